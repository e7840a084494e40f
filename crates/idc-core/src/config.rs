use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::Subject;

/// Env var that overrides the configured primary service URL.
pub const API_URL_ENV: &str = "IDCHECK_API_URL";

/// Top-level harness configuration loaded from `idcheck.toml`.
///
/// **Security**: passwords for the test subjects live in this file by
/// necessity (they are throwaway seeded identities), but no other credential
/// is ever stored here. Bearer tokens obtained during a run are never written
/// back anywhere.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HarnessConfig {
    #[serde(default)]
    pub primary: PrimaryConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

impl HarnessConfig {
    /// Load config from `./idcheck.toml`, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(path)
        } else {
            tracing::debug!("no idcheck.toml found, using built-in defaults");
            let cfg = Self::default();
            cfg.validate()?;
            Ok(cfg)
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let cfg: HarnessConfig =
            toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Semantic validation for settings not expressible via type checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for subject in &self.subjects {
            if subject.email.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "subject with empty email".to_string(),
                ));
            }
            if subject.expected_role.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "subject {} has empty expected_role",
                    subject.email
                )));
            }
        }
        if self.primary.request_timeout_secs == 0 || self.primary.probe_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeouts must be nonzero".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective primary service URL: `IDCHECK_API_URL` wins over the file.
    pub fn api_url(&self) -> String {
        std::env::var(API_URL_ENV).unwrap_or_else(|_| self.primary.api_url.clone())
    }

    /// Configured subjects, or the stock seeded trio when none are declared.
    pub fn subjects_or_default(&self) -> Vec<Subject> {
        if self.subjects.is_empty() {
            default_subjects()
        } else {
            self.subjects.clone()
        }
    }

    fn default_path() -> PathBuf {
        PathBuf::from("idcheck.toml")
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(String),
    #[error("parse: {0}")]
    Parse(String),
    #[error("validation: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Section structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryConfig {
    /// Base URL of the primary service under verification.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-call timeout for login and introspection, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Timeout for the run-precondition reachability probe, in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:3080".into()
}
fn default_request_timeout() -> u64 {
    10
}
fn default_probe_timeout() -> u64 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DirectoryConfig {
    /// Base URL of the identity lookup endpoint. When unset the directory
    /// pre-check is skipped and verification proceeds without a record.
    #[serde(default)]
    pub url: Option<String>,
}

/// The three seeded test identities from the stock deployment.
pub fn default_subjects() -> Vec<Subject> {
    vec![
        Subject::new("admin@test.com", "Admin@123456", "ADMIN", "admin user"),
        Subject::new("user1@test.com", "User@123456", "USER", "regular user 1"),
        Subject::new("user2@test.com", "User@123456", "USER", "regular user 2"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = HarnessConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.primary.api_url, "http://localhost:3080");
        assert_eq!(cfg.primary.request_timeout_secs, 10);
        assert_eq!(cfg.primary.probe_timeout_secs, 3);
        assert!(cfg.directory.url.is_none());
    }

    #[test]
    fn empty_subject_list_falls_back_to_seeded_trio() {
        let cfg = HarnessConfig::default();
        let subjects = cfg.subjects_or_default();
        assert_eq!(subjects.len(), 3);
        assert_eq!(subjects[0].email, "admin@test.com");
        assert_eq!(subjects[0].expected_role, "ADMIN");
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let text = r#"
            [primary]
            api_url = "http://chat.internal:3080"

            [[subjects]]
            email = "ops@test.com"
            password = "Ops@123456"
            expected_role = "ADMIN"
        "#;
        let cfg: HarnessConfig = toml::from_str(text).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.primary.api_url, "http://chat.internal:3080");
        assert_eq!(cfg.primary.request_timeout_secs, 10);
        assert_eq!(cfg.subjects.len(), 1);
        assert_eq!(cfg.subjects[0].description, "");
    }

    #[test]
    fn rejects_subject_without_role() {
        let text = r#"
            [[subjects]]
            email = "ops@test.com"
            password = "x"
            expected_role = ""
        "#;
        let cfg: HarnessConfig = toml::from_str(text).unwrap();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("ops@test.com")
        ));
    }

    #[test]
    fn load_from_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idcheck.toml");
        std::fs::write(
            &path,
            r#"
            [primary]
            request_timeout_secs = 5
        "#,
        )
        .unwrap();
        let cfg = HarnessConfig::load_from(&path).unwrap();
        assert_eq!(cfg.primary.request_timeout_secs, 5);
    }

    #[test]
    fn load_from_missing_file_is_io_error() {
        let result = HarnessConfig::load_from("/definitely/missing/idcheck.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}

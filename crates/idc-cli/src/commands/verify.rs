use std::path::PathBuf;
use std::time::Duration;

use idc_core::types::{RunReport, VerdictStatus};
use idc_harness::auth::AuthClient;
use idc_harness::directory::{HttpDirectory, IdentityDirectory, NullDirectory};
use idc_harness::orchestrator::Orchestrator;

use super::load_config;

/// Run the `verify` subcommand: execute the harness and report per-subject
/// verdicts plus an aggregate summary. Exits nonzero unless every subject
/// passed.
pub async fn run(
    config_path: Option<&str>,
    api_url: Option<&str>,
    json_output: bool,
    out_path: Option<&str>,
) -> anyhow::Result<()> {
    let cfg = load_config(config_path)?;
    let api_url = api_url
        .map(String::from)
        .unwrap_or_else(|| cfg.api_url());
    let subjects = cfg.subjects_or_default();

    let auth = AuthClient::new(
        &api_url,
        Duration::from_secs(cfg.primary.request_timeout_secs),
        Duration::from_secs(cfg.primary.probe_timeout_secs),
    );
    let directory: Box<dyn IdentityDirectory> = match &cfg.directory.url {
        Some(url) => Box::new(HttpDirectory::new(
            url,
            Duration::from_secs(cfg.primary.request_timeout_secs),
        )),
        None => Box::new(NullDirectory),
    };

    let report = Orchestrator::new(&auth, directory.as_ref(), &subjects)
        .run()
        .await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&api_url, &report);
    }

    if let Some(path) = out_path {
        write_json_artifact(path, &serde_json::to_value(&report)?)?;
    }

    if report.exit_code() != 0 {
        anyhow::bail!(
            "verification failed ({} of {} subjects)",
            report.failed,
            report.total()
        );
    }

    Ok(())
}

fn print_report(api_url: &str, report: &RunReport) {
    println!("identity propagation report");
    println!("{}", "-".repeat(40));
    println!("Primary: {api_url}");

    for (index, verdict) in report.verdicts.iter().enumerate() {
        let label = if verdict.description.is_empty() {
            verdict.email.clone()
        } else {
            format!("{} ({})", verdict.email, verdict.description)
        };
        println!("{}. {label}", index + 1);
        println!("   status: {}", verdict.status);
        match verdict.status {
            VerdictStatus::Passed => {
                println!(
                    "   role: {}  user id: {}",
                    verdict.actual_role.as_deref().unwrap_or("-"),
                    verdict.user_id.as_deref().unwrap_or("-")
                );
                if let Some(headers) = &verdict.headers {
                    println!(
                        "   headers: X-User-Role={} X-User-Email={} X-User-ID={}",
                        headers.role, headers.email, headers.user_id
                    );
                }
            }
            VerdictStatus::Failed => {
                println!(
                    "   expected: {}  actual: {}",
                    verdict.expected_role,
                    verdict.actual_role.as_deref().unwrap_or("-")
                );
            }
            VerdictStatus::Error => {
                println!(
                    "   error: {}",
                    verdict.error.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    println!("{}", "-".repeat(40));
    println!(
        "total: {} | passed: {} | failed: {}",
        report.total(),
        report.passed,
        report.failed
    );
}

fn write_json_artifact(path: &str, value: &serde_json::Value) -> anyhow::Result<()> {
    let out_path = PathBuf::from(path);
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(out_path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

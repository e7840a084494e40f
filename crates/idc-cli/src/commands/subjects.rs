use super::load_config;

/// Run the `subjects` subcommand: list the configured subjects without
/// touching the network.
pub fn run(config_path: Option<&str>) -> anyhow::Result<()> {
    let cfg = load_config(config_path)?;
    let subjects = cfg.subjects_or_default();

    println!("configured subjects");
    println!("{}", "-".repeat(40));
    for subject in &subjects {
        let description = if subject.description.is_empty() {
            String::new()
        } else {
            format!("  ({})", subject.description)
        };
        println!(
            "  {:<28} expects {}{description}",
            subject.email, subject.expected_role
        );
    }
    println!("total: {}", subjects.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_default_subjects_without_config() {
        // No idcheck.toml in the test cwd: falls back to the seeded trio.
        run(None).unwrap();
    }

    #[test]
    fn fails_on_missing_explicit_config() {
        assert!(run(Some("/definitely/missing/idcheck.toml")).is_err());
    }
}

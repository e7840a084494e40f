mod commands;
mod logging;

use clap::{Parser, Subcommand};

/// idcheck CLI -- verify identity propagation for a chat deployment.
#[derive(Parser)]
#[command(name = "idc", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the verification harness (default when no subcommand is given).
    Verify {
        /// Path to idcheck.toml (defaults to ./idcheck.toml).
        #[arg(long)]
        config: Option<String>,
        /// Primary service URL, overriding config and IDCHECK_API_URL.
        #[arg(long)]
        api_url: Option<String>,
        /// Emit the report as JSON on stdout.
        #[arg(long)]
        json: bool,
        /// Write the JSON report artifact to this path.
        #[arg(long)]
        out: Option<String>,
    },

    /// List the configured subjects without touching the network.
    Subjects {
        /// Path to idcheck.toml (defaults to ./idcheck.toml).
        #[arg(long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging("info");
    let cli = Cli::parse();

    match cli.command {
        None => {
            commands::verify::run(None, None, false, None).await?;
        }
        Some(Commands::Verify {
            config,
            api_url,
            json,
            out,
        }) => {
            commands::verify::run(config.as_deref(), api_url.as_deref(), json, out.as_deref())
                .await?;
        }
        Some(Commands::Subjects { config }) => {
            commands::subjects::run(config.as_deref())?;
        }
    }

    Ok(())
}

//! Bento Send
//!
//! Delivers a raw RFC 822 message through the Bento batch email API, using
//! `BENTO_*` environment variables for credentials.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bento_mailer::{BentoDelivery, FrameworkVersion, HtmlInliner, RecordingTransport, Settings};
use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{Environment, FromEnv};
use eyre::{Result, WrapErr};
use serde_json::{Map, Value};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "bento-send")]
#[command(about = "Deliver email through the Bento batch email API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Deliver one RFC 822 message file
    Send {
        /// Path to the message (.eml)
        file: PathBuf,

        /// Personalization values as a JSON object
        #[arg(short, long, value_parser = parse_personalization)]
        personalization: Option<Map<String, Value>>,

        /// Host framework version; 7.0 and later get CSS inlined
        #[arg(short = 'F', long)]
        framework_version: Option<FrameworkVersion>,

        /// Print the request body instead of sending it
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Verify the required settings and print them
    Check,
}

fn parse_personalization(raw: &str) -> Result<Map<String, Value>, String> {
    serde_json::from_str(raw).map_err(|e| format!("personalization must be a JSON object: {}", e))
}

async fn read_message(file: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(file)
        .await
        .wrap_err_with(|| format!("Failed to read {}", file.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command {
        Commands::Send {
            file,
            personalization,
            framework_version,
            dry_run,
        } => {
            let raw = read_message(&file).await?;
            let mail = mailparse::parse_mail(&raw)
                .wrap_err_with(|| format!("Failed to parse {}", file.display()))?;
            let inliner = HtmlInliner::for_host(framework_version);
            let personalization = personalization.unwrap_or_default();

            if dry_run {
                let transport = Arc::new(RecordingTransport::new());
                let delivery = BentoDelivery::with_transport(settings, transport.clone())
                    .with_inliner(inliner);
                delivery.deliver_with(&mail, personalization).await?;

                let request = transport
                    .last_request()
                    .await
                    .ok_or_else(|| eyre::eyre!("Dry run produced no request"))?;
                println!("{}", serde_json::to_string_pretty(&request.body)?);
            } else {
                let delivery = BentoDelivery::new(settings).with_inliner(inliner);
                let response = delivery.deliver_with(&mail, personalization).await?;

                info!(file = %file.display(), status = response.status, "Message sent");
                println!(
                    "{} {}",
                    response.status,
                    response.reason.as_deref().unwrap_or_default()
                );
            }
        }

        Commands::Check => {
            settings.validate()?;
            println!("{:#?}", settings);
        }
    }

    Ok(())
}

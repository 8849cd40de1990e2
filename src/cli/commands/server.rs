use clap::Subcommand;

use crate::cli::{utils, OutputFormat};

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Show server information from API root endpoint")]
    Info {
        #[arg(long, env = "STAYBOOK_URL", default_value = utils::DEFAULT_SERVER_URL, help = "Server base URL")]
        url: String,
    },

    #[command(about = "Check server health status from API /health endpoint")]
    Health {
        #[arg(long, env = "STAYBOOK_URL", default_value = utils::DEFAULT_SERVER_URL, help = "Server base URL")]
        url: String,
    },
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Info { url } => {
            let (_, body) = utils::fetch_json(&url, "/").await?;
            utils::output_value(output_format, &body)
        }
        ServerCommands::Health { url } => {
            let (status, body) = utils::fetch_json(&url, "/health").await?;
            utils::output_value(output_format, &body)?;
            if !status.is_success() {
                anyhow::bail!("{} reported {}", url, status);
            }
            Ok(())
        }
    }
}

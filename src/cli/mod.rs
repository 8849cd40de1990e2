pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "staybook")]
#[command(about = "Staybook CLI - database, user and server administration for the Staybook API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Output in YAML format")]
    pub yaml: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Database schema management")]
    Db {
        #[command(subcommand)]
        cmd: commands::db::DbCommands,
    },

    #[command(about = "User account administration")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "Remote server checks")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Browse spots on a running server")]
    Spots {
        #[command(subcommand)]
        cmd: commands::spots::SpotsCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else if cli.yaml {
            OutputFormat::Yaml
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Db { cmd } => commands::db::handle(cmd, output_format).await,
        Commands::User { cmd } => commands::user::handle(cmd, output_format).await,
        Commands::Server { cmd } => commands::server::handle(cmd, output_format).await,
        Commands::Spots { cmd } => commands::spots::handle(cmd, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_flags_select_format() {
        let cli = Cli::parse_from(["staybook", "--yaml", "server", "health"]);
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Yaml);

        let cli = Cli::parse_from(["staybook", "spots", "list", "--page", "2", "--json"]);
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Json);

        let cli = Cli::parse_from(["staybook", "db", "migrate"]);
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Text);
    }
}

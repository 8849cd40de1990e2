use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::auth::hash_password;
use crate::cli::{utils, OutputFormat};
use crate::config;
use crate::database::models::NewUser;
use crate::database::{DatabaseError, DatabaseManager, PgStore, Store};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user directly in the database")]
    Add {
        #[arg(long, help = "Login email (unique)")]
        email: String,
        #[arg(long, help = "First name")]
        first_name: String,
        #[arg(long, help = "Last name")]
        last_name: String,
        #[arg(long, env = "STAYBOOK_USER_PASSWORD", help = "Plain-text password; hashed before storing")]
        password: String,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Add {
            email,
            first_name,
            last_name,
            password,
        } => {
            if !email.contains('@') {
                anyhow::bail!("'{}' is not an email address", email);
            }

            let pool = DatabaseManager::connect(&config::config().database)
                .await
                .context("failed to connect to PostgreSQL")?;
            let store = PgStore::new(pool);

            let hashed_password = hash_password(&password)?;
            let user = store
                .create_user(NewUser {
                    first_name,
                    last_name,
                    email: email.to_lowercase(),
                    hashed_password,
                })
                .await
                .map_err(|e| match e {
                    DatabaseError::UniqueViolation(_) => anyhow::anyhow!("a user with email '{}' already exists", email),
                    other => anyhow::Error::new(other),
                })?;

            utils::output_success(
                output_format,
                &format!("Created user {} <{}>", user.id, user.email),
                Some(json!({ "user": user })),
            )
        }
    }
}

use clap::Subcommand;
use serde_json::Value;

use crate::cli::{utils, OutputFormat};

#[derive(Subcommand)]
pub enum SpotsCommands {
    #[command(about = "List spots with rating and preview image")]
    List {
        #[arg(long, env = "STAYBOOK_URL", default_value = utils::DEFAULT_SERVER_URL, help = "Server base URL")]
        url: String,
        #[arg(long, help = "Page number (1-based)")]
        page: Option<u32>,
        #[arg(long, help = "Spots per page")]
        size: Option<u32>,
    },
}

pub async fn handle(cmd: SpotsCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        SpotsCommands::List { url, page, size } => {
            let mut path = String::from("/spots");
            let params: Vec<String> = [("page", page), ("size", size)]
                .into_iter()
                .filter_map(|(key, value)| value.map(|v| format!("{}={}", key, v)))
                .collect();
            if !params.is_empty() {
                path.push('?');
                path.push_str(&params.join("&"));
            }

            let (status, body) = utils::fetch_json(&url, &path).await?;
            if !status.is_success() {
                anyhow::bail!("{} answered {}: {}", url, status, body);
            }

            match output_format {
                OutputFormat::Text => print_spots(&body),
                _ => utils::output_value(output_format, &body),
            }
        }
    }
}

fn print_spots(body: &Value) -> anyhow::Result<()> {
    let spots = body.get("Spot").and_then(Value::as_array).cloned().unwrap_or_default();
    if spots.is_empty() {
        println!("No spots found");
        return Ok(());
    }

    for spot in spots {
        let rating = spot
            .get("avgRating")
            .and_then(Value::as_f64)
            .map(|r| format!("{:.1}", r))
            .unwrap_or_else(|| "new".to_string());
        println!(
            "{:>5}  {:<40}  {:>8}  {}",
            spot.get("id").unwrap_or(&Value::Null),
            spot.get("name").and_then(Value::as_str).unwrap_or_default(),
            spot.get("price").unwrap_or(&Value::Null),
            rating
        );
    }
    Ok(())
}

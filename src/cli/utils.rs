use anyhow::Context;
use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Base URL used when `--url` and `STAYBOOK_URL` are both absent
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Print a structured value in the selected format
pub fn output_value(output_format: OutputFormat, value: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        OutputFormat::Text => println!("{}", text_line(value)),
    }
    Ok(())
}

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Text => {
            println!("✓ {}", message);
            Ok(())
        }
        _ => {
            let mut response = json!({ "success": true, "message": message });
            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }
            output_value(output_format, &response)
        }
    }
}

/// `key=value` pairs for flat objects; anything else as compact JSON
fn text_line(value: &Value) -> String {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{}={}", k, s),
                other => format!("{}={}", k, other),
            })
            .collect::<Vec<_>>()
            .join(" "),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// GET `base/path` and decode the JSON body, whatever the status
pub async fn fetch_json(base_url: &str, path: &str) -> anyhow::Result<(reqwest::StatusCode, Value)> {
    let url = url::Url::parse(base_url)
        .and_then(|base| base.join(path))
        .with_context(|| format!("invalid server url '{}'", base_url))?;

    let response = reqwest::Client::new()
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("request to {} failed", url))?;

    let status = response.status();
    let body = response
        .json::<Value>()
        .await
        .with_context(|| format!("{} did not return JSON", url))?;
    Ok((status, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_lines_flatten_objects() {
        assert_eq!(text_line(&json!({"id": 1, "name": "Cabin"})), "id=1 name=Cabin");
        assert_eq!(text_line(&json!("plain")), "plain");
    }
}

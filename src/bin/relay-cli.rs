use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde_json::Value;

use vrc_age_relay::config::{load_config_or_default, AdmissionConfig};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Query a running VRChat age-verification relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Relay configuration whose admission allow-lists the requests should satisfy
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show relay readiness and the authenticated VRChat account
    Health,
    /// Look up a display name the way an in-game caller would
    Check {
        username: String,

        /// Caller tag; defaults to the first configured one
        #[arg(long)]
        called_from: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Check { username, called_from } => {
            let admission = load_config_or_default(cli.config.as_deref())?.admission;
            let headers = caller_headers(&admission)?;
            let tag = called_from
                .or_else(|| admission.caller_tags.first().cloned())
                .unwrap_or_default();

            let res = client
                .get(format!("{}/checkAdultStatus", base))
                .headers(headers)
                .query(&[("username", username.as_str()), (admission.caller_tag_name.as_str(), tag.as_str())])
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

/// Headers an admitted in-game caller would send under this configuration.
fn caller_headers(admission: &AdmissionConfig) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    if let Some(ua) = admission.user_agents.first() {
        headers.insert(USER_AGENT, HeaderValue::from_str(ua)?);
    }
    if let Some(version) = admission.runtime_versions.first() {
        headers.insert(
            HeaderName::from_bytes(admission.runtime_version_header.as_bytes())?,
            HeaderValue::from_str(version)?,
        );
    }
    Ok(headers)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Relay returned status {}", status);
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_follow_configured_allow_lists() {
        let admission = AdmissionConfig {
            user_agents: vec!["UnityPlayer/6000.0.1f1".to_string()],
            runtime_version_header: "x-runtime".to_string(),
            runtime_versions: vec!["6000.0.1f1".to_string()],
            ..AdmissionConfig::default()
        };

        let headers = caller_headers(&admission).unwrap();

        assert_eq!(headers.get(USER_AGENT).unwrap(), "UnityPlayer/6000.0.1f1");
        assert_eq!(headers.get("x-runtime").unwrap(), "6000.0.1f1");
        assert!(headers.get("x-unity-version").is_none());
    }

    #[test]
    fn test_config_flag_is_read() {
        let cli = Cli::try_parse_from(["relay-cli", "--config", "/etc/relay.toml", "check", "ExampleUser"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/etc/relay.toml")));
        match cli.command {
            Commands::Check { username, called_from } => {
                assert_eq!(username, "ExampleUser");
                assert!(called_from.is_none());
            }
            Commands::Health => panic!("expected check"),
        }
    }
}

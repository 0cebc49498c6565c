//! One-shot requests against the League client API.
//!
//! ```text
//! lcu-cli get /lol-summoner/v1/current-summoner
//! lcu-cli post /lol-lobby/v2/lobby --body '{"queueId": 420}'
//! lcu-cli --port 51234 --token abc get /riotclient/ux-state
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use reqwest::Method;
use serde_json::Value;

use lcu_bridge::config::load_or_default;
use lcu_bridge::discovery::{ProcessLocator, StaticLocator, SystemLocator};
use lcu_bridge::observability::init_logging;
use lcu_bridge::{Bridge, EventRouter, RequestOptions};

#[derive(Parser)]
#[command(name = "lcu-cli")]
#[command(about = "Send a request to the League client API", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip discovery and use this port (requires --token)
    #[arg(long, requires = "token")]
    port: Option<u16>,

    /// Auth token to use with --port
    #[arg(long, requires = "port")]
    token: Option<String>,

    /// HTTP method
    #[arg(value_enum)]
    method: HttpMethod,

    /// API path, e.g. /lol-summoner/v1/current-summoner
    uri: String,

    /// JSON request body
    #[arg(short, long)]
    body: Option<String>,

    /// Query parameter as key=value. Repeatable.
    #[arg(short, long = "query", value_parser = parse_pair)]
    query: Vec<(String, String)>,
}

#[derive(Clone, Copy, ValueEnum)]
enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{}`", raw))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_or_default(cli.config.as_deref())?;
    // Keep stdout clean for the response body.
    config.observability.log_level = "warn".to_string();
    init_logging(&config.observability)?;

    let mut options = RequestOptions::default();
    if let Some(body) = &cli.body {
        options.body = Some(serde_json::from_str::<Value>(body)?);
    }
    options.query = cli.query;

    let locator: Arc<dyn ProcessLocator> = match (cli.port, cli.token) {
        (Some(port), Some(token)) => Arc::new(StaticLocator::from_credentials(port, &token)),
        _ => Arc::new(SystemLocator::new(config.discovery.process_names.clone())),
    };

    let mut bridge = Bridge::with_locator(config, Arc::new(EventRouter::new()), locator);
    bridge.start().await?;

    let result = bridge.request(cli.method.into(), &cli.uri, options).await;
    bridge.stop().await;

    let response = result?;
    let status = response.status();
    let text = response.text().await?;

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) if text.is_empty() => {}
        Err(_) => println!("{}", text),
    }

    if !status.is_success() {
        eprintln!("HTTP {}", status);
        std::process::exit(1);
    }
    Ok(())
}

//! Issue one call through the outbound rewriter, as application code would.
use std::process::ExitCode;

use clap::Parser;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;
use url::Url;

use api_relay::config::loader::load_config;
use api_relay::outbound::{ExecutionContext, OutboundClient, OutboundRequest};

#[derive(Parser)]
#[command(name = "relay-fetch")]
#[command(about = "Fetch a URL through the api-relay outbound rewriter", long_about = None)]
struct Cli {
    /// Execution context whose rewriter to apply.
    #[arg(long, default_value_t = ExecutionContext::current())]
    context: ExecutionContext,

    /// Origin for same-origin paths (browser context).
    #[arg(long, default_value = "http://localhost:3000")]
    origin: Url,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// HTTP method.
    #[arg(short = 'X', long, default_value = "GET")]
    method: Method,

    /// Extra request header, `name: value`. Repeatable.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body.
    #[arg(short, long)]
    data: Option<String>,

    /// Print the rewritten URL without sending anything.
    #[arg(long)]
    dry_run: bool,

    url: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("relay-fetch: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = load_config(cli.config.as_deref())?.validate()?;
    let rewriter = cli.context.rewriter(&settings);
    let client = OutboundClient::new(reqwest::Client::new(), rewriter).with_origin(cli.origin);

    if cli.dry_run {
        println!("{}", client.resolve(&cli.url)?);
        return Ok(());
    }

    let mut request = OutboundRequest::new(cli.method, cli.url);
    for header in &cli.headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| format!("header '{header}' is not 'name: value'"))?;
        request = request.header(
            HeaderName::from_bytes(name.trim().as_bytes())?,
            HeaderValue::from_str(value.trim())?,
        );
    }
    if let Some(data) = cli.data {
        request = request.body(data);
    }

    let res = client.execute(request).await?;
    let status = res.status();
    eprintln!("{} {}", status, res.url());

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{text}"),
    }
    Ok(())
}

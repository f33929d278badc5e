use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use tenant_gateway::config::loader::check_file;
use tenant_gateway::routing::TenantRouter;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the tenant gateway", long_about = None)]
struct Cli {
    /// Admin API base URL.
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Admin API key.
    #[arg(short, long, env = "GATEWAY_ADMIN_API_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Status,
    /// List the tenant → upstream table
    Tenants,
    /// Validate a configuration file without starting the gateway
    Validate {
        /// Path to the TOML configuration file
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let path = match cli.command {
        Commands::Status => "/admin/status",
        Commands::Tenants => "/admin/tenants",
        Commands::Validate { path } => return validate(&path),
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let res = reqwest::Client::new()
        .get(format!("{}{}", cli.url.trim_end_matches('/'), path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

fn validate(path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = check_file(path)?;
    let router = TenantRouter::from_config(&config.routing)?;

    println!("{}: OK", path.display());
    println!("tenant header: {}", router.tenant_header());
    for (tenant, upstream) in router.table().entries() {
        println!("  {tenant} -> {upstream}");
    }
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        return Err(format!("admin API returned {status}: {text}").into());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

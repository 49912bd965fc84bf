// quip-mcp: MCP server for Quip over stdio.

use anyhow::Context;
use clap::Parser;
use quip_client::QuipClient;
use quip_mcp::settings::{
    read_token_line, setup_interactive, MIN_TOKEN_LEN, TOKEN_ENV, TOKEN_URL,
};
use quip_mcp::{build_server, default_config_path, mask_token, Settings};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "quip-mcp",
    version,
    about = "Model Context Protocol server for Quip documents"
)]
struct Cli {
    /// Prompt for a Quip API token and save it
    #[arg(long)]
    setup: bool,

    /// Show the configuration file location and status
    #[arg(long = "config")]
    show_config: bool,

    /// Read and write configuration at PATH instead of the default location
    #[arg(long, value_name = "PATH")]
    config_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    quip_mcp::init_logging("info");

    let path = cli.config_path.unwrap_or_else(default_config_path);

    if cli.setup {
        setup_interactive(&path, read_token, std::io::stdout())
            .with_context(|| format!("setup failed for {}", path.display()))?;
        return Ok(());
    }

    if cli.show_config {
        return show_config(&path);
    }

    let settings = Settings::load(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;

    if !settings.has_valid_token() {
        print_token_help(&path);
        std::process::exit(1);
    }

    let client =
        QuipClient::new(settings.client_config()?).context("failed to build HTTP client")?;
    let server = build_server(client).await;

    info!(
        base_url = settings.base_url(),
        "Quip MCP server {} listening on stdio",
        env!("CARGO_PKG_VERSION")
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    server
        .serve(stdin, tokio::io::stdout())
        .await
        .context("stdio transport failed")
}

/// Read the token without echo on a terminal; piped input is read as a line.
fn read_token() -> std::io::Result<String> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        console::Term::stderr().read_secure_line()
    } else {
        read_token_line(stdin.lock())
    }
}

fn show_config(path: &Path) -> anyhow::Result<()> {
    let settings = Settings::load(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;

    println!("Configuration file: {}", path.display());
    println!("File exists: {}", if path.exists() { "yes" } else { "no" });
    match settings.token() {
        Some(token) => println!("API token: {}", mask_token(token)),
        None => println!("API token: not set"),
    }
    println!("Token valid: {}", if settings.has_valid_token() { "yes" } else { "no" });
    println!("Base URL: {}", settings.base_url());
    println!("Timeout: {}s", settings.timeout_secs());
    Ok(())
}

fn print_token_help(path: &Path) {
    eprintln!("No valid Quip API token configured.");
    eprintln!();
    eprintln!("Get a personal access token at {}, then either:", TOKEN_URL);
    eprintln!("  1. Run: quip-mcp --setup");
    eprintln!("  2. Set the {} environment variable", TOKEN_ENV);
    eprintln!("  3. Write 'quip_api_token: <token>' to {}", path.display());
    eprintln!();
    eprintln!("Tokens must be at least {} characters.", MIN_TOKEN_LEN);
}

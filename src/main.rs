use crypto_binance_provider::config::ServerConfig;
use crypto_binance_provider::tools::ToolContext;
use crypto_binance_provider::transport::TransportMode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first to determine mode
    let args: Vec<String> = std::env::args().collect();
    let (mode, port) = parse_args(&args);

    // Initialize tracing/logging
    // Always stderr: stdout is reserved for the MCP protocol in stdio mode
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting crypto market provider in {} mode...", mode);

    let mut config = ServerConfig::from_env()?;
    if let Some(port) = port {
        config.http = config.http.with_port(port);
    }
    tracing::debug!(?config, "Loaded configuration");

    let context = Arc::new(ToolContext::from_config(&config)?);

    match mode {
        TransportMode::Stdio => run_stdio_server(context).await?,
        TransportMode::Http => run_http_server(&config, context).await?,
    }

    Ok(())
}

/// Parse command-line arguments
fn parse_args(args: &[String]) -> (TransportMode, Option<u16>) {
    let mut mode = TransportMode::default();
    let mut port = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--mode" => {
                if i + 1 < args.len() {
                    mode = match args[i + 1].parse() {
                        Ok(mode) => mode,
                        Err(msg) => exit_with_usage(&msg),
                    };
                    i += 1;
                }
            }
            "--http" => mode = TransportMode::Http,
            "--stdio" => mode = TransportMode::Stdio,
            "--port" => {
                if i + 1 < args.len() {
                    port = match args[i + 1].parse::<u16>() {
                        Ok(p) if p > 0 => Some(p),
                        _ => exit_with_usage(&format!("Invalid port: {}", args[i + 1])),
                    };
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => exit_with_usage(&format!("Unknown argument: {}", other)),
        }
        i += 1;
    }

    (mode, port)
}

fn exit_with_usage(message: &str) -> ! {
    eprintln!("{}", message);
    print_usage();
    std::process::exit(1);
}

/// Print usage information
///
/// Goes to stderr so it never corrupts an MCP stdio stream.
fn print_usage() {
    eprintln!("Crypto Binance Provider - MCP server for Binance market data, analysis and risk workflows");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    crypto-binance-provider [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    --mode <MODE>       Transport mode: stdio or http (default: stdio)");
    eprintln!("    --stdio             Run in stdio MCP mode (shortcut for --mode stdio)");
    eprintln!("    --http              Run in HTTP mode (shortcut for --mode http)");
    eprintln!("    --port <PORT>       HTTP port, overrides HTTP_PORT (default: 8080)");
    eprintln!("    --help, -h          Print this help message");
    eprintln!();
    eprintln!("ENVIRONMENT VARIABLES:");
    eprintln!("    BINANCE_API_BASE_URL         Spot REST base URL (default: https://api.binance.com)");
    eprintln!("    BINANCE_FUTURES_BASE_URL     Futures REST base URL (default: https://fapi.binance.com)");
    eprintln!("    BINANCE_HTTP_TIMEOUT_SECS    Upstream request timeout (default: 10)");
    eprintln!("    RATE_LIMIT_CAPACITY          Token bucket capacity per market (default: 10)");
    eprintln!("    RATE_LIMIT_REFILL_PER_SEC    Token refill rate per market (default: 10)");
    eprintln!("    RETRY_MAX_RETRIES            Retries after the first attempt (default: 3)");
    eprintln!("    RETRY_BASE_DELAY_MS          Backoff base delay (default: 300)");
    eprintln!("    SEARCH_CACHE_SIZE            Search cache entries (default: 200)");
    eprintln!("    HTTP_HOST                    HTTP bind host (default: 0.0.0.0)");
    eprintln!("    HTTP_PORT                    HTTP bind port (default: 8080)");
    eprintln!("    RUST_LOG                     Logging level (default: info)");
    eprintln!();
    eprintln!("EXAMPLES:");
    eprintln!("    # Start in stdio mode");
    eprintln!("    crypto-binance-provider --stdio");
    eprintln!();
    eprintln!("    # Start HTTP server on custom port");
    eprintln!("    crypto-binance-provider --mode http --port 9000");
}

/// Run the provider in stdio MCP mode
#[cfg(feature = "mcp_server")]
async fn run_stdio_server(context: Arc<ToolContext>) -> anyhow::Result<()> {
    crypto_binance_provider::transport::stdio::run_stdio_server(context).await
}

#[cfg(not(feature = "mcp_server"))]
async fn run_stdio_server(_context: Arc<ToolContext>) -> anyhow::Result<()> {
    anyhow::bail!("stdio mode requires the 'mcp_server' feature")
}

/// Run the provider in HTTP mode
#[cfg(feature = "http_transport")]
async fn run_http_server(config: &ServerConfig, context: Arc<ToolContext>) -> anyhow::Result<()> {
    crypto_binance_provider::transport::http::start_http_server(&config.http, context).await
}

#[cfg(not(feature = "http_transport"))]
async fn run_http_server(_config: &ServerConfig, _context: Arc<ToolContext>) -> anyhow::Result<()> {
    anyhow::bail!("HTTP mode requires the 'http_transport' feature")
}

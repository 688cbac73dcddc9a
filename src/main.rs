use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use gallery_explorer::{Config, create_app, startup_checks};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web server (default if no command specified)
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        host: Option<String>,

        /// Automatically quit after specified number of seconds (useful for testing)
        #[arg(long)]
        quit_after: Option<u64>,
    },

    /// Validate the configuration and list the configured collections
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Some(Commands::Check) => run_check(&cli.config).await,
        Some(Commands::Serve {
            port,
            host,
            quit_after,
        }) => run_server(&cli.config, port, host, quit_after).await,
        None => run_server(&cli.config, None, None, None).await,
    }
}

fn load_config(config_path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if config_path.exists() {
        let config_content = std::fs::read_to_string(config_path)?;
        Ok(toml_edit::de::from_str::<Config>(&config_content)?)
    } else {
        info!("Config file not found at {:?}, using defaults", config_path);
        Ok(Config::default())
    }
}

async fn run_check(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;

    if let Err(errors) = startup_checks::perform_startup_checks(&config).await {
        for e in &errors {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }

    if config.collections.is_empty() {
        println!("No collections configured");
    } else {
        println!("Collections:");
        for collection in &config.collections {
            let endpoint = config
                .media
                .endpoints
                .get(&collection.id)
                .map(String::as_str)
                .unwrap_or("(default)");
            println!(
                "  {:<12} {:<40} {}",
                collection.id, collection.title, endpoint
            );
        }
    }

    Ok(())
}

async fn run_server(
    config_path: &Path,
    port: Option<u16>,
    host: Option<String>,
    quit_after: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;

    let host = host.unwrap_or(config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info!("Starting {} server", config.app.name);
    info!("Configuration loaded from: {:?}", config_path);
    info!("Template directory: {:?}", config.templates.directory);
    info!("Media delivery URL: {}", config.media.delivery_url);
    info!("Media API base: {}", config.media.api_base);

    if let Err(errors) = startup_checks::perform_startup_checks(&config).await {
        for e in &errors {
            error!("Startup check failed: {}", e);
        }
        return Err("startup checks failed".into());
    }

    let app = create_app(config).await;

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    match quit_after {
        Some(seconds) => {
            info!("Server will quit after {} seconds", seconds);
            let shutdown = async move {
                tokio::time::sleep(std::time::Duration::from_secs(seconds)).await;
                info!("Quit timer elapsed, shutting down");
            };
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await?;
        }
        None => axum::serve(listener, app).await?,
    }

    Ok(())
}

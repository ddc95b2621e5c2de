//! Binary entrypoint for the tagrelay CLI.
//!
//! Commands:
//! - `start [--port <n>] [--relay-port <n>] [--no-relay]` - accept readers and relay reports
//! - `init` - write a starter `config.toml`
//! - `decode <HEX>... | --file <path>` - decode a hex capture offline, one JSON report per line
//!
//! See the library crate docs for module‑level details: `tagrelay::`.
use std::net::SocketAddr;
use std::path::Path;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use tagrelay::config::Config;
use tagrelay::logutil::parse_hex_capture;
use tagrelay::reader::{ConnectionContext, TagReport};

#[derive(Parser)]
#[command(name = "tagrelay")]
#[command(about = "TCP ingest and relay for RFID fixed-reader tag reports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Accept reader connections and relay decoded reports
    Start {
        /// Reader listener port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Viewer relay port (overrides config)
        #[arg(long)]
        relay_port: Option<u16>,

        /// Do not start the viewer relay
        #[arg(long)]
        no_relay: bool,
    },
    /// Write a default configuration file
    Init,
    /// Decode a hex capture and print the resulting reports as JSON lines
    Decode {
        /// Hex bytes (whitespace, ':' and '0x' prefixes are ignored)
        hex: Vec<String>,

        /// Read the capture from a file instead
        #[arg(short, long)]
        file: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            port,
            relay_port,
            no_relay,
        } => {
            let mut config = load_or_default(&cli.config, cli.verbose).await?;
            if let Some(port) = port {
                config.listener.port = port;
            }
            if let Some(port) = relay_port {
                config.relay.port = port;
            }
            if no_relay {
                config.relay.enabled = false;
            }
            config.validate()?;

            info!("Starting tagrelay v{}", env!("CARGO_PKG_VERSION"));
            tagrelay::server::run(config).await?;
        }
        Commands::Init => {
            init_logging(&None, cli.verbose);
            if Path::new(&cli.config).exists() {
                bail!("{} already exists; refusing to overwrite", cli.config);
            }
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Decode { hex, file } => {
            let config = load_or_default(&cli.config, cli.verbose).await?;
            let text = match file {
                Some(path) => tokio::fs::read_to_string(&path).await?,
                None if !hex.is_empty() => hex.join(" "),
                None => bail!("provide hex bytes or --file"),
            };
            let bytes = parse_hex_capture(&text)?;

            let mut ctx = ConnectionContext::open(SocketAddr::from(([0, 0, 0, 0], 0)), config.protocol);
            let mut reports: Vec<TagReport> = Vec::new();
            let summary = ctx.on_data(&bytes, &mut reports);
            for report in &reports {
                println!("{}", serde_json::to_string(report)?);
            }
            if ctx.buffered() > 0 {
                warn!("{} trailing byte(s) did not form a complete frame", ctx.buffered());
            }
            info!(
                "Decoded {} report(s); {} byte(s) discarded, {} decode failure(s)",
                summary.reports, summary.discarded_bytes, summary.decode_failures
            );
            ctx.close();
        }
    }

    Ok(())
}

/// Load the config file, falling back to defaults only when it does not exist.
/// Logging is initialized from the result.
async fn load_or_default(path: &str, verbosity: u8) -> Result<Config> {
    if !Path::new(path).exists() {
        init_logging(&None, verbosity);
        info!("No config file at {}; using defaults", path);
        return Ok(Config::default());
    }
    let config = Config::load(path).await?;
    init_logging(&Some(config.clone()), verbosity);
    Ok(config)
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity raises the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| c.logging.level_filter())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Tee to the console only when attached to a terminal
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}

//! portseek - find a free TCP port from the shell
//!
//! Prints the resolved port on stdout so launch scripts can capture it.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

use portseek::config::load_options;
use portseek::{GetPortOptions, HostSpec, PortRange, PortResolver, WaitOptions};

#[derive(Parser)]
#[command(name = "portseek")]
#[command(version)]
#[command(about = "Find an available TCP port", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a free port (requested port, ranges, then random)
    Get {
        /// Preferred port (0 = random)
        #[arg(long, short)]
        port: Option<u16>,
        /// Extra candidate ports (e.g., 4001,4002)
        #[arg(long, value_delimiter = ',')]
        ports: Vec<u16>,
        /// Primary range (e.g., 4000-4100)
        #[arg(long)]
        range: Option<PortRange>,
        /// Fallback range (default 3000-3100 when nothing is pinned)
        #[arg(long, conflicts_with = "no_alt_range")]
        alt_range: Option<PortRange>,
        /// Disable the fallback range
        #[arg(long)]
        no_alt_range: bool,
        /// Prefer a random port
        #[arg(long, conflicts_with = "no_random")]
        random: bool,
        /// Never fall back to a random port
        #[arg(long)]
        no_random: bool,
        /// Host to bind (default: all local interfaces)
        #[arg(long)]
        host: Option<String>,
        /// Fall back to 0.0.0.0 instead of 127.0.0.1 for bad hostnames
        #[arg(long)]
        public: bool,
        /// Name shown in log lines
        #[arg(long)]
        name: Option<String>,
        /// Options file (.yaml, .yml or .json); flags override it
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask the OS for a random free port
    Random {
        #[arg(long)]
        host: Option<String>,
    },
    /// Check whether a port is free (exit code 1 when taken)
    Check {
        port: u16,
        /// Host to check; repeat to require every host
        #[arg(long)]
        host: Vec<String>,
    },
    /// Wait until something listens on a port
    Wait {
        port: u16,
        /// Delay between attempts in milliseconds
        #[arg(long, default_value_t = 500)]
        delay: u64,
        /// Number of attempts
        #[arg(long, default_value_t = 4)]
        retries: u32,
        /// Host to watch; repeat to watch several
        #[arg(long)]
        host: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let resolver = PortResolver::new();

    match cli.command {
        Commands::Get {
            port,
            ports,
            range,
            alt_range,
            no_alt_range,
            random,
            no_random,
            host,
            public,
            name,
            config,
            json,
        } => {
            let mut options = match config {
                Some(path) => load_options(&path)
                    .with_context(|| format!("Failed to load options from {}", path.display()))?,
                None => GetPortOptions::new(),
            };

            if let Some(port) = port {
                options.port = Some(port);
            }
            if !ports.is_empty() {
                options.ports = ports;
            }
            if range.is_some() {
                options.port_range = range;
            }
            if alt_range.is_some() {
                options.alternative_port_range = alt_range;
            }
            if no_alt_range {
                options.alternative_port_range = Some(PortRange::empty());
            }
            if random {
                options.random = Some(true);
            }
            if no_random {
                options.random = Some(false);
            }
            if host.is_some() {
                options.host = host;
            }
            if name.is_some() {
                options.name = name;
            }
            options.public |= public;
            options.verbose |= cli.verbose;

            let host = options.host.clone();
            let resolved = resolver.get_port(options).await?;

            if json {
                let output = serde_json::json!({ "port": resolved, "host": host });
                println!("{}", serde_json::to_string(&output)?);
            } else {
                println!("{}", resolved);
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Random { host } => {
            let port = resolver.get_random_port(&HostSpec::from_option(host)).await?;
            println!("{}", port);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Check { port, host } => {
            let hosts = HostSpec::from(host);

            match resolver.check_port(port, &hosts, cli.verbose).await {
                Some(bound) => {
                    println!("{} {} is free {}", "✓".green(), bound, hosts.label());
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    println!("{} {} is not available {}", "✗".red(), port, hosts.label());
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Commands::Wait {
            port,
            delay,
            retries,
            host,
        } => {
            let options = WaitOptions::default()
                .delay_ms(delay)
                .retries(retries)
                .hosts(HostSpec::from(host));

            resolver.wait_for_port(port, &options).await?;
            println!("{} port {} is up", "✓".green(), port);
            Ok(ExitCode::SUCCESS)
        }
    }
}

//! CLI for pathtrie: serve a route table or print its trie.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pathtrie_rs::{demo_routes, RegistrationPolicy, RouteFile, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pathtrie")]
#[command(about = "Segment-trie HTTP router")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the routes of a route file (or the demo routes) until ctrl-c.
    Serve {
        /// Bind host (default: env HOST, then 127.0.0.1)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (default: env PORT, then 8000)
        #[arg(long)]
        port: Option<u16>,
        /// Reject malformed or conflicting routes instead of warning
        #[arg(long)]
        strict: bool,
        /// TOML route file
        #[arg(long)]
        routes: Option<PathBuf>,
    },
    /// Print the trie built from a route file (or the demo routes).
    Tree {
        #[arg(long)]
        strict: bool,
        #[arg(long)]
        routes: Option<PathBuf>,
    },
}

fn route_file(path: Option<&PathBuf>) -> Result<RouteFile, pathtrie_rs::Error> {
    match path {
        Some(path) => RouteFile::load(path),
        None => Ok(demo_routes()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pathtrie=info,pathtrie_core=info,pathtrie_rs=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = ServerConfig::default().apply_env(|key| std::env::var(key).ok())?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            strict,
            routes,
        } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if strict {
                config.policy = RegistrationPolicy::Strict;
            }
            tracing::info!(
                address = %config.addr(),
                policy = ?config.policy,
                routes = ?routes,
                "configuration loaded"
            );
            let app = route_file(routes.as_ref())?.into_app(config.policy)?;
            app.run(&config)
        }
        Commands::Tree { strict, routes } => {
            if strict {
                config.policy = RegistrationPolicy::Strict;
            }
            let app = route_file(routes.as_ref())?.into_app(config.policy)?;
            print!("{}", app.router.render());
            Ok(())
        }
    }
}

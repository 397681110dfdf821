//! Command line interface.
//!
//! ```text
//! valkyrja [--config FILE] serve [--bind ADDR]
//! valkyrja [--config FILE] routes:list [--json]
//! valkyrja [--config FILE] routes:cache [--path FILE]
//! valkyrja [--config FILE] routes:clear [--path FILE]
//! ```
//!
//! Every command exits 0 on success and 1 on failure.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::app::{ApplicationBuilder, BootError};
use crate::config::{load_config, AppConfig};
use crate::http::HttpServer;
use crate::lifecycle::{spawn_signal_listener, Shutdown};
use crate::observability::{logging, metrics};
use crate::routing::{CacheError, CacheWatcher, Collection, RouteCache, RoutingError, Target};

#[derive(Parser, Debug)]
#[command(name = "valkyrja")]
#[command(about = "Valkyrja HTTP application", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve HTTP requests
    Serve {
        /// Override server.bind_address
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// List the route table
    #[command(name = "routes:list")]
    RoutesList {
        /// Print route definitions as JSON
        #[arg(long)]
        json: bool,
    },
    /// Collect routes and write the route cache
    #[command(name = "routes:cache")]
    RoutesCache {
        /// Override routing.cache_path
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Remove the route cache
    #[command(name = "routes:clear")]
    RoutesClear {
        /// Override routing.cache_path
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

/// Errors a command can end with.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Boot(#[from] BootError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

/// Run a parsed command line. `configure` turns the loaded config into an
/// application builder (providers, middleware, fallback).
pub async fn run<F>(cli: Cli, configure: F) -> ExitCode
where
    F: FnOnce(AppConfig) -> ApplicationBuilder,
{
    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => AppConfig::default(),
    };
    logging::init(&config.observability);

    let builder = configure(config);
    let result = match cli.command {
        Command::Serve { bind } => serve(builder, bind).await,
        Command::RoutesList { json } => builder
            .load_routes()
            .map_err(CommandError::from)
            .and_then(|collection| list_routes(&collection, json))
            .map(|out| print!("{out}")),
        Command::RoutesCache { path } => {
            let path = path.unwrap_or_else(|| PathBuf::from(&builder.config().routing.cache_path));
            cache_routes(&builder, &path).map(|msg| println!("{msg}"))
        }
        Command::RoutesClear { path } => {
            let path = path.unwrap_or_else(|| PathBuf::from(&builder.config().routing.cache_path));
            clear_cache(&path).map(|msg| println!("{msg}"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(builder: ApplicationBuilder, bind: Option<String>) -> Result<(), CommandError> {
    let config = builder.config().clone();

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let app = Arc::new(builder.build()?);

    let bind = bind.unwrap_or(config.server.bind_address);
    let listener = TcpListener::bind(&bind).await.map_err(|source| CommandError::Io {
        context: format!("failed to bind {bind}"),
        source,
    })?;

    let shutdown = Shutdown::new();
    let _signals = spawn_signal_listener(&shutdown);

    // Keep the watcher handle alive for the server's lifetime.
    let (route_updates, _watcher) = if config.routing.watch_cache {
        let (watcher, updates) = CacheWatcher::new(Path::new(&config.routing.cache_path));
        match watcher.run() {
            Ok(handle) => (updates, Some(handle)),
            Err(e) => {
                tracing::warn!(error = %e, "Route cache watcher unavailable");
                (updates, None)
            }
        }
    } else {
        let (_, updates) = mpsc::unbounded_channel();
        (updates, None)
    };

    HttpServer::new(app)
        .run(listener, route_updates, shutdown.subscribe())
        .await
        .map_err(|source| CommandError::Io {
            context: "server error".to_string(),
            source,
        })?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Render the route table, in registration order.
pub fn list_routes(collection: &Collection, json: bool) -> Result<String, CommandError> {
    if json {
        let mut out = serde_json::to_string_pretty(&collection.definitions()).map_err(CacheError::from)?;
        out.push('\n');
        return Ok(out);
    }

    let header = ["METHOD", "PATH", "NAME", "TARGET", "MIDDLEWARE"];
    let rows: Vec<[String; 5]> = collection
        .all()
        .iter()
        .map(|route| {
            let methods: Vec<&str> = route.methods().iter().map(|m| m.as_str()).collect();
            let target = match route.target() {
                Target::Dispatch(dispatch) => dispatch.to_string(),
                Target::Redirect(redirect) => format!("redirect {} {}", redirect.status, redirect.to),
            };
            [
                methods.join("|"),
                route.path().to_string(),
                route.name().unwrap_or("").to_string(),
                target,
                route.middleware().join(", "),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let mut line = |cells: [&str; 5]| {
        let mut text = String::new();
        for (cell, width) in cells.iter().zip(widths) {
            let _ = write!(text, "{cell:<width$}  ");
        }
        out.push_str(text.trim_end());
        out.push('\n');
    };
    line(header);
    for row in &rows {
        line([&row[0], &row[1], &row[2], &row[3], &row[4]]);
    }
    let _ = writeln!(out, "\n{} route(s)", rows.len());
    Ok(out)
}

/// Collect routes from the providers (never from an existing cache) and write them to `path`.
pub fn cache_routes(builder: &ApplicationBuilder, path: &Path) -> Result<String, CommandError> {
    let collection = builder.collect()?;
    RouteCache::from_collection(&collection).write(path)?;
    tracing::info!(path = %path.display(), routes = collection.len(), "Route cache written");
    Ok(format!("Cached {} route(s) to {}", collection.len(), path.display()))
}

/// Remove the cache file. A missing file is not an error.
pub fn clear_cache(path: &Path) -> Result<String, CommandError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(format!("Removed route cache {}", path.display())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Ok(format!("No route cache at {}", path.display()))
        }
        Err(source) => Err(CommandError::Io {
            context: format!("failed to remove {}", path.display()),
            source,
        }),
    }
}

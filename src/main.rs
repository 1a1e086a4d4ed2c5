//! propmap: load, resolve and inspect agent property files.
//!
//! # Architecture Overview
//!
//! ```text
//!   workers.properties
//!          │
//!          ▼
//!   ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//!   │    loader    │───▶│ property map │◀───│   resolver   │
//!   │ lines, $(x)  │    │ arena-backed │    │ .reference   │
//!   └──────────────┘    └──────┬───────┘    └──────────────┘
//!                              │
//!                              ▼
//!                     dump / get / watch
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use propmap::config::loader::load_config;
use propmap::config::watcher::PropertiesWatcher;
use propmap::loader::load_properties;
use propmap::observability::logging;
use propmap::{PropertyMap, PropmapConfig, SharedProperties, Treatment};

#[derive(Parser)]
#[command(name = "propmap")]
#[command(about = "Load, resolve and inspect agent property files", long_about = None)]
struct Cli {
    /// TOML settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Store values as written, without $(name) expansion.
    #[arg(long)]
    raw: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every resolved property as JSON
    Dump { file: PathBuf },
    /// Print one property
    Get {
        file: PathBuf,
        key: String,
        #[arg(long = "as", value_enum, default_value_t = Kind::String)]
        kind: Kind,
        #[arg(long)]
        default: Option<String>,
    },
    /// Reload the file whenever it changes
    Watch { file: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    String,
    Int,
    Double,
    Bool,
    List,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => PropmapConfig::default(),
    };
    if cli.raw {
        config.map.treatment = Treatment::Raw;
    }

    logging::init(&config.observability.log_level);

    match cli.command {
        Commands::Dump { file } => {
            let (map, report) = load_properties(&file, &config)?;
            map.dump();
            let out = json!({
                "entries": map.to_pairs(),
                "lines": {
                    "accepted": report.accepted,
                    "blank": report.blank,
                    "malformed": report.malformed,
                    "too_long": report.too_long,
                },
                "arena": map.arena_stats(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Get { file, key, kind, default } => {
            let (map, _) = load_properties(&file, &config)?;
            print_value(&map, &key, kind, default.as_deref());
        }
        Commands::Watch { file } => watch(&file, config).await?,
    }

    Ok(())
}

fn print_value(map: &PropertyMap, key: &str, kind: Kind, default: Option<&str>) {
    match kind {
        Kind::String => match map.get_str(key).or(default) {
            Some(v) => println!("{}", v),
            None => eprintln!("Property '{}' not set", key),
        },
        Kind::Int => {
            let def = default.map_or(0, propmap::map::accessors::parse_size);
            println!("{}", map.get_int(key, def));
        }
        Kind::Double => {
            let def = default.map_or(0.0, propmap::map::accessors::atof);
            println!("{}", map.get_double(key, def));
        }
        Kind::Bool => {
            let def = default.map_or(false, |d| propmap::map::accessors::bool_code(d, false));
            println!("{}", map.get_bool(key, def));
        }
        Kind::List => {
            let items = map.get_list(key, default).unwrap_or_default();
            println!("{}", json!(items));
        }
    }
}

async fn watch(file: &Path, config: PropmapConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (map, report) = load_properties(file, &config)?;
    let shared = Arc::new(SharedProperties::new(map));

    let (watcher, mut updates) = PropertiesWatcher::new(file, config);
    let _watcher = watcher.since(report.modified).run()?;

    loop {
        tokio::select! {
            Some(map) = updates.recv() => {
                shared.store(map);
                let current = shared.load();
                tracing::info!(entries = current.len(), "Properties reloaded");
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown complete");
                return Ok(());
            }
        }
    }
}

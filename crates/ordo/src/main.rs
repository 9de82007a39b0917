mod cli; // Declare the cli module

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use ordo_core::config::{ConfigFormat, LoaderConfig};
use ordo_core::kernel::constants::{APP_NAME, APP_VERSION, DEFAULT_CONFIG_FILE};
use ordo_core::kernel::error::{Error, Result};
use ordo_core::plugin_system::loader::{CandidateSource, PluginLoader};
use ordo_core::plugin_system::{Environment, Plugin, PluginContext, PluginManager};

// --- Core plugins shipped with the binary ---
use core_audit::AuditPlugin;

use cli::{CliArgs, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Handle simple ping command
    if args.ping {
        println!("pong");
        return ExitCode::SUCCESS;
    }

    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Route `log` records through a `tracing` fmt subscriber writing to stderr.
/// `RUST_LOG` wins over `-v`.
fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to bridge log records to tracing: {}", e);
    }
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install tracing subscriber: {}", e);
    }
}

async fn run(args: CliArgs) -> Result<()> {
    info!("{} v{} starting", APP_NAME, APP_VERSION);

    let config = load_config(&args).await?;
    let manager = load_plugins(&config).await?;

    match args.command {
        None | Some(Commands::Order { json: false }) => print_order(&manager),
        Some(Commands::Order { json: true }) => {
            let report = manager.load_report().cloned().unwrap_or_default();
            let text = serde_json::to_string_pretty(&report).map_err(|e| Error::Other(e.to_string()))?;
            println!("{}", text);
        }
        Some(Commands::Observers { name }) => {
            if !manager.has_plugin(&name) {
                warn!("Plugin '{}' is not registered", name);
            }
            for observer in manager.observers_of(&name) {
                println!("{}", observer.name());
            }
        }
        Some(Commands::Descriptor { file }) => {
            let output = transform_descriptor(&manager, &file).await?;
            println!("{}", output);
        }
    }
    Ok(())
}

/// Read the configuration file and apply command line overrides
async fn load_config(args: &CliArgs) -> Result<LoaderConfig> {
    let mut config = match &args.config {
        Some(path) => LoaderConfig::load(path).await?,
        None => LoaderConfig::load_or_default(Path::new(DEFAULT_CONFIG_FILE)).await?,
    };

    if !args.plugins_dir.is_empty() {
        config.plugin_dirs = args.plugins_dir.clone();
    }
    if let Some(env) = &args.env {
        config.environment = Environment::from(env.clone());
    }
    if args.no_core {
        config.load_core_plugins = false;
    }
    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Discover user plugins, load them after the core plugins and announce
/// every registered plugin to its observers
async fn load_plugins(config: &LoaderConfig) -> Result<PluginManager> {
    let core: Vec<Arc<dyn Plugin>> = if config.load_core_plugins {
        vec![Arc::new(AuditPlugin::new())]
    } else {
        Vec::new()
    };
    let user = PluginLoader::with_dirs(&config.plugin_dirs).candidates().await?;

    let mut manager = PluginManager::from_config(config);
    manager.load_plugins(core, user);
    manager.set_context(PluginContext::new(config.environment.clone()));

    for (name, e) in manager.configure_runtime()? {
        warn!("Runtime configuration of '{}' failed: {}", name, e);
    }
    for (observer, e) in manager.announce_loaded()? {
        warn!("Observer '{}' rejected a load notification: {}", observer, e);
    }
    Ok(manager)
}

fn print_order(manager: &PluginManager) {
    let report = manager.load_report().cloned().unwrap_or_default();

    for name in &report.registered {
        println!("{}", name);
    }
    for name in &report.failed {
        let unresolved = manager
            .failed_plugins()
            .get(name)
            .map(|failed| failed.unresolved.join(", "))
            .unwrap_or_default();
        println!("failed: {} (unresolved: {})", name, unresolved);
    }
    for (evictor, victim) in &report.evicted {
        println!("evicted: {} by {}", victim, evictor);
    }
    for name in &report.skipped {
        println!("skipped: {}", name);
    }
}

async fn transform_descriptor(manager: &PluginManager, file: &Path) -> Result<String> {
    let format = ConfigFormat::from_path(file)
        .ok_or_else(|| Error::config(file, "unsupported descriptor file extension"))?;
    let text = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| Error::io(e, "read_descriptor", file.to_path_buf()))?;
    Ok(manager.transform_descriptor(&text, format)?)
}

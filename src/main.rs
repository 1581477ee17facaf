mod cli;

use heicwatch::config::{self, Config, WatchSettings};
use heicwatch::reconcile::Reconciler;
use heicwatch::watch::Scheduler;
use heicwatch_common::system_ownership;
use heicwatch_convert::{converter_version, ConvertCommand};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "heicwatch=trace,heicwatch_common=debug,heicwatch_convert=debug".to_string()
        } else {
            "heicwatch=info,heicwatch_common=info,heicwatch_convert=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Watch { run_now } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(watch(cli.config.as_deref(), run_now))
        }
        Commands::Run { dry_run } => run_once(cli.config.as_deref(), dry_run),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate => validate(cli.config.as_deref()),
    }
}

fn build_reconciler(config: &Config, settings: WatchSettings) -> Result<Reconciler> {
    let converter = ConvertCommand::discover(config.tools.convert_path.as_deref())
        .context("Converter not available")?
        .with_prefix_args(config.tools.convert_args.iter());

    tracing::debug!("Using converter {:?}", converter.program());

    Ok(Reconciler::new(
        settings,
        Arc::new(converter),
        system_ownership(),
    ))
}

async fn watch(config_path: Option<&Path>, run_now: bool) -> Result<()> {
    let (config, settings) = config::load_settings(config_path)?;
    let interval = settings.interval;
    let reconciler = build_reconciler(&config, settings)?;

    tracing::info!("Starting heicwatch");

    let scheduler = Scheduler::new(Arc::new(reconciler), interval);
    let result = scheduler.run(run_now, shutdown_signal()).await;

    tracing::info!("Shutting down...");
    result
}

fn run_once(config_path: Option<&Path>, dry_run: bool) -> Result<()> {
    let (config, settings) = config::load_settings(config_path)?;
    let reconciler = build_reconciler(&config, settings)?.with_dry_run(dry_run);

    if dry_run {
        println!("[DRY RUN] Nothing will be converted or deleted");
    }

    let summary = reconciler.run_cycle()?;
    println!("{}", summary);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    config::apply_env(&mut config, |key| std::env::var(key).ok())?;

    println!("Checking external tools...\n");

    let found = match ConvertCommand::discover(config.tools.convert_path.as_deref()) {
        Ok(converter) => {
            let program = converter.program();
            match converter_version(program) {
                Some(version) => println!("✓ converter ({}) - {}", version, program.display()),
                None => println!("? converter (version unknown) - {}", program.display()),
            }
            true
        }
        Err(e) => {
            println!("✗ converter ({})", e);
            false
        }
    };

    println!();
    if found {
        println!("All required tools are available!");
    } else {
        println!("The converter is missing. Install ImageMagick or set CONVERT_BIN.");
    }

    Ok(())
}

fn validate(config_path: Option<&Path>) -> Result<()> {
    match config_path {
        Some(p) => println!("Validating config: {:?}", p),
        None => println!("Validating environment and default config locations"),
    }

    let (config, settings) = config::load_settings(config_path)?;

    println!("✓ Configuration is valid");
    println!("  Watch: {}", settings.watch_root.display());
    println!("  Interval: {:?}", settings.interval);
    println!("  Keep original: {}", settings.keep_original);
    println!("  Keep live photo: {}", settings.keep_live_photo);
    match &settings.target_root {
        Some(target) => println!("  Target: {}", target.display()),
        None => println!("  Target: (convert in place)"),
    }
    println!(
        "  Owner: {}",
        settings.owner.as_deref().unwrap_or("(unchanged)")
    );
    match &config.tools.convert_path {
        Some(path) => println!("  Converter: {}", path.display()),
        None => println!("  Converter: {} on PATH", heicwatch_convert::DEFAULT_CONVERTER),
    }
    if !config.tools.convert_args.is_empty() {
        println!("  Converter args: {}", config.tools.convert_args.join(" "));
    }

    Ok(())
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mailsentry::health::{resolve_store_root, HealthCheck};
use mailsentry::{Config, NotmuchClient, SyncEngine, SyncError, SyncSummary};

#[derive(Parser)]
#[command(name = "mailsentry")]
#[command(about = "Tag-driven maildir synchronization for notmuch")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Move tagged mails into their configured folders, then refresh the index
    Sync {
        /// Log intended moves without touching files or index
        #[arg(long)]
        dry_run: bool,

        /// Override the configured message age window, in days (0 = no window)
        #[arg(long)]
        max_age: Option<u64>,

        /// Sync only this folder
        #[arg(long)]
        folder: Option<String>,
    },

    /// List configured folders and their rules
    Rules,

    /// System health check and diagnostics
    Doctor,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = load_config(cli.config.clone())?;

    init_logging(cli.verbose, &config);
    info!("Starting MailSentry v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Sync {
            dry_run,
            max_age,
            folder,
        } => cmd_sync(dry_run, max_age, folder, &config),
        Commands::Rules => cmd_rules(&config),
        Commands::Doctor => cmd_doctor(&config),
    }
}

/// Initialize logging based on verbosity level and configuration
fn init_logging(verbose: bool, config: &Config) {
    let default_level = if verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<std::path::PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(&path),
        None => Config::load_or_default(),
    }
}

/// Sync mail files according to configuration
fn cmd_sync(
    dry_run: bool,
    max_age: Option<u64>,
    folder_filter: Option<String>,
    config: &Config,
) -> Result<()> {
    let client = NotmuchClient::new();

    let store_root = resolve_store_root(config, &client)
        .context("Could not determine the maildir root; set `maildir` in the config")?;
    let max_age = max_age.unwrap_or(config.sync.max_age);

    let folders: Vec<_> = match &folder_filter {
        Some(name) => vec![config
            .folder(name)
            .with_context(|| format!("Folder '{}' is not configured", name))?],
        None => config.folders.iter().collect(),
    };

    if folders.is_empty() {
        println!("Nothing to sync - no folders configured");
        println!("   Add a `folders` section to the config, or run 'mailsentry doctor'");
        return Ok(());
    }

    if dry_run {
        println!("🔍 Dry run mode - no files will be moved");
    }
    println!("🔄 Syncing {} maildir folder(s) in {}", folders.len(), store_root.display());

    let engine = SyncEngine::new(client, store_root, max_age, dry_run);

    let mut summaries: Vec<SyncSummary> = Vec::new();
    for folder in folders {
        match engine.sync(&folder.name, &folder.rules) {
            Ok(summary) => {
                println!(
                    "   📁 {}: {} rules, {} matched, {} moved ({:.2}s)",
                    summary.folder,
                    summary.rules_processed,
                    summary.messages_matched,
                    summary.files_moved,
                    summary.duration.as_secs_f64()
                );
                summaries.push(summary);
            }
            Err(SyncError::RefreshFailed { .. }) => {
                // Already logged with folder context by the engine; a stale
                // index is not safe to keep syncing against.
                std::process::exit(2);
            }
            Err(err) => return Err(err.into()),
        }
    }

    let moved: usize = summaries.iter().map(|s| s.files_moved).sum();
    let matched: usize = summaries.iter().map(|s| s.messages_matched).sum();
    let would_move: usize = summaries.iter().map(|s| s.rules_matched).sum();

    println!("\n🎉 Synchronization Complete!");
    println!("   📊 Messages matched: {}", matched);
    if dry_run {
        println!("   🔍 Files that would move on a real run: {}", would_move);
    } else {
        println!("   ✅ Files moved: {}", moved);
    }

    Ok(())
}

/// List configured folders and rules
fn cmd_rules(config: &Config) -> Result<()> {
    if config.folders.is_empty() {
        println!("No folders configured");
        return Ok(());
    }

    for folder in &config.folders {
        println!("📁 {}", folder.name);
        for rule in &folder.rules {
            println!("   {} -> {}", rule.tag, rule.destination);
        }
    }

    Ok(())
}

/// System health check and diagnostics
fn cmd_doctor(config: &Config) -> Result<()> {
    let client = NotmuchClient::new();
    let health = HealthCheck::run(config, &client);
    print_health_report(&health);

    if !health.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}

/// Print health check report to stdout
fn print_health_report(health: &HealthCheck) {
    use mailsentry::health::CheckResult;

    fn print_check(name: &str, result: &CheckResult) {
        println!("{}:", name);
        let icon = if result.passed {
            if result.is_warning { "⚠️ " } else { "✅" }
        } else {
            "❌"
        };
        println!("  {} {}", icon, result.message);
        if let Some(details) = &result.details {
            for line in details.lines() {
                println!("     {}", line);
            }
        }
    }

    println!("🔍 MailSentry System Diagnostics");
    println!();

    for (name, result) in health.all_checks() {
        print_check(name, result);
        println!();
    }

    if health.all_passed() {
        println!("✅ All checks passed");
    } else {
        println!("❌ Some checks failed");
    }
}

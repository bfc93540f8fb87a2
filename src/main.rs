//! TransDict - Translation dictionaries for structured game text
//!
//! Command line entry point: export, translate, import and inspect
//! dictionaries.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use transdict::cli::{Args, Commands};
use transdict::config::{Config, ProviderKind};
use transdict::dictionary::ProgressLabel;
use transdict::observer::ConsoleObserver;
use transdict::translate::TranslatorFactory;
use transdict::workflow::{probe_translator, Workflow};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::InitConfig { output } => {
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
        Commands::Export { source, dict } => {
            let workflow = Workflow::new(config);
            let dict = dict.unwrap_or_else(|| workflow.dictionary_path_for(&source));
            info!("Exporting {} to {}", source.display(), dict.display());

            let summary = workflow.export_dictionary(&source, &dict).await?;
            println!(
                "Exported {} entries ({} new) to {}",
                summary.entries,
                summary.added,
                dict.display()
            );
        }
        Commands::Translate { dict, from, to, provider, chunk_size } => {
            apply_overrides(&mut config, provider.as_deref(), from, to)?;
            if let Some(chunk_size) = chunk_size {
                config.translate.chunk_size = chunk_size;
                config.translate.batch_chunk_size = chunk_size;
            }

            let translator = TranslatorFactory::create_translator(&config.translate)?;
            let workflow = Workflow::new(config);
            let observer = ConsoleObserver::new();
            info!(
                "Translating {} with {} ({} -> {})",
                dict.display(),
                translator.name(),
                workflow.config().translate.source_language,
                workflow.config().translate.target_language
            );

            match workflow.translate_dictionary(&dict, translator, &observer).await {
                Ok(summary) => {
                    observer.finish("done");
                    println!(
                        "Translated {} entries, {} still pending ({})",
                        summary.translated,
                        summary.pending_after,
                        ProgressLabel(summary.progress)
                    );
                }
                Err(e) => {
                    observer.finish("aborted");
                    error!("Translation aborted: {}", e);
                    println!("Progress so far is saved in {}; run translate again to resume", dict.display());
                    return Err(e.into());
                }
            }
        }
        Commands::Import { source, dict, output, force } => {
            let workflow = Workflow::new(config);
            let dict: PathBuf = dict.unwrap_or_else(|| workflow.dictionary_path_for(&source));

            let summary = workflow.import_dictionary(&source, &dict, output, force).await?;
            if let Some(backup) = &summary.backup {
                println!("Backup: {}", backup.display());
            }
            println!(
                "Imported {} strings into {} ({})",
                summary.applied,
                summary.output.display(),
                ProgressLabel(summary.progress)
            );
        }
        Commands::Status { path } => {
            let workflow = Workflow::new(config);
            let statuses = workflow.status(&path)?;

            if statuses.is_empty() {
                println!("No dictionaries found in {}", path.display());
            } else {
                println!("{:<50} {:<10} {:<15}", "Dictionary", "Entries", "Progress");
                println!("{}", "-".repeat(75));
                for status in statuses {
                    println!(
                        "{:<50} {:<10} {:<15}",
                        status.path.display(),
                        status.entries,
                        ProgressLabel(status.progress).to_string()
                    );
                }
            }
        }
        Commands::Languages { provider } => {
            apply_overrides(&mut config, provider.as_deref(), None, None)?;
            let translator = TranslatorFactory::create_translator(&config.translate)?;
            let languages = translator.supported_languages().await?;

            println!("\n{} languages:", translator.name());
            println!("{:<10} {:<30}", "Code", "Name");
            println!("{}", "-".repeat(40));
            for (code, name) in languages {
                println!("{:<10} {:<30}", code, name);
            }
        }
        Commands::TestProvider { provider, to } => {
            apply_overrides(&mut config, provider.as_deref(), None, to)?;
            let translator = TranslatorFactory::create_translator(&config.translate)?;
            let probe = probe_translator(translator.as_ref(), &config.translate.target_language).await?;

            if probe.changed {
                println!("{} works: \"{}\"", translator.name(), probe.translation);
            } else {
                println!(
                    "{} answered but did not translate (got \"{}\")",
                    translator.name(),
                    probe.translation
                );
            }
        }
    }

    Ok(())
}

/// Apply command line overrides on top of the loaded configuration
fn apply_overrides(
    config: &mut Config,
    provider: Option<&str>,
    from: Option<String>,
    to: Option<String>,
) -> Result<()> {
    if let Some(provider) = provider {
        config.translate.provider = ProviderKind::parse(provider)?;
    }
    if let Some(from) = from {
        config.translate.source_language = from;
    }
    if let Some(to) = to {
        config.translate.target_language = to;
    }
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".transdict").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "transdict.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("transdict.log").display()
    );

    Ok(())
}

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use mailsense::channels::load_inputs;
use mailsense::config::AppConfig;
use mailsense::pipeline::Pipeline;
use mailsense::tools::ToolExecutor;

/// Batch read when no input paths are given, relative to the data directory.
const DEFAULT_BATCH_FILE: &str = "examples_emails.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    let _log_guard = init_tracing(config.log_dir.as_deref());

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--tools") {
        println!(
            "{}",
            serde_json::to_string_pretty(&ToolExecutor::definitions())?
        );
        return Ok(());
    }

    let mut paths: Vec<PathBuf> = args.into_iter().map(PathBuf::from).collect();
    if paths.is_empty() {
        let default = config.data_dir.join(DEFAULT_BATCH_FILE);
        if !default.exists() {
            eprintln!("No input given and no batch found at {}", default.display());
            eprintln!("  usage: mailsense [--tools] <emails.json | message.eml>...");
            println!("[]");
            return Ok(());
        }
        paths.push(default);
    }

    eprintln!("📬 MailSense v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Data dir: {}", config.data_dir.display());
    eprintln!("   Mode: {:?}", config.mode);

    let emails = load_inputs(&paths).await?;
    let pipeline = Pipeline::from_config(&config)
        .await
        .context("failed to open data directory")?;
    let reports = pipeline.run_batch(&emails).await?;

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

/// Log to stderr, and to a daily file under `log_dir` when set.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "mailsense.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .init();

    guard
}

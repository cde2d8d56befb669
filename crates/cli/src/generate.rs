//! Local one-shot pipeline run with colored progress output.

use crate::cli::GenerateArgs;
use color_eyre::eyre::WrapErr;
use colored::Colorize;
use rf_core::capabilities::manager::missing_tools;
use rf_core::capabilities::CapabilitySet;
use rf_core::config::load_config;
use rf_core::engine::PipelineEngine;
use rf_core::progress::{progress_channel, ProgressReceiver};
use rf_core::storage::{ArtifactStore, StorageArea};
use rf_protocol::{EventKind, PipelineRequest, UploadedVideo};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub async fn run(args: GenerateArgs) -> color_eyre::Result<()> {
    let upload = match &args.video_file {
        Some(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
            Some(UploadedVideo::new(name, bytes))
        }
        None => None,
    };
    let request = PipelineRequest::new(args.script, args.voice, args.query, upload)?;

    let config = load_config(args.config.as_deref())?;
    for tool in missing_tools(&config) {
        eprintln!("{} '{}' not found on PATH", "warning:".yellow().bold(), tool);
    }

    let capabilities = CapabilitySet::from_config(&config)?;
    let artifacts = ArtifactStore::open(&config.storage.output_dir)?;
    let storage = StorageArea::new(config.storage.work_root.clone(), artifacts.clone());
    let engine = PipelineEngine::new(capabilities, storage);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted; cancelling pipeline");
            on_interrupt.cancel();
        }
    });

    let (tx, rx) = progress_channel(config.pipeline.event_buffer);
    let (result, ()) = tokio::join!(engine.run(request, tx, cancel), print_progress(rx));

    let video_id = result?;
    let path = artifacts.get(video_id.as_str()).await?;
    println!("{} {}", "Video:".green().bold(), path.display());
    Ok(())
}

async fn print_progress(mut rx: ProgressReceiver) {
    while let Some(event) = rx.recv().await {
        let pct = format!("[{:>3}%]", event.progress);
        match &event.kind {
            EventKind::InProgress => println!("{} {}", pct.cyan(), event.status),
            EventKind::Complete { .. } => println!("{} {}", pct.green(), event.status.green()),
            EventKind::Error { message } => {
                eprintln!("{} {}", pct.red(), message.red());
            }
        }
    }
}

use pdf_arrange::PageRenderingService;
use pdf_async_runtime::{PdfCommand, PdfUpdate};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::handlers;

/// Async worker task that processes PDF commands and sends updates.
///
/// Loads and assemblies run as their own tasks so both slots can work at
/// once and a cancel request is never stuck behind a long job.
pub async fn worker_task(
    mut command_rx: mpsc::UnboundedReceiver<PdfCommand>,
    update_tx: mpsc::UnboundedSender<PdfUpdate>,
    renderer: Arc<dyn PageRenderingService>,
) {
    while let Some(cmd) = command_rx.recv().await {
        process_command(cmd, &renderer, &update_tx).await;
    }
    log::debug!("Command channel closed, worker exiting");
}

async fn process_command(
    cmd: PdfCommand,
    renderer: &Arc<dyn PageRenderingService>,
    update_tx: &mpsc::UnboundedSender<PdfUpdate>,
) {
    match cmd {
        PdfCommand::LoadSlot {
            slot,
            path,
            scale,
            cancel,
        } => {
            let renderer = Arc::clone(renderer);
            let update_tx = update_tx.clone();
            tokio::spawn(async move {
                handlers::load::handle_load(slot, path, scale, renderer, cancel, &update_tx).await;
            });
        }
        PdfCommand::AssembleSlot {
            job,
            options,
            cancel,
        } => {
            let update_tx = update_tx.clone();
            tokio::spawn(async move {
                handlers::assemble::handle_assemble(job, options, cancel, &update_tx).await;
            });
        }
        PdfCommand::SaveOutput { path, document } => {
            handlers::assemble::handle_save(path, document, update_tx).await;
        }
        PdfCommand::LoadConfig { path } => {
            handlers::assemble::handle_load_config(path, update_tx).await;
        }
    }
}

use pdf_arrange::{
    AssembledDocument, AssemblyJob, AssemblyOptions, AssemblyPipeline, CancellationToken,
    EditorOptions, LopdfBackend, Progress, write_output,
};
use pdf_async_runtime::PdfUpdate;
use std::path::PathBuf;
use tokio::sync::mpsc;

pub async fn handle_assemble(
    job: AssemblyJob,
    options: AssemblyOptions,
    cancel: CancellationToken,
    update_tx: &mpsc::UnboundedSender<PdfUpdate>,
) {
    let slot = job.slot();
    let pipeline = AssemblyPipeline::new(LopdfBackend, options);

    let mut reporter = |progress: Progress| {
        let _ = update_tx.send(PdfUpdate::AssemblyProgress { slot, progress });
    };

    let result = pipeline.run(job, &mut reporter, &cancel).await;
    let _ = update_tx.send(PdfUpdate::AssemblyFinished { slot, result });
}

pub async fn handle_save(
    path: PathBuf,
    document: AssembledDocument,
    update_tx: &mpsc::UnboundedSender<PdfUpdate>,
) {
    match write_output(&document.bytes, &path).await {
        Ok(()) => {
            log::info!(
                "Saved {} page(s) to {}",
                document.page_count,
                path.display()
            );
            let _ = update_tx.send(PdfUpdate::Saved { path, document });
        }
        Err(e) => {
            log::error!("Failed to save {}: {}", path.display(), e);
            let _ = update_tx.send(PdfUpdate::SaveFailed {
                slot: document.slot,
                error: e,
            });
        }
    }
}

pub async fn handle_load_config(path: PathBuf, update_tx: &mpsc::UnboundedSender<PdfUpdate>) {
    match EditorOptions::load(&path).await {
        Ok(options) => {
            let _ = update_tx.send(PdfUpdate::ConfigLoaded { options });
        }
        Err(e) => {
            let _ = update_tx.send(PdfUpdate::Error {
                message: format!("Failed to load configuration: {}", e),
            });
        }
    }
}

use pdf_arrange::{
    ArrangeError, CancellationToken, PageRenderingService, Progress, SlotId, read_source,
    render_thumbnails,
};
use pdf_async_runtime::PdfUpdate;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Read a file and render its thumbnails.
///
/// The slot only changes once every page is rendered; until then the UI
/// just sees progress.
pub async fn handle_load(
    slot: SlotId,
    path: PathBuf,
    scale: f32,
    renderer: Arc<dyn PageRenderingService>,
    cancel: CancellationToken,
    update_tx: &mpsc::UnboundedSender<PdfUpdate>,
) {
    log::info!("Loading {} into {} slot", path.display(), slot);

    let source = match read_source(&path).await {
        Ok(source) => source,
        Err(e) => {
            log::error!("Failed to read {}: {}", path.display(), e);
            let _ = update_tx.send(PdfUpdate::LoadFailed { slot, error: e });
            return;
        }
    };

    let bytes: Arc<[u8]> = source.bytes.into();
    let mut reporter = |progress: Progress| {
        let _ = update_tx.send(PdfUpdate::LoadProgress { slot, progress });
    };

    match render_thumbnails(renderer, Arc::clone(&bytes), scale, &mut reporter, &cancel).await {
        Ok(rendered) => {
            log::info!("Loaded {} ({} pages)", source.name, rendered.page_count);
            let _ = update_tx.send(PdfUpdate::SlotLoaded {
                slot,
                name: source.name,
                bytes,
                thumbnails: rendered.thumbnails,
            });
        }
        Err(ArrangeError::Cancelled) => {
            let _ = update_tx.send(PdfUpdate::LoadCancelled { slot });
        }
        Err(e) => {
            log::error!("Failed to load {}: {}", path.display(), e);
            let _ = update_tx.send(PdfUpdate::LoadFailed { slot, error: e });
        }
    }
}

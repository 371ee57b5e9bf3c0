use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

// Re-export types from the core crate
pub use pdf_arrange::{
    ArrangeError, AssembledDocument, AssemblyJob, AssemblyOptions, CancellationToken,
    EditorOptions, Progress, RasterImage, SlotId,
};

/// Commands sent from UI to worker
#[derive(Debug)]
pub enum PdfCommand {
    /// Read a file and render its thumbnails for a slot
    LoadSlot {
        slot: SlotId,
        path: PathBuf,
        scale: f32,
        cancel: CancellationToken,
    },
    /// Build the output document for a slot
    AssembleSlot {
        job: AssemblyJob,
        options: AssemblyOptions,
        cancel: CancellationToken,
    },
    SaveOutput {
        path: PathBuf,
        document: AssembledDocument,
    },
    LoadConfig {
        path: PathBuf,
    },
}

/// Updates sent from worker to UI
#[derive(Debug)]
pub enum PdfUpdate {
    LoadProgress {
        slot: SlotId,
        progress: Progress,
    },
    /// Everything rendered; nothing reaches the UI before this
    SlotLoaded {
        slot: SlotId,
        name: String,
        bytes: Arc<[u8]>,
        thumbnails: Vec<RasterImage>,
    },
    LoadFailed {
        slot: SlotId,
        error: ArrangeError,
    },
    LoadCancelled {
        slot: SlotId,
    },
    AssemblyProgress {
        slot: SlotId,
        progress: Progress,
    },
    AssemblyFinished {
        slot: SlotId,
        result: pdf_arrange::Result<AssembledDocument>,
    },
    Saved {
        path: PathBuf,
        document: AssembledDocument,
    },
    SaveFailed {
        slot: SlotId,
        error: ArrangeError,
    },
    ConfigLoaded {
        options: EditorOptions,
    },
    Error {
        message: String,
    },
}

pub type CommandSender = mpsc::UnboundedSender<PdfCommand>;
pub type UpdateSender = mpsc::UnboundedSender<PdfUpdate>;

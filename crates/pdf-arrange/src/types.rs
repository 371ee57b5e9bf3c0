use crate::model::{EntryId, SlotId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArrangeError {
    #[error("{0} PDF is not loaded")]
    NotLoaded(SlotId),
    #[error("{0} PDF has no pages")]
    NoPages(SlotId),
    #[error("Invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),
    #[error("Assembly cancelled")]
    Cancelled,
    #[error("Assembly failed: {source}")]
    AssemblyFailure {
        /// 1-based output position of the page being copied, if any
        page: Option<usize>,
        #[source]
        source: Box<ArrangeError>,
    },
    #[error("Failed to load PDF: {0}")]
    LoadFailure(String),
    #[error("Failed to render page: {0}")]
    RenderFailure(String),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl ArrangeError {
    /// Whether this error is something the user caused and can act on,
    /// as opposed to an internal defect.
    pub fn is_user_facing(&self) -> bool {
        match self {
            ArrangeError::Invariant(violation) => matches!(violation, InvariantViolation::LastPage),
            ArrangeError::TaskJoin(_) => false,
            _ => true,
        }
    }
}

/// Model rules that an operation would break.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("cannot remove last page")]
    LastPage,
    #[error("entry {0:?} is not present")]
    EntryNotFound(EntryId),
    #[error("index {index} out of range for {len} pages")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("a copied page cannot be returned to the {slot} PDF")]
    CopyBack { slot: SlotId },
}

pub type Result<T> = std::result::Result<T, ArrangeError>;

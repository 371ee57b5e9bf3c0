//! Output document assembly
//!
//! An [`AssemblyJob`] is a snapshot of one slot's page order together with
//! the source bytes it needs. [`AssemblyPipeline::run`] copies the pages
//! into a new document one at a time, checking for cancellation before each
//! page and reporting progress after it. Nothing is produced unless every
//! page made it.

use crate::backend::{AssemblyBackend, LoadOptions};
use crate::cancel::{CancellationToken, Progress, ProgressReporter, report_quietly};
use crate::model::{DocumentId, PageCollection, SlotId};
use crate::options::AssemblyOptions;
use crate::types::*;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::Arc;

/// A page to place in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobPage {
    pub document: DocumentId,
    /// 1-based page number within `document`
    pub page_number: u32,
}

/// Everything needed to assemble one slot, detached from the live model
#[derive(Debug, Clone)]
pub struct AssemblyJob {
    slot: SlotId,
    pages: Vec<JobPage>,
    sources: HashMap<DocumentId, Arc<[u8]>>,
}

impl AssemblyJob {
    /// Snapshot a slot's current order.
    ///
    /// Fails with [`ArrangeError::NotLoaded`] before anything was loaded into
    /// the slot and with [`ArrangeError::NoPages`] when its sequence is empty.
    pub fn from_collection(pages: &PageCollection, slot: SlotId) -> Result<Self> {
        if !pages.is_loaded(slot) {
            return Err(ArrangeError::NotLoaded(slot));
        }

        let sequence = pages.sequence(slot);
        if sequence.is_empty() {
            return Err(ArrangeError::NoPages(slot));
        }

        let mut sources = HashMap::new();
        let mut job_pages = Vec::with_capacity(sequence.len());
        for entry in sequence {
            let document = entry.document();
            if !sources.contains_key(&document) {
                let source = pages
                    .source(document)
                    .ok_or_else(|| ArrangeError::LoadFailure(format!("{document:?} was released")))?;
                sources.insert(document, Arc::clone(source.bytes()));
            }
            job_pages.push(JobPage {
                document,
                page_number: entry.source_page(),
            });
        }

        Ok(Self {
            slot,
            pages: job_pages,
            sources,
        })
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn pages(&self) -> &[JobPage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of distinct source documents the job reads from
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

/// A finished output document
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub slot: SlotId,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

impl AssembledDocument {
    /// File name to offer when saving, stamped with the current time
    pub fn suggested_filename(&self, prefix: &str) -> String {
        suggested_filename(prefix, self.slot, Local::now())
    }
}

/// `{prefix}_{Slot}_{unix millis}.pdf`
pub fn suggested_filename(prefix: &str, slot: SlotId, at: DateTime<Local>) -> String {
    format!("{}_{}_{}.pdf", prefix, slot.label(), at.timestamp_millis())
}

/// Drives an [`AssemblyBackend`] over a job
#[derive(Debug, Clone)]
pub struct AssemblyPipeline<B: AssemblyBackend> {
    backend: B,
    options: AssemblyOptions,
}

impl<B: AssemblyBackend> AssemblyPipeline<B> {
    pub fn new(backend: B, options: AssemblyOptions) -> Self {
        Self { backend, options }
    }

    pub fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    /// Assemble the job's pages in order.
    ///
    /// The token is cleared when the run starts and checked before every
    /// page; once set, the run stops with [`ArrangeError::Cancelled`] and the
    /// partial output is discarded. Progress `(i, total)` is reported after
    /// page `i` has been appended. Backend failures are wrapped in
    /// [`ArrangeError::AssemblyFailure`].
    pub async fn run<R>(
        &self,
        job: AssemblyJob,
        reporter: &mut R,
        token: &CancellationToken,
    ) -> Result<AssembledDocument>
    where
        R: ProgressReporter,
    {
        token.reset();

        let AssemblyJob {
            slot,
            pages,
            sources,
        } = job;
        let total = pages.len();
        if total == 0 {
            return Err(ArrangeError::NoPages(slot));
        }

        log::info!("Assembling {} page(s) from the {} slot", total, slot);

        let backend = self.backend.clone();
        let mut output = run_blocking(move || backend.create_empty())
            .await
            .map_err(|e| failure(None, e))?;

        let load_options = LoadOptions {
            ignore_encryption: self.options.ignore_encryption,
        };
        // Parsed sources, each loaded the first time a page needs it
        let mut loaded: HashMap<DocumentId, B::Source> = HashMap::new();

        for (i, page) in pages.iter().enumerate() {
            if token.is_cancelled() {
                log::info!("Assembly of {} cancelled after {}/{} page(s)", slot, i, total);
                return Err(ArrangeError::Cancelled);
            }

            let position = i + 1;
            let source = match loaded.remove(&page.document) {
                Some(source) => source,
                None => {
                    let bytes = sources.get(&page.document).cloned().ok_or_else(|| {
                        failure(
                            Some(position),
                            ArrangeError::LoadFailure(format!("{:?} is missing", page.document)),
                        )
                    })?;
                    let backend = self.backend.clone();
                    run_blocking(move || backend.load_source(&bytes, load_options))
                        .await
                        .map_err(|e| failure(Some(position), e))?
                }
            };

            let backend = self.backend.clone();
            let page_number = page.page_number;
            let (next, source) = run_blocking(move || {
                let copied = backend.copy_page(&mut output, &source, page_number)?;
                backend.append(&mut output, copied)?;
                Ok((output, source))
            })
            .await
            .map_err(|e| failure(Some(position), e))?;
            output = next;
            loaded.insert(page.document, source);

            report_quietly(&mut *reporter, Progress::new(position, total));
        }

        let backend = self.backend.clone();
        let bytes = run_blocking(move || backend.serialize(output))
            .await
            .map_err(|e| failure(None, e))?;

        log::info!("Assembled {} page(s), {} bytes", total, bytes.len());

        Ok(AssembledDocument {
            slot,
            bytes,
            page_count: total,
        })
    }
}

fn failure(page: Option<usize>, source: ArrangeError) -> ArrangeError {
    match page {
        Some(page) => log::error!("Assembly failed at page {}: {}", page, source),
        None => log::error!("Assembly failed: {}", source),
    }
    ArrangeError::AssemblyFailure {
        page,
        source: Box::new(source),
    }
}

/// Run blocking backend work off the async executor
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_suggested_filename() {
        let at = Local.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            suggested_filename("edited", SlotId::Right, at),
            "edited_Right_1700000000123.pdf"
        );
    }
}

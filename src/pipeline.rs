// Resumable dictionary translation
//
// Entries are processed in fixed-size positional chunks. After every chunk the
// whole dictionary is written back, so an interrupted run loses at most the
// chunk in flight and re-running picks up the entries still pending.

use std::path::Path;
use tracing::{debug, info, warn};

use crate::dictionary::{count_entries, read_text, Dictionary, DictEntry, Segment};
use crate::error::{Result, TransDictError};
use crate::translate::{translate_preserving, BatchOracle, Oracle};

/// Default number of entries per checkpoint
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Receives pipeline events; every method defaults to doing nothing
pub trait PipelineObserver: Send + Sync {
    fn item_done(&self, _original: &str, _translated: &str, _success: bool) {}

    fn item_error(&self, _original: &str, _error: &str) {}

    /// Called after chunk `chunk` (1-based) of `chunks` has been written to disk
    fn chunk_saved(&self, _chunk: usize, _chunks: usize) {}

    /// Overall progress: `done` of `total` items handled so far.
    /// `total` counts terminator-delimited segments of the file.
    fn progress(&self, _done: usize, _total: usize, _label: &str) {}
}

/// Observer that ignores every event
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Counter behind the `progress` events of one run
struct RunProgress {
    name: String,
    done: usize,
    total: usize,
}

impl RunProgress {
    fn label(&self, verb: &str) -> String {
        format!("{} {}... {}/{}", verb, self.name, self.done, self.total)
    }
}

pub struct TranslationPipeline<'a> {
    oracle: &'a dyn Oracle,
    batch_oracle: Option<&'a dyn BatchOracle>,
    observer: &'a dyn PipelineObserver,
    chunk_size: usize,
}

impl<'a> TranslationPipeline<'a> {
    pub fn new(oracle: &'a dyn Oracle) -> Self {
        Self {
            oracle,
            batch_oracle: None,
            observer: &NoopObserver,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_batch_oracle(mut self, batch_oracle: Option<&'a dyn BatchOracle>) -> Self {
        self.batch_oracle = batch_oracle;
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn PipelineObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Translate every pending entry of the dictionary at `path`.
    ///
    /// Returns the number of entries translated in this run. Entries that
    /// could not be translated take their original text and are not counted.
    /// A fatal oracle error aborts the run; chunks written before it stay on
    /// disk.
    pub async fn apply<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let path = path.as_ref();
        if self.chunk_size == 0 {
            return Err(TransDictError::Config("chunk size must be at least 1".to_string()));
        }

        let text = read_text(path)?;
        let mut dictionary = Dictionary::parse(&text);
        let mut progress = RunProgress {
            name: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            done: 0,
            total: count_entries(&text),
        };

        let total = dictionary.len();
        let chunks = total.div_ceil(self.chunk_size);
        info!(
            "Translating {} ({} entries, {} pending, {} chunks of {})",
            path.display(),
            total,
            dictionary.pending_count(),
            chunks,
            self.chunk_size
        );
        self.report(&progress, "Translating");

        let mut succeeded = 0;
        for (index, start) in (0..total).step_by(self.chunk_size).enumerate() {
            let end = (start + self.chunk_size).min(total);
            succeeded += self
                .process_chunk(&mut dictionary.segments_mut()[start..end], &mut progress)
                .await?;

            dictionary.save(path)?;
            debug!("Checkpoint {}/{} written", index + 1, chunks);
            self.observer.chunk_saved(index + 1, chunks);
            self.report(&progress, "Saved");
        }

        progress.done = progress.total;
        self.report(&progress, "Dictionary complete");

        info!("Translated {} entries in {}", succeeded, path.display());
        Ok(succeeded)
    }

    fn report(&self, progress: &RunProgress, verb: &str) {
        self.observer
            .progress(progress.done, progress.total, &progress.label(verb));
    }

    async fn process_chunk(
        &self,
        segments: &mut [Segment],
        progress: &mut RunProgress,
    ) -> Result<usize> {
        let mut pending: Vec<usize> = segments
            .iter()
            .enumerate()
            .filter_map(|(i, s)| pending_entry(s).map(|_| i))
            .collect();

        if pending.is_empty() {
            return Ok(0);
        }

        let mut succeeded = 0;
        if let Some(batch_oracle) = self.batch_oracle {
            if let Some(leftover) = self.try_batch(batch_oracle, segments, &pending, progress).await {
                succeeded += pending.len() - leftover.len();
                pending = leftover;
            }
        }

        for &i in &pending {
            let Segment::Entry(entry) = &mut segments[i] else {
                continue;
            };

            match translate_preserving(&entry.original, self.oracle).await {
                Ok(translated) => {
                    self.observer.item_done(&entry.original, &translated, true);
                    entry.translated = translated;
                    succeeded += 1;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Keeping original text for {}: {}", entry.key, e);
                    self.observer.item_error(&entry.original, &e.to_string());
                    entry.translated = entry.original.clone();
                }
            }

            progress.done += 1;
            self.report(progress, "Translating");
        }

        Ok(succeeded)
    }

    /// One batch request for every pending entry of the chunk. Returns the
    /// entries the batch left blank, or `None` when the whole chunk has to be
    /// translated item by item.
    async fn try_batch(
        &self,
        batch_oracle: &dyn BatchOracle,
        segments: &mut [Segment],
        pending: &[usize],
        progress: &mut RunProgress,
    ) -> Option<Vec<usize>> {
        let originals: Vec<String> = pending
            .iter()
            .filter_map(|&i| pending_entry(&segments[i]).map(|e| e.original.clone()))
            .collect();

        let translations = match batch_oracle.translate_batch(&originals).await {
            Ok(translations) if translations.len() == originals.len() => translations,
            Ok(translations) => {
                warn!(
                    "Batch translation returned {} results for {} texts, translating one by one",
                    translations.len(),
                    originals.len()
                );
                return None;
            }
            Err(e) => {
                warn!("Batch translation failed, translating one by one: {}", e);
                return None;
            }
        };

        let mut leftover = Vec::new();
        for (&i, translated) in pending.iter().zip(translations) {
            let Segment::Entry(entry) = &mut segments[i] else {
                continue;
            };
            if translated.trim().is_empty() {
                debug!("Batch left {} blank, translating it alone", entry.key);
                leftover.push(i);
                continue;
            }
            self.observer.item_done(&entry.original, &translated, true);
            entry.translated = translated;
            progress.done += 1;
            self.report(progress, "Translating");
        }

        Some(leftover)
    }
}

fn pending_entry(segment: &Segment) -> Option<&DictEntry> {
    match segment {
        Segment::Entry(entry) if entry.is_pending() => Some(entry),
        _ => None,
    }
}

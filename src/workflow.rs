use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::dictionary::{self, compute_progress, Dictionary};
use crate::error::{Result, TransDictError};
use crate::pipeline::{PipelineObserver, TranslationPipeline};
use crate::source::SourceDocument;
use crate::translate::{BatchBinding, BatchOracle, GuardedOracle, Translator};

/// Text sent when probing a provider
pub const PROBE_TEXT: &str = "Hello, world!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Entries in the dictionary after the export
    pub entries: usize,
    /// Entries added by this export
    pub added: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationSummary {
    pub translated: usize,
    pub pending_before: usize,
    pub pending_after: usize,
    pub progress: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub applied: usize,
    pub progress: u8,
    pub output: PathBuf,
    pub backup: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryStatus {
    /// Path relative to the scanned directory
    pub path: PathBuf,
    pub progress: u8,
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub translation: String,
    /// The provider answered with something non-empty and different
    pub changed: bool,
}

/// Dictionary operations. Export, translation and import issued through one
/// workflow never interleave.
pub struct Workflow {
    config: Config,
    lock: Mutex<()>,
}

impl Workflow {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Dictionary path used when none is given: the source with the
    /// dictionary extension
    pub fn dictionary_path_for<P: AsRef<Path>>(&self, source: P) -> PathBuf {
        source.as_ref().with_extension(&self.config.dictionary.extension)
    }

    /// Export the source strings into a dictionary. An existing dictionary
    /// keeps its entries; only new keys are appended.
    pub async fn export_dictionary<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source: P,
        dict: Q,
    ) -> Result<ExportSummary> {
        let _guard = self.lock.lock().await;
        let (source, dict) = (source.as_ref(), dict.as_ref());

        let document = SourceDocument::from_file(source)?;
        let records = document.to_records();

        let (dictionary, added) = if dict.exists() {
            let mut dictionary = Dictionary::load(dict)?;
            let added = dictionary.merge_records(&records);
            info!("Merged {} new entries into {}", added, dict.display());
            (dictionary, added)
        } else {
            let dictionary = Dictionary::from_records(&records);
            let added = dictionary.len();
            info!("Exported {} entries to {}", added, dict.display());
            (dictionary, added)
        };

        dictionary.save(dict)?;

        Ok(ExportSummary {
            entries: dictionary.len(),
            added,
        })
    }

    /// Translate the pending entries of a dictionary with `translator`
    pub async fn translate_dictionary<P: AsRef<Path>>(
        &self,
        dict: P,
        translator: Arc<dyn Translator>,
        observer: &dyn PipelineObserver,
    ) -> Result<TranslationSummary> {
        let _guard = self.lock.lock().await;
        let dict = dict.as_ref();
        let settings = &self.config.translate;

        let pending_before = Dictionary::load(dict)?.pending_count();
        self.check_target_language(translator.as_ref()).await?;

        let oracle = GuardedOracle::new(
            translator.clone(),
            &settings.source_language,
            &settings.target_language,
            settings.failure_threshold,
        );
        let batch = BatchBinding::new(
            translator.clone(),
            &settings.source_language,
            &settings.target_language,
        );
        if batch.is_some() {
            info!("Using {} batch translation", translator.name());
        }
        let chunk_size = settings.effective_chunk_size(batch.is_some());

        let translated = TranslationPipeline::new(&oracle)
            .with_chunk_size(chunk_size)
            .with_batch_oracle(batch.as_ref().map(|b| b as &dyn BatchOracle))
            .with_observer(observer)
            .apply(dict)
            .await?;

        let text = dictionary::read_text(dict)?;
        let pending_after = Dictionary::parse(&text).pending_count();

        if translated == 0 && pending_before > 0 {
            warn!(
                "No translations were produced. Try a different provider (current: {})",
                translator.name()
            );
        }

        Ok(TranslationSummary {
            translated,
            pending_before,
            pending_after,
            progress: compute_progress(&text),
        })
    }

    async fn check_target_language(&self, translator: &dyn Translator) -> Result<()> {
        let target = &self.config.translate.target_language;
        let languages = match translator.supported_languages().await {
            Ok(languages) => languages,
            Err(e) => {
                warn!("Could not fetch languages from {}: {}", translator.name(), e);
                return Ok(());
            }
        };

        if languages.is_empty() || language_supported(&languages, target) {
            Ok(())
        } else {
            Err(TransDictError::UnsupportedLanguage(format!(
                "{} is not supported by {}",
                target,
                translator.name()
            )))
        }
    }

    /// Push the dictionary back into the source document.
    ///
    /// Refuses dictionaries below the configured minimum progress unless
    /// `force` is set. Writing over the source keeps a one-time backup.
    pub async fn import_dictionary<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source: P,
        dict: Q,
        output: Option<PathBuf>,
        force: bool,
    ) -> Result<ImportSummary> {
        let _guard = self.lock.lock().await;
        let (source, dict) = (source.as_ref(), dict.as_ref());

        let text = dictionary::read_text(dict)?;
        let progress = compute_progress(&text);
        let required = self.config.dictionary.min_import_progress;
        if progress < required && !force {
            return Err(TransDictError::IncompleteDictionary { progress, required });
        }
        if progress < required {
            warn!("Importing partial dictionary ({}% complete)", progress);
        }

        let mut document = SourceDocument::from_file(source)?;
        let applied = document.apply_translations(&dictionary::deserialize(&text));

        let output = output.unwrap_or_else(|| source.to_path_buf());
        let mut backup = None;
        if output == source && self.config.dictionary.backup_source {
            let backup_path = backup_path_for(source);
            if !backup_path.exists() {
                std::fs::copy(source, &backup_path)?;
                info!("Backed up {} to {}", source.display(), backup_path.display());
            }
            backup = Some(backup_path);
        }

        document.save_to_file(&output)?;
        info!("Imported {} strings into {}", applied, output.display());

        Ok(ImportSummary {
            applied,
            progress,
            output,
            backup,
        })
    }

    /// Progress of one dictionary, or of every dictionary below a directory.
    ///
    /// In a directory, a source whose dictionary is gone but whose import
    /// backup exists has already been imported and is listed as done.
    pub fn status<P: AsRef<Path>>(&self, path: P) -> Result<Vec<DictionaryStatus>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TransDictError::NotFound(path.display().to_string()));
        }

        if !path.is_dir() {
            let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
            return Ok(vec![dictionary_status(path, &root)?]);
        }

        let extension = self.config.dictionary.extension.as_str();
        let files: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .collect();

        let mut statuses = Vec::new();
        for file in &files {
            if file.extension().is_some_and(|ext| ext == extension) {
                statuses.push(dictionary_status(file, path)?);
            } else if file.extension().is_some_and(|ext| ext == BACKUP_EXTENSION) {
                let source = file.with_extension("");
                if source.is_file() && !self.dictionary_path_for(&source).exists() {
                    statuses.push(imported_status(&source, path));
                }
            }
        }

        statuses.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(statuses)
    }
}

fn relative_to(file: &Path, root: &Path) -> PathBuf {
    pathdiff::diff_paths(file, root).unwrap_or_else(|| file.to_path_buf())
}

fn dictionary_status(file: &Path, root: &Path) -> Result<DictionaryStatus> {
    let text = dictionary::read_text(file)?;
    Ok(DictionaryStatus {
        path: relative_to(file, root),
        progress: compute_progress(&text),
        entries: Dictionary::parse(&text).len(),
    })
}

fn imported_status(source: &Path, root: &Path) -> DictionaryStatus {
    let entries = match SourceDocument::from_file(source) {
        Ok(document) => document.to_records().len(),
        Err(e) => {
            warn!("Could not read {}: {}", source.display(), e);
            0
        }
    };
    DictionaryStatus {
        path: relative_to(source, root),
        progress: 100,
        entries,
    }
}

fn base_language(code: &str) -> &str {
    code.split('-').next().unwrap_or(code)
}

/// Match a language code against a provider list, accepting regional
/// variants both ways ("zh" matches "zh-CN", "pt-BR" matches "pt")
fn language_supported(languages: &BTreeMap<String, String>, code: &str) -> bool {
    languages.keys().any(|known| {
        known.eq_ignore_ascii_case(code)
            || base_language(known).eq_ignore_ascii_case(code)
            || known.eq_ignore_ascii_case(base_language(code))
    })
}

const BACKUP_EXTENSION: &str = "backup";

fn backup_path_for(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_os_string();
    name.push(".");
    name.push(BACKUP_EXTENSION);
    PathBuf::from(name)
}

/// Translate a probe string to check that a provider works
pub async fn probe_translator(translator: &dyn Translator, target: &str) -> Result<ProbeResult> {
    translator.check_availability().await?;
    let translation = translator.translate(PROBE_TEXT, "en", target).await?;
    let changed = !translation.trim().is_empty() && translation != PROBE_TEXT;
    Ok(ProbeResult { translation, changed })
}

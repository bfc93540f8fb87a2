// Translation dictionary (.dict) format
//
// A dictionary is a flat list of entries, each encoding one string of the
// source document:
//
//     <key>|_SEP_|<original>|_SEP_|<translated>|_END_|\n
//
// Entries are delimited by the terminator token, not by newlines, so values
// may span lines. The translated field stays empty until filled.

pub mod progress;

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, TransDictError};

pub use progress::{compute_progress, progress_of_file, ProgressLabel};

/// Field separator inside an entry
pub const SEP: &str = "|_SEP_|";
/// Entry terminator
pub const TERMINATOR: &str = "|_END_|\n";

/// One exported string of the source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub original: String,
    pub translated: String,
}

impl Record {
    pub fn new(key: impl Into<String>, original: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            original: original.into(),
            translated: String::new(),
        }
    }
}

/// Serialize records to dictionary text. Records with a blank original are
/// not written.
pub fn serialize(records: &[Record]) -> String {
    records
        .iter()
        .filter(|r| !r.original.trim().is_empty())
        .map(|r| DictEntry::from_record(r).render())
        .collect()
}

/// Parse dictionary text into a key -> value mapping.
///
/// The value is the translated field when it is non-blank and the original
/// otherwise. Values are trimmed and later duplicates win.
pub fn deserialize(text: &str) -> HashMap<String, String> {
    let mut translations = HashMap::new();

    for segment in text.split(TERMINATOR) {
        if segment.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = segment.split(SEP).collect();
        if parts.len() < 2 {
            continue;
        }
        let key = parts[0].trim();
        let original = parts[1].trim();
        let translated = parts.get(2).map(|t| t.trim()).unwrap_or("");

        let value = if translated.is_empty() { original } else { translated };
        translations.insert(key.to_string(), value.to_string());
    }

    translations
}

/// Number of terminator-delimited segments, counting the empty segment after
/// the trailing terminator. Used as the "total" shown while translating.
pub fn count_entries(text: &str) -> usize {
    text.split(TERMINATOR).count()
}

/// A parsed dictionary entry. Raw values are kept untrimmed so untouched
/// entries are written back byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictEntry {
    pub key: String,
    pub original: String,
    pub translated: String,
    extra: Vec<String>,
}

impl DictEntry {
    fn from_record(record: &Record) -> Self {
        Self {
            key: record.key.clone(),
            original: record.original.clone(),
            translated: record.translated.clone(),
            extra: Vec::new(),
        }
    }

    fn parse(segment: &str) -> Option<Self> {
        let mut parts = segment.split(SEP);
        let key = parts.next()?;
        let original = parts.next()?;
        let translated = parts.next().unwrap_or("");

        Some(Self {
            key: key.to_string(),
            original: original.to_string(),
            translated: translated.to_string(),
            extra: parts.map(str::to_string).collect(),
        })
    }

    /// Still waiting for a translation
    pub fn is_pending(&self) -> bool {
        self.translated.trim().is_empty() && !self.original.trim().is_empty()
    }

    fn render(&self) -> String {
        let mut out = String::with_capacity(
            self.key.len() + self.original.len() + self.translated.len() + 32,
        );
        out.push_str(&self.key);
        out.push_str(SEP);
        out.push_str(&self.original);
        out.push_str(SEP);
        out.push_str(&self.translated);
        for field in &self.extra {
            out.push_str(SEP);
            out.push_str(field);
        }
        out.push_str(TERMINATOR);
        out
    }
}

/// A terminator-delimited unit of the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Entry(DictEntry),
    /// Text without any separator, e.g. stray whitespace from hand editing.
    /// Carried through rewrites untouched.
    Unparsed(String),
}

impl Segment {
    fn render(&self) -> String {
        match self {
            Segment::Entry(entry) => entry.render(),
            Segment::Unparsed(raw) => format!("{}{}", raw, TERMINATOR),
        }
    }
}

/// Ordered, in-memory view of a dictionary file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    segments: Vec<Segment>,
}

impl Dictionary {
    /// Tokenize dictionary text. Empty segments are dropped.
    pub fn parse(text: &str) -> Self {
        let segments = text
            .split(TERMINATOR)
            .filter(|s| !s.is_empty())
            .map(|s| match DictEntry::parse(s) {
                Some(entry) => Segment::Entry(entry),
                None => Segment::Unparsed(s.to_string()),
            })
            .collect();

        Self { segments }
    }

    /// Build a fresh dictionary from exported records. The first record wins
    /// when a key repeats.
    pub fn from_records(records: &[Record]) -> Self {
        let mut dictionary = Self::default();
        dictionary.merge_records(records);
        dictionary
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = read_text(path)?;
        Ok(Self::parse(&text))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_atomic(path.as_ref(), &self.render())
    }

    pub fn render(&self) -> String {
        self.segments.iter().map(Segment::render).collect()
    }

    /// Append records whose key is not in the dictionary yet and whose
    /// original is not blank. Existing entries, including their originals,
    /// are left as they are.
    /// Returns the number of appended entries.
    pub fn merge_records(&mut self, records: &[Record]) -> usize {
        let mut known: HashSet<String> =
            self.entries().map(|e| e.key.clone()).collect();
        let mut added = 0;

        for record in records {
            if record.original.trim().is_empty() || known.contains(&record.key) {
                continue;
            }
            known.insert(record.key.clone());
            self.segments.push(Segment::Entry(DictEntry::from_record(record)));
            added += 1;
        }

        added
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }

    pub fn entries(&self) -> impl Iterator<Item = &DictEntry> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Entry(entry) => Some(entry),
            Segment::Unparsed(_) => None,
        })
    }

    pub fn get(&self, key: &str) -> Option<&DictEntry> {
        self.entries().find(|e| e.key == key)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.entries().filter(|e| e.is_pending()).count()
    }
}

/// Read a dictionary file, mapping a missing file to `NotFound`
pub fn read_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TransDictError::NotFound(path.display().to_string()),
        _ => TransDictError::Io(e),
    })
}

/// Replace the whole file through a temporary sibling so readers never see a
/// half-written dictionary
pub fn write_atomic(path: &Path, text: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(text.as_bytes())?;
    tmp.flush()?;
    // Temp files are created owner-only; keep the mode of the file being replaced
    match std::fs::metadata(path) {
        Ok(metadata) => tmp.as_file().set_permissions(metadata.permissions())?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(TransDictError::Io(e)),
    }
    tmp.persist(path).map_err(|e| TransDictError::Io(e.error))?;

    debug!("Wrote {} bytes to {}", text.len(), path.display());
    Ok(())
}

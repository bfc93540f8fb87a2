use std::collections::HashMap;
use std::path::Path;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dictionary::Record;
use crate::error::{Result, TransDictError};

/// Key of the document-level description entry
pub const DESCRIPTION_KEY: &str = "description";

/// Source data the dictionary is exported from and imported into
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub records: Vec<SourceRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub string_fields: Vec<StringField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringField {
    pub key: String,
    pub value: String,
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn name_key(index: usize) -> String {
    format!("record{}_name", index)
}

fn field_key(index: usize, field: &str) -> String {
    format!("record{}_{}", index, field)
}

impl SourceDocument {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TransDictError::NotFound(path.display().to_string()),
            _ => TransDictError::Io(e),
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Flatten the document into dictionary records, in document order.
    /// Records are numbered from 1; blank strings are skipped.
    pub fn to_records(&self) -> Vec<Record> {
        let mut records = Vec::new();

        if let Some(description) = self.description.as_deref().filter(|d| !is_blank(d)) {
            records.push(Record::new(DESCRIPTION_KEY, description));
        }

        for (index, record) in self.records.iter().enumerate().map(|(i, r)| (i + 1, r)) {
            if let Some(name) = record.name.as_deref().filter(|n| !is_blank(n)) {
                records.push(Record::new(name_key(index), name));
            }
            for field in record.string_fields.iter().filter(|f| !is_blank(&f.value)) {
                records.push(Record::new(field_key(index, &field.key), field.value.as_str()));
            }
        }

        records
    }

    /// Replace every string that has a non-blank value in `translations`.
    /// Returns the number of replaced strings.
    pub fn apply_translations(&mut self, translations: &HashMap<String, String>) -> usize {
        let lookup = |key: &str| {
            translations
                .get(key)
                .filter(|value| !value.trim().is_empty())
                .cloned()
        };
        let mut applied = 0;

        if self.description.is_some() {
            if let Some(value) = lookup(DESCRIPTION_KEY) {
                self.description = Some(value);
                applied += 1;
            }
        }

        for (index, record) in self.records.iter_mut().enumerate().map(|(i, r)| (i + 1, r)) {
            if record.name.is_some() {
                if let Some(value) = lookup(&name_key(index)) {
                    record.name = Some(value);
                    applied += 1;
                }
            }
            for field in record.string_fields.iter_mut() {
                if let Some(value) = lookup(&field_key(index, &field.key)) {
                    field.value = value;
                    applied += 1;
                }
            }
        }

        info!("Applied {} translated strings", applied);
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{deserialize, serialize};

    fn document() -> SourceDocument {
        SourceDocument {
            description: Some("A mod".to_string()),
            records: vec![
                SourceRecord {
                    name: Some("Rusty sword".to_string()),
                    string_fields: vec![
                        StringField { key: "desc".to_string(), value: "Old /ITEM/".to_string() },
                        StringField { key: "note".to_string(), value: String::new() },
                    ],
                },
                SourceRecord {
                    name: None,
                    string_fields: vec![StringField { key: "title".to_string(), value: "Boss".to_string() }],
                },
            ],
        }
    }

    #[test]
    fn test_record_keys_follow_naming_convention() {
        let keys: Vec<String> = document().to_records().into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["description", "record1_name", "record1_desc", "record2_title"]);
    }

    #[test]
    fn test_apply_translations_from_dictionary() {
        let mut doc = document();
        let mut records = doc.to_records();
        records[1].translated = "Epee rouillee".to_string();
        records[3].translated = "  ".to_string();

        let applied = doc.apply_translations(&deserialize(&serialize(&records)));

        // Untranslated entries import their original text
        assert_eq!(applied, 4);
        assert_eq!(doc.records[0].name.as_deref(), Some("Epee rouillee"));
        assert_eq!(doc.records[1].string_fields[0].value, "Boss");
        assert_eq!(doc.records[0].string_fields[1].value, "");
    }

    #[test]
    fn test_blank_strings_are_not_exported() {
        let doc = SourceDocument {
            description: Some("  ".to_string()),
            records: vec![SourceRecord {
                name: Some("\t".to_string()),
                string_fields: vec![
                    StringField { key: "pad".to_string(), value: "   ".to_string() },
                    StringField { key: "title".to_string(), value: "Boss".to_string() },
                ],
            }],
        };

        let keys: Vec<String> = doc.to_records().into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["record1_title"]);
    }

    #[test]
    fn test_missing_keys_leave_document_untouched() {
        let mut doc = document();
        assert_eq!(doc.apply_translations(&HashMap::new()), 0);
        assert_eq!(doc, document());
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mod.json");
        document().save_to_file(&path).unwrap();
        assert_eq!(SourceDocument::from_file(&path).unwrap(), document());
    }
}

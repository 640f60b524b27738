//! Output formatters for catalog listings.
//!
//! - Plain text for humans: one line per record with flag markers
//! - JSON for scripting and automation
//!
//! # JSON Schema
//!
//! ```json
//! {
//!   "records": [
//!     { "path": "/designs/Caixa Natal", "name": "Caixa Natal", "favorite": true, ... }
//!   ],
//!   "total": 1
//! }
//! ```

use crate::record::ProjectRecord;
use serde::Serialize;

/// A record with its path, as printed by `list --json`.
#[derive(Debug, Serialize)]
pub struct JsonRecord<'a> {
    pub path: &'a str,
    #[serde(flatten)]
    pub record: &'a ProjectRecord,
}

/// The `list --json` document.
#[derive(Debug, Serialize)]
pub struct JsonListing<'a> {
    pub records: Vec<JsonRecord<'a>>,
    pub total: usize,
}

impl<'a> JsonListing<'a> {
    #[must_use]
    pub fn new(records: &[&'a ProjectRecord]) -> Self {
        let records: Vec<JsonRecord<'a>> = records
            .iter()
            .map(|&record| JsonRecord {
                path: record.path(),
                record,
            })
            .collect();
        Self {
            total: records.len(),
            records,
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Four-character flag column: favorite, done, good/bad, analyzed.
pub fn flag_markers(record: &ProjectRecord) -> String {
    let rating = if record.is_good() {
        '+'
    } else if record.is_bad() {
        '-'
    } else {
        ' '
    };
    [
        if record.favorite { '*' } else { ' ' },
        if record.done { 'D' } else { ' ' },
        rating,
        if record.analyzed { 'A' } else { ' ' },
    ]
    .iter()
    .collect()
}

/// One line of the plain text listing.
pub fn format_record_line(record: &ProjectRecord) -> String {
    let categories = if record.categories.is_empty() {
        String::from("-")
    } else {
        record.categories.join(", ")
    };
    format!(
        "[{}] {}  ({})  {}",
        flag_markers(record),
        record.name,
        categories,
        record.path()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Flag;

    #[test]
    fn test_flag_markers() {
        let mut record = ProjectRecord::new("/p/a");
        assert_eq!(flag_markers(&record), "    ");
        record.favorite = true;
        record.set_flag(Flag::Bad, true);
        assert_eq!(flag_markers(&record), "* - ");
    }

    #[test]
    fn test_record_line() {
        let mut record = ProjectRecord::new("/p/Arvore");
        record.categories = vec!["Natal".into(), "Decoracao".into()];
        assert_eq!(
            format_record_line(&record),
            "[    ] Arvore  (Natal, Decoracao)  /p/Arvore"
        );
    }

    #[test]
    fn test_json_listing_includes_path_and_rating() {
        let mut record = ProjectRecord::new("/p/a");
        record.set_flag(Flag::Good, true);
        let listing = JsonListing::new(&[&record]);
        let json = listing.to_json_pretty().unwrap();
        assert!(json.contains("\"path\": \"/p/a\""));
        assert!(json.contains("\"good\": true"));
        assert!(json.contains("\"total\": 1"));
    }
}

//! Output formatting and persistence for engine results.
//!
//! Supports pretty-printing, JSON serialization, and CSV append.

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use csv::WriterBuilder;
use std::fmt::Debug;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Renders a value as pretty-printed JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Writes a value to stdout as pretty-printed JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = to_json(value)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}

/// Appends records as rows to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records<T: Serialize>(path: &str, records: &[T]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, records = records.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::RankedEntry;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn entries() -> Vec<RankedEntry> {
        vec![
            RankedEntry { label: "Ludhiana Mandi, Punjab".into(), price: 2150.0 },
            RankedEntry { label: "Karnal, Haryana".into(), price: 2100.0 },
        ]
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&entries());
    }

    #[test]
    fn test_to_json() {
        let json = to_json(&entries()).unwrap();
        assert!(json.contains("\"label\": \"Ludhiana Mandi, Punjab\""));
    }

    #[test]
    fn test_append_records_creates_file() {
        let path = temp_path("mandi_prices_test_create.csv");
        let _ = fs::remove_file(&path); // clean up any prior run

        append_records(&path, &entries()).unwrap();

        assert!(Path::new(&path).exists());
        let content = fs::read_to_string(&path).unwrap();
        // quoted because the label contains a comma
        assert!(content.contains("\"Ludhiana Mandi, Punjab\",2150.0"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_records_writes_header_once() {
        let path = temp_path("mandi_prices_test_header.csv");
        let _ = fs::remove_file(&path);

        append_records(&path, &entries()).unwrap();
        append_records(&path, &entries()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| *l == "label,price").count();
        assert_eq!(header_count, 1);
        // 1 header + 4 data rows
        assert_eq!(content.lines().count(), 5);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_ranked_records_keeps_scope_columns() {
        use crate::ranking::{RankedSubset, Scope, SortOrder};

        let path = temp_path("mandi_prices_test_ranked.csv");
        let _ = fs::remove_file(&path);

        let national = RankedSubset {
            scope: Scope::National,
            order: SortOrder::Descending,
            entries: entries(),
        };
        let state = RankedSubset {
            scope: Scope::State("Punjab".into()),
            order: SortOrder::Descending,
            entries: vec![RankedEntry { label: "Ludhiana Mandi".into(), price: 2150.0 }],
        };

        append_records(&path, &national.records()).unwrap();
        append_records(&path, &state.records()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "scope,state,order,rank,label,price");
        assert_eq!(lines[1], "national,,descending,1,\"Ludhiana Mandi, Punjab\",2150.0");
        assert_eq!(lines[3], "state,Punjab,descending,1,Ludhiana Mandi,2150.0");

        fs::remove_file(&path).unwrap();
    }
}

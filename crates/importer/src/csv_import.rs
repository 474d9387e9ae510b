//! CSV parsing for bulk entry and chip registration.
//!
//! Rows that fail to parse become warnings; the remaining rows are still
//! returned so one bad line never sinks a whole start list.

use std::io::Read;

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use storage::dto::chip::ChipImportRow;
use storage::dto::entry::EntryImportRow;

use crate::error::Result;

/// Parsed rows plus one warning per rejected line.
#[derive(Debug, Clone, Default)]
pub struct Parsed<T> {
    pub rows: Vec<T>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EntryRecord {
    bib: i64,
    first_name: String,
    last_name: String,
    club: Option<String>,
    class: String,
}

#[derive(Debug, Deserialize)]
struct ChipRecord {
    bib: i64,
    siac: String,
    primary: Option<String>,
}

/// Entries from `bib,first_name,last_name,club,class` with a header row.
pub fn parse_entries<R: Read>(reader: R) -> Result<Parsed<EntryImportRow>> {
    parse(reader, |record: EntryRecord| {
        Ok(EntryImportRow {
            bib: record.bib,
            first_name: record.first_name,
            last_name: record.last_name,
            club: record.club,
            class: record.class,
        })
    })
}

/// Chips from `bib,siac,primary` with a header row. An empty `primary`
/// column means primary.
pub fn parse_chips<R: Read>(reader: R) -> Result<Parsed<ChipImportRow>> {
    parse(reader, |record: ChipRecord| {
        let is_primary = match record.primary.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("") | Some("1") | Some("true") | Some("yes") | Some("y") => true,
            Some("0") | Some("false") | Some("no") | Some("n") => false,
            Some(other) => return Err(format!("'{other}' is not a yes/no value")),
        };

        Ok(ChipImportRow {
            bib: record.bib,
            siac: record.siac,
            is_primary,
        })
    })
}

fn parse<R, Rec, Row, F>(reader: R, convert: F) -> Result<Parsed<Row>>
where
    R: Read,
    Rec: for<'de> Deserialize<'de>,
    F: Fn(Rec) -> std::result::Result<Row, String>,
{
    let mut csv = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    csv.headers()?;

    let mut parsed = Parsed {
        rows: Vec::new(),
        warnings: Vec::new(),
    };

    for (index, record) in csv.deserialize::<Rec>().enumerate() {
        // header is line 1
        let line = index + 2;
        match record.map_err(|e| e.to_string()).and_then(&convert) {
            Ok(row) => parsed.rows.push(row),
            Err(e) => parsed.warnings.push(format!("line {line}: {e}")),
        }
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_with_bad_row() {
        let data = "bib,first_name,last_name,club,class\n\
                    101, Anna ,Berg,OK Ravinen,Open\n\
                    x,Bo,Ek,,Open\n\
                    103,Cia,Dahl,,Women\n";

        let parsed = parse_entries(data.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].first_name, "Anna");
        assert_eq!(parsed.rows[1].club, None);
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].starts_with("line 3"));
    }

    #[test]
    fn test_chip_primary_column() {
        let data = "bib,siac,primary\n101,8001,\n101,8002,no\n102,8003,maybe\n103,8004\n";

        let parsed = parse_chips(data.as_bytes()).unwrap();
        let primaries: Vec<(String, bool)> = parsed
            .rows
            .iter()
            .map(|r| (r.siac.clone(), r.is_primary))
            .collect();
        assert_eq!(
            primaries,
            vec![
                ("8001".to_string(), true),
                ("8002".to_string(), false),
                ("8004".to_string(), true),
            ]
        );
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].contains("maybe"));
    }
}

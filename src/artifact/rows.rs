use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::Result;

/// One data row keyed by header cell.
pub type Row = HashMap<String, String>;

pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let reader = ReaderBuilder::new().flexible(true).from_path(path)?;
    collect_rows(reader)
}

/// Parse CSV text whose first record is the header. A header name that
/// occurs twice keeps the value of its last column.
pub fn read_rows_from<R: Read>(source: R) -> Result<Vec<Row>> {
    let reader = ReaderBuilder::new().flexible(true).from_reader(source);
    collect_rows(reader)
}

fn collect_rows<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<Row>> {
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

//! Abstraction over "a source of rows with named columns" (§6). The
//! builder only depends on this trait, not on `csv` directly, so a
//! different tabular format can be plugged in without touching the
//! construction algorithm.

use std::path::Path;

use crate::error::{BuildError, BuildResult};

/// A single data row, addressable by column name.
pub trait Row {
    fn get(&self, column: &str) -> Option<&str>;
}

/// Opens a tabular source and yields its rows in file order.
pub trait TabularSource {
    type Row: Row;

    fn columns(&self) -> &[String];
    fn rows(&mut self) -> BuildResult<Vec<Self::Row>>;
}

pub struct CsvRow {
    columns: std::rc::Rc<Vec<String>>,
    values: Vec<String>,
}

impl Row for CsvRow {
    fn get(&self, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(idx).map(String::as_str)
    }
}

pub struct CsvSource {
    columns: std::rc::Rc<Vec<String>>,
    reader: csv::Reader<std::fs::File>,
    path: String,
}

impl CsvSource {
    pub fn open(path: impl AsRef<Path>) -> BuildResult<Self> {
        let path_ref = path.as_ref();
        if !path_ref.exists() {
            return Err(BuildError::InputNotFound(path_ref.display().to_string()));
        }
        let mut reader = csv::Reader::from_path(path_ref)
            .map_err(|source| BuildError::Csv { path: path_ref.display().to_string(), source })?;
        let columns: Vec<String> = reader
            .headers()
            .map_err(|source| BuildError::Csv { path: path_ref.display().to_string(), source })?
            .iter()
            .map(str::to_string)
            .collect();
        Ok(Self { columns: std::rc::Rc::new(columns), reader, path: path_ref.display().to_string() })
    }
}

impl TabularSource for CsvSource {
    type Row = CsvRow;

    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn rows(&mut self) -> BuildResult<Vec<Self::Row>> {
        let mut rows = Vec::new();
        for record in self.reader.records() {
            let record = record.map_err(|source| BuildError::Csv { path: self.path.clone(), source })?;
            rows.push(CsvRow { columns: self.columns.clone(), values: record.iter().map(str::to_string).collect() });
        }
        Ok(rows)
    }
}

use crate::traits::{DatasetReader, has_extension};
use crate::{Error, Result};
use sleigh_types::{Dataset, Values, Variable, parse_datetime};
use std::path::Path;

/// CSV tables with one time index column.
///
/// Every other column becomes a float variable along the index dimension;
/// empty cells are read as NaN.
pub struct CsvReader {
    index_column: String,
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new("time")
    }
}

impl CsvReader {
    pub fn new(index_column: impl Into<String>) -> Self {
        Self {
            index_column: index_column.into(),
        }
    }

    pub fn index_column(&self) -> &str {
        &self.index_column
    }
}

impl DatasetReader for CsvReader {
    fn id(&self) -> &'static str {
        "csv"
    }

    fn can_handle(&self, path: &Path) -> bool {
        has_extension(path, &["csv"])
    }

    fn parse_str(&self, content: &str) -> Result<Dataset> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        let index_pos = headers
            .iter()
            .position(|h| h == self.index_column)
            .ok_or_else(|| {
                Error::Parse(format!("missing index column '{}'", self.index_column))
            })?;

        let mut times = Vec::new();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            for (col, cell) in record.iter().enumerate() {
                if col == index_pos {
                    let t = parse_datetime(cell)
                        .map_err(|e| Error::Parse(format!("row {}: {}", row + 1, e)))?;
                    times.push(t);
                } else if cell.is_empty() {
                    columns[col].push(f64::NAN);
                } else {
                    let value = cell.parse::<f64>().map_err(|_| {
                        Error::Parse(format!(
                            "row {}: column '{}' is not numeric: '{}'",
                            row + 1,
                            &headers[col],
                            cell
                        ))
                    })?;
                    columns[col].push(value);
                }
            }
        }

        let dim = self.index_column.as_str();
        let mut dataset = Dataset::new()
            .with_dim(dim, times.len())
            .with_coord(dim, Variable::new([dim], Values::Time(times)));
        for (col, values) in columns.into_iter().enumerate() {
            if col == index_pos {
                continue;
            }
            dataset = dataset.with_var(&headers[col], Variable::new([dim], Values::Float(values)));
        }
        dataset.validate()?;
        Ok(dataset)
    }
}

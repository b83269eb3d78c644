//! Catalog CSV parsing.
//!
//! The whole file is parsed and validated before anything is written, so a
//! bad row rejects the upload without touching the catalog.
//!
//! Expected header: `id,author,title,image,quantity,price,description`.
//! `image` and `description` may be omitted or left empty.

use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::models::BookImport;

/// Columns every import file must have.
const REQUIRED_COLUMNS: [&str; 5] = ["id", "author", "title", "quantity", "price"];

/// Largest price the `NUMERIC(10, 2)` column holds, in cents.
const MAX_PRICE_CENTS: i64 = 9_999_999_999;

/// Errors from parsing an import file.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("missing column: {0}")]
    MissingColumn(&'static str),

    #[error("file contains no books")]
    Empty,

    #[error("line {line}: {message}")]
    Row { line: u64, message: String },

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// A row as it appears in the file.
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: i32,
    author: String,
    title: String,
    #[serde(default)]
    image: Option<String>,
    quantity: i32,
    price: Decimal,
    #[serde(default)]
    description: String,
}

impl CsvRow {
    fn validate(self, line: u64) -> Result<BookImport, ImportError> {
        let fail = |message: &str| ImportError::Row {
            line,
            message: message.to_string(),
        };

        if self.author.is_empty() {
            return Err(fail("author is required"));
        }
        if self.title.is_empty() {
            return Err(fail("title is required"));
        }
        if self.quantity < 0 {
            return Err(fail("quantity cannot be negative"));
        }
        if self.price.is_sign_negative() {
            return Err(fail("price cannot be negative"));
        }
        if self.price.scale() > 2 {
            return Err(fail("price has more than two decimal places"));
        }
        if self.price > Decimal::new(MAX_PRICE_CENTS, 2) {
            return Err(fail("price cannot exceed 99999999.99"));
        }

        Ok(BookImport {
            book_id: self.id,
            author: self.author,
            title: self.title,
            image: self.image.filter(|image| !image.is_empty()),
            quantity: self.quantity,
            price: self.price,
            description: self.description,
        })
    }
}

/// Parse and validate a catalog CSV.
///
/// # Errors
///
/// Returns `ImportError::MissingColumn` if the header lacks a required
/// column, `ImportError::Row` with the line number of the first bad row,
/// and `ImportError::Empty` if there are no data rows.
pub fn parse_catalog<R: Read>(input: R) -> Result<Vec<BookImport>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ImportError::MissingColumn(column));
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| match e.position() {
            Some(pos) => ImportError::Row {
                line: pos.line(),
                message: e.to_string(),
            },
            None => ImportError::Csv(e),
        })?;
        let line = record.position().map_or(0, csv::Position::line);

        let row: CsvRow = record
            .deserialize(Some(&headers))
            .map_err(|e| ImportError::Row {
                line,
                message: e.to_string(),
            })?;
        rows.push(row.validate(line)?);
    }

    if rows.is_empty() {
        return Err(ImportError::Empty);
    }
    Ok(rows)
}

// ==============================================================================
// parsers/mod.rs - File parser modules
// ==============================================================================
// Description: Parsers for summary-statistics and LD reference file formats
// Author: Matt Barham
// Created: 2026-08-10
// Modified: 2026-08-27
// Version: 1.0.0
// ==============================================================================

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

pub mod betaprod;
pub mod chisq;
pub mod ldscore;
pub mod mfile;

pub use betaprod::{BetaprodParseError, BetaprodParser, BetaprodRecord, BetaprodTable};
pub use chisq::{ChisqParseError, ChisqParser, ChisqRecord, ChisqTable};
pub use ldscore::{LdScoreParseError, LdScoreParser, LdScoreRow, LdScoreTable};
pub use mfile::{MFileParseError, MFileParser};

/// Open a text file for line-wise reading, transparently decompressing
/// when the path ends in `.gz`.
pub(crate) fn open_text(path: &Path) -> std::io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Parse a float field, mapping the usual missing-data markers to NaN so the
/// range checks can report them as missing rather than as malformed text.
pub(crate) fn parse_float_field(field: &str) -> Result<f64, std::num::ParseFloatError> {
    match field {
        "NA" | "N/A" | "NaN" | "nan" | "." => Ok(f64::NAN),
        _ => field.parse::<f64>(),
    }
}

/// Parse an integer field (sample sizes, effect directions).
pub(crate) fn parse_int_field(field: &str) -> Result<i64, std::num::ParseIntError> {
    field.parse::<i64>()
}

/// Resolve a reference-file path, falling back to the `.gz` variant when the
/// plain file does not exist.
pub(crate) fn resolve_with_gz(base: &str) -> Option<PathBuf> {
    let plain = PathBuf::from(base);
    if plain.is_file() {
        return Some(plain);
    }
    let gz = PathBuf::from(format!("{base}.gz"));
    if gz.is_file() {
        return Some(gz);
    }
    None
}

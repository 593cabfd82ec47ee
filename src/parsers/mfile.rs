// ==============================================================================
// mfile.rs - M File Parser
// ==============================================================================
// Description: Parser for .l2.M files (per-annotation SNP counts used as the
//              LD score regression denominator)
// Author: Matt Barham
// Created: 2026-08-10
// Modified: 2026-08-27
// Version: 1.0.0
// ==============================================================================
// Format: A single whitespace-delimited line of floats, one per annotation
// Example:
//   1173569.0
// ==============================================================================

use std::io::BufRead;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::parsers::{open_text, resolve_with_gz};

/// Errors that can occur during .l2.M file parsing
#[derive(Error, Debug)]
pub enum MFileParseError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("no M file found at {path} (or {path}.gz)")]
    FileNotFound { path: String },

    #[error("{path}: M file is empty")]
    EmptyFile { path: String },

    #[error("{path}: invalid M value '{value}'")]
    InvalidValue { path: String, value: String },

    #[error("{path}: expected {expected} M values, found {found}")]
    LengthMismatch {
        path: String,
        expected: usize,
        found: usize,
    },

    #[error("number of chromosomes must be at least 1")]
    NoChromosomes,
}

/// Parser for .l2.M files
pub struct MFileParser;

impl MFileParser {
    /// Parse a whole-genome M file `{stem}.l2.M[.gz]` into one count per
    /// annotation.
    pub fn parse(stem: &str) -> Result<Vec<f64>, MFileParseError> {
        let values = Self::parse_one(&format!("{stem}.l2.M"))?;
        info!("Loaded M file with {} annotations", values.len());
        Ok(values)
    }

    /// Parse per-chromosome M files `{stem}{chr}.l2.M[.gz]` for `chr` in
    /// `1..=num_chromosomes` and sum them element-wise. Every chunk must have
    /// the same number of annotations.
    pub fn parse_split(stem: &str, num_chromosomes: usize) -> Result<Vec<f64>, MFileParseError> {
        if num_chromosomes == 0 {
            return Err(MFileParseError::NoChromosomes);
        }

        let mut totals: Option<Vec<f64>> = None;
        for chr in 1..=num_chromosomes {
            let base = format!("{stem}{chr}.l2.M");
            let values = Self::parse_one(&base)?;
            match totals.as_mut() {
                None => totals = Some(values),
                Some(t) => {
                    if values.len() != t.len() {
                        return Err(MFileParseError::LengthMismatch {
                            path: base,
                            expected: t.len(),
                            found: values.len(),
                        });
                    }
                    for (total, value) in t.iter_mut().zip(values) {
                        *total += value;
                    }
                }
            }
        }

        // num_chromosomes >= 1, so totals is always set
        let totals = totals.ok_or(MFileParseError::NoChromosomes)?;
        info!(
            "Summed M files across {} chromosomes ({} annotations)",
            num_chromosomes,
            totals.len()
        );
        Ok(totals)
    }

    fn parse_one(base: &str) -> Result<Vec<f64>, MFileParseError> {
        let path = resolve_with_gz(base).ok_or_else(|| MFileParseError::FileNotFound {
            path: base.to_string(),
        })?;
        debug!("Reading M file: {}", path.display());

        let line = first_line(&path)?.ok_or_else(|| MFileParseError::EmptyFile {
            path: base.to_string(),
        })?;

        let values = line
            .split_whitespace()
            .map(|field| {
                field
                    .parse::<f64>()
                    .map_err(|_| MFileParseError::InvalidValue {
                        path: base.to_string(),
                        value: field.to_string(),
                    })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        if values.is_empty() {
            return Err(MFileParseError::EmptyFile {
                path: base.to_string(),
            });
        }
        Ok(values)
    }
}

fn first_line(path: &Path) -> Result<Option<String>, MFileParseError> {
    let reader = open_text(path)?;
    match reader.lines().next() {
        Some(line) => Ok(Some(line?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_parse_single_annotation() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("eur").display().to_string();
        fs::write(format!("{stem}.l2.M"), "1173569.0\n").unwrap();

        let values = MFileParser::parse(&stem).unwrap();
        assert_eq!(values, vec![1173569.0]);
    }

    #[test]
    fn test_parse_multiple_annotations() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("annot").display().to_string();
        fs::write(format!("{stem}.l2.M"), "1000.0 2500.5 40.0\n").unwrap();

        let values = MFileParser::parse(&stem).unwrap();
        assert_eq!(values, vec![1000.0, 2500.5, 40.0]);
    }

    #[test]
    fn test_parse_split_sums_elementwise() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("eur.").display().to_string();
        fs::write(format!("{stem}1.l2.M"), "100.0 10.0\n").unwrap();
        fs::write(format!("{stem}2.l2.M"), "200.0 20.0\n").unwrap();
        fs::write(format!("{stem}3.l2.M"), "300.0 30.0\n").unwrap();

        let values = MFileParser::parse_split(&stem, 3).unwrap();
        assert_eq!(values, vec![600.0, 60.0]);
    }

    #[test]
    fn test_parse_split_length_mismatch() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("eur.").display().to_string();
        fs::write(format!("{stem}1.l2.M"), "100.0 10.0\n").unwrap();
        fs::write(format!("{stem}2.l2.M"), "200.0\n").unwrap();

        let result = MFileParser::parse_split(&stem, 2);
        assert!(matches!(
            result.unwrap_err(),
            MFileParseError::LengthMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_missing_chunk() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("eur.").display().to_string();
        fs::write(format!("{stem}1.l2.M"), "100.0\n").unwrap();

        let result = MFileParser::parse_split(&stem, 2);
        assert!(matches!(
            result.unwrap_err(),
            MFileParseError::FileNotFound { .. }
        ));
    }

    #[test]
    fn test_parse_invalid_value() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("eur").display().to_string();
        fs::write(format!("{stem}.l2.M"), "100.0 abc\n").unwrap();

        let result = MFileParser::parse(&stem);
        match result.unwrap_err() {
            MFileParseError::InvalidValue { value, .. } => assert_eq!(value, "abc"),
            other => panic!("Expected InvalidValue error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_empty_file() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("eur").display().to_string();
        fs::write(format!("{stem}.l2.M"), "").unwrap();

        let result = MFileParser::parse(&stem);
        assert!(matches!(result.unwrap_err(), MFileParseError::EmptyFile { .. }));
    }

    #[test]
    fn test_parse_zero_chromosomes() {
        let result = MFileParser::parse_split("whatever", 0);
        assert!(matches!(result.unwrap_err(), MFileParseError::NoChromosomes));
    }
}

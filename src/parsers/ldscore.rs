// ==============================================================================
// ldscore.rs - LD Score Reference Table Parser
// ==============================================================================
// Description: Parser for .l2.ldscore files, whole-genome or split per
//              chromosome, plain or gzipped
// Author: Matt Barham
// Created: 2026-08-10
// Modified: 2026-08-27
// Version: 1.0.0
// ==============================================================================
// Format: Whitespace-delimited text with a header row. CHR/BP/CM/MAF are
//         positional metadata and are dropped; every column other than SNP
//         is an LD score column whose name is data-dependent.
// Example:
//   CHR SNP BP CM MAF L2
//   1 rs4040617 779322 0 0.23 2.266
//   1 rs4970383 838555 0 0.36 4.101
// ==============================================================================

use std::collections::HashSet;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::checks::{check_snp_ids, CheckError};
use crate::parsers::{open_text, parse_float_field};

// metadata columns stripped from every chunk
const DROPPED_COLUMNS: [&str; 4] = ["CHR", "BP", "CM", "MAF"];

/// One row of an LD score table
#[derive(Debug, Clone, PartialEq)]
pub struct LdScoreRow {
    pub snp: String,
    /// One value per entry in [`LdScoreTable::score_names`], in order
    pub scores: Vec<f64>,
}

/// LD score reference table
#[derive(Debug, Clone)]
pub struct LdScoreTable {
    /// Names of the LD score columns (e.g., `["L2"]`, or one per annotation)
    pub score_names: Vec<String>,
    pub rows: Vec<LdScoreRow>,
}

impl LdScoreTable {
    pub fn n_snps(&self) -> usize {
        self.rows.len()
    }

    pub fn n_scores(&self) -> usize {
        self.score_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows where `pred` holds for the named score column. Errors when the
    /// column does not exist.
    pub fn filter_by_score<F>(&self, name: &str, pred: F) -> Result<LdScoreTable, LdScoreParseError>
    where
        F: Fn(f64) -> bool,
    {
        let idx = self
            .score_names
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| LdScoreParseError::UnknownColumn(name.to_string()))?;

        Ok(LdScoreTable {
            score_names: self.score_names.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| pred(r.scores[idx]))
                .cloned()
                .collect(),
        })
    }

    /// Subset the table to SNPs in a reference set, preserving order.
    pub fn retain_snps(&mut self, keep: &HashSet<String>) {
        self.rows.retain(|r| keep.contains(&r.snp));
    }
}

/// Errors that can occur during .l2.ldscore parsing
#[derive(Error, Debug)]
pub enum LdScoreParseError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("no ldscore file found at {path} (or {path}.gz)")]
    FileNotFound { path: String },

    #[error("{path}: file is empty or contains no data rows")]
    EmptyFile { path: String },

    #[error("{path}: cannot find a column named SNP")]
    MissingSnpColumn { path: String },

    #[error("{path}: LD score columns do not match the first chromosome chunk")]
    ColumnMismatch { path: String },

    #[error("{path}: wrong number of fields at line {line}: expected {expected}, found {found}")]
    ColumnCount {
        path: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{path}: invalid value in column {column} at line {line}: '{value}'")]
    InvalidValue {
        path: String,
        line: usize,
        column: String,
        value: String,
    },

    #[error("number of chromosomes must be at least 1")]
    NoChromosomes,

    #[error("unknown LD score column '{0}'")]
    UnknownColumn(String),

    #[error(transparent)]
    Check(#[from] CheckError),
}

/// Parser for .l2.ldscore reference files
pub struct LdScoreParser;

impl LdScoreParser {
    /// Parse a whole-genome LD score file `{stem}.l2.ldscore[.gz]`.
    ///
    /// Rows whose SNP identifier is `.` are dropped; duplicate identifiers
    /// among the remaining rows are an error.
    pub fn parse(stem: &str) -> Result<LdScoreTable, LdScoreParseError> {
        Self::parse_chunks(vec![format!("{stem}.l2.ldscore")])
    }

    /// Parse per-chromosome LD score files `{stem}{chr}.l2.ldscore[.gz]` for
    /// `chr` in `1..=num_chromosomes` and concatenate them. Every chunk must
    /// carry the same LD score columns.
    pub fn parse_split(
        stem: &str,
        num_chromosomes: usize,
    ) -> Result<LdScoreTable, LdScoreParseError> {
        if num_chromosomes == 0 {
            return Err(LdScoreParseError::NoChromosomes);
        }
        let chunks = (1..=num_chromosomes)
            .map(|chr| format!("{stem}{chr}.l2.ldscore"))
            .collect();
        Self::parse_chunks(chunks)
    }

    fn parse_chunks(chunks: Vec<String>) -> Result<LdScoreTable, LdScoreParseError> {
        let mut table: Option<LdScoreTable> = None;

        for chunk in chunks {
            let path = resolve_path(&chunk)?;
            let (score_names, rows) = Self::parse_one(&path)?;

            match table.as_mut() {
                None => table = Some(LdScoreTable { score_names, rows }),
                Some(t) => {
                    if t.score_names != score_names {
                        return Err(LdScoreParseError::ColumnMismatch {
                            path: path.display().to_string(),
                        });
                    }
                    t.rows.extend(rows);
                }
            }
        }

        // parse_chunks is never called with an empty list
        let table = table.ok_or(LdScoreParseError::NoChromosomes)?;
        check_snp_ids(table.rows.iter().map(|r| r.snp.as_str()))?;

        info!(
            "Loaded {} SNPs x {} LD score columns",
            table.n_snps(),
            table.n_scores()
        );
        Ok(table)
    }

    fn parse_one(path: &Path) -> Result<(Vec<String>, Vec<LdScoreRow>), LdScoreParseError> {
        let path_str = path.display().to_string();
        debug!("Reading ldscore chunk: {path_str}");

        let reader = open_text(path)?;
        let mut lines = reader.lines();

        let header = lines.next().ok_or_else(|| LdScoreParseError::EmptyFile {
            path: path_str.clone(),
        })??;
        let names: Vec<&str> = header.split_whitespace().collect();

        let snp_idx = names.iter().position(|&c| c == "SNP").ok_or_else(|| {
            LdScoreParseError::MissingSnpColumn {
                path: path_str.clone(),
            }
        })?;
        let score_cols: Vec<(usize, String)> = names
            .iter()
            .enumerate()
            .filter(|&(idx, name)| idx != snp_idx && !DROPPED_COLUMNS.contains(name))
            .map(|(idx, name)| (idx, name.to_string()))
            .collect();

        let mut rows = Vec::new();
        let mut data_lines = 0usize;
        let mut dropped_dots = 0usize;

        for (idx, line_result) in lines.enumerate() {
            let line_number = idx + 2;
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            data_lines += 1;

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != names.len() {
                return Err(LdScoreParseError::ColumnCount {
                    path: path_str.clone(),
                    line: line_number,
                    expected: names.len(),
                    found: fields.len(),
                });
            }

            // untyped placeholder rows are tolerated here, unlike sumstats
            if fields[snp_idx] == "." {
                dropped_dots += 1;
                continue;
            }

            let mut scores = Vec::with_capacity(score_cols.len());
            for (col_idx, col_name) in &score_cols {
                let value = parse_float_field(fields[*col_idx]).map_err(|_| {
                    LdScoreParseError::InvalidValue {
                        path: path_str.clone(),
                        line: line_number,
                        column: col_name.clone(),
                        value: fields[*col_idx].to_string(),
                    }
                })?;
                scores.push(value);
            }

            rows.push(LdScoreRow {
                snp: fields[snp_idx].to_string(),
                scores,
            });
        }

        if data_lines == 0 {
            return Err(LdScoreParseError::EmptyFile { path: path_str });
        }
        if dropped_dots > 0 {
            debug!("{path_str}: dropped {dropped_dots} rows with SNP id '.'");
        }

        Ok((score_cols.into_iter().map(|(_, name)| name).collect(), rows))
    }
}

fn resolve_path(base: &str) -> Result<PathBuf, LdScoreParseError> {
    crate::parsers::resolve_with_gz(base).ok_or_else(|| LdScoreParseError::FileNotFound {
        path: base.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(path: &Path, contents: &str) {
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_parse_drops_metadata_columns() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("eur").display().to_string();
        write_file(
            Path::new(&format!("{stem}.l2.ldscore")),
            "\
CHR SNP BP CM MAF L2
1 rs1 779322 0 0.23 2.266
1 rs2 838555 0 0.36 4.101
",
        );

        let table = LdScoreParser::parse(&stem).unwrap();
        assert_eq!(table.score_names, vec!["L2".to_string()]);
        assert_eq!(table.n_snps(), 2);
        assert_eq!(table.rows[0].snp, "rs1");
        assert_eq!(table.rows[0].scores, vec![2.266]);
        assert_eq!(table.rows[1].scores, vec![4.101]);
    }

    #[test]
    fn test_parse_dot_snp_rows_dropped() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("eur").display().to_string();
        write_file(
            Path::new(&format!("{stem}.l2.ldscore")),
            "\
SNP L2
rs1 2.0
. 3.0
rs2 4.0
",
        );

        let table = LdScoreParser::parse(&stem).unwrap();
        assert_eq!(table.n_snps(), 2);
        assert_eq!(table.rows[1].snp, "rs2");
    }

    #[test]
    fn test_parse_duplicate_snp_rejected() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("eur").display().to_string();
        write_file(
            Path::new(&format!("{stem}.l2.ldscore")),
            "\
SNP L2
rs1 2.0
rs1 4.0
",
        );

        let result = LdScoreParser::parse(&stem);
        assert!(matches!(
            result.unwrap_err(),
            LdScoreParseError::Check(CheckError::DuplicateSnpId { .. })
        ));
    }

    #[test]
    fn test_parse_split_concatenates() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("eur.").display().to_string();
        write_file(
            Path::new(&format!("{stem}1.l2.ldscore")),
            "\
CHR SNP BP CM MAF L2
1 rs1 100 0 0.2 1.0
1 rs2 200 0 0.3 2.0
",
        );
        write_file(
            Path::new(&format!("{stem}2.l2.ldscore")),
            "\
CHR SNP BP CM MAF L2
2 rs3 100 0 0.4 3.0
",
        );

        let table = LdScoreParser::parse_split(&stem, 2).unwrap();
        assert_eq!(table.n_snps(), 3);
        assert_eq!(table.rows[2].snp, "rs3");
        assert_eq!(table.rows[2].scores, vec![3.0]);
    }

    #[test]
    fn test_parse_split_column_mismatch() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("eur.").display().to_string();
        write_file(
            Path::new(&format!("{stem}1.l2.ldscore")),
            "SNP L2\nrs1 1.0\n",
        );
        write_file(
            Path::new(&format!("{stem}2.l2.ldscore")),
            "SNP L2A L2B\nrs2 1.0 2.0\n",
        );

        let result = LdScoreParser::parse_split(&stem, 2);
        assert!(matches!(
            result.unwrap_err(),
            LdScoreParseError::ColumnMismatch { .. }
        ));
    }

    #[test]
    fn test_parse_gzipped_fallback() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("eur").display().to_string();
        let gz_path = format!("{stem}.l2.ldscore.gz");

        let file = fs::File::create(&gz_path).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        write!(encoder, "SNP L2\nrs1 2.5\n").unwrap();
        encoder.finish().unwrap();

        let table = LdScoreParser::parse(&stem).unwrap();
        assert_eq!(table.n_snps(), 1);
        assert_eq!(table.rows[0].scores, vec![2.5]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("nope").display().to_string();
        let result = LdScoreParser::parse(&stem);
        assert!(matches!(
            result.unwrap_err(),
            LdScoreParseError::FileNotFound { .. }
        ));
    }

    #[test]
    fn test_multiple_score_columns() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("annot").display().to_string();
        write_file(
            Path::new(&format!("{stem}.l2.ldscore")),
            "\
CHR SNP BP L2_coding L2_intron
1 rs1 100 1.5 0.5
1 rs2 200 2.5 1.5
",
        );

        let table = LdScoreParser::parse(&stem).unwrap();
        assert_eq!(
            table.score_names,
            vec!["L2_coding".to_string(), "L2_intron".to_string()]
        );
        assert_eq!(table.rows[1].scores, vec![2.5, 1.5]);
    }

    #[test]
    fn test_filter_by_score() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("eur").display().to_string();
        write_file(
            Path::new(&format!("{stem}.l2.ldscore")),
            "\
SNP L2
rs1 1.0
rs2 -0.5
rs3 3.0
",
        );

        let table = LdScoreParser::parse(&stem).unwrap();
        let positive = table.filter_by_score("L2", |v| v >= 0.0).unwrap();
        assert_eq!(positive.n_snps(), 2);
        assert_eq!(positive.rows[1].snp, "rs3");

        let result = table.filter_by_score("L3", |_| true);
        assert!(matches!(
            result.unwrap_err(),
            LdScoreParseError::UnknownColumn(name) if name == "L3"
        ));
    }

    #[test]
    fn test_retain_snps() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("eur").display().to_string();
        write_file(
            Path::new(&format!("{stem}.l2.ldscore")),
            "SNP L2\nrs1 1.0\nrs2 2.0\n",
        );

        let mut table = LdScoreParser::parse(&stem).unwrap();
        let keep: HashSet<String> = std::iter::once("rs2".to_string()).collect();
        table.retain_snps(&keep);
        assert_eq!(table.n_snps(), 1);
        assert_eq!(table.rows[0].snp, "rs2");
    }
}

// ==============================================================================
// chisq.rs - Single-Phenotype Summary Statistics Parser
// ==============================================================================
// Description: Parser for .chisq association summary-statistics files
// Author: Matt Barham
// Created: 2026-08-10
// Modified: 2026-08-27
// Version: 1.0.0
// ==============================================================================
// Format: Whitespace-delimited text with a header row
// Example:
//   SNP CHR BP P N MAF
//   rs4040617 1 779322 0.45 45000 0.23
//   rs4970383 1 838555 0.02 45000 0.36
// ==============================================================================

use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::checks::{
    check_chi_square, check_maf, check_p_values, check_sample_size, check_snp_ids, CheckError,
};
use crate::parsers::{open_text, parse_float_field, parse_int_field};
use crate::stats::chi_square_from_p;

/// One cleaned row of a .chisq file
#[derive(Debug, Clone, PartialEq)]
pub struct ChisqRecord {
    /// SNP identifier (e.g., "rs4040617")
    pub snp: String,
    /// 1-df chi-square association statistic (converted from P when the
    /// file carries a P column)
    pub chisq: f64,
    /// Sample size, as float for downstream division
    pub n: f64,
    /// Minor allele frequency, folded to min(maf, 1 - maf)
    pub maf: Option<f64>,
    /// Imputation quality score
    pub info: Option<f64>,
}

/// Cleaned .chisq table handed to the regression layer
#[derive(Debug, Clone)]
pub struct ChisqTable {
    pub records: Vec<ChisqRecord>,
}

impl ChisqTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Subset the table to SNPs in a reference set, preserving order.
    pub fn retain_snps(&mut self, keep: &HashSet<String>) {
        self.records.retain(|r| keep.contains(&r.snp));
    }

    /// Mean chi-square across all SNPs (None for an empty table).
    pub fn mean_chisq(&self) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        let sum: f64 = self.records.iter().map(|r| r.chisq).sum();
        Some(sum / self.records.len() as f64)
    }
}

/// Errors that can occur during .chisq file parsing
#[derive(Error, Debug)]
pub enum ChisqParseError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("file is empty or contains no data rows")]
    EmptyFile,

    #[error("cannot find a column named {0}")]
    MissingColumn(&'static str),

    #[error("chisq file must have a column labeled either P or CHISQ")]
    MissingStatColumn,

    #[error("wrong number of fields at line {line}: expected {expected}, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid value in column {column} at line {line}: '{value}'")]
    InvalidValue {
        line: usize,
        column: String,
        value: String,
    },

    #[error(transparent)]
    Check(#[from] CheckError),
}

// column positions resolved from the header, plus which statistic we got
struct Layout {
    n_fields: usize,
    snp: usize,
    n: usize,
    stat: usize,
    stat_is_p: bool,
    maf: Option<usize>,
    info: Option<usize>,
}

struct RawRow {
    snp: String,
    stat: f64,
    n: i64,
    maf: Option<f64>,
    info: Option<f64>,
}

/// Parser for .chisq summary-statistics files
pub struct ChisqParser;

impl ChisqParser {
    /// Parse and validate a .chisq file.
    ///
    /// # Arguments
    /// * `path` - Path to the file; `.gz` input is decompressed transparently
    ///
    /// # Returns
    /// * `Ok(ChisqTable)` - Cleaned table, association statistic on the
    ///   chi-square scale
    /// * `Err(ChisqParseError)` - First type, range, or format error found
    ///
    /// # Columns
    /// `SNP` and `N` are required. Exactly one of `P` / `CHISQ` supplies the
    /// association statistic; when both are present `P` wins and is converted
    /// via the inverse chi-square CDF. `MAF` (folded to the minor allele) and
    /// `INFO` are carried through when present. Any other column (`CHR`,
    /// `BP`, `CM`, ...) is ignored.
    pub fn parse(path: impl AsRef<Path>) -> Result<ChisqTable, ChisqParseError> {
        let path = path.as_ref();
        info!("Parsing chisq file: {}", path.display());

        let reader = open_text(path)?;
        let mut lines = reader.lines();

        let header = lines.next().ok_or(ChisqParseError::EmptyFile)??;
        let layout = Self::resolve_layout(&header)?;
        debug!(
            "Resolved columns: stat from {}, MAF {}, INFO {}",
            if layout.stat_is_p { "P" } else { "CHISQ" },
            layout.maf.is_some(),
            layout.info.is_some()
        );

        let mut rows = Vec::new();
        for (idx, line_result) in lines.enumerate() {
            let line_number = idx + 2; // line 1 is the header
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            rows.push(Self::parse_row(&line, line_number, &layout)?);
        }

        if rows.is_empty() {
            return Err(ChisqParseError::EmptyFile);
        }

        check_sample_size(rows.iter().map(|r| r.n))?;
        check_snp_ids(rows.iter().map(|r| r.snp.as_str()))?;
        if layout.maf.is_some() {
            check_maf(rows.iter().filter_map(|r| r.maf))?;
        }
        if layout.stat_is_p {
            check_p_values(rows.iter().map(|r| r.stat))?;
        } else {
            check_chi_square(rows.iter().map(|r| r.stat))?;
        }

        let records = rows
            .into_iter()
            .map(|r| ChisqRecord {
                snp: r.snp,
                chisq: if layout.stat_is_p {
                    chi_square_from_p(r.stat)
                } else {
                    r.stat
                },
                n: r.n as f64,
                maf: r.maf.map(|m| m.min(1.0 - m)),
                info: r.info,
            })
            .collect::<Vec<_>>();

        info!("Parsed {} SNPs from {}", records.len(), path.display());
        Ok(ChisqTable { records })
    }

    fn resolve_layout(header: &str) -> Result<Layout, ChisqParseError> {
        let names: Vec<&str> = header.split_whitespace().collect();
        if names.is_empty() {
            return Err(ChisqParseError::EmptyFile);
        }
        let col = |name: &str| names.iter().position(|&c| c == name);

        let snp = col("SNP").ok_or(ChisqParseError::MissingColumn("SNP"))?;
        let n = col("N").ok_or(ChisqParseError::MissingColumn("N"))?;
        let (stat, stat_is_p) = match (col("P"), col("CHISQ")) {
            (Some(p), _) => (p, true),
            (None, Some(chisq)) => (chisq, false),
            (None, None) => return Err(ChisqParseError::MissingStatColumn),
        };

        Ok(Layout {
            n_fields: names.len(),
            snp,
            n,
            stat,
            stat_is_p,
            maf: col("MAF"),
            info: col("INFO"),
        })
    }

    fn parse_row(line: &str, line_number: usize, layout: &Layout) -> Result<RawRow, ChisqParseError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != layout.n_fields {
            return Err(ChisqParseError::ColumnCount {
                line: line_number,
                expected: layout.n_fields,
                found: fields.len(),
            });
        }

        let float_at = |idx: usize, column: &str| {
            parse_float_field(fields[idx]).map_err(|_| ChisqParseError::InvalidValue {
                line: line_number,
                column: column.to_string(),
                value: fields[idx].to_string(),
            })
        };

        let stat_name = if layout.stat_is_p { "P" } else { "CHISQ" };
        Ok(RawRow {
            snp: fields[layout.snp].to_string(),
            stat: float_at(layout.stat, stat_name)?,
            n: parse_int_field(fields[layout.n]).map_err(|_| ChisqParseError::InvalidValue {
                line: line_number,
                column: "N".to_string(),
                value: fields[layout.n].to_string(),
            })?,
            maf: layout.maf.map(|idx| float_at(idx, "MAF")).transpose()?,
            info: layout.info.map(|idx| float_at(idx, "INFO")).transpose()?,
        })
    }
}

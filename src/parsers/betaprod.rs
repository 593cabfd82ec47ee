// ==============================================================================
// betaprod.rs - Two-Phenotype Summary Statistics Parser
// ==============================================================================
// Description: Parser for .betaprod files (genetic-covariance regression input)
// Author: Matt Barham
// Created: 2026-08-10
// Modified: 2026-08-27
// Version: 1.0.0
// ==============================================================================
// Format: Whitespace-delimited text with a header row; per-phenotype columns
//         carry a 1 or 2 suffix
// Example:
//   SNP P1 DIR1 N1 P2 DIR2 N2
//   rs4040617 0.45 1 45000 0.12 -1 32000
// ==============================================================================

use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::checks::{
    check_chi_square, check_direction, check_maf, check_p_values, check_sample_size,
    check_snp_ids, CheckError,
};
use crate::parsers::{open_text, parse_float_field, parse_int_field};
use crate::stats::{chi_square_from_p, signed_effect};

/// One cleaned row of a .betaprod file. Direction columns are consumed by the
/// signed-effect transform and do not appear in the output.
#[derive(Debug, Clone, PartialEq)]
pub struct BetaprodRecord {
    pub snp: String,
    /// Signed effect-size estimate for phenotype 1: sqrt(chisq1 / n1) * dir1
    pub betahat1: f64,
    pub n1: f64,
    pub maf1: Option<f64>,
    pub info1: Option<f64>,
    /// Signed effect-size estimate for phenotype 2
    pub betahat2: f64,
    pub n2: f64,
    pub maf2: Option<f64>,
    pub info2: Option<f64>,
}

/// Cleaned .betaprod table
#[derive(Debug, Clone)]
pub struct BetaprodTable {
    pub records: Vec<BetaprodRecord>,
}

impl BetaprodTable {
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
}

/// Errors that can occur during .betaprod file parsing
#[derive(Error, Debug)]
pub enum BetaprodParseError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("file is empty or contains no data rows")]
    EmptyFile,

    #[error("cannot find a column named {0}")]
    MissingColumn(String),

    #[error("no column named P{pheno} or CHISQ{pheno} in betaprod file")]
    MissingStatColumn { pheno: usize },

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

    #[error("phenotype {pheno}: {source}")]
    Check {
        pheno: usize,
        #[source]
        source: CheckError,
    },

    #[error(transparent)]
    SnpCheck(#[from] CheckError),
}

// header positions for one phenotype's column group
struct PhenoLayout {
    dir: usize,
    n: usize,
    stat: usize,
    stat_is_chisq: bool,
    maf: Option<usize>,
    info: Option<usize>,
}

struct Layout {
    n_fields: usize,
    snp: usize,
    phenos: [PhenoLayout; 2],
}

#[derive(Default, Clone)]
struct RawPheno {
    dir: i64,
    n: i64,
    stat: f64,
    maf: Option<f64>,
    info: Option<f64>,
}

struct RawRow {
    snp: String,
    phenos: [RawPheno; 2],
}

/// Parser for .betaprod summary-statistics files
pub struct BetaprodParser;

impl BetaprodParser {
    /// Parse and validate a .betaprod file.
    ///
    /// # Arguments
    /// * `path` - Path to the file; `.gz` input is decompressed transparently
    ///
    /// # Returns
    /// * `Ok(BetaprodTable)` - Cleaned table with per-phenotype signed
    ///   effect-size estimates
    /// * `Err(BetaprodParseError)` - First type, range, or format error found
    ///
    /// # Columns
    /// `SNP` is required. For each phenotype i in {1, 2}: `DIRi` (+1/-1) and
    /// `Ni` are required, and one of `CHISQi` / `Pi` supplies the statistic
    /// (`CHISQi` wins when both are present; `Pi` is converted via the
    /// inverse chi-square CDF first). `MAFi` (folded) and `INFOi` are
    /// optional.
    pub fn parse(path: impl AsRef<Path>) -> Result<BetaprodTable, BetaprodParseError> {
        let path = path.as_ref();
        info!("Parsing betaprod file: {}", path.display());

        let reader = open_text(path)?;
        let mut lines = reader.lines();

        let header = lines.next().ok_or(BetaprodParseError::EmptyFile)??;
        let layout = Self::resolve_layout(&header)?;

        let mut rows = Vec::new();
        for (idx, line_result) in lines.enumerate() {
            let line_number = idx + 2;
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            rows.push(Self::parse_row(&line, line_number, &layout)?);
        }

        if rows.is_empty() {
            return Err(BetaprodParseError::EmptyFile);
        }

        check_snp_ids(rows.iter().map(|r| r.snp.as_str()))?;

        for (i, pheno) in layout.phenos.iter().enumerate() {
            let pheno_number = i + 1;
            let with_pheno = |source: CheckError| BetaprodParseError::Check {
                pheno: pheno_number,
                source,
            };

            check_sample_size(rows.iter().map(|r| r.phenos[i].n)).map_err(with_pheno)?;
            check_direction(rows.iter().map(|r| r.phenos[i].dir)).map_err(with_pheno)?;
            if pheno.stat_is_chisq {
                check_chi_square(rows.iter().map(|r| r.phenos[i].stat)).map_err(with_pheno)?;
            } else {
                check_p_values(rows.iter().map(|r| r.phenos[i].stat)).map_err(with_pheno)?;
            }
            if pheno.maf.is_some() {
                check_maf(rows.iter().filter_map(|r| r.phenos[i].maf)).map_err(with_pheno)?;
            }
            debug!(
                "Phenotype {}: statistic from {}",
                pheno_number,
                if pheno.stat_is_chisq { "CHISQ" } else { "P" }
            );
        }

        let records = rows
            .into_iter()
            .map(|r| {
                let betahat = |raw: &RawPheno, layout: &PhenoLayout| {
                    let chisq = if layout.stat_is_chisq {
                        raw.stat
                    } else {
                        chi_square_from_p(raw.stat)
                    };
                    signed_effect(chisq, raw.n as f64, raw.dir)
                };
                BetaprodRecord {
                    betahat1: betahat(&r.phenos[0], &layout.phenos[0]),
                    n1: r.phenos[0].n as f64,
                    maf1: r.phenos[0].maf.map(|m| m.min(1.0 - m)),
                    info1: r.phenos[0].info,
                    betahat2: betahat(&r.phenos[1], &layout.phenos[1]),
                    n2: r.phenos[1].n as f64,
                    maf2: r.phenos[1].maf.map(|m| m.min(1.0 - m)),
                    info2: r.phenos[1].info,
                    snp: r.snp,
                }
            })
            .collect::<Vec<_>>();

        info!("Parsed {} SNPs from {}", records.len(), path.display());
        Ok(BetaprodTable { records })
    }

    fn resolve_layout(header: &str) -> Result<Layout, BetaprodParseError> {
        let names: Vec<&str> = header.split_whitespace().collect();
        if names.is_empty() {
            return Err(BetaprodParseError::EmptyFile);
        }
        let col = |name: &str| names.iter().position(|&c| c == name);

        let snp = col("SNP")
            .ok_or_else(|| BetaprodParseError::MissingColumn("SNP".to_string()))?;

        let pheno_layout = |pheno: usize| -> Result<PhenoLayout, BetaprodParseError> {
            let named = |base: &str| format!("{base}{pheno}");
            let dir = col(&named("DIR"))
                .ok_or_else(|| BetaprodParseError::MissingColumn(named("DIR")))?;
            let n =
                col(&named("N")).ok_or_else(|| BetaprodParseError::MissingColumn(named("N")))?;
            let (stat, stat_is_chisq) = match (col(&named("CHISQ")), col(&named("P"))) {
                (Some(chisq), _) => (chisq, true),
                (None, Some(p)) => (p, false),
                (None, None) => return Err(BetaprodParseError::MissingStatColumn { pheno }),
            };
            Ok(PhenoLayout {
                dir,
                n,
                stat,
                stat_is_chisq,
                maf: col(&named("MAF")),
                info: col(&named("INFO")),
            })
        };

        Ok(Layout {
            n_fields: names.len(),
            snp,
            phenos: [pheno_layout(1)?, pheno_layout(2)?],
        })
    }

    fn parse_row(
        line: &str,
        line_number: usize,
        layout: &Layout,
    ) -> Result<RawRow, BetaprodParseError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != layout.n_fields {
            return Err(BetaprodParseError::ColumnCount {
                line: line_number,
                expected: layout.n_fields,
                found: fields.len(),
            });
        }

        let invalid = |column: String, idx: usize| BetaprodParseError::InvalidValue {
            line: line_number,
            column,
            value: fields[idx].to_string(),
        };
        let float_at = |idx: usize, column: String| {
            parse_float_field(fields[idx]).map_err(|_| invalid(column, idx))
        };
        let int_at = |idx: usize, column: String| {
            parse_int_field(fields[idx]).map_err(|_| invalid(column, idx))
        };

        let mut phenos: [RawPheno; 2] = Default::default();
        for (i, pheno) in layout.phenos.iter().enumerate() {
            let pheno_number = i + 1;
            let named = |base: &str| format!("{base}{pheno_number}");
            let stat_name = if pheno.stat_is_chisq {
                named("CHISQ")
            } else {
                named("P")
            };
            phenos[i] = RawPheno {
                dir: int_at(pheno.dir, named("DIR"))?,
                n: int_at(pheno.n, named("N"))?,
                stat: float_at(pheno.stat, stat_name)?,
                maf: pheno
                    .maf
                    .map(|idx| float_at(idx, named("MAF")))
                    .transpose()?,
                info: pheno
                    .info
                    .map(|idx| float_at(idx, named("INFO")))
                    .transpose()?,
            };
        }

        Ok(RawRow {
            snp: fields[layout.snp].to_string(),
            phenos,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_chisq_columns() {
        let contents = "\
SNP CHISQ1 DIR1 N1 CHISQ2 DIR2 N2
rs1 4.0 1 10000 9.0 -1 40000
rs2 1.0 -1 10000 0.0 1 40000
";
        let file = create_test_file(contents);
        let table = BetaprodParser::parse(file.path()).unwrap();

        assert_eq!(table.len(), 2);
        // betahat = sqrt(chisq / n) * dir
        assert!((table.records[0].betahat1 - 0.02).abs() < 1e-12);
        assert!((table.records[0].betahat2 - (-0.015)).abs() < 1e-12);
        assert!((table.records[1].betahat1 - (-0.01)).abs() < 1e-12);
        assert_eq!(table.records[1].betahat2, 0.0);
        assert_eq!(table.records[0].n1, 10000.0);
        assert_eq!(table.records[0].n2, 40000.0);
    }

    #[test]
    fn test_parse_p_columns_converted() {
        let contents = "\
SNP P1 DIR1 N1 P2 DIR2 N2 MAF1
rs1 0.05 -1 40000 1.0 1 40000 0.9
";
        let file = create_test_file(contents);
        let table = BetaprodParser::parse(file.path()).unwrap();

        let expected = -(3.841458820694124f64 / 40000.0).sqrt();
        assert!((table.records[0].betahat1 - expected).abs() < 1e-12);
        // P2 = 1 -> chisq 0 -> betahat 0
        assert_eq!(table.records[0].betahat2, 0.0);
        // MAF folded; phenotype 2 has no MAF column
        assert!((table.records[0].maf1.unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(table.records[0].maf2, None);
    }

    #[test]
    fn test_chisq_wins_over_p() {
        let contents = "\
SNP CHISQ1 P1 DIR1 N1 CHISQ2 DIR2 N2
rs1 4.0 0.9 1 10000 1.0 1 10000
";
        let file = create_test_file(contents);
        let table = BetaprodParser::parse(file.path()).unwrap();

        // CHISQ1 = 4 is used directly; P1 is ignored
        assert!((table.records[0].betahat1 - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_bad_direction() {
        let contents = "\
SNP CHISQ1 DIR1 N1 CHISQ2 DIR2 N2
rs1 4.0 1 10000 1.0 0 10000
";
        let file = create_test_file(contents);
        let result = BetaprodParser::parse(file.path());
        match result.unwrap_err() {
            BetaprodParseError::Check { pheno, source } => {
                assert_eq!(pheno, 2);
                assert_eq!(source, CheckError::BadDirection { row: 0, value: 0 });
            }
            other => panic!("Expected direction check error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_dir_column() {
        let contents = "\
SNP CHISQ1 N1 CHISQ2 DIR2 N2
rs1 4.0 10000 1.0 1 10000
";
        let file = create_test_file(contents);
        let result = BetaprodParser::parse(file.path());
        match result.unwrap_err() {
            BetaprodParseError::MissingColumn(name) => assert_eq!(name, "DIR1"),
            other => panic!("Expected MissingColumn error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_stat_column_for_second_phenotype() {
        let contents = "\
SNP CHISQ1 DIR1 N1 DIR2 N2
rs1 4.0 1 10000 1 10000
";
        let file = create_test_file(contents);
        let result = BetaprodParser::parse(file.path());
        assert!(matches!(
            result.unwrap_err(),
            BetaprodParseError::MissingStatColumn { pheno: 2 }
        ));
    }

    #[test]
    fn test_fractional_direction_rejected() {
        let contents = "\
SNP CHISQ1 DIR1 N1 CHISQ2 DIR2 N2
rs1 4.0 0.5 10000 1.0 1 10000
";
        let file = create_test_file(contents);
        let result = BetaprodParser::parse(file.path());
        match result.unwrap_err() {
            BetaprodParseError::InvalidValue { column, value, .. } => {
                assert_eq!(column, "DIR1");
                assert_eq!(value, "0.5");
            }
            other => panic!("Expected InvalidValue error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_snp_rejected() {
        let contents = "\
SNP CHISQ1 DIR1 N1 CHISQ2 DIR2 N2
rs1 4.0 1 10000 1.0 1 10000
rs1 2.0 1 10000 1.0 1 10000
";
        let file = create_test_file(contents);
        let result = BetaprodParser::parse(file.path());
        assert!(matches!(
            result.unwrap_err(),
            BetaprodParseError::SnpCheck(CheckError::DuplicateSnpId { .. })
        ));
    }

    #[test]
    fn test_retain_snps() {
        let contents = "\
SNP CHISQ1 DIR1 N1 CHISQ2 DIR2 N2
rs1 4.0 1 10000 1.0 1 10000
rs2 2.0 1 10000 1.0 1 10000
";
        let file = create_test_file(contents);
        let mut table = BetaprodParser::parse(file.path()).unwrap();

        let keep: HashSet<String> = std::iter::once("rs2".to_string()).collect();
        table.retain_snps(&keep);
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].snp, "rs2");
    }
}

// ==============================================================================
// checks.rs - Column Sanity Checks
// ==============================================================================
// Description: Range and sanity checks shared by all summary-statistics parsers
// Author: Matt Barham
// Created: 2026-08-10
// Modified: 2026-08-27
// Version: 1.0.0
// ==============================================================================
// Policy: fail on the first invalid value found; no partial acceptance.
// Type errors (non-numeric text in a numeric column) are caught earlier, at
// field parse time. These checks catch values that parsed fine but make no
// statistical sense.
// ==============================================================================

use std::collections::HashSet;
use thiserror::Error;

/// Errors raised by column sanity checks
#[derive(Error, Debug, PartialEq)]
pub enum CheckError {
    #[error("DIR entry not equal to +/- 1 at row {row}: {value}")]
    BadDirection { row: usize, value: i64 },

    #[error("SNP identifier set to . (a dot) at row {row}")]
    DotSnpId { row: usize },

    #[error("duplicated SNP identifier '{id}' at row {row}")]
    DuplicateSnpId { row: usize, id: String },

    #[error("missing P-value at row {row}")]
    MissingPValue { row: usize },

    #[error("P-value > 1 at row {row}: {value}")]
    PValueAboveOne { row: usize, value: f64 },

    #[error("P-value <= 0 at row {row}: {value}")]
    PValueNotPositive { row: usize, value: f64 },

    #[error("missing chi-square statistic at row {row}")]
    MissingChiSquare { row: usize },

    #[error("infinite chi-square statistic at row {row}")]
    InfiniteChiSquare { row: usize },

    #[error("negative chi-square statistic at row {row}: {value}")]
    NegativeChiSquare { row: usize, value: f64 },

    #[error("missing MAF at row {row}")]
    MissingMaf { row: usize },

    #[error("MAF >= 1 at row {row}: {value}")]
    MafTooHigh { row: usize, value: f64 },

    #[error("MAF <= 0 at row {row}: {value}")]
    MafTooLow { row: usize, value: f64 },

    #[error("negative sample size at row {row}: {value}")]
    NegativeSampleSize { row: usize, value: i64 },
}

/// Check that effect directions are exactly +1 or -1.
///
/// Nonsense values (text, fractions) are caught earlier by coercion to int.
pub fn check_direction<I>(directions: I) -> Result<(), CheckError>
where
    I: IntoIterator<Item = i64>,
{
    for (row, dir) in directions.into_iter().enumerate() {
        if dir != 1 && dir != -1 {
            return Err(CheckError::BadDirection { row, value: dir });
        }
    }
    Ok(())
}

/// Check that SNP identifiers are sensible: no `.` placeholders, no duplicates.
pub fn check_snp_ids<'a, I>(ids: I) -> Result<(), CheckError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for (row, id) in ids.into_iter().enumerate() {
        if id == "." {
            return Err(CheckError::DotSnpId { row });
        }
        if !seen.insert(id) {
            return Err(CheckError::DuplicateSnpId {
                row,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

/// Check that P-values lie in (0, 1] and that none are missing.
pub fn check_p_values<I>(p_values: I) -> Result<(), CheckError>
where
    I: IntoIterator<Item = f64>,
{
    for (row, p) in p_values.into_iter().enumerate() {
        if p.is_nan() {
            return Err(CheckError::MissingPValue { row });
        }
        if p > 1.0 {
            return Err(CheckError::PValueAboveOne { row, value: p });
        }
        if p <= 0.0 {
            return Err(CheckError::PValueNotPositive { row, value: p });
        }
    }
    Ok(())
}

/// Check that chi-square statistics lie in [0, inf) and that none are missing.
pub fn check_chi_square<I>(stats: I) -> Result<(), CheckError>
where
    I: IntoIterator<Item = f64>,
{
    for (row, chisq) in stats.into_iter().enumerate() {
        if chisq.is_nan() {
            return Err(CheckError::MissingChiSquare { row });
        }
        if chisq.is_infinite() {
            return Err(CheckError::InfiniteChiSquare { row });
        }
        if chisq < 0.0 {
            return Err(CheckError::NegativeChiSquare { row, value: chisq });
        }
    }
    Ok(())
}

/// Check that minor allele frequencies lie strictly inside (0, 1).
pub fn check_maf<I>(mafs: I) -> Result<(), CheckError>
where
    I: IntoIterator<Item = f64>,
{
    for (row, maf) in mafs.into_iter().enumerate() {
        if maf.is_nan() {
            return Err(CheckError::MissingMaf { row });
        }
        if maf >= 1.0 {
            return Err(CheckError::MafTooHigh { row, value: maf });
        }
        if maf <= 0.0 {
            return Err(CheckError::MafTooLow { row, value: maf });
        }
    }
    Ok(())
}

/// Check that sample sizes are non-negative.
pub fn check_sample_size<I>(sizes: I) -> Result<(), CheckError>
where
    I: IntoIterator<Item = i64>,
{
    for (row, n) in sizes.into_iter().enumerate() {
        if n < 0 {
            return Err(CheckError::NegativeSampleSize { row, value: n });
        }
    }
    Ok(())
}

// ==============================================================================
// idlist.rs - Identifier List Readers
// ==============================================================================
// Description: Readers for SNP / individual ID lists (PLINK .bim/.fam, VCF
//              .snp/.ind, plain filter files, .annot annotation files) and
//              the left-join helper used to subset tables to a reference set
// Author: Matt Barham
// Created: 2026-08-10
// Modified: 2026-08-27
// Version: 1.0.0
// ==============================================================================
// Format: Whitespace-delimited text, headerless except for .annot. Each
//         variant keeps a fixed column subset and designates one column as
//         the identifier.
// ==============================================================================

use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::checks::{check_snp_ids, CheckError};
use crate::parsers::open_text;

/// Errors that can occur while reading an identifier list
#[derive(Error, Debug)]
pub enum IdListError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("file is empty or contains no data rows")]
    EmptyFile,

    #[error("filename must end in {expected}")]
    WrongExtension { expected: &'static str },

    #[error("too few fields at line {line}: need at least {needed}, found {found}")]
    TooFewColumns {
        line: usize,
        needed: usize,
        found: usize,
    },

    #[error("wrong number of fields at line {line}: expected {expected}, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Check(#[from] CheckError),
}

// how one list format is laid out on disk
struct FormatSpec {
    label: &'static str,
    // None: take the column names from the header row
    colnames: Option<&'static [&'static str]>,
    keep_col: usize,
    fname_end: Option<&'static str>,
    has_header: bool,
    // None: keep every column
    usecols: Option<&'static [usize]>,
    check_snp: bool,
}

const PLINK_BIM: FormatSpec = FormatSpec {
    label: "plink-bim",
    colnames: Some(&["CHR", "SNP", "CM", "BP"]),
    keep_col: 1,
    fname_end: Some(".bim"),
    has_header: false,
    usecols: Some(&[0, 1, 2, 3]),
    check_snp: true,
};

const VCF_SNP: FormatSpec = FormatSpec {
    label: "vcf-snp",
    colnames: Some(&["CHR", "BP", "SNP", "CM"]),
    keep_col: 2,
    fname_end: Some(".snp"),
    has_header: false,
    usecols: Some(&[0, 1, 2, 3]),
    check_snp: true,
};

const PLINK_FAM: FormatSpec = FormatSpec {
    label: "plink-fam",
    colnames: Some(&["IID"]),
    keep_col: 0,
    fname_end: Some(".fam"),
    has_header: false,
    usecols: Some(&[1]),
    check_snp: false,
};

const VCF_IND: FormatSpec = FormatSpec {
    label: "vcf-ind",
    colnames: Some(&["IID"]),
    keep_col: 0,
    fname_end: Some(".ind"),
    has_header: false,
    usecols: Some(&[0]),
    check_snp: false,
};

const FILTER: FormatSpec = FormatSpec {
    label: "filter",
    colnames: Some(&["ID"]),
    keep_col: 0,
    fname_end: None,
    has_header: false,
    usecols: Some(&[0]),
    check_snp: false,
};

const ANNOT: FormatSpec = FormatSpec {
    label: "annot",
    colnames: None,
    keep_col: 2,
    fname_end: Some(".annot"),
    has_header: true,
    usecols: None,
    check_snp: false,
};

/// A loaded identifier list: the kept columns plus the designated id column
#[derive(Debug, Clone)]
pub struct IdList {
    /// Names of the kept columns
    pub colnames: Vec<String>,
    /// Kept columns, row-major, as read
    pub rows: Vec<Vec<String>>,
    keep_col: usize,
}

impl IdList {
    /// Read a PLINK `.bim` file (CHR, SNP, CM, BP; id = SNP).
    pub fn plink_bim(path: impl AsRef<Path>) -> Result<IdList, IdListError> {
        Self::read(path.as_ref(), &PLINK_BIM)
    }

    /// Read a VCF-derived `.snp` file (CHR, BP, SNP, CM; id = SNP).
    pub fn vcf_snp(path: impl AsRef<Path>) -> Result<IdList, IdListError> {
        Self::read(path.as_ref(), &VCF_SNP)
    }

    /// Read a PLINK `.fam` file (id = IID, the second column on disk).
    pub fn plink_fam(path: impl AsRef<Path>) -> Result<IdList, IdListError> {
        Self::read(path.as_ref(), &PLINK_FAM)
    }

    /// Read a VCF-derived `.ind` file (id = IID, the first column).
    pub fn vcf_ind(path: impl AsRef<Path>) -> Result<IdList, IdListError> {
        Self::read(path.as_ref(), &VCF_IND)
    }

    /// Read a one-id-per-line filter file (any extension).
    pub fn filter(path: impl AsRef<Path>) -> Result<IdList, IdListError> {
        Self::read(path.as_ref(), &FILTER)
    }

    /// Read an `.annot` annotation file (header row; id = third column).
    pub fn annot(path: impl AsRef<Path>) -> Result<IdList, IdListError> {
        Self::read(path.as_ref(), &ANNOT)
    }

    fn read(path: &Path, spec: &FormatSpec) -> Result<IdList, IdListError> {
        if let Some(end) = spec.fname_end {
            let name = path.to_string_lossy();
            if !name.ends_with(end) {
                return Err(IdListError::WrongExtension { expected: end });
            }
        }
        debug!("Reading {} id list: {}", spec.label, path.display());

        let reader = open_text(path)?;
        let mut lines = reader.lines();

        let mut colnames: Vec<String> = match spec.colnames {
            Some(names) => names.iter().map(|n| n.to_string()).collect(),
            None => Vec::new(),
        };
        let mut header_width = None;
        if spec.has_header {
            let header = lines.next().ok_or(IdListError::EmptyFile)??;
            let names: Vec<String> = header.split_whitespace().map(|n| n.to_string()).collect();
            if names.is_empty() {
                return Err(IdListError::EmptyFile);
            }
            header_width = Some(names.len());
            if spec.colnames.is_none() {
                colnames = names;
            }
        }

        // widest column index this format needs from each row
        let needed = match spec.usecols {
            Some(cols) => cols.iter().max().copied().unwrap_or(0) + 1,
            None => header_width.unwrap_or(spec.keep_col + 1).max(spec.keep_col + 1),
        };

        let mut rows = Vec::new();
        let first_data_line = if spec.has_header { 2 } else { 1 };
        for (idx, line_result) in lines.enumerate() {
            let line_number = idx + first_data_line;
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            // keep-all formats must match the header width exactly, or the
            // rows would go ragged relative to colnames
            if let (None, Some(width)) = (spec.usecols, header_width) {
                if fields.len() != width {
                    return Err(IdListError::ColumnCount {
                        line: line_number,
                        expected: width,
                        found: fields.len(),
                    });
                }
            }
            if fields.len() < needed {
                return Err(IdListError::TooFewColumns {
                    line: line_number,
                    needed,
                    found: fields.len(),
                });
            }

            let row: Vec<String> = match spec.usecols {
                Some(cols) => cols.iter().map(|&c| fields[c].to_string()).collect(),
                None => fields.iter().map(|f| f.to_string()).collect(),
            };
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(IdListError::EmptyFile);
        }

        let list = IdList {
            colnames,
            rows,
            keep_col: spec.keep_col,
        };
        if spec.check_snp {
            check_snp_ids(list.ids())?;
        }

        info!(
            "Loaded {} ids from {} ({})",
            list.len(),
            path.display(),
            spec.label
        );
        Ok(list)
    }

    /// Number of ids in the list.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Name of the identifier column, when known.
    pub fn id_column(&self) -> Option<&str> {
        self.colnames.get(self.keep_col).map(|s| s.as_str())
    }

    /// The identifiers, in file order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |r| r[self.keep_col].as_str())
    }

    /// Collect the identifiers into a set for table subsetting.
    pub fn id_set(&self) -> HashSet<String> {
        self.ids().map(|id| id.to_string()).collect()
    }

    /// Left-join filter: indices (in file order) of this list's ids that
    /// also appear in `other_ids`.
    pub fn loj<'a, I>(&self, other_ids: I) -> Vec<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keep: HashSet<&str> = other_ids.into_iter().collect();
        self.ids()
            .enumerate()
            .filter(|(_, id)| keep.contains(id))
            .map(|(idx, _)| idx)
            .collect()
    }
}

// ==============================================================================
// main.rs - Summary Statistics Ingestion Entry Point
// ==============================================================================
// Description: Preflight CLI: parse and validate summary-statistics and LD
//              reference files before they reach the regression stage
// Author: Matt Barham
// Created: 2026-08-10
// Modified: 2026-08-28
// Version: 1.0.1
// ==============================================================================

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sumstats_ingest::idlist::IdList;
use sumstats_ingest::parsers::{BetaprodParser, ChisqParser, LdScoreParser, MFileParser};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Emit the summary as JSON instead of plain text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a .chisq summary-statistics file
    Chisq {
        /// Path to the file (.gz accepted)
        file: PathBuf,
    },

    /// Validate a .betaprod two-phenotype summary-statistics file
    Betaprod {
        /// Path to the file (.gz accepted)
        file: PathBuf,
    },

    /// Validate an LD score reference ({stem}.l2.ldscore[.gz])
    Ldscore {
        /// File stem, without the .l2.ldscore suffix
        stem: String,

        /// Read {stem}{chr}.l2.ldscore for chr in 1..=N and concatenate
        #[arg(long)]
        num_chromosomes: Option<usize>,
    },

    /// Validate an M file ({stem}.l2.M[.gz])
    Mfile {
        /// File stem, without the .l2.M suffix
        stem: String,

        /// Read {stem}{chr}.l2.M for chr in 1..=N and sum element-wise
        #[arg(long)]
        num_chromosomes: Option<usize>,
    },

    /// Validate an identifier list (.bim/.snp/.fam/.ind/filter/.annot)
    Idlist {
        /// Path to the file
        file: PathBuf,

        /// On-disk layout of the list
        #[arg(long, value_enum)]
        format: IdListFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum IdListFormat {
    /// PLINK .bim variant list
    Bim,
    /// VCF-derived .snp variant list
    Snp,
    /// PLINK .fam individual list
    Fam,
    /// VCF-derived .ind individual list
    Ind,
    /// One id per line, any extension
    Filter,
    /// .annot annotation file with header
    Annot,
}

/// Preflight result for one input file
#[derive(Serialize, Debug)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Summary {
    Chisq {
        file: String,
        snps: usize,
        mean_chisq: Option<f64>,
        has_maf: bool,
        has_info: bool,
    },
    Betaprod {
        file: String,
        snps: usize,
    },
    Ldscore {
        stem: String,
        snps: usize,
        score_columns: Vec<String>,
    },
    Mfile {
        stem: String,
        annotations: usize,
        values: Vec<f64>,
    },
    Idlist {
        file: String,
        format: String,
        ids: usize,
        id_column: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sumstats_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let summary = run(&args.command)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if let Some(fields) = serde_json::to_value(&summary)?.as_object() {
        for (key, value) in fields {
            println!("{key}: {value}");
        }
    }

    Ok(())
}

fn run(command: &Command) -> Result<Summary> {
    match command {
        Command::Chisq { file } => {
            let table = ChisqParser::parse(file)?;
            Ok(Summary::Chisq {
                file: file.display().to_string(),
                snps: table.len(),
                mean_chisq: table.mean_chisq(),
                has_maf: table.records.iter().any(|r| r.maf.is_some()),
                has_info: table.records.iter().any(|r| r.info.is_some()),
            })
        }

        Command::Betaprod { file } => {
            let table = BetaprodParser::parse(file)?;
            Ok(Summary::Betaprod {
                file: file.display().to_string(),
                snps: table.len(),
            })
        }

        Command::Ldscore {
            stem,
            num_chromosomes,
        } => {
            let table = match num_chromosomes {
                Some(num) => LdScoreParser::parse_split(stem, *num)?,
                None => LdScoreParser::parse(stem)?,
            };
            Ok(Summary::Ldscore {
                stem: stem.clone(),
                snps: table.n_snps(),
                score_columns: table.score_names,
            })
        }

        Command::Mfile {
            stem,
            num_chromosomes,
        } => {
            let values = match num_chromosomes {
                Some(num) => MFileParser::parse_split(stem, *num)?,
                None => MFileParser::parse(stem)?,
            };
            Ok(Summary::Mfile {
                stem: stem.clone(),
                annotations: values.len(),
                values,
            })
        }

        Command::Idlist { file, format } => {
            let list = match format {
                IdListFormat::Bim => IdList::plink_bim(file)?,
                IdListFormat::Snp => IdList::vcf_snp(file)?,
                IdListFormat::Fam => IdList::plink_fam(file)?,
                IdListFormat::Ind => IdList::vcf_ind(file)?,
                IdListFormat::Filter => IdList::filter(file)?,
                IdListFormat::Annot => IdList::annot(file)?,
            };
            Ok(Summary::Idlist {
                file: file.display().to_string(),
                format: format!("{format:?}").to_lowercase(),
                ids: list.len(),
                id_column: list.id_column().map(String::from),
            })
        }
    }
}

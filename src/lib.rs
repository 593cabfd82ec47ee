// ==============================================================================
// lib.rs - Summary Statistics Ingestion Library
// ==============================================================================
// Description: Library interface for summary-statistics / LD reference
//              ingestion modules
// Author: Matt Barham
// Created: 2026-08-10
// Modified: 2026-08-27
// Version: 1.0.0
// ==============================================================================

pub mod checks;
pub mod idlist;
pub mod parsers;
pub mod stats;

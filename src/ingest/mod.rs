//! Ingestion: accumulating raw instrument arrays into the registry.
//!
//! `reader` materializes a file into a [`RawDataset`]; `merge` converts its
//! time axis, normalizes declared fill values to NaN, and writes every
//! variable into the store, overwriting or appending per the caller's
//! options.
//!
//! Variable and time-axis name resolution happens before this layer: the
//! core never prompts, it only takes already-resolved names.

pub mod merge;
pub mod reader;

pub use merge::{ingest, ingest_dataset, IngestOptions, RawDataset, RawTimeAxis, RawVariable};

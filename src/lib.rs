//! In-memory registry and transform operators for labeled, irregularly
//! sampled scientific time-series data.
//!
//! Instrument files are materialized (by the readers in [`ingest`], or by
//! any other collaborator) into raw arrays, pushed through time-coordinate
//! conversion into a shared [`TimeSeriesStore`], and reshaped in place by
//! the operators in [`ops`]. Rendering is someone else's job: a plotting
//! frontend reads variables back from the store by name and must treat it
//! as read-only.
//!
//! ```text
//!  .parquet / .json / .csv
//!        │
//!        ▼
//!   ┌────────────────┐
//!   │ ingest::reader  │  materialize file → RawDataset
//!   └────────────────┘
//!        │
//!        ▼
//!   ┌────────────────┐
//!   │ ingest::merge   │  time conversion, fill→NaN, put or append
//!   └────────────────┘
//!        │
//!        ▼
//!   ┌────────────────┐
//!   │ TimeSeriesStore │  name → variable
//!   └────────────────┘
//!        │
//!        ▼
//!   ops::degap / ops::derive rewrite variables; a renderer reads them
//! ```
//!
//! The whole crate is synchronous and single-threaded: every
//! operation is a bounded computation over in-memory arrays, and one
//! logical thread of control drives all reads and writes. Embedders that
//! share a store across threads wrap it in their own lock.

pub mod data;
pub mod error;
pub mod ingest;
pub mod ops;
pub mod time;

pub use data::model::{DataArray, MetadataValue, PlotOptions, TimeSeriesVariable};
pub use data::store::TimeSeriesStore;
pub use error::{TplotError, TplotResult};
pub use ingest::{ingest, ingest_dataset, IngestOptions, RawDataset, RawTimeAxis, RawVariable};
pub use ops::degap::{degap, FillPolicy};
pub use ops::derive::derive;

//! Data layer: core types and the shared variable registry.
//!
//! Architecture:
//! ```text
//!  raw arrays + units string
//!        │
//!        ▼
//!   ┌───────────────────┐
//!   │ TimeSeriesVariable │  time, values, spec_bins, options
//!   └───────────────────┘
//!        │
//!        ▼
//!   ┌─────────────────┐
//!   │ TimeSeriesStore  │  name → variable, insertion-ordered
//!   └─────────────────┘
//!        │
//!        ▼
//!   operators (degap, derive) and the renderer read back by name
//! ```

pub mod model;
pub mod store;

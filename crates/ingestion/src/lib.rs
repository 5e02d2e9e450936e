//! Run acquisition library.
//!
//! Turns a run key into decoded wind fields without downloading the
//! multi-gigabyte forecast file:
//!
//! ```text
//! RunKey
//!   │
//!   ├─► IndexResolver: GET <run>.index, select 10u/10v surface entries
//!   │         │
//!   │         ▼
//!   │   [ChunkDescriptor { field, offset, length }]
//!   │
//!   └─► ChunkAcquirer: byte-range read of each chunk from the bucket
//!             │
//!             ▼
//!       GribDecoder (grib_dump subprocess or in-process) → Vec<f64>
//! ```
//!
//! The `RunSource` trait wraps the whole pipeline so the cache layer can be
//! exercised without network access.

pub mod acquire;
pub mod config;
pub mod decoder;
pub mod index;
pub mod source;

// Re-exports
pub use acquire::ChunkAcquirer;
pub use config::{AcquisitionConfig, DecoderConfig};
pub use decoder::{parse_grib_dump_json, EmbeddedGribDecoder, GribDecoder, GribDumpDecoder};
pub use index::{parse_index, ChunkDescriptor, IndexResolver, SURFACE_LEVTYPE};
pub use source::{RemoteRunSource, RunFields, RunSource};

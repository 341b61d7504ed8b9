//! Dataset repository for insightdb
//!
//! Stores whole datasets by id. Queries read an immutable snapshot
//! (`Arc<Dataset>`) fetched once; a replace or delete never disturbs a
//! snapshot already handed out.
//!
//! Two implementations:
//! - [`MemoryRepository`]: process-local map
//! - [`DiskRepository`]: one JSON blob per dataset in a directory

mod backend;
mod disk;
mod errors;
mod memory;

pub use backend::DatasetRepository;
pub use disk::DiskRepository;
pub use errors::{RepositoryError, RepositoryResult};
pub use memory::MemoryRepository;

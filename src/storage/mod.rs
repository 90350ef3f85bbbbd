//! Artifact storage
//!
//! Backends receive one complete batch per call and turn it into a new,
//! immutable artifact. The commit pipeline treats them as external
//! collaborators: any error means the batch was not stored.

pub mod backends;
pub mod config;
pub mod error;
pub mod factory;
pub mod traits;

pub use backends::{FileStorage, MemoryStorage, StoredArtifact};
pub use config::Destination;
pub use error::{StorageError, StorageResult};
pub use factory::StorageFactory;
pub use traits::ArtifactStore;

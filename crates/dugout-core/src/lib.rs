// Core library: the league data model, the persisted store container,
// descriptive statistics, and the query engine. No I/O beyond the store file.

pub mod container;
pub mod error;
pub mod model;
pub mod query;
pub mod stats;

pub use container::{ContainerSlot, DataStoreContainer, SaveOutcome, StoreCounts};
pub use error::StoreError;

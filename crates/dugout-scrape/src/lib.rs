// Scraping library: page sources, schedule and result page parsers, and the
// build/update passes that turn them into a DataStore.

pub mod catalog;
pub mod decode;
mod dom;
pub mod error;
pub mod pipeline;
pub mod result;
pub mod retry;
pub mod schedule;
pub mod source;

pub use catalog::{CatalogEntry, LeagueCatalog};
pub use error::ScrapeError;
pub use pipeline::{PassOptions, PassReport, Pipeline};
pub use result::GameResultBuilder;
pub use retry::RetryPolicy;
pub use schedule::ScheduleBuilder;
pub use source::{HttpPageSource, PageSource, StaticPageSource};

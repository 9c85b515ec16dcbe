pub mod adapters;
pub mod assemble;
pub mod config;
pub mod dates;
pub mod pipeline;
pub mod reconcile;
pub mod scraper;
pub mod store;
pub mod text;
pub mod types;
pub mod utils;

pub use self::assemble::{Assembly, RunMetadata};
pub use self::config::{PipelineConfig, ScraperConfig};
pub use self::pipeline::{Pipeline, PipelineError};
pub use self::scraper::{ScraperError, SourcePayloads, WebScraper};
pub use self::store::ArtifactStore;
pub use self::types::{CanonicalRecord, Chamber};

pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod flights;
pub mod geocode;
pub mod logging;
pub mod matrix;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod serialize;

pub use config::Config;
pub use error::{PipelineError, Result};
pub use registry::{CanonicalCountry, CodeKey, CountryRegistry};
pub use resolver::NameResolver;

pub mod chart;
pub mod cli;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod provider;
pub mod quote;
pub mod service;
pub mod ticker;

pub use error::{LookupError, ProviderError};
pub use service::QuoteService;

pub mod compare;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod logging;
pub mod market;
pub mod merchant;
pub mod parser;
pub mod report;
pub mod session;
pub mod types;

pub use error::{CompareError, MissingColumnsError, Result};
pub use session::ComparisonSession;
pub use types::{ComparisonRow, ExchangeRate, MarketIndex, MarketRecord, MerchantProduct, ProductCatalog};

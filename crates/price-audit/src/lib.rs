//! Fetches spot quotes for a set of coins, validates them and writes a
//! timestamped validation report.

pub mod cli;
pub mod fetcher;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod store;
pub mod validator;

pub use fetcher::{CoinGeckoTransport, PriceFetcher, QuoteRequest, QuoteTransport};
pub use pipeline::PriceAudit;
pub use report::ReportAssembler;
pub use store::ReportStore;
pub use validator::{validate, validate_at};

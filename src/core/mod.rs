//! Core domain types and abstractions

pub mod config;
pub mod log;
pub mod observable;
pub mod provider;
pub mod rates;

// Re-export main types for cleaner imports
pub use observable::{Observable, Subscription};
pub use provider::{ApiProvider, FetchError, ProviderClient, RateSource};
pub use rates::{CurrencyPair, DailyRate, Payload, RateSet, Timeline};

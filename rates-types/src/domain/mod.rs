//! Domain models for the rates service.

pub mod change;
pub mod iso;
pub mod pair;
pub mod period;
pub mod rate;

pub use change::change_percent;
pub use iso::IsoWhitelist;
pub use pair::CurrencyPair;
pub use period::HistoryPeriod;
pub use rate::{ConfirmedRate, LatestRate, RateId, RateWithChange, StagedQuote};

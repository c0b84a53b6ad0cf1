//! fintrack-core
//!
//! Budget tracking, recurring catch-up and chart analytics over a
//! [`fintrack_domain::Ledger`]. Depends on fintrack-domain only: no CLI,
//! no terminal I/O, no direct filesystem access.

pub mod account_service;
pub mod analytics_service;
pub mod budget_service;
pub mod category_service;
pub mod error;
pub mod ledger_service;
pub mod public_api;
pub mod recurrence_service;
pub mod storage;
pub mod time;

pub use account_service::*;
pub use analytics_service::*;
pub use budget_service::*;
pub use category_service::*;
pub use error::{CoreError, CoreResult, EntityKind};
pub use ledger_service::*;
pub use public_api::LedgerApi;
pub use recurrence_service::*;
pub use storage::*;
pub use time::*;

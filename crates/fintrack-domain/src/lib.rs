//! fintrack-domain
//!
//! Pure domain models (Ledger, Account, Category, Transaction, Budget,
//! RecurringTransaction) plus the calendar helpers they share.
//! No I/O, no CLI, no storage. Only data types and core enums.

pub mod account;
pub mod budget;
pub mod calendar;
pub mod category;
pub mod common;
pub mod ledger;
pub mod recurring;
pub mod transaction;

pub use account::*;
pub use budget::*;
pub use category::*;
pub use common::*;
pub use ledger::*;
pub use recurring::*;
pub use transaction::*;

#![doc(test(attr(deny(warnings))))]

//! fintrack tracks accounts, categorized transactions, budgets and monthly
//! recurring charges, and derives chart-ready analytics from the ledger.
//!
//! The domain, services, configuration and JSON storage live in the
//! workspace crates re-exported below; this crate adds tracing setup,
//! build metadata and the `fintrack_cli` script runner.

pub mod cli;
pub mod errors;
pub mod utils;

pub use fintrack_config;
pub use fintrack_core;
pub use fintrack_domain;
pub use fintrack_storage_json;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup debug log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::debug!("fintrack tracing initialized.");
    });
}

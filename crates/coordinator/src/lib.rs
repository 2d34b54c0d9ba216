//! # InnoFund Coordinator Crate
//!
//! The orchestration layer: intent preparation, wallet-driven
//! transaction execution and the HTTP API that fronts the mirror.
//!
//! One user action is one flow: prepare → ensure network → submit →
//! reconcile. The backend prepares and reconciles; the wallet, owned
//! by the client, executes in between.

pub mod executor;
pub mod handlers;
pub mod preparer;

pub use executor::TransactionExecutor;
pub use handlers::{router, AppState};
pub use preparer::{Intent, IntentAction, IntentPreparer};

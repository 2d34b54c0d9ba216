//! # InnoFund Chain Crate
//!
//! The chain boundary of the backend: the network descriptor the wallet
//! consumes, prepared call data, the provider abstraction and the
//! wallet session that drives network switching and submission.
//!
//! Nothing in this crate holds ledger state. A session is explicitly
//! constructed, owned by its caller, and passed by reference into
//! operations; there is no lazy global provider.

pub mod abi;
pub mod call;
pub mod mock;
pub mod network;
pub mod provider;
pub mod session;

pub use call::ChainCall;
pub use mock::{MockProvider, SubmitOutcome};
pub use network::{NativeCurrency, NetworkDescriptor};
pub use provider::{ChainProvider, ChainReceipt};
pub use session::WalletSession;

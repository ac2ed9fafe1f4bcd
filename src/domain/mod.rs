//! Domain layer - Core yield-routing types and invariants.
//!
//! Pure data structures with no I/O: quotes, the bounded selection set,
//! the rolling history window, deposit tickets and the error taxonomy.

pub mod deposit;
pub mod error;
pub mod history;
pub mod quote;
pub mod selection;

// Re-export core types for convenience
pub use deposit::{DepositEvent, DepositState, DepositTarget, DepositTicket};
pub use error::{DepositError, SourceError, WalletError};
pub use history::{HistoryBuffer, HistorySample};
pub use quote::{dedupe, DualApy, NamedApy, ProtocolQuote, Series};
pub use selection::{parse_comparison_query, SelectionSet};

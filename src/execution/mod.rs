/// Execution Layer
///
/// Real-world interaction with the chain once a decision says trade:
/// flash-loan request encoding and submission, plus the contract's admin
/// operations (profit withdrawal, keeper rotation).
pub mod flashloan;

pub use flashloan::{ArbExecutor, ExecutionRequest, FlashLoanExecutor};

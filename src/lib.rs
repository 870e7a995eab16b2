// Three-Layer Architecture
pub mod data_sync;  // Data Layer: block triggers, reserve snapshots, orientation discovery
pub mod engine;     // Logic Layer: route evaluation, arbitrage selection, path building
pub mod execution;  // Execution Layer: flash-loan submission, contract admin

// Common utilities and types
pub mod config;
pub mod constants;
pub mod keeper;

// Re-export key components from each layer
pub use config::{KeeperConfig, LoadConfigError, RouteConfig};
pub use data_sync::{
    BlockHeader, BlockWatcher, ChainReader, OrientationSource, ReserveSnapshot, ReserveSource,
    ResolvedRoute, resolve_routes,
};
pub use engine::{
    ArbitrageDecision, EngineError, EvaluatedRoute, Route, TradePath, amount_out, build_paths,
    evaluate, evaluate_route, evaluate_route_reversed, total_debt,
};
pub use execution::{ArbExecutor, ExecutionRequest, FlashLoanExecutor};
pub use keeper::Keeper;

pub mod evaluator;
pub mod path;
pub mod selector;
pub mod types;

pub use evaluator::{amount_out, evaluate_route, evaluate_route_reversed};
pub use path::build_paths;
pub use selector::{evaluate, total_debt};
pub use types::{ArbitrageDecision, EvaluatedRoute, Route, TradePath};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("need at least two routes to compare, got {0}")]
    NotEnoughRoutes(usize),
    #[error("route through venue {0} has no pools")]
    EmptyRoute(u8),
}

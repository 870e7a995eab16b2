use crate::constants::PREMIUM_DENOMINATOR;
use crate::engine::EngineError;
use crate::engine::evaluator::evaluate_route_reversed;
use crate::engine::path::build_paths;
use crate::engine::types::{ArbitrageDecision, EvaluatedRoute};
use alloy_primitives::{I256, U256};

/// Borrowed principal plus the lending-pool premium, floor-divided.
/// `premium_numerator` is expressed in 1/10_000 units (9 = 0.09%).
pub fn total_debt(principal: U256, premium_numerator: u64) -> U256 {
    principal + principal * U256::from(premium_numerator) / U256::from(PREMIUM_DENOMINATOR)
}

/// Compare the evaluated routes and decide whether the spread pays for the
/// debt.
///
/// Routes are ordered ascending by forward output with an integer
/// comparator; the sort is stable, so routes whose outputs compare equal
/// keep their insertion order. The best route's output is then converted
/// back to the input asset through the worst route (hops reversed, reserve
/// roles swapped) and netted against the debt.
///
/// Only the two global extremes are compared. Intermediate routes and
/// longer cycles are out of scope for this engine.
pub fn evaluate(routes: &[EvaluatedRoute], debt: U256) -> Result<ArbitrageDecision, EngineError> {
    if routes.len() < 2 {
        return Err(EngineError::NotEnoughRoutes(routes.len()));
    }
    if let Some(empty) = routes.iter().find(|r| r.route.hops.is_empty()) {
        return Err(EngineError::EmptyRoute(empty.route.venue));
    }

    let mut ordered: Vec<&EvaluatedRoute> = routes.iter().collect();
    ordered.sort_by(|a, b| a.amount_out.cmp(&b.amount_out));

    let worst = ordered[0];
    let best = ordered[ordered.len() - 1];

    let reverse_amount = evaluate_route_reversed(&worst.route, best.amount_out);
    let net = signed_sub(reverse_amount, debt);
    if net <= I256::ZERO {
        return Ok(ArbitrageDecision::no_trade(net));
    }

    let (forward, reverse) = build_paths(&best.route, &worst.route);
    Ok(ArbitrageDecision { net, execute: true, forward, reverse })
}

/// Signed difference of two unsigned amounts, saturating at the I256 range.
fn signed_sub(a: U256, b: U256) -> I256 {
    if a >= b {
        I256::try_from(a - b).unwrap_or(I256::MAX)
    } else {
        I256::try_from(b - a).map(|v| -v).unwrap_or(I256::MIN)
    }
}

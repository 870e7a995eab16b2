use alloy_primitives::{Address, I256, U256};

/// An ordered chain of pools converting the input asset into the output
/// asset, captured for one decision cycle.
///
/// Reserve pairs are already oriented to the swap direction: `hops[i].0` is
/// the reserve of the asset entering pool `i` and `hops[i].1` the reserve of
/// the asset leaving it. `assets` lists the traversed addresses from input
/// to output, so it always holds one entry more than `hops`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub hops: Vec<(U256, U256)>,
    pub assets: Vec<Address>,
    /// Router index understood by the flash-loan contract.
    pub venue: u8,
}

/// A route together with its forward output for the borrowed input amount.
#[derive(Debug, Clone)]
pub struct EvaluatedRoute {
    pub route: Route,
    pub amount_out: U256,
}

/// Asset sequence handed to the flash-loan contract, tagged with the router
/// that services it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradePath {
    pub assets: Vec<Address>,
    pub venue: u8,
}

/// Outcome of one decision cycle.
///
/// `net` is the reverse-leg return minus the total debt and may be negative
/// or zero, in which case `execute` is false and both paths are empty.
#[derive(Debug, Clone)]
pub struct ArbitrageDecision {
    pub net: I256,
    pub execute: bool,
    pub forward: TradePath,
    pub reverse: TradePath,
}

impl ArbitrageDecision {
    pub fn no_trade(net: I256) -> Self {
        Self { net, execute: false, forward: TradePath::default(), reverse: TradePath::default() }
    }
}

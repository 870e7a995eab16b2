use crate::engine::types::{Route, TradePath};

/// Build the two execution legs for the flash-loan contract.
///
/// The forward leg follows the best route from input asset to output asset;
/// the reverse leg walks the worst route's assets backwards, output to
/// input. Each leg carries the venue tag of its own route.
pub fn build_paths(best: &Route, worst: &Route) -> (TradePath, TradePath) {
    let forward = TradePath { assets: best.assets.clone(), venue: best.venue };

    let mut reverse_assets = worst.assets.clone();
    reverse_assets.reverse();
    let reverse = TradePath { assets: reverse_assets, venue: worst.venue };

    (forward, reverse)
}

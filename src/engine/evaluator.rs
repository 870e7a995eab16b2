use crate::constants::{FEE_DENOMINATOR, FEE_NUMERATOR};
use crate::engine::types::Route;
use alloy_primitives::U256;

/// Constant-product output amount for a single fee-bearing swap.
///
/// Mirrors the UniswapV2 pair library exactly: the 0.3% fee is taken from
/// the input leg and the final division floors. All arithmetic stays in
/// `U256`; on-chain reserves are `uint112`, so no intermediate product can
/// overflow 256 bits.
///
/// A pool with an empty reserve on either side cannot pay out, so the
/// result is zero for zero reserves (and for a zero denominator), never a
/// division fault.
pub fn amount_out(amount_in: U256, reserve_in: U256, reserve_out: U256) -> U256 {
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return U256::ZERO;
    }
    let amount_in_with_fee = amount_in * U256::from(FEE_NUMERATOR);
    let numerator = amount_in_with_fee * reserve_out;
    let denominator = reserve_in * U256::from(FEE_DENOMINATOR) + amount_in_with_fee;
    if denominator.is_zero() {
        return U256::ZERO;
    }
    numerator / denominator
}

/// Evaluate a route forward: each hop's output becomes the next hop's input.
pub fn evaluate_route(route: &Route, amount_in: U256) -> U256 {
    let mut amount = amount_in;
    for (reserve_in, reserve_out) in &route.hops {
        amount = amount_out(amount, *reserve_in, *reserve_out);
    }
    amount
}

/// Evaluate a route in the opposite direction: hops are walked in reverse
/// order and each reserve pair swaps roles, the forward "out" side becoming
/// the reverse "in" side.
pub fn evaluate_route_reversed(route: &Route, amount_in: U256) -> U256 {
    let mut amount = amount_in;
    for (reserve_in, reserve_out) in route.hops.iter().rev() {
        amount = amount_out(amount, *reserve_out, *reserve_in);
    }
    amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    fn route(hops: Vec<(u64, u64)>) -> Route {
        let assets = (0..=hops.len() as u8).map(Address::repeat_byte).collect();
        Route {
            hops: hops.into_iter().map(|(a, b)| (U256::from(a), U256::from(b))).collect(),
            assets,
            venue: 0,
        }
    }

    #[test]
    fn matches_pair_library_reference_values() {
        // amountInWithFee = 997000, numerator = 9_970_000_000_000,
        // denominator = 10_997_000, floor = 906
        assert_eq!(
            amount_out(U256::from(1000u64), U256::from(10000u64), U256::from(10000u64)),
            U256::from(906u64)
        );
    }

    #[test]
    fn zero_liquidity_means_zero_output() {
        let big = U256::from(1_000_000u64);
        assert_eq!(amount_out(big, U256::ZERO, big), U256::ZERO);
        assert_eq!(amount_out(big, big, U256::ZERO), U256::ZERO);
        assert_eq!(amount_out(U256::ZERO, U256::ZERO, U256::ZERO), U256::ZERO);
    }

    #[test]
    fn output_stays_strictly_below_out_reserve() {
        let reserve_out = U256::from(10000u64);
        for amount in [1u64, 1000, 10_000, 100_000, u64::MAX] {
            let out = amount_out(U256::from(amount), U256::from(10000u64), reserve_out);
            assert!(out < reserve_out, "amount_in={amount} drained the pool");
        }
    }

    #[test]
    fn output_is_monotone_in_input() {
        let samples = [0u64, 1, 10, 100, 1000, 5000, 10_000, 100_000];
        let expected = [0u64, 0, 9, 98, 906, 3326, 4992, 9088];
        let mut previous = U256::ZERO;
        for (amount, want) in samples.iter().zip(expected) {
            let out = amount_out(U256::from(*amount), U256::from(10000u64), U256::from(10000u64));
            assert_eq!(out, U256::from(want));
            assert!(out >= previous);
            previous = out;
        }
    }

    #[test]
    fn route_evaluation_chains_hops() {
        let two_hop = route(vec![(1_000_000, 1_000_000), (1_000_000, 1_300_000)]);
        let first = amount_out(U256::from(10_000u64), U256::from(1_000_000u64), U256::from(1_000_000u64));
        let second = amount_out(first, U256::from(1_000_000u64), U256::from(1_300_000u64));
        assert_eq!(evaluate_route(&two_hop, U256::from(10_000u64)), second);
        assert_eq!(second, U256::from(12_669u64));
    }

    #[test]
    fn reverse_walks_hops_backwards_with_swapped_roles() {
        let two_hop = route(vec![(1_000_000, 1_000_000), (1_000_000, 1_300_000)]);
        let first = amount_out(U256::from(12_669u64), U256::from(1_300_000u64), U256::from(1_000_000u64));
        let second = amount_out(first, U256::from(1_000_000u64), U256::from(1_000_000u64));
        assert_eq!(evaluate_route_reversed(&two_hop, U256::from(12_669u64)), second);
    }

    #[test]
    fn round_trip_never_beats_the_input() {
        // The fee on each leg makes a forward-then-back trip strictly lossy.
        let one_hop = route(vec![(10_000, 10_000)]);
        let forward = evaluate_route(&one_hop, U256::from(1000u64));
        let back = evaluate_route_reversed(&one_hop, forward);
        assert_eq!(forward, U256::from(906u64));
        assert_eq!(back, U256::from(828u64));
        assert!(back < U256::from(1000u64));

        let two_hop = route(vec![(1_000_000, 2_000_000), (3_000_000, 500_000)]);
        for amount in [1u64, 777, 10_000, 250_000] {
            let forward = evaluate_route(&two_hop, U256::from(amount));
            let back = evaluate_route_reversed(&two_hop, forward);
            assert!(back <= U256::from(amount));
        }
    }
}

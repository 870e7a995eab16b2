use alloy_primitives::{Address, address};

/// Input-side fee taken by UniswapV2-compatible pools: 0.3%, kept as the
/// 997/1000 pair the pair contract itself computes with.
pub const FEE_NUMERATOR: u64 = 997;
pub const FEE_DENOMINATOR: u64 = 1000;

/// Flash-loan premium charged by the lending pool, in 1/10_000 units.
pub const DEFAULT_PREMIUM_NUMERATOR: u64 = 9;
pub const PREMIUM_DENOMINATOR: u64 = 10_000;

/// Multicall3 lives at the same address on most EVM chains.
pub const DEFAULT_MULTICALL: Address = address!("0xcA11bde05977b3631167028862bE2a173976CA11");

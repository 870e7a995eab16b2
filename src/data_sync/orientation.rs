use crate::config::RouteConfig;
use crate::engine::Route;
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use eyre::{Result, WrapErr, eyre};
use std::collections::HashMap;
use tracing::info;

/// One-time discovery of which token occupies a pool's first storage slot.
#[async_trait]
pub trait OrientationSource: Send + Sync {
    async fn token0(&self, pool: Address) -> Result<Address>;
}

/// A configured route with its per-pool orientation flags fixed.
///
/// `reversed[i]` is true when pool `i` stores the hop's input asset in its
/// second slot, so the reported `(reserve0, reserve1)` pair must be swapped
/// before evaluation. Pair contracts cannot reorder their tokens after
/// deployment, so the flags hold for the process lifetime.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    pub assets: Vec<Address>,
    pub pools: Vec<Address>,
    pub venue: u8,
    pub reversed: Vec<bool>,
}

impl ResolvedRoute {
    /// Build this cycle's oriented route from raw `(reserve0, reserve1)`
    /// pairs keyed by pool address.
    pub fn materialize(&self, reserves: &HashMap<Address, (U256, U256)>) -> Result<Route> {
        let mut hops = Vec::with_capacity(self.pools.len());
        for (pool, reversed) in self.pools.iter().zip(&self.reversed) {
            let (reserve0, reserve1) = reserves
                .get(pool)
                .copied()
                .ok_or_else(|| eyre!("pool {pool} missing from reserve snapshot"))?;
            hops.push(if *reversed { (reserve1, reserve0) } else { (reserve0, reserve1) });
        }
        Ok(Route { hops, assets: self.assets.clone(), venue: self.venue })
    }
}

/// Resolve orientation flags for every configured route.
///
/// Runs exactly once, before the keeper accepts block triggers. Any failed
/// discovery read aborts startup: a route with an unknown orientation would
/// poison every later computation, so partial initialization is not
/// allowed. Pools shared between routes are only queried once.
pub async fn resolve_routes<S>(source: &S, routes: &[RouteConfig]) -> Result<Vec<ResolvedRoute>>
where
    S: OrientationSource + ?Sized,
{
    let mut token0_cache: HashMap<Address, Address> = HashMap::new();
    let mut resolved = Vec::with_capacity(routes.len());

    for route in routes {
        let mut reversed = Vec::with_capacity(route.pools.len());
        for (i, pool) in route.pools.iter().enumerate() {
            let token0 = match token0_cache.get(pool) {
                Some(token0) => *token0,
                None => {
                    let token0 = source
                        .token0(*pool)
                        .await
                        .wrap_err_with(|| format!("orientation discovery failed for pool {pool}"))?;
                    token0_cache.insert(*pool, token0);
                    token0
                }
            };
            reversed.push(token0 != route.assets[i]);
        }
        info!(venue = route.venue, ?reversed, "resolved route orientation");
        resolved.push(ResolvedRoute {
            assets: route.assets.clone(),
            pools: route.pools.clone(),
            venue: route.venue,
            reversed,
        });
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const STABLE: Address = Address::repeat_byte(0xA0);
    const MID: Address = Address::repeat_byte(0xA1);
    const TARGET: Address = Address::repeat_byte(0xA2);
    const POOL_IN: Address = Address::repeat_byte(0xB0);
    const POOL_OUT: Address = Address::repeat_byte(0xB1);

    /// token0 answers from a fixed table, counting the reads.
    struct TableSource {
        table: HashMap<Address, Address>,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl OrientationSource for TableSource {
        async fn token0(&self, pool: Address) -> Result<Address> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.table.get(&pool).copied().ok_or_else(|| eyre!("no such pool"))
        }
    }

    fn route_config() -> RouteConfig {
        RouteConfig {
            assets: vec![STABLE, MID, TARGET],
            pools: vec![POOL_IN, POOL_OUT],
            venue: 0,
        }
    }

    #[tokio::test]
    async fn flags_follow_token0() {
        // First pool stores the stable asset in slot 0, second stores the
        // target (not the mid input) in slot 0.
        let source = TableSource {
            table: HashMap::from([(POOL_IN, STABLE), (POOL_OUT, TARGET)]),
            reads: AtomicUsize::new(0),
        };
        let resolved = resolve_routes(&source, &[route_config()]).await.unwrap();
        assert_eq!(resolved[0].reversed, vec![false, true]);
    }

    #[tokio::test]
    async fn shared_pools_are_discovered_once() {
        let source = TableSource {
            table: HashMap::from([(POOL_IN, STABLE), (POOL_OUT, MID)]),
            reads: AtomicUsize::new(0),
        };
        let resolved = resolve_routes(&source, &[route_config(), route_config()]).await.unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_discovery_aborts_resolution() {
        let source = TableSource { table: HashMap::new(), reads: AtomicUsize::new(0) };
        assert!(resolve_routes(&source, &[route_config()]).await.is_err());
    }

    #[test]
    fn materialize_swaps_reversed_hops() {
        let resolved = ResolvedRoute {
            assets: vec![STABLE, MID, TARGET],
            pools: vec![POOL_IN, POOL_OUT],
            venue: 0,
            reversed: vec![false, true],
        };
        let reserves = HashMap::from([
            (POOL_IN, (U256::from(10u64), U256::from(20u64))),
            (POOL_OUT, (U256::from(30u64), U256::from(40u64))),
        ]);
        let route = resolved.materialize(&reserves).unwrap();
        assert_eq!(route.hops, vec![
            (U256::from(10u64), U256::from(20u64)),
            (U256::from(40u64), U256::from(30u64)),
        ]);
        assert_eq!(route.assets, resolved.assets);
    }

    #[test]
    fn materialize_requires_every_pool() {
        let resolved = ResolvedRoute {
            assets: vec![STABLE, MID, TARGET],
            pools: vec![POOL_IN, POOL_OUT],
            venue: 0,
            reversed: vec![false, false],
        };
        let reserves = HashMap::from([(POOL_IN, (U256::from(1u64), U256::from(1u64)))]);
        assert!(resolved.materialize(&reserves).is_err());
    }
}

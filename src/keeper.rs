use crate::config::KeeperConfig;
use crate::data_sync::{BlockWatcher, ChainReader, ReserveSnapshot, ReserveSource, ResolvedRoute, resolve_routes};
use crate::engine::{self, ArbitrageDecision, EvaluatedRoute};
use crate::execution::{ArbExecutor, ExecutionRequest, FlashLoanExecutor};
use alloy_primitives::{Address, U256};
use eyre::{Result, eyre};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Drives one arbitrage decision cycle per block notification.
pub struct Keeper {
    routes: Vec<ResolvedRoute>,
    /// Deduplicated pool list; every snapshot request uses this order.
    pools: Vec<Address>,
    stable: Address,
    principal: U256,
    debt: U256,
    reserve_source: Arc<dyn ReserveSource>,
    executor: Arc<dyn ArbExecutor>,
    /// One-slot execution guard. While a cycle holds it, new block triggers
    /// are dropped rather than queued: an opportunity computed against an
    /// old snapshot is worthless.
    guard: Mutex<()>,
}

impl Keeper {
    pub fn new(
        routes: Vec<ResolvedRoute>,
        stable: Address,
        principal: U256,
        premium_numerator: u64,
        reserve_source: Arc<dyn ReserveSource>,
        executor: Arc<dyn ArbExecutor>,
    ) -> Self {
        let mut pools = Vec::new();
        for route in &routes {
            for pool in &route.pools {
                if !pools.contains(pool) {
                    pools.push(*pool);
                }
            }
        }
        let debt = engine::total_debt(principal, premium_numerator);

        Self { routes, pools, stable, principal, debt, reserve_source, executor, guard: Mutex::new(()) }
    }

    /// Handle one block trigger.
    ///
    /// Returns the decision when a cycle ran, or `None` when the trigger
    /// was dropped or the cycle failed. The guard is a lexical scope, so it
    /// is released on every exit path alike: no-trade returns, execution
    /// handoff, and errors.
    pub async fn on_block(&self, block_number: u64) -> Option<ArbitrageDecision> {
        let Ok(_guard) = self.guard.try_lock() else {
            info!(block = block_number, "cycle in flight, dropping block");
            return None;
        };

        match self.cycle(block_number).await {
            Ok(decision) => Some(decision),
            Err(err) => {
                error!(block = block_number, "cycle failed: {err:#}");
                None
            }
        }
    }

    async fn cycle(&self, block_number: u64) -> Result<ArbitrageDecision> {
        let snapshot = self.reserve_source.snapshot(&self.pools).await?;
        let reserves = self.reserve_map(&snapshot)?;

        let mut evaluated = Vec::with_capacity(self.routes.len());
        for resolved in &self.routes {
            let route = resolved.materialize(&reserves)?;
            let amount_out = engine::evaluate_route(&route, self.principal);
            evaluated.push(EvaluatedRoute { route, amount_out });
        }

        let decision = engine::evaluate(&evaluated, self.debt)?;
        info!(
            block = block_number,
            snapshot_block = snapshot.block_number,
            net = %decision.net,
            "cycle evaluated"
        );

        if decision.execute {
            let request = ExecutionRequest {
                asset: self.stable,
                amount: self.principal,
                forward: decision.forward.clone(),
                reverse: decision.reverse.clone(),
            };
            let hash = self.executor.execute(&request).await?;
            info!(block = block_number, tx = %hash, "flashloan handoff complete");
        }

        Ok(decision)
    }

    fn reserve_map(&self, snapshot: &ReserveSnapshot) -> Result<HashMap<Address, (U256, U256)>> {
        if snapshot.reserves.len() != self.pools.len() {
            return Err(eyre!(
                "snapshot size mismatch: requested {} pools, got {}",
                self.pools.len(),
                snapshot.reserves.len()
            ));
        }
        Ok(self.pools.iter().copied().zip(snapshot.reserves.iter().copied()).collect())
    }
}

/// Start the keeper from configuration: resolve pool orientations, then
/// process block notifications until the watcher shuts down.
///
/// Orientation discovery failure is fatal here; a keeper with unresolved
/// pools has no safe degraded mode.
pub async fn run(config: KeeperConfig) -> Result<()> {
    let reader = Arc::new(ChainReader::new(
        config.rpc.multicall_address,
        config.rpc.http_url.clone(),
        config.rpc.http_timeout(),
    )?);
    let executor = Arc::new(FlashLoanExecutor::new(
        &config.rpc.http_url,
        &config.executor.private_key,
        config.executor.flashloan_address,
    )?);

    let routes = resolve_routes(reader.as_ref(), &config.routes).await?;
    let keeper = Arc::new(Keeper::new(
        routes,
        config.assets.stable,
        config.principal()?,
        config.borrow.premium_numerator,
        reader,
        executor,
    ));

    let watcher = BlockWatcher::new(
        config.rpc.wss_url.clone(),
        config.rpc.ws_connection_timeout(),
        config.rpc.max_reconnect_attempts,
        config.rpc.reconnect_delay(),
        config.rpc.channel_buffer_size,
    );
    let (mut block_rx, _shutdown_tx) = watcher.subscribe_new_heads().await?;
    info!("keeper online, waiting for blocks");

    while let Some(header) = block_rx.recv().await {
        let block_number = match header.block_number() {
            Ok(number) => number,
            Err(e) => {
                warn!("skipping malformed block header: {e}");
                continue;
            }
        };
        // Cycles run detached so a slow cycle never backs the channel up;
        // overlapping triggers fall into the guard's drop path instead.
        let keeper = Arc::clone(&keeper);
        tokio::spawn(async move {
            keeper.on_block(block_number).await;
        });
    }

    Ok(())
}

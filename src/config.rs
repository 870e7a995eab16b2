use crate::constants::{DEFAULT_MULTICALL, DEFAULT_PREMIUM_NUMERATOR};
use alloy_primitives::{Address, U256};
use dotenvy::dotenv;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{env, fs};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// RPC endpoints and connection policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// WebSocket endpoint for the newHeads subscription.
    pub wss_url: String,
    /// HTTP endpoint for Multicall reads and transaction submission.
    pub http_url: String,
    #[serde(default = "default_multicall")]
    pub multicall_address: Address,
    #[serde(default = "default_ws_timeout_secs")]
    pub ws_connection_timeout_secs: u64,
    #[serde(default = "default_max_reconnects")]
    pub max_reconnect_attempts: u32,
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
}

impl RpcConfig {
    pub fn ws_connection_timeout(&self) -> Duration {
        Duration::from_secs(self.ws_connection_timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn default_multicall() -> Address {
    DEFAULT_MULTICALL
}

fn default_ws_timeout_secs() -> u64 {
    30
}

fn default_max_reconnects() -> u32 {
    5
}

fn default_reconnect_delay_secs() -> u64 {
    2
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_channel_buffer() -> usize {
    100
}

/// The two endpoints every route shares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Borrowed asset, the input and settlement side of every cycle.
    pub stable: Address,
    /// Asset the forward leg buys and the reverse leg sells.
    pub target: Address,
}

/// Flash-borrow sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorrowConfig {
    /// Amount in human units of the stable asset, as a decimal integer
    /// string.
    pub amount: String,
    /// Decimals of the stable asset.
    pub decimals: u8,
    /// Lending-pool premium numerator in 1/10_000 units.
    #[serde(default = "default_premium_numerator")]
    pub premium_numerator: u64,
}

fn default_premium_numerator() -> u64 {
    DEFAULT_PREMIUM_NUMERATOR
}

/// Flash-loan contract and signing key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    pub flashloan_address: Address,
    /// Keeper signing key, usually supplied as `${PRIVATE_KEY}`.
    pub private_key: String,
}

/// One candidate conversion route: `pools[i]` trades `assets[i]` into
/// `assets[i + 1]`, and `venue` names the router that services the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    pub assets: Vec<Address>,
    pub pools: Vec<Address>,
    pub venue: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeeperConfig {
    pub rpc: RpcConfig,
    pub assets: AssetsConfig,
    pub borrow: BorrowConfig,
    pub executor: ExecutorConfig,
    pub routes: Vec<RouteConfig>,
}

impl KeeperConfig {
    /// Borrow amount scaled to the stable asset's base units.
    pub fn principal(&self) -> Result<U256, LoadConfigError> {
        let amount: U256 = self
            .borrow
            .amount
            .parse()
            .map_err(|e| LoadConfigError::Invalid(format!("borrow amount: {e}")))?;
        if amount.is_zero() {
            return Err(LoadConfigError::Invalid("borrow amount must be non-zero".to_string()));
        }
        Ok(amount * U256::from(10u64).pow(U256::from(self.borrow.decimals)))
    }

    fn validate(&self) -> Result<(), LoadConfigError> {
        if self.routes.len() < 2 {
            return Err(LoadConfigError::Invalid(format!(
                "need at least two routes to arbitrage, got {}",
                self.routes.len()
            )));
        }
        for (i, route) in self.routes.iter().enumerate() {
            if route.pools.is_empty() {
                return Err(LoadConfigError::Invalid(format!("route {i} has no pools")));
            }
            if route.assets.len() != route.pools.len() + 1 {
                return Err(LoadConfigError::Invalid(format!(
                    "route {i}: {} pools need {} assets, got {}",
                    route.pools.len(),
                    route.pools.len() + 1,
                    route.assets.len()
                )));
            }
            if route.assets.first() != Some(&self.assets.stable)
                || route.assets.last() != Some(&self.assets.target)
            {
                return Err(LoadConfigError::Invalid(format!(
                    "route {i} must start at the stable asset and end at the target asset"
                )));
            }
        }
        self.principal()?;
        Ok(())
    }
}

/// Load and validate the keeper configuration.
///
/// `${VAR}` placeholders in the file are expanded from the environment
/// after `.env` is read, so secrets stay out of the config file.
pub fn load(path: &str) -> Result<KeeperConfig, LoadConfigError> {
    dotenv().ok();
    let contents = fs::read_to_string(path)?;
    let contents = expand_vars(&contents);
    let config: KeeperConfig = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

fn expand_vars(raw_config: &str) -> String {
    // https://stackoverflow.com/questions/62888154/rust-load-environment-variables-into-log4rs-yml-file
    let re = Regex::new(r"\$\{([a-zA-Z_][0-9a-zA-Z_]*)\}").unwrap();
    re.replace_all(raw_config, |caps: &Captures| match env::var(&caps[1]) {
        Ok(val) => val,
        Err(_) => caps[0].to_string(),
    })
    .to_string()
}

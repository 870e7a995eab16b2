use crate::data_sync::orientation::OrientationSource;
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, sol};
use async_trait::async_trait;
use eyre::{Result, eyre};
use serde_json::Value;
use std::time::Duration;

sol! {
    /// Multicall3 batching interface: every pool's reserves in one call.
    contract Multicall3 {
        struct Call {
            address target;
            bytes callData;
        }

        function aggregate(Call[] calldata calls) public view returns (uint256 blockNumber, bytes[] memory returnData);
    }

    interface IUniswapV2Pair {
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
        function token0() external view returns (address);
    }
}

/// Reserve pairs for a set of pools, all read at one chain height.
///
/// The block number is the one Multicall3 reports for the aggregate call,
/// which anchors every pair in the snapshot to the same state root.
#[derive(Debug, Clone)]
pub struct ReserveSnapshot {
    pub block_number: u64,
    /// Raw `(reserve0, reserve1)` pairs in request order, not yet oriented.
    pub reserves: Vec<(U256, U256)>,
}

/// Source of single-height, order-preserving reserve snapshots.
#[async_trait]
pub trait ReserveSource: Send + Sync {
    async fn snapshot(&self, pools: &[Address]) -> Result<ReserveSnapshot>;
}

/// JSON-RPC reader for pool state: batched reserves via Multicall3, plus
/// the one-time `token0` discovery reads.
#[derive(Debug, Clone)]
pub struct ChainReader {
    multicall_address: Address,
    http_client: reqwest::Client,
    rpc_url: String,
}

impl ChainReader {
    pub fn new(multicall_address: Address, rpc_url: String, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { multicall_address, http_client, rpc_url })
    }

    /// Prepare a `getReserves()` call for one pool.
    fn reserves_call(pool: Address) -> Multicall3::Call {
        Multicall3::Call {
            target: pool,
            callData: IUniswapV2Pair::getReservesCall {}.abi_encode().into(),
        }
    }

    /// `eth_call` against the latest block.
    async fn call_contract(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let request_body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "eth_call",
            "params": [
                {
                    "to": format!("{to:#x}"),
                    "data": format!("{data:#x}")
                },
                "latest"
            ],
            "id": 1
        });

        let response = self
            .http_client
            .post(&self.rpc_url)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let response_json: Value = response.json().await?;

        if let Some(error) = response_json.get("error") {
            return Err(eyre!("RPC error: {error}"));
        }

        let result = response_json
            .get("result")
            .and_then(|r| r.as_str())
            .ok_or_else(|| eyre!("missing result in RPC response"))?;

        let bytes = hex::decode(result.trim_start_matches("0x"))?;
        Ok(bytes.into())
    }
}

#[async_trait]
impl ReserveSource for ChainReader {
    /// Read every pool's reserves in a single aggregate call.
    ///
    /// A pool whose return data does not decode fails the whole snapshot:
    /// a partially populated snapshot would silently evaluate routes
    /// against mismatched state.
    async fn snapshot(&self, pools: &[Address]) -> Result<ReserveSnapshot> {
        let calls: Vec<Multicall3::Call> = pools.iter().copied().map(Self::reserves_call).collect();
        let data = Multicall3::aggregateCall { calls }.abi_encode();

        let response = self.call_contract(self.multicall_address, data.into()).await?;
        let decoded = Multicall3::aggregateCall::abi_decode_returns(&response)?;

        if decoded.returnData.len() != pools.len() {
            return Err(eyre!(
                "snapshot size mismatch: requested {} pools, got {}",
                pools.len(),
                decoded.returnData.len()
            ));
        }
        let block_number = u64::try_from(decoded.blockNumber)
            .map_err(|_| eyre!("snapshot block number out of range"))?;

        let mut reserves = Vec::with_capacity(pools.len());
        for (pool, return_data) in pools.iter().zip(decoded.returnData.iter()) {
            let pair = IUniswapV2Pair::getReservesCall::abi_decode_returns(return_data)
                .map_err(|e| eyre!("failed to decode reserves for pool {pool}: {e}"))?;
            reserves.push((U256::from(pair.reserve0), U256::from(pair.reserve1)));
        }

        Ok(ReserveSnapshot { block_number, reserves })
    }
}

#[async_trait]
impl OrientationSource for ChainReader {
    async fn token0(&self, pool: Address) -> Result<Address> {
        let data = IUniswapV2Pair::token0Call {}.abi_encode();
        let response = self.call_contract(pool, data.into()).await?;
        let token0 = IUniswapV2Pair::token0Call::abi_decode_returns(&response)
            .map_err(|e| eyre!("failed to decode token0 for pool {pool}: {e}"))?;
        Ok(token0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolValue;

    #[test]
    fn reserves_call_targets_the_pool() {
        let pool = Address::repeat_byte(0x42);
        let call = ChainReader::reserves_call(pool);

        assert_eq!(call.target, pool);
        let expected_selector = &IUniswapV2Pair::getReservesCall {}.abi_encode()[0..4];
        assert_eq!(&call.callData[0..4], expected_selector);
    }

    #[test]
    fn aggregate_round_trip_preserves_order_and_height() {
        // uint112 occupies a full word on the wire, so reserve pairs can be
        // modeled with plain U256 values that fit the narrower type.
        let reserves_a: Bytes = (U256::from(111u64), U256::from(222u64), 0u32).abi_encode_sequence().into();
        let reserves_b: Bytes = (U256::from(333u64), U256::from(444u64), 0u32).abi_encode_sequence().into();
        let payload = (U256::from(987_654u64), vec![reserves_a, reserves_b]).abi_encode_sequence();

        let decoded = Multicall3::aggregateCall::abi_decode_returns(&payload).unwrap();
        assert_eq!(u64::try_from(decoded.blockNumber).unwrap(), 987_654);

        let first = IUniswapV2Pair::getReservesCall::abi_decode_returns(&decoded.returnData[0]).unwrap();
        assert_eq!(U256::from(first.reserve0), U256::from(111u64));
        let second = IUniswapV2Pair::getReservesCall::abi_decode_returns(&decoded.returnData[1]).unwrap();
        assert_eq!(U256::from(second.reserve1), U256::from(444u64));
    }

    #[test]
    fn chain_reader_construction() {
        let reader = ChainReader::new(
            Address::repeat_byte(0x11),
            "https://polygon-rpc.example".to_string(),
            Duration::from_secs(10),
        )
        .unwrap();
        assert_eq!(reader.multicall_address, Address::repeat_byte(0x11));
    }
}

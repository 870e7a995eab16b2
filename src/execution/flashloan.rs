use crate::engine::TradePath;
use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, B256, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{SolCall, sol};
use async_trait::async_trait;
use eyre::{Result, eyre};
use tracing::info;

sol! {
    /// The on-chain flash-loan contract this keeper drives. `path0` walks
    /// the forward leg on `router0`, `path1` the reverse leg on `router1`.
    interface IFlashArb {
        function flashloan(address asset, uint256 amount, address[] calldata path0, address[] calldata path1, uint8 router0, uint8 router1) external;
        function withdraw(address asset) external;
        function changeKeeper(address newKeeper) external;
    }

    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
    }
}

/// Everything the executor needs for one flash-loan request.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// Borrowed asset.
    pub asset: Address,
    /// Borrowed principal in base units.
    pub amount: U256,
    pub forward: TradePath,
    pub reverse: TradePath,
}

/// External execution boundary: hand off a profitable two-leg path.
#[async_trait]
pub trait ArbExecutor: Send + Sync {
    /// Submit the request and return the confirmed transaction hash.
    async fn execute(&self, request: &ExecutionRequest) -> Result<B256>;
}

/// Submits flash-loan requests as locally signed transactions.
pub struct FlashLoanExecutor {
    provider: DynProvider,
    flashloan_address: Address,
    keeper_address: Address,
}

impl FlashLoanExecutor {
    pub fn new(http_url: &str, private_key: &str, flashloan_address: Address) -> Result<Self> {
        let signer: PrivateKeySigner =
            private_key.trim().parse().map_err(|_| eyre!("invalid keeper private key"))?;
        let keeper_address = signer.address();
        let wallet = EthereumWallet::from(signer);

        let url = http_url.parse().map_err(|e| eyre!("invalid http rpc url: {e}"))?;
        let provider = ProviderBuilder::new().wallet(wallet).connect_http(url).erased();

        info!("keeper address: {keeper_address}");
        Ok(Self { provider, flashloan_address, keeper_address })
    }

    pub fn keeper_address(&self) -> Address {
        self.keeper_address
    }

    /// Encode the flash-loan request calldata.
    fn flashloan_calldata(request: &ExecutionRequest) -> Vec<u8> {
        IFlashArb::flashloanCall {
            asset: request.asset,
            amount: request.amount,
            path0: request.forward.assets.clone(),
            path1: request.reverse.assets.clone(),
            router0: request.forward.venue,
            router1: request.reverse.venue,
        }
        .abi_encode()
    }

    /// Send a contract call to the flash-loan contract and wait until it is
    /// mined.
    async fn send_call(&self, calldata: Vec<u8>) -> Result<B256> {
        let tx = TransactionRequest::default()
            .with_to(self.flashloan_address)
            .with_input(calldata);
        let pending = self.provider.send_transaction(tx).await?;
        let hash = pending.watch().await?;
        Ok(hash)
    }

    /// Sweep accumulated profit out of the flash-loan contract. Returns
    /// `None` when the contract holds nothing to withdraw.
    pub async fn withdraw(&self, asset: Address) -> Result<Option<B256>> {
        let balance_call = IERC20::balanceOfCall { owner: self.flashloan_address }.abi_encode();
        let call = TransactionRequest::default().with_to(asset).with_input(balance_call);
        let response = self.provider.call(call).await?;
        let balance = IERC20::balanceOfCall::abi_decode_returns(&response)?;

        if balance.is_zero() {
            info!("empty balance, nothing to withdraw");
            return Ok(None);
        }

        info!("withdrawing {balance} base units of {asset}");
        let hash = self.send_call(IFlashArb::withdrawCall { asset }.abi_encode()).await?;
        info!(tx = %hash, "withdraw request mined");
        Ok(Some(hash))
    }

    /// Rotate the keeper address authorized on the contract.
    pub async fn change_keeper(&self, new_keeper: Address) -> Result<B256> {
        info!("updating keeper to {new_keeper}");
        let hash = self.send_call(IFlashArb::changeKeeperCall { newKeeper: new_keeper }.abi_encode()).await?;
        info!(tx = %hash, "keeper change request mined");
        Ok(hash)
    }
}

#[async_trait]
impl ArbExecutor for FlashLoanExecutor {
    async fn execute(&self, request: &ExecutionRequest) -> Result<B256> {
        let hash = self.send_call(Self::flashloan_calldata(request)).await?;
        info!(tx = %hash, "flashloan request mined");
        Ok(hash)
    }
}

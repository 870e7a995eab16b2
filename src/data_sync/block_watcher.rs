use eyre::{Result, eyre};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use url::Url;

/// Block header fields carried by a newHeads notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: String,
    pub hash: String,
    #[serde(rename = "parentHash")]
    pub parent_hash: String,
    pub timestamp: String,
}

impl BlockHeader {
    /// Parse the block number from its hex string form.
    pub fn block_number(&self) -> Result<u64> {
        let num_str = self.number.trim_start_matches("0x");
        u64::from_str_radix(num_str, 16).map_err(|e| eyre!("invalid block number format: {e}"))
    }
}

/// Subscribes to newHeads over WebSocket and feeds block headers into a
/// bounded channel.
///
/// The channel deliberately drops headers when full: the keeper only acts
/// on fresh state, so a backlog of old block notifications has no value.
pub struct BlockWatcher {
    rpc_url: String,
    connection_timeout: Duration,
    max_reconnect_attempts: u32,
    reconnect_delay: Duration,
    channel_buffer_size: usize,
}

impl BlockWatcher {
    pub fn new(
        rpc_url: String,
        connection_timeout: Duration,
        max_reconnect_attempts: u32,
        reconnect_delay: Duration,
        channel_buffer_size: usize,
    ) -> Self {
        Self { rpc_url, connection_timeout, max_reconnect_attempts, reconnect_delay, channel_buffer_size }
    }

    /// Start the newHeads subscription.
    ///
    /// Returns the header receiver and a shutdown sender. The watcher task
    /// reconnects with a fixed delay until the configured attempts run out.
    pub async fn subscribe_new_heads(&self) -> Result<(mpsc::Receiver<BlockHeader>, mpsc::Sender<()>)> {
        let (block_tx, block_rx) = mpsc::channel(self.channel_buffer_size);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        let rpc_url = self.rpc_url.clone();
        let connection_timeout = self.connection_timeout;
        let max_reconnect_attempts = self.max_reconnect_attempts;
        let reconnect_delay = self.reconnect_delay;

        tokio::spawn(async move {
            let mut reconnect_count = 0;

            loop {
                match Self::connect_and_subscribe(&rpc_url, connection_timeout, &block_tx, &mut shutdown_rx).await {
                    Ok(()) => {
                        info!("block subscription ended normally");
                        break;
                    }
                    Err(e) => {
                        error!("block subscription error: {e}");
                        reconnect_count += 1;

                        if reconnect_count >= max_reconnect_attempts {
                            error!("max reconnection attempts reached, giving up");
                            break;
                        }

                        warn!("attempting reconnection #{reconnect_count} in {reconnect_delay:?}");
                        sleep(reconnect_delay).await;
                    }
                }
            }
        });

        Ok((block_rx, shutdown_tx))
    }

    async fn connect_and_subscribe(
        rpc_url: &str,
        connection_timeout: Duration,
        block_tx: &mpsc::Sender<BlockHeader>,
        shutdown_rx: &mut mpsc::Receiver<()>,
    ) -> Result<()> {
        let url = Url::parse(rpc_url)?;
        info!("connecting to websocket: {url}");

        let (ws_stream, _) = timeout(connection_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| eyre!("websocket connection timeout"))?
            .map_err(|e| eyre!("websocket connection failed: {e}"))?;

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        let subscribe_request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_subscribe",
            "params": ["newHeads"]
        });
        ws_sender.send(Message::Text(subscribe_request.to_string().into())).await?;

        // The first reply confirms the subscription or reports an error.
        match ws_receiver.next().await {
            Some(Ok(Message::Text(text))) => {
                let response: Value = serde_json::from_str(text.as_str())?;
                if let Some(result) = response.get("result") {
                    info!("newHeads subscription confirmed with id {result}");
                } else if let Some(error) = response.get("error") {
                    return Err(eyre!("subscription error: {error}"));
                } else {
                    return Err(eyre!("unexpected subscription response: {text}"));
                }
            }
            Some(Ok(msg)) => return Err(eyre!("unexpected message type during subscription: {msg:?}")),
            Some(Err(e)) => return Err(eyre!("websocket error during subscription: {e}")),
            None => return Err(eyre!("websocket closed during subscription")),
        }

        loop {
            tokio::select! {
                ws_msg = ws_receiver.next() => {
                    match ws_msg {
                        Some(Ok(Message::Text(text))) => {
                            if let Err(e) = Self::handle_message(text.as_str(), block_tx) {
                                warn!("failed to handle websocket message: {e}");
                            }
                        }
                        Some(Ok(Message::Close(_))) => {
                            info!("websocket closed by server");
                            break;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = ws_sender.send(Message::Pong(data)).await {
                                error!("failed to send pong: {e}");
                                break;
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            error!("websocket error: {e}");
                            break;
                        }
                        None => {
                            info!("websocket stream ended");
                            break;
                        }
                    }
                }

                _ = shutdown_rx.recv() => {
                    info!("received shutdown signal");
                    return Ok(());
                }
            }
        }

        Err(eyre!("websocket connection lost"))
    }

    fn handle_message(text: &str, block_tx: &mpsc::Sender<BlockHeader>) -> Result<()> {
        let message: Value = serde_json::from_str(text)?;

        // Only subscription notifications carry a params.result payload.
        if let Some(result) = message.get("params").and_then(|p| p.get("result")) {
            let header: BlockHeader = serde_json::from_value(result.clone())?;
            debug!("received new block {}", header.number);

            if let Err(e) = block_tx.try_send(header) {
                match e {
                    mpsc::error::TrySendError::Full(_) => {
                        warn!("block header channel is full, dropping block");
                    }
                    mpsc::error::TrySendError::Closed(_) => {
                        return Err(eyre!("block header channel is closed"));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_block_number() {
        let header = BlockHeader {
            number: "0x1a2b3c".to_string(),
            hash: "0xabcd".to_string(),
            parent_hash: "0x1234".to_string(),
            timestamp: "0x61234567".to_string(),
        };
        assert_eq!(header.block_number().unwrap(), 0x1a2b3c);

        let bad = BlockHeader { number: "zzz".to_string(), ..header };
        assert!(bad.block_number().is_err());
    }

    #[tokio::test]
    async fn notification_lands_in_the_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let notification = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "eth_subscription",
            "params": {
                "subscription": "0xcafe",
                "result": {
                    "number": "0x10",
                    "hash": "0xaa",
                    "parentHash": "0xbb",
                    "timestamp": "0x1"
                }
            }
        });
        BlockWatcher::handle_message(&notification.to_string(), &tx).unwrap();
        let header = rx.try_recv().unwrap();
        assert_eq!(header.block_number().unwrap(), 16);
    }

    #[tokio::test]
    async fn full_channel_drops_quietly() {
        let (tx, mut rx) = mpsc::channel(1);
        let notification = serde_json::json!({
            "params": { "result": {
                "number": "0x1", "hash": "0x", "parentHash": "0x", "timestamp": "0x0"
            }}
        });
        BlockWatcher::handle_message(&notification.to_string(), &tx).unwrap();
        // Second header overflows the one-slot buffer and is dropped.
        BlockWatcher::handle_message(&notification.to_string(), &tx).unwrap();
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}

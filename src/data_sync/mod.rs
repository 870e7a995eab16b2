/// Data Synchronization Layer
///
/// Everything the engine consumes from the chain:
///
/// - WebSocket-based block-event subscription (newHeads)
/// - Multicall-based batched reserve snapshots at a single height
/// - One-time pool orientation discovery
pub mod block_watcher;
pub mod orientation;
pub mod reserve_reader;

pub use block_watcher::{BlockHeader, BlockWatcher};
pub use orientation::{OrientationSource, ResolvedRoute, resolve_routes};
pub use reserve_reader::{ChainReader, ReserveSnapshot, ReserveSource};

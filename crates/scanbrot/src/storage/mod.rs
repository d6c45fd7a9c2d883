//! # Storage
//!
//! The backing store, the one channel to it, and the controller that owns
//! that channel.

pub mod addressing;
pub mod channel;
pub mod controller;
pub mod store;

pub use addressing::RowAddresser;
pub use channel::{ChannelOp, ChannelStats, Direction, StorageChannel};
pub use controller::{prefetch_target, ControllerState, ControllerStats, Handshake, StorageController};
pub use store::{BackingStore, MemoryStore};

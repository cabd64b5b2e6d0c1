//! Topic feeds.
//!
//! A fixed set of topics (from config), each backed by a broadcast channel.
//! Events are encoded at most once per wire format no matter how many
//! sessions receive them.

pub mod envelope;
pub mod event;
pub mod hub;

pub use envelope::ClientMessage;
pub use event::FeedEvent;
pub use hub::FeedHub;

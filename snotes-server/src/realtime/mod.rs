//! Real-time fan-out of project events
//!
//! [`ChannelHub`] keeps one broadcast channel per project that currently has
//! subscribers; [`ws`] serves those channels over WebSocket.

pub mod broadcaster;
pub mod ws;

pub use broadcaster::{ChannelHub, EventPublisher, Subscription};

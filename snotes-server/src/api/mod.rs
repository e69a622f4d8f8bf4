//! HTTP API handlers for snotes-server
//!
//! Every mutation follows the same sequence: validate the body, authorize the
//! caller through the guard, apply one store change, publish at most one
//! event, respond. A failure at any step stops the sequence, so rejected
//! requests never touch the store and failed writes never broadcast.

pub mod cells;
pub mod extract;
pub mod health;
pub mod notes;
pub mod projects;
pub mod songs;
pub mod steps;

pub use health::health_routes;

//! Room-based WebSocket chat relay library.
//!
//! Clients join a named room over a WebSocket, publish text messages, and
//! receive messages published by any other client in the same room, plus a
//! bounded recent-history replay on join and a live online-user roster.
//! Multiple server processes can share one logical room through an external
//! pub/sub channel.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// configuration
pub mod config;

// shared library
pub mod common;

//! Concrete implementations of the domain ports, plus the process-local
//! fan-out machinery (session registry and room broadcast bridge).

pub mod fanout;
pub mod inmemory;
pub mod redis;
pub mod sqlite;

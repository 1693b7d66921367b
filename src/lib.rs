// LRU reading cache and priority task scheduler behind a JSON/HTTP surface.

pub mod config;
pub mod engine;
pub mod error;
pub mod server;
pub mod source;
pub mod telemetry;

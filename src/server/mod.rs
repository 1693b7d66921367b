// HTTP surface: thin axum adapter over the engines.

pub mod handler;
pub mod state;

// Engine core: the reading cache and the task scheduler, each behind its own lock.

pub mod cache;
pub mod scheduler;
pub mod stats;

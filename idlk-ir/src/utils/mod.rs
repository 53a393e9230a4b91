//! Utility modules for idlk-ir

pub mod db_retry;
pub mod pool_monitor;

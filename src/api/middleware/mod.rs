//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Auth resolver: bearer token → `Principal`
//! 2. Access logger: logs after auth, has the caller

pub mod audit;
pub mod auth;

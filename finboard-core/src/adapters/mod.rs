//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - reqwest HTTP client for the TransactionApi port

pub mod http;

#[cfg(test)]
pub mod mock_api;

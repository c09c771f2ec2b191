//! Model provider adapters.
//!
//! Each provider implements the backend trait for its specific API.

mod foundry;

pub use foundry::{DEFAULT_API_VERSION, FoundryClient, FoundryClientBuilder};

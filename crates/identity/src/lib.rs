//! Entra ID bearer tokens for lakechat.
//!
//! Every remote call lakechat makes (the agent project, the Fabric REST API
//! and the lakehouse SQL endpoint) authenticates with an OAuth2 access token
//! for a specific scope. This crate provides the [`TokenCredential`] seam and
//! the sources that can fill it.
//!
//! # Sources
//!
//! - [`ClientSecretCredential`]: service principal, client-credentials grant.
//! - [`StaticTokenCredential`]: a pre-issued token, mostly for CI and tests.
//! - [`AzureCliCredential`]: whatever account `az login` signed into.
//! - [`DefaultCredential`]: tries the above in that order.
//!
//! Wrap any of them in [`CachedCredential`] to reuse tokens until they
//! expire.
//!
//! # Example
//!
//! ```no_run
//! use identity::{CachedCredential, DefaultCredential, TokenCredential};
//!
//! # async fn example() -> identity::Result<()> {
//! let credential = CachedCredential::new(DefaultCredential::from_env());
//! let token = credential.token("https://ai.azure.com/.default").await?;
//! println!("expires at {}", token.expires_at);
//! # Ok(())
//! # }
//! ```

mod azure_cli;
mod cache;
mod client_secret;
mod credential;
mod default;
mod error;
mod token;

pub use azure_cli::AzureCliCredential;
pub use cache::CachedCredential;
pub use client_secret::ClientSecretCredential;
pub use credential::{StaticTokenCredential, TokenCredential};
pub use default::{CredentialSource, DefaultCredential};
pub use error::{Error, Result};
pub use token::AccessToken;

/// Scope for the AI project (agents, conversations, responses).
pub const AI_PROJECT_SCOPE: &str = "https://ai.azure.com/.default";

/// Scope for the Fabric REST API.
pub const FABRIC_API_SCOPE: &str = "https://api.fabric.microsoft.com/.default";

/// Scope for SQL endpoints (the double slash is part of the resource id).
pub const SQL_DATABASE_SCOPE: &str = "https://database.windows.net//.default";

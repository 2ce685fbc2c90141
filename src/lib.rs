//! Microsoft account authentication for Minecraft.
//!
//! This crate turns a Microsoft OAuth2 authorization code into a verified
//! Minecraft profile by walking the full token-exchange chain:
//!
//! 1. Authorization code → Microsoft access token
//! 2. Microsoft access token → Xbox Live token + user hash
//! 3. Xbox Live token → XSTS token (Minecraft relying party)
//! 4. XSTS token + user hash → Minecraft access token
//! 5. Entitlement check (does the account own the game?)
//! 6. Profile fetch
//!
//! Every stage is strictly sequential; a failure at any stage aborts the
//! whole chain with an error naming the stage. An account that does not own
//! Minecraft is a defined negative outcome, not an error: [`AuthClient::connect`]
//! returns `Ok(None)` in that case.
//!
//! Offline (no-network) profiles are also supported, deriving the stable
//! offline-player UUID from the username alone.
//!
//! # Example
//!
//! ```no_run
//! use mc_auth::{AuthClient, AuthConfig};
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mc_auth::AuthError> {
//!     let config = AuthConfig::new(
//!         "azure-app-client-id",
//!         "azure-app-client-secret",
//!         Url::parse("http://localhost/auth-response").unwrap(),
//!     );
//!     let client = AuthClient::new(config)?;
//!
//!     // `code` comes from the OAuth2 redirect after user consent.
//!     let code = "M.R3_BAY...";
//!     match client.connect(code).await? {
//!         Some(profile) => println!("logged in as {} ({})", profile.username(), profile.uuid()),
//!         None => println!("this account does not own Minecraft"),
//!     }
//!
//!     // Offline mode needs no network at all.
//!     let offline = client.connect_offline("Venodez")?;
//!     assert_eq!(offline.uuid(), "0e866771-0dd6-3df5-b3de-6172ce2befe3");
//!     Ok(())
//! }
//! ```
//!
//! Tokens are never logged; no credential is cached between calls.

pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod offline;
pub mod profile;

pub use client::AuthClient;
pub use config::{AuthConfig, Endpoints, HttpTimeouts};
pub use errors::{AuthError, Result, Stage, XstsError};
pub use models::{McCape, McSkin, XblIdentity};
pub use offline::offline_uuid;
pub use profile::Profile;

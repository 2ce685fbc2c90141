use std::time::Duration;

use url::Url;

use crate::errors::{AuthError, Result};

/// Production endpoints for the authentication chain
pub mod endpoints {
    pub const MS_TOKEN: &str = "https://login.microsoftonline.com/consumers/oauth2/v2.0/token";
    pub const XBL_AUTHENTICATE: &str = "https://user.auth.xboxlive.com/user/authenticate";
    pub const XSTS_AUTHORIZE: &str = "https://xsts.auth.xboxlive.com/xsts/authorize";
    pub const MC_LOGIN: &str = "https://api.minecraftservices.com/authentication/login_with_xbox";
    pub const MC_ENTITLEMENTS: &str = "https://api.minecraftservices.com/entitlements/mcstore";
    pub const MC_PROFILE: &str = "https://api.minecraftservices.com/minecraft/profile";
}

/// OAuth scope requested in the authorization-code exchange
pub const SCOPE: &str = "XboxLive.signin";

/// Xbox Live sandbox used by retail accounts
pub const SANDBOX_ID: &str = "RETAIL";

/// Site name for the RPS ticket in the Xbox Live authenticate call
pub const XBL_SITE_NAME: &str = "user.auth.xboxlive.com";

/// Relying parties
pub const RP_XBOXLIVE_AUTH: &str = "http://auth.xboxlive.com";
pub const RP_MINECRAFT: &str = "rp://api.minecraftservices.com/";

/// Resolved endpoint set used by one [`crate::AuthClient`].
///
/// Defaults to the production URLs; tests point individual stages at mock
/// servers.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub ms_token: String,
    pub xbl_authenticate: String,
    pub xsts_authorize: String,
    pub mc_login: String,
    pub mc_entitlements: String,
    pub mc_profile: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            ms_token: endpoints::MS_TOKEN.to_string(),
            xbl_authenticate: endpoints::XBL_AUTHENTICATE.to_string(),
            xsts_authorize: endpoints::XSTS_AUTHORIZE.to_string(),
            mc_login: endpoints::MC_LOGIN.to_string(),
            mc_entitlements: endpoints::MC_ENTITLEMENTS.to_string(),
            mc_profile: endpoints::MC_PROFILE.to_string(),
        }
    }
}

/// HTTP client timeouts, applied uniformly to every outbound call
#[derive(Debug, Clone)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(15),
            request: Duration::from_secs(30),
        }
    }
}

/// Configuration for [`crate::AuthClient`]
///
/// Holds the Azure application credentials used in the authorization-code
/// exchange. Read-only for the lifetime of the client; safe to share across
/// concurrent `connect` calls.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Azure app client ID
    pub client_id: String,

    /// Azure app client secret
    pub client_secret: String,

    /// Azure app redirect URI (must match the one used during consent)
    pub redirect_uri: Url,

    /// HTTP client timeouts
    pub http_timeouts: HttpTimeouts,

    /// Custom user agent (optional)
    pub user_agent: Option<String>,

    /// Endpoint set; production URLs unless overridden
    pub endpoints: Endpoints,
}

impl AuthConfig {
    /// Create a config from Azure application credentials
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: Url,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri,
            http_timeouts: HttpTimeouts::default(),
            user_agent: Some("mc-auth".to_string()),
            endpoints: Endpoints::default(),
        }
    }

    /// Reject unusable credentials before any network call is made
    pub(crate) fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(AuthError::Config("client_id must not be empty".to_string()));
        }
        if self.client_secret.is_empty() {
            return Err(AuthError::Config(
                "client_secret must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

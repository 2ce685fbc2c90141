use serde::{Deserialize, Serialize};

/// Microsoft OAuth token request (form-encoded body)
#[derive(Debug, Clone, Serialize)]
pub struct MsTokenRequest<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub code: &'a str,
    pub redirect_uri: &'a str,
    pub grant_type: &'a str,
    pub scope: &'a str,
}

/// Microsoft OAuth token response
#[derive(Debug, Clone, Deserialize)]
pub struct MsTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Xbox Live user.authenticate request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct XblAuthRequest {
    pub properties: XblAuthProperties,
    pub relying_party: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct XblAuthProperties {
    pub auth_method: String,
    pub site_name: String,
    pub rps_ticket: String,
}

/// Xbox Live user.authenticate response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XblAuthResponse {
    pub token: String,
    pub display_claims: XblDisplayClaims,
}

#[derive(Debug, Clone, Deserialize)]
pub struct XblDisplayClaims {
    pub xui: Vec<XblUserInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct XblUserInfo {
    pub uhs: String,
}

/// Output of the Xbox Live stage: the session token plus the user hash that
/// must accompany it in the Minecraft Services login.
#[derive(Debug, Clone)]
pub struct XblIdentity {
    pub token: String,
    pub user_hash: String,
}

/// XSTS authorize request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct XstsAuthRequest {
    pub properties: XstsAuthProperties,
    pub relying_party: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct XstsAuthProperties {
    pub sandbox_id: String,
    pub user_tokens: Vec<String>,
}

/// XSTS authorize response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XstsAuthResponse {
    pub token: String,
}

/// XSTS error response (401)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XstsErrorResponse {
    #[serde(rename = "XErr")]
    pub xerr: u64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Minecraft login_with_xbox request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct McLoginRequest {
    pub identity_token: String,
}

/// Minecraft login_with_xbox response
#[derive(Debug, Clone, Deserialize)]
pub struct McLoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Entitlement (mcstore) response; the account owns the game iff `items` is
/// non-empty.
#[derive(Debug, Clone, Deserialize)]
pub struct EntitlementsResponse {
    #[serde(default)]
    pub items: Vec<EntitlementItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntitlementItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

/// Minecraft profile response
#[derive(Debug, Clone, Deserialize)]
pub struct McProfileResponse {
    /// UUID without dashes
    pub id: String,
    /// Player name
    pub name: String,
    #[serde(default)]
    pub skins: Vec<McSkin>,
    #[serde(default)]
    pub capes: Vec<McCape>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct McSkin {
    pub id: String,
    pub state: String,
    pub url: String,
    pub variant: String,
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct McCape {
    pub id: String,
    pub state: String,
    pub url: String,
    #[serde(default)]
    pub alias: Option<String>,
}

use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

use crate::errors::{AuthError, Result, Stage};
use crate::models::{McCape, McProfileResponse, McSkin};
use crate::offline::offline_uuid;

/// A resolved Minecraft profile.
///
/// Built exactly once, either from a verified Minecraft access token
/// (network-populated) or from a username (offline, purely computed), and
/// immutable afterwards. Offline profiles carry an empty access token and
/// no skins or capes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    access_token: String,
    username: String,
    uuid: String,
    skins: Vec<McSkin>,
    capes: Vec<McCape>,
}

impl Profile {
    /// Fetch the profile behind a Minecraft access token.
    #[instrument(skip(http, access_token))]
    pub(crate) async fn fetch(http: &Client, url: &str, access_token: &str) -> Result<Self> {
        debug!("fetching Minecraft profile");
        let response = http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::network(Stage::Profile, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AuthError::ProfileNotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Http {
                stage: Stage::Profile,
                status,
                body_snippet: body.chars().take(200).collect(),
            });
        }

        let profile: McProfileResponse = response
            .json()
            .await
            .map_err(|e| AuthError::invalid_response(Stage::Profile, e.to_string()))?;

        Ok(Self {
            access_token: access_token.to_string(),
            username: profile.name,
            uuid: profile.id,
            skins: profile.skins,
            capes: profile.capes,
        })
    }

    /// Build an offline profile from a username alone.
    ///
    /// Pure computation: no network, no scheduling. Fails only for an empty
    /// username.
    pub fn offline(username: &str) -> Result<Self> {
        if username.is_empty() {
            return Err(AuthError::EmptyUsername);
        }
        Ok(Self {
            access_token: String::new(),
            username: username.to_string(),
            uuid: offline_uuid(username).to_string(),
            skins: Vec::new(),
            capes: Vec::new(),
        })
    }

    /// Minecraft access token this profile was fetched with; empty for
    /// offline profiles.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Player name
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Player UUID. Online profiles carry the service's un-hyphenated form;
    /// offline profiles the hyphenated offline-player UUID.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn skins(&self) -> &[McSkin] {
        &self.skins
    }

    pub fn capes(&self) -> &[McCape] {
        &self.capes
    }

    /// Whether this profile was built without network authentication
    pub fn is_offline(&self) -> bool {
        self.access_token.is_empty()
    }
}

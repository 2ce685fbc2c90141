use reqwest::{Client, Response, StatusCode};
use tracing::{debug, instrument};

use crate::config::{AuthConfig, RP_MINECRAFT, RP_XBOXLIVE_AUTH, SANDBOX_ID, SCOPE, XBL_SITE_NAME};
use crate::errors::{AuthError, Result, Stage, XstsError};
use crate::models::*;
use crate::profile::Profile;

/// Client for the Microsoft → Xbox Live → XSTS → Minecraft token-exchange
/// pipeline.
///
/// Each [`connect`](AuthClient::connect) call owns its credential chain
/// exclusively; the client itself holds only read-only configuration and a
/// connection pool, so it can be shared and cloned freely across tasks.
#[derive(Debug, Clone)]
pub struct AuthClient {
    config: AuthConfig,
    http: Client,
}

impl AuthClient {
    /// Create a new authentication client.
    ///
    /// Fails fast on unusable application credentials, before any network
    /// call.
    pub fn new(config: AuthConfig) -> Result<Self> {
        config.validate()?;
        let http = Client::builder()
            .connect_timeout(config.http_timeouts.connect)
            .timeout(config.http_timeouts.request)
            .user_agent(config.user_agent.as_deref().unwrap_or("mc-auth"))
            .build()
            .map_err(|e| AuthError::Config(e.to_string()))?;

        Ok(Self { config, http })
    }

    /// Exchange an OAuth2 authorization code for a Microsoft access token
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let request = MsTokenRequest {
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            code,
            redirect_uri: self.config.redirect_uri.as_str(),
            grant_type: "authorization_code",
            scope: SCOPE,
        };

        debug!("exchanging authorization code for a Microsoft access token");
        let response = self
            .http
            .post(&self.config.endpoints.ms_token)
            .form(&request)
            .send()
            .await
            .map_err(|e| AuthError::network(Stage::MsTokenExchange, e))?;

        if !response.status().is_success() {
            return Err(Self::http_error(Stage::MsTokenExchange, response).await);
        }

        let token: MsTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::invalid_response(Stage::MsTokenExchange, e.to_string()))?;
        Ok(token.access_token)
    }

    /// Authenticate with Xbox Live, yielding the session token and user hash
    #[instrument(skip(self, ms_access_token))]
    pub async fn xbl_authenticate(&self, ms_access_token: &str) -> Result<XblIdentity> {
        let request = XblAuthRequest {
            properties: XblAuthProperties {
                auth_method: "RPS".to_string(),
                site_name: XBL_SITE_NAME.to_string(),
                rps_ticket: format!("d={ms_access_token}"),
            },
            relying_party: RP_XBOXLIVE_AUTH.to_string(),
            token_type: "JWT".to_string(),
        };

        debug!("authenticating with Xbox Live");
        let response = self
            .http
            .post(&self.config.endpoints.xbl_authenticate)
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AuthError::network(Stage::XblAuthenticate, e))?;

        if !response.status().is_success() {
            return Err(Self::http_error(Stage::XblAuthenticate, response).await);
        }

        let xbl: XblAuthResponse = response
            .json()
            .await
            .map_err(|e| AuthError::invalid_response(Stage::XblAuthenticate, e.to_string()))?;

        let user_hash = xbl
            .display_claims
            .xui
            .first()
            .map(|claim| claim.uhs.clone())
            .ok_or_else(|| {
                AuthError::invalid_response(Stage::XblAuthenticate, "missing XUI claims")
            })?;

        Ok(XblIdentity {
            token: xbl.token,
            user_hash,
        })
    }

    /// Authorize with XSTS for the Minecraft Services relying party
    #[instrument(skip(self, xbl_token))]
    pub async fn xsts_authorize(&self, xbl_token: &str) -> Result<String> {
        let request = XstsAuthRequest {
            properties: XstsAuthProperties {
                sandbox_id: SANDBOX_ID.to_string(),
                user_tokens: vec![xbl_token.to_string()],
            },
            relying_party: RP_MINECRAFT.to_string(),
            token_type: "JWT".to_string(),
        };

        debug!("authorizing with XSTS");
        let response = self
            .http
            .post(&self.config.endpoints.xsts_authorize)
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AuthError::network(Stage::XstsAuthorize, e))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let denial: XstsErrorResponse = response
                .json()
                .await
                .map_err(|e| AuthError::invalid_response(Stage::XstsAuthorize, e.to_string()))?;
            return Err(XstsError::from_xerr(denial.xerr).into());
        }

        if !response.status().is_success() {
            return Err(Self::http_error(Stage::XstsAuthorize, response).await);
        }

        let xsts: XstsAuthResponse = response
            .json()
            .await
            .map_err(|e| AuthError::invalid_response(Stage::XstsAuthorize, e.to_string()))?;
        Ok(xsts.token)
    }

    /// Login to Minecraft Services with the XSTS token and user hash
    #[instrument(skip(self, user_hash, xsts_token))]
    pub async fn mc_login(&self, user_hash: &str, xsts_token: &str) -> Result<String> {
        let request = McLoginRequest {
            identity_token: format!("XBL3.0 x={user_hash};{xsts_token}"),
        };

        debug!("logging in to Minecraft Services");
        let response = self
            .http
            .post(&self.config.endpoints.mc_login)
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AuthError::network(Stage::McLogin, e))?;

        if !response.status().is_success() {
            return Err(Self::http_error(Stage::McLogin, response).await);
        }

        let login: McLoginResponse = response
            .json()
            .await
            .map_err(|e| AuthError::invalid_response(Stage::McLogin, e.to_string()))?;
        Ok(login.access_token)
    }

    /// Check whether the account behind a Minecraft access token owns the
    /// game. Owned iff the entitlement item list is non-empty.
    #[instrument(skip(self, mc_access_token))]
    pub async fn check_ownership(&self, mc_access_token: &str) -> Result<bool> {
        debug!("checking game ownership");
        let response = self
            .http
            .get(&self.config.endpoints.mc_entitlements)
            .bearer_auth(mc_access_token)
            .send()
            .await
            .map_err(|e| AuthError::network(Stage::Entitlements, e))?;

        if !response.status().is_success() {
            return Err(Self::http_error(Stage::Entitlements, response).await);
        }

        let entitlements: EntitlementsResponse = response
            .json()
            .await
            .map_err(|e| AuthError::invalid_response(Stage::Entitlements, e.to_string()))?;
        Ok(!entitlements.items.is_empty())
    }

    /// Run the full exchange pipeline for an authorization code.
    ///
    /// The four token exchanges and the ownership check run strictly in
    /// sequence; any stage failure aborts the chain with an error naming the
    /// stage, and no partial credential is ever returned. `Ok(None)` means
    /// the chain succeeded but the account does not own Minecraft.
    #[instrument(skip(self, code))]
    pub async fn connect(&self, code: &str) -> Result<Option<Profile>> {
        let ms_access_token = self.exchange_code(code).await?;
        let xbl = self.xbl_authenticate(&ms_access_token).await?;
        let xsts_token = self.xsts_authorize(&xbl.token).await?;
        let mc_access_token = self.mc_login(&xbl.user_hash, &xsts_token).await?;

        if !self.check_ownership(&mc_access_token).await? {
            debug!("account does not own Minecraft");
            return Ok(None);
        }

        let profile = Profile::fetch(
            &self.http,
            &self.config.endpoints.mc_profile,
            &mc_access_token,
        )
        .await?;
        Ok(Some(profile))
    }

    /// Build an offline profile for a username. Pure computation, no
    /// network.
    pub fn connect_offline(&self, username: &str) -> Result<Profile> {
        Profile::offline(username)
    }

    async fn http_error(stage: Stage, response: Response) -> AuthError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        AuthError::Http {
            stage,
            status,
            body_snippet: body.chars().take(200).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoints;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> AuthClient {
        let mut config = AuthConfig::new(
            "test-client-id",
            "test-client-secret",
            Url::parse("http://localhost/auth-response").unwrap(),
        );
        let base = server.uri();
        config.endpoints = Endpoints {
            ms_token: format!("{base}/consumers/oauth2/v2.0/token"),
            xbl_authenticate: format!("{base}/user/authenticate"),
            xsts_authorize: format!("{base}/xsts/authorize"),
            mc_login: format!("{base}/authentication/login_with_xbox"),
            mc_entitlements: format!("{base}/entitlements/mcstore"),
            mc_profile: format!("{base}/minecraft/profile"),
        };
        AuthClient::new(config).unwrap()
    }

    async fn mount_happy_chain(server: &MockServer, items: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/consumers/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("client_secret=test-client-secret"))
            .and(body_string_contains("scope=XboxLive.signin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ms-access-token",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(path("/user/authenticate"))
            .and(body_string_contains("d=ms-access-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Token": "xbl-token",
                "DisplayClaims": { "xui": [ { "uhs": "user-hash" } ] }
            })))
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(path("/xsts/authorize"))
            .and(body_string_contains("xbl-token"))
            .and(body_string_contains("rp://api.minecraftservices.com/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Token": "xsts-token"
            })))
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(path("/authentication/login_with_xbox"))
            .and(body_string_contains("XBL3.0 x=user-hash;xsts-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "mc-access-token",
                "username": "ignored",
                "token_type": "Bearer",
                "expires_in": 86400
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/entitlements/mcstore"))
            .and(header("Authorization", "Bearer mc-access-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": items })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_connect_round_trip() {
        let server = MockServer::start().await;
        let client = test_client(&server);

        mount_happy_chain(
            &server,
            json!([{ "name": "product_minecraft", "signature": "sig" }]),
        )
        .await;

        Mock::given(method("GET"))
            .and(path("/minecraft/profile"))
            .and(header("Authorization", "Bearer mc-access-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "069a79f444e94726a5befca90e38aaf5",
                "name": "Notch",
                "skins": [{
                    "id": "skin-1",
                    "state": "ACTIVE",
                    "url": "http://textures.minecraft.net/texture/abc",
                    "variant": "CLASSIC"
                }],
                "capes": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let profile = client.connect("auth-code").await.unwrap().unwrap();
        assert_eq!(profile.access_token(), "mc-access-token");
        assert_eq!(profile.username(), "Notch");
        assert_eq!(profile.uuid(), "069a79f444e94726a5befca90e38aaf5");
        assert_eq!(profile.skins().len(), 1);
        assert_eq!(profile.skins()[0].id, "skin-1");
        assert!(profile.capes().is_empty());
        assert!(!profile.is_offline());
    }

    #[tokio::test]
    async fn test_not_owned_returns_none() {
        let server = MockServer::start().await;
        let client = test_client(&server);

        mount_happy_chain(&server, json!([])).await;

        // Profile endpoint must never be reached when the account does not
        // own the game.
        Mock::given(method("GET"))
            .and(path("/minecraft/profile"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = client.connect("auth-code").await.unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_stage_failure_aborts_chain() {
        let server = MockServer::start().await;
        let client = test_client(&server);

        Mock::given(method("POST"))
            .and(path("/consumers/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ms-access-token"
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/user/authenticate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("xbl down"))
            .mount(&server)
            .await;

        // Stage 3 and later must never run after a stage-2 failure.
        Mock::given(method("POST"))
            .and(path("/xsts/authorize"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client.connect("auth-code").await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::Http {
                stage: Stage::XblAuthenticate,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_access_token_is_invalid_response() {
        let server = MockServer::start().await;
        let client = test_client(&server);

        Mock::given(method("POST"))
            .and(path("/consumers/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        let err = client.connect("auth-code").await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::MsTokenExchange));
        assert!(matches!(err, AuthError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_missing_xui_claims_is_invalid_response() {
        let server = MockServer::start().await;
        let client = test_client(&server);

        Mock::given(method("POST"))
            .and(path("/consumers/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ms-access-token"
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/user/authenticate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Token": "xbl-token",
                "DisplayClaims": { "xui": [] }
            })))
            .mount(&server)
            .await;

        let err = client.connect("auth-code").await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::InvalidResponse {
                stage: Stage::XblAuthenticate,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_xsts_denial_decodes_xerr() {
        let server = MockServer::start().await;
        let client = test_client(&server);

        Mock::given(method("POST"))
            .and(path("/consumers/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ms-access-token"
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/user/authenticate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Token": "xbl-token",
                "DisplayClaims": { "xui": [ { "uhs": "user-hash" } ] }
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/xsts/authorize"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "Identity": "0",
                "XErr": 2148916233u64,
                "Message": "",
                "Redirect": ""
            })))
            .mount(&server)
            .await;

        let err = client.connect("auth-code").await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::XstsDenied(XstsError::NoXboxAccount)
        ));
    }

    #[tokio::test]
    async fn test_profile_not_found_maps_404() {
        let server = MockServer::start().await;
        let client = test_client(&server);

        mount_happy_chain(&server, json!([{ "name": "product_minecraft" }])).await;

        Mock::given(method("GET"))
            .and(path("/minecraft/profile"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": "NOT_FOUND"
            })))
            .mount(&server)
            .await;

        let err = client.connect("auth-code").await.unwrap_err();
        assert!(matches!(err, AuthError::ProfileNotFound));
    }

    #[tokio::test]
    async fn test_connect_offline_makes_no_network_calls() {
        let server = MockServer::start().await;
        let client = test_client(&server);

        let profile = client.connect_offline("Venodez").unwrap();
        assert_eq!(profile.uuid(), "0e866771-0dd6-3df5-b3de-6172ce2befe3");
        assert_eq!(profile.access_token(), "");

        let requests = server.received_requests().await.unwrap();
        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn test_empty_credentials_fail_before_network() {
        let config = AuthConfig::new(
            "",
            "",
            Url::parse("http://localhost/auth-response").unwrap(),
        );
        assert!(matches!(AuthClient::new(config), Err(AuthError::Config(_))));
    }
}

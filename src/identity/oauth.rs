//! Google authorization-code flow: authorize URL construction, code
//! exchange, and profile fetch from the userinfo endpoint. The `state`
//! value round-trips through the caller; this module only builds and
//! consumes it.

use anyhow::{Context, Result};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use tracing::error;

use crate::config::GoogleConfig;
use crate::error::{AppError, AppResult};
use crate::identity::principal::FederatedProfile;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

type ConfiguredClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

pub struct GoogleOAuth {
    client: ConfiguredClient,
    http: reqwest::Client,
    userinfo_url: String,
}

/// Userinfo response shape (v2 endpoint).
#[derive(Debug, Deserialize)]
struct GoogleProfile {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl GoogleOAuth {
    pub fn new(cfg: &GoogleConfig) -> Result<Self> {
        let auth_url = AuthUrl::new(AUTH_URL.to_string()).context("authorization endpoint URL")?;
        let token_url = TokenUrl::new(TOKEN_URL.to_string()).context("token endpoint URL")?;
        let redirect_url = RedirectUrl::new(cfg.redirect_url.clone())
            .with_context(|| format!("invalid OAuth redirect URL: {}", cfg.redirect_url))?;
        let client = BasicClient::new(ClientId::new(cfg.client_id.clone()))
            .set_client_secret(ClientSecret::new(cfg.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);
        // The token client must not follow redirects.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("building OAuth HTTP client")?;
        Ok(Self { client, http, userinfo_url: USERINFO_URL.to_string() })
    }

    /// Fully-formed authorize URL the caller should send the end-user to.
    pub fn authorize_url(&self, state: &str) -> String {
        let state = CsrfToken::new(state.to_string());
        let (url, _state) = self
            .client
            .authorize_url(move || state)
            .add_scope(Scope::new("profile".to_string()))
            .url();
        url.to_string()
    }

    /// Exchange the callback `code` for an access token.
    pub async fn exchange_code(&self, code: &str) -> AppResult<String> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| {
                error!("oauth code exchange failed: {e}");
                AppError::authentication("oauth_exchange_failed", "sign-in could not be completed")
            })?;
        Ok(token.access_token().secret().clone())
    }

    /// Fetch the externally-verified profile for an access token.
    pub async fn fetch_profile(&self, access_token: &str) -> AppResult<FederatedProfile> {
        let profile: GoogleProfile = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::upstream("oauth_userinfo_failed", e.to_string()))?
            .json()
            .await
            .map_err(|e| AppError::upstream("oauth_userinfo_failed", e.to_string()))?;
        Ok(FederatedProfile {
            provider_id: profile.id,
            display_name: profile.name,
            given_name: profile.given_name,
            family_name: profile.family_name,
            avatar_url: profile.picture,
        })
    }
}

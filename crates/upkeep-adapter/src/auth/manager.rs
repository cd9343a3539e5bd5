/*
[INPUT]:  Operator credentials and HTTP client
[OUTPUT]: Authenticated session token
[POS]:    Auth layer - orchestrates the login flow
[UPDATE]: When auth endpoints or flow steps change
*/

use reqwest::Method;
use tracing::info;

use crate::http::{Credentials, Result, UpkeepClient, UpkeepError};
use crate::types::{LoginRequest, LoginResponse};

use super::{TokenData, TokenManager};

/// Manages the login flow and hands out authenticated clients
#[derive(Debug)]
pub struct AuthManager {
    client: UpkeepClient,
    token_manager: TokenManager,
}

impl AuthManager {
    pub fn new(client: UpkeepClient) -> Self {
        Self {
            client,
            token_manager: TokenManager::new(),
        }
    }

    /// Get the token manager
    pub fn token_manager(&self) -> &TokenManager {
        &self.token_manager
    }

    /// Exchange username and password for a session token
    ///
    /// POST /api/auth/login
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(UpkeepError::Authentication {
                message: "username and password are required".to_string(),
            });
        }

        let body = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        let builder = self.client.request(Method::POST, "/api/auth/login")?.json(&body);
        let response: LoginResponse = self.client.send_json(builder).await?;

        if response.token.trim().is_empty() {
            return Err(UpkeepError::InvalidResponse(
                "login response carried an empty token".to_string(),
            ));
        }

        let data = TokenData::new(
            response.token.clone(),
            response.expires_in,
            response.username.clone().or_else(|| Some(body.username.clone())),
        );
        info!(
            username = %body.username,
            expires_at = ?data.expires_at,
            "signed in"
        );
        self.token_manager.set(data);

        Ok(response)
    }

    /// Return a copy of the client carrying the current token
    pub fn authenticated_client(&self) -> Result<UpkeepClient> {
        if self.token_manager.is_expired() && self.token_manager.token_data().is_some() {
            return Err(UpkeepError::TokenExpired);
        }
        let token = self.token_manager.get_token().ok_or(UpkeepError::AuthRequired)?;
        let mut client = self.client.clone();
        client.set_credentials(Credentials::new(token));
        Ok(client)
    }

    /// Forget the current token
    pub fn logout(&self) {
        self.token_manager.clear();
    }
}

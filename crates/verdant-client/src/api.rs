//! HTTP gateway to the storefront backend.
//!
//! Single chokepoint for all network calls: attaches the persisted bearer
//! credential when present and normalizes server error payloads into
//! [`ClientError`]. No retries, timeouts or deduplication: a late response
//! still applies its effect at the call site.

use std::sync::{Arc, Mutex};

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use verdant_shared::constants::CREDENTIAL_KEY;
use verdant_shared::protocol::{
    AuthResponse, CreateOrderRequest, ErrorBody, HealthResponse, LoginRequest, OrderCreated,
    OrderEnvelope, OrdersPage, ProfileResponse, SignupRequest, UpdateProfileRequest,
    VerifyTokenResponse,
};
use verdant_shared::types::OrderId;
use verdant_store::Database;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error envelope.
    #[error("{message} (HTTP {status})")]
    Api { status: StatusCode, message: String },

    /// The request never completed or the body failed to decode.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ClientError {
    /// The server's message when there is one, else the given fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Network(_) => fallback.to_string(),
        }
    }
}

pub struct ApiClient {
    base_url: String,
    http: Client,
    store: Arc<Mutex<Database>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, store: Arc<Mutex<Database>>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: Client::new(),
            store,
        }
    }

    /// The persisted bearer credential, if one exists.
    fn credential(&self) -> Option<String> {
        let db = self.store.lock().ok()?;
        db.get_text(CREDENTIAL_KEY).ok().flatten()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, url);
        if let Some(token) = self.credential() {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Send a request, decoding either the expected body or the server's
    /// error envelope.
    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let resp = req.send().await?;
        let status = resp.status();

        if status.is_success() {
            Ok(resp.json::<T>().await?)
        } else {
            let message = match resp.json::<ErrorBody>().await {
                Ok(body) => body.message.unwrap_or(body.error),
                Err(_) => "An error occurred".to_string(),
            };
            Err(ClientError::Api { status, message })
        }
    }

    // -- Auth --

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send(self.request(Method::POST, "/api/auth/login").json(&body))
            .await
    }

    pub async fn signup(&self, data: &SignupRequest) -> Result<AuthResponse, ClientError> {
        self.send(self.request(Method::POST, "/api/auth/register").json(data))
            .await
    }

    pub async fn verify_token(&self) -> Result<VerifyTokenResponse, ClientError> {
        self.send(self.request(Method::POST, "/api/auth/verify-token"))
            .await
    }

    pub async fn get_profile(&self) -> Result<ProfileResponse, ClientError> {
        self.send(self.request(Method::GET, "/api/auth/profile"))
            .await
    }

    pub async fn update_profile(
        &self,
        update: &UpdateProfileRequest,
    ) -> Result<ProfileResponse, ClientError> {
        self.send(self.request(Method::PUT, "/api/auth/profile").json(update))
            .await
    }

    // -- Orders --

    pub async fn create_order(
        &self,
        order: &CreateOrderRequest,
    ) -> Result<OrderCreated, ClientError> {
        self.send(self.request(Method::POST, "/api/orders").json(order))
            .await
    }

    pub async fn get_orders(&self, page: u32, limit: u32) -> Result<OrdersPage, ClientError> {
        let path = format!("/api/orders?page={page}&limit={limit}");
        self.send(self.request(Method::GET, &path)).await
    }

    pub async fn get_order(&self, order_id: &OrderId) -> Result<OrderEnvelope, ClientError> {
        let path = format!("/api/orders/{order_id}");
        self.send(self.request(Method::GET, &path)).await
    }

    // -- Misc --

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.send(self.request(Method::GET, "/api/health")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Mutex::new(
            Database::open_at(&dir.path().join("api.db")).unwrap(),
        ));
        let api = ApiClient::new("http://localhost:8080/", store);
        assert_eq!(api.base_url, "http://localhost:8080");
    }

    #[test]
    fn credential_reads_from_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Mutex::new(
            Database::open_at(&dir.path().join("api.db")).unwrap(),
        ));
        let api = ApiClient::new("http://localhost:8080", store.clone());
        assert!(api.credential().is_none());

        store
            .lock()
            .unwrap()
            .put_text(CREDENTIAL_KEY, "deadbeef")
            .unwrap();
        assert_eq!(api.credential().unwrap(), "deadbeef");
    }
}

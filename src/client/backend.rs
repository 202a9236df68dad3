// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::api::types::{ApiResponse, ConfirmPurchaseRequest, PurchaseConfirmation};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Transport(String),

    #[error("unexpected backend response: {0}")]
    InvalidResponse(String),

    /// Message returned by the backend.
    #[error("{0}")]
    Rejected(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[async_trait]
pub trait ConfirmationApi: Send + Sync {
    async fn confirm_purchase(
        &self,
        request: &ConfirmPurchaseRequest,
    ) -> Result<PurchaseConfirmation, BackendError>;
}

/// Presale backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl ConfirmationApi for HttpBackend {
    async fn confirm_purchase(
        &self,
        request: &ConfirmPurchaseRequest,
    ) -> Result<PurchaseConfirmation, BackendError> {
        // Error statuses carry the same envelope, so the status code is not checked
        let response: ApiResponse<PurchaseConfirmation> = self
            .client
            .post(self.endpoint("/api/confirm-purchase"))
            .json(request)
            .send()
            .await?
            .json()
            .await?;

        if !response.success {
            let message = if response.message.is_empty() {
                "Backend confirmation failed".to_owned()
            } else {
                response.message
            };
            return Err(BackendError::Rejected(message));
        }

        response
            .data
            .ok_or_else(|| BackendError::InvalidResponse("confirmation without data".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api;
    use crate::settings::Settings;
    use triomphe::Arc;

    async fn backend_with(owner: &str) -> HttpBackend {
        let mut settings = Settings::default();
        settings.presale.owner_public_key = owner.to_owned();
        settings.network.static_dir = None;

        let (addr, server) =
            warp::serve(api::routes(Arc::new(settings))).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        HttpBackend::new(format!("http://{addr}/"))
    }

    fn request() -> ConfirmPurchaseRequest {
        ConfirmPurchaseRequest {
            signature: "99eUso3aSbE9tqGSTXzo3TLfKb9RkMTURrHKQ1K7Zh3BbeqPevr5E1iCbpTjqHuTFLtfxTTD5ekfVuZFzQyEQf8"
                .to_owned(),
            buyer: "GgBaCs3NCBuZN12kCJgAW63ydqohFkHEdfdEXBPzLHq".to_owned(),
            amount: 1000.0,
        }
    }

    #[tokio::test]
    async fn it_confirms_against_the_server() {
        let backend = backend_with("11111111111111111111111111111112").await;
        let confirmation = backend.confirm_purchase(&request()).await.unwrap();

        assert_eq!(confirmation.signature, request().signature);
        assert_eq!(confirmation.amount, 1000.0);
        assert_eq!(confirmation.total_cost, 1000.0 * 0.000045);
    }

    #[tokio::test]
    async fn server_errors_become_rejections() {
        let backend = backend_with("REPLACE_WITH_OWNER_PUBLIC_KEY").await;

        match backend.confirm_purchase(&request()).await {
            Err(BackendError::Rejected(message)) => {
                assert_eq!(message, "OWNER_PUBLIC_KEY not configured on server")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let backend = HttpBackend::new("http://127.0.0.1:1");
        assert!(matches!(
            backend.confirm_purchase(&request()).await,
            Err(BackendError::Transport(_))
        ));
    }
}

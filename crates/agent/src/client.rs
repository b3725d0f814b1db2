// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the AIR authority.

use std::fmt;
use std::sync::Once;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use airserver::error::{AirError, ErrorBody, ErrorResponse};
use airserver::model::{JobId, ResponderId};
use airserver::wire::{
    AssignRequest, AssignResponse, CompleteRequest, CompleteResponse, MessageResponse,
    PendingResponse, RegisterRequest, RegisterResponse, ResponderInfo, TokenRequest,
};

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Failure of a single authority call.
#[derive(Debug)]
pub enum ClientError {
    /// The authority answered with an error status.
    Rejected { status: u16, body: ErrorBody },
    /// The request never produced a usable response.
    Transport(reqwest::Error),
}

impl ClientError {
    /// True if the authority rejected the call with the code of `err`.
    pub fn is(&self, err: &AirError) -> bool {
        matches!(self, Self::Rejected { body, .. } if body.code == err.as_str())
    }

    /// Id of the already-pending job carried by a `JOB_CONFLICT` rejection.
    pub fn conflicting_job(&self) -> Option<JobId> {
        match self {
            Self::Rejected { body, .. } if body.code == "JOB_CONFLICT" => {
                body.details.as_ref()?.get("jobId")?.as_u64()
            }
            _ => None,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { status, body } => {
                write!(f, "{status} {}: {}", body.code, body.message)
            }
            Self::Transport(e) => write!(f, "transport: {e}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e)
    }
}

/// HTTP client wrapper for one authority.
#[derive(Clone)]
pub struct AuthorityClient {
    base_url: String,
    client: Client,
}

impl AuthorityClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        ensure_crypto();
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_owned(), client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /responders/register`
    pub async fn register(
        &self,
        token: Option<&str>,
        name: Option<&str>,
    ) -> Result<RegisterResponse, ClientError> {
        let body = RegisterRequest { token: token.map(str::to_owned), name: name.map(str::to_owned) };
        self.post("/responders/register", &body).await
    }

    /// `POST /responders/deregister`
    pub async fn deregister(&self, token: &str) -> Result<MessageResponse, ClientError> {
        self.post("/responders/deregister", &TokenRequest { token: token.to_owned() }).await
    }

    /// `GET /responders`
    pub async fn list_responders(&self) -> Result<Vec<ResponderInfo>, ClientError> {
        let resp = self.client.get(self.url("/responders")).send().await?;
        decode(resp).await
    }

    /// `POST /jobs/assign`
    pub async fn assign(&self, responder_id: ResponderId) -> Result<AssignResponse, ClientError> {
        self.post("/jobs/assign", &AssignRequest { responder_id }).await
    }

    /// `POST /jobs/pending`
    pub async fn pending(&self, token: &str) -> Result<PendingResponse, ClientError> {
        self.post("/jobs/pending", &TokenRequest { token: token.to_owned() }).await
    }

    /// `POST /jobs/complete`
    pub async fn complete(&self, req: &CompleteRequest) -> Result<CompleteResponse, ClientError> {
        self.post("/jobs/complete", req).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        decode(resp).await
    }
}

/// Decode a success body, or turn an error status into [`ClientError::Rejected`].
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let bytes = resp.bytes().await?;
    let body = match serde_json::from_slice::<ErrorResponse>(&bytes) {
        Ok(envelope) => envelope.error,
        Err(_) => ErrorBody {
            code: format!("HTTP_{}", status.as_u16()),
            message: String::from_utf8_lossy(&bytes).into_owned(),
            details: None,
        },
    };
    Err(ClientError::Rejected { status: status.as_u16(), body })
}

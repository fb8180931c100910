use remedy_logging::{remedy_debug, remedy_warn};
use serde::{Deserialize, Serialize};

use crate::http::build_client;
use crate::{FailureKind, HttpSettings, TransferAction, TransferError, TransferGrant};

/// Issues single-use transfer URLs. A fresh grant is requested for every
/// transfer; implementations must not cache.
#[async_trait::async_trait]
pub trait GrantIssuer: Send + Sync {
    async fn issue(
        &self,
        action: TransferAction,
        object_name: &str,
    ) -> Result<TransferGrant, TransferError>;
}

#[derive(Debug, Serialize)]
struct SigningRequest<'a> {
    accion: TransferAction,
    archivo: &'a str,
}

#[derive(Debug, Deserialize)]
struct SigningResponse {
    url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReqwestGrantIssuer {
    client: reqwest::Client,
    endpoint: url::Url,
}

impl ReqwestGrantIssuer {
    pub fn new(endpoint: url::Url, settings: &HttpSettings) -> Result<Self, TransferError> {
        let client = build_client(settings)?;
        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: reqwest::Client, endpoint: url::Url) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait::async_trait]
impl GrantIssuer for ReqwestGrantIssuer {
    async fn issue(
        &self,
        action: TransferAction,
        object_name: &str,
    ) -> Result<TransferGrant, TransferError> {
        remedy_debug!(
            "Requesting {} grant for {}",
            action.wire_name(),
            object_name
        );
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&SigningRequest {
                accion: action,
                archivo: object_name,
            })
            .send()
            .await
            .map_err(|err| signing_error(format!("signing service unreachable: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            remedy_warn!("Signing service answered {} for {}", status, object_name);
            return Err(signing_error(format!("signing service answered {status}")));
        }

        let body: SigningResponse = response
            .json()
            .await
            .map_err(|err| signing_error(format!("malformed signing response: {err}")))?;
        let raw = body
            .url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| signing_error("signing response carried no url"))?;
        let url = url::Url::parse(raw.trim())
            .map_err(|err| signing_error(format!("unusable grant url: {err}")))?;

        Ok(TransferGrant {
            url,
            action,
            object_name: object_name.to_string(),
        })
    }
}

fn signing_error(message: impl Into<String>) -> TransferError {
    TransferError::new(FailureKind::Signing, message)
}

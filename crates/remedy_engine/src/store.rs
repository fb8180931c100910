use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

use crate::decode::decode_text;
use crate::http::{build_client, map_reqwest_error, read_limited};
use crate::{FailureKind, HttpSettings, TransferError, TransferGrant};

/// Direct transfers against the object store using pre-signed grants.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes `body` at the grant URL. Any 2xx is success.
    async fn put(
        &self,
        grant: &TransferGrant,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), TransferError>;

    /// Reads the object at the grant URL as text. A 404 maps to
    /// `FailureKind::NotFound`.
    async fn get_text(&self, grant: &TransferGrant) -> Result<String, TransferError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestObjectStore {
    client: reqwest::Client,
    max_download_bytes: u64,
}

impl ReqwestObjectStore {
    pub fn new(settings: &HttpSettings) -> Result<Self, TransferError> {
        let client = build_client(settings)?;
        Ok(Self::with_client(client, settings.max_download_bytes))
    }

    pub fn with_client(client: reqwest::Client, max_download_bytes: u64) -> Self {
        Self {
            client,
            max_download_bytes,
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for ReqwestObjectStore {
    async fn put(
        &self,
        grant: &TransferGrant,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), TransferError> {
        let response = self
            .client
            .put(grant.url.clone())
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|err| TransferError::new(FailureKind::Upload, err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::new(
                FailureKind::Upload,
                format!("object store answered {status}"),
            ));
        }
        Ok(())
    }

    async fn get_text(&self, grant: &TransferGrant) -> Result<String, TransferError> {
        let response = self
            .client
            .get(grant.url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TransferError::new(
                FailureKind::NotFound,
                format!("{} not ready", grant.object_name),
            ));
        }
        if !status.is_success() {
            return Err(TransferError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let bytes = read_limited(response, self.max_download_bytes).await?;
        let decoded = decode_text(&bytes, content_type.as_deref())
            .map_err(|err| TransferError::new(FailureKind::Decode, err.to_string()))?;
        Ok(decoded.text)
    }
}

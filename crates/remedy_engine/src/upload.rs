use std::fs;
use std::path::Path;

use bytes::Bytes;
use remedy_logging::{remedy_info, remedy_warn};
use sha2::{Digest, Sha256};

use crate::{FailureKind, GrantIssuer, ObjectStore, TransferAction, TransferError};

/// Local file about to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub object_name: String,
    pub bytes: Bytes,
    pub content_type: String,
}

impl SourceFile {
    pub fn new(object_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let object_name = object_name.into();
        let content_type = content_type_for(&object_name).to_string();
        Self {
            object_name,
            bytes: bytes.into(),
            content_type,
        }
    }

    pub fn load(path: &Path, object_name: impl Into<String>) -> Result<Self, TransferError> {
        let bytes = fs::read(path).map_err(|err| {
            TransferError::new(FailureKind::ReadSource, format!("{}: {err}", path.display()))
        })?;
        Ok(Self::new(object_name, bytes))
    }

    /// Short SHA-256 prefix, logged so uploads can be matched with store-side objects.
    pub fn short_digest(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        digest.iter().take(6).map(|byte| format!("{byte:02x}")).collect()
    }
}

fn content_type_for(object_name: &str) -> &'static str {
    let ext = object_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("json") => "application/json",
        Some("py") => "text/x-python",
        Some("txt") | Some("log") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Requests an upload grant, then transfers the file to the object store.
///
/// Not retried: any failure is terminal for the job.
pub async fn upload_source(
    issuer: &dyn GrantIssuer,
    store: &dyn ObjectStore,
    source: &SourceFile,
) -> Result<(), TransferError> {
    let grant = issuer
        .issue(TransferAction::Upload, &source.object_name)
        .await?;

    remedy_info!(
        "Uploading {} ({} bytes, {}, sha256 {})",
        source.object_name,
        source.bytes.len(),
        source.content_type,
        source.short_digest()
    );
    store
        .put(&grant, source.bytes.clone(), &source.content_type)
        .await
        .inspect_err(|err| remedy_warn!("Upload of {} failed: {}", source.object_name, err))
}

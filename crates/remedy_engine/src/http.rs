use futures_util::StreamExt;

use crate::{FailureKind, HttpSettings, TransferError};

pub(crate) fn build_client(settings: &HttpSettings) -> Result<reqwest::Client, TransferError> {
    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .build()
        .map_err(|err| TransferError::new(FailureKind::Network, err.to_string()))
}

/// Transport failures keep their timeout/network distinction only on the
/// download path; signing and upload callers collapse them into their own kind.
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> TransferError {
    if err.is_timeout() {
        return TransferError::new(FailureKind::Timeout, err.to_string());
    }
    TransferError::new(FailureKind::Network, err.to_string())
}

/// Reads the body, refusing to buffer more than `max_bytes`.
pub(crate) async fn read_limited(
    response: reqwest::Response,
    max_bytes: u64,
) -> Result<Vec<u8>, TransferError> {
    if let Some(content_len) = response.content_length() {
        if content_len > max_bytes {
            return Err(TransferError::new(
                FailureKind::TooLarge { max_bytes },
                format!("declared length {content_len}"),
            ));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        let next_len = bytes.len() as u64 + chunk.len() as u64;
        if next_len > max_bytes {
            return Err(TransferError::new(
                FailureKind::TooLarge { max_bytes },
                format!("body exceeded {max_bytes} bytes"),
            ));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

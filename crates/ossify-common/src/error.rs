use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Error response returned by the service for 3xx, 4xx and 5xx statuses.
///
/// When the response carries no body, `code` holds the HTTP status line
/// instead and the remaining fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProtocolError {
    #[serde(rename = "Code", default)]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
    #[serde(rename = "RequestId", default)]
    pub request_id: String,
    #[serde(rename = "HostId", default)]
    pub host_id: String,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Code: {}, Message: {}, RequestId: {}, HostId: {}",
            self.code, self.message, self.request_id, self.host_id
        )
    }
}

#[derive(Debug, Error)]
pub enum OssifyError {
    #[error("access key required")]
    CredentialsRequired,
    #[error("bucket name required")]
    BucketNameRequired,
    #[error("invalid bucket name: {0}")]
    InvalidBucketName(String),
    #[error("object name required")]
    ObjectNameRequired,
    #[error("invalid object name: {0}")]
    InvalidObjectName(String),
    #[error("data type not supported")]
    UnsupportedDataType,
    #[error("upload id required")]
    UploadIdRequired,
    #[error("invalid part number: {0}")]
    InvalidPartNumber(i32),
    #[error("source object invalid")]
    InvalidSourceObject,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("xml serialize failed: {0}")]
    Serialize(String),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("{0}")]
    Protocol(ProtocolError),
    #[error("content range invalid")]
    ContentRangeInvalid,
    #[error("content range corrupt")]
    ContentRangeCorrupt,
    #[error("transport: {0}")]
    Transport(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl OssifyError {
    /// The service error code, when this error is a service response.
    pub fn protocol_code(&self) -> Option<&str> {
        match self {
            Self::Protocol(err) => Some(&err.code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, OssifyError>;

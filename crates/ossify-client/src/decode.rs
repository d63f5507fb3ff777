//! Response decoding: transparent decompression, status-driven error
//! classification and body-sink dispatch.

use std::io::Write as _;
use std::mem;

use flate2::write::{DeflateDecoder, GzDecoder};
use futures::StreamExt;
use http::StatusCode;
use http::header::CONTENT_ENCODING;
use ossify_common::{OssifyError, ProtocolError, Result};
use quick_xml::de::from_str as xml_from_str;
use serde::de::DeserializeOwned;
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Where a successful response body goes. Decided once at the call boundary;
/// structured XML decoding is the separate [`read_xml`] entry point.
pub enum Sink<'a> {
    /// Drain and drop the body.
    Discard,
    /// Replace the buffer contents with the full body.
    Bytes(&'a mut Vec<u8>),
    /// Stream the body into the file.
    File(&'a mut File),
    /// Stream the body into an arbitrary writer.
    Writer(&'a mut (dyn AsyncWrite + Unpin + Send)),
}

impl Sink<'_> {
    pub(crate) fn is_download_target(&self) -> bool {
        !matches!(self, Sink::Discard)
    }

    async fn write(&mut self, data: &[u8]) -> Result<u64> {
        if data.is_empty() {
            return Ok(0);
        }
        match self {
            Sink::Discard => {}
            Sink::Bytes(buf) => buf.extend_from_slice(data),
            Sink::File(file) => file.write_all(data).await?,
            Sink::Writer(writer) => writer.write_all(data).await?,
        }
        Ok(data.len() as u64)
    }

    async fn flush(&mut self) -> Result<()> {
        match self {
            Sink::Discard | Sink::Bytes(_) => Ok(()),
            Sink::File(file) => Ok(file.flush().await?),
            Sink::Writer(writer) => Ok(writer.flush().await?),
        }
    }
}

enum ContentDecoder {
    Identity,
    Gzip(GzDecoder<Vec<u8>>),
    Deflate(DeflateDecoder<Vec<u8>>),
}

impl ContentDecoder {
    fn for_response(response: &reqwest::Response) -> Self {
        let encoding = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        match encoding {
            "gzip" => Self::Gzip(GzDecoder::new(Vec::new())),
            "deflate" => Self::Deflate(DeflateDecoder::new(Vec::new())),
            _ => Self::Identity,
        }
    }

    fn decode(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Identity => Ok(chunk.to_vec()),
            Self::Gzip(decoder) => {
                decoder.write_all(chunk)?;
                decoder.flush()?;
                Ok(mem::take(decoder.get_mut()))
            }
            Self::Deflate(decoder) => {
                decoder.write_all(chunk)?;
                decoder.flush()?;
                Ok(mem::take(decoder.get_mut()))
            }
        }
    }

    fn finish(self) -> Result<Vec<u8>> {
        match self {
            Self::Identity => Ok(Vec::new()),
            Self::Gzip(decoder) => Ok(decoder.finish()?),
            Self::Deflate(decoder) => Ok(decoder.finish()?),
        }
    }
}

/// Reads a response to completion.
///
/// Statuses 300 through 599 yield the decoded protocol error; success
/// statuses stream the transparently decompressed body into `sink`. Returns
/// the number of decoded bytes. The response is consumed on every path,
/// which closes the underlying stream.
pub async fn read_body(response: reqwest::Response, mut sink: Sink<'_>) -> Result<u64> {
    let status = response.status();
    let mut decoder = ContentDecoder::for_response(&response);

    if is_error_status(status) {
        return Err(protocol_error(response, decoder, status).await);
    }

    if let Sink::Bytes(buf) = &mut sink {
        buf.clear();
    }

    let mut read = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| OssifyError::Transport(err.to_string()))?;
        let decoded = decoder.decode(&chunk)?;
        read += sink.write(&decoded).await?;
    }
    let tail = decoder.finish()?;
    read += sink.write(&tail).await?;
    sink.flush().await?;

    Ok(read)
}

/// Reads a response to completion and XML-decodes the body into `T`.
pub async fn read_xml<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let mut buf = Vec::new();
    read_body(response, Sink::Bytes(&mut buf)).await?;
    let text = std::str::from_utf8(&buf)
        .map_err(|err| OssifyError::Decode(format!("response body: {err}")))?;
    xml_from_str(text).map_err(|err| OssifyError::Decode(format!("response body: {err}")))
}

fn is_error_status(status: StatusCode) -> bool {
    status.is_redirection() || status.is_client_error() || status.is_server_error()
}

async fn protocol_error(
    response: reqwest::Response,
    mut decoder: ContentDecoder,
    status: StatusCode,
) -> OssifyError {
    let raw = match response.bytes().await {
        Ok(raw) => raw,
        Err(err) => return OssifyError::Transport(err.to_string()),
    };
    let body = decoder.decode(&raw).and_then(|mut decoded| {
        decoder.finish().map(|tail| {
            decoded.extend_from_slice(&tail);
            decoded
        })
    });
    let body = match body {
        Ok(body) => body,
        Err(err) => return err,
    };

    if body.is_empty() {
        return OssifyError::Protocol(ProtocolError {
            code: status_line(status),
            ..Default::default()
        });
    }

    let text = match std::str::from_utf8(&body) {
        Ok(text) => text,
        Err(err) => return OssifyError::Decode(format!("error body: {err}")),
    };
    match xml_from_str::<ProtocolError>(text) {
        Ok(error) => {
            debug!(code = %error.code, request_id = %error.request_id, "service returned an error");
            OssifyError::Protocol(error)
        }
        Err(err) => OssifyError::Decode(format!("error body: {err}")),
    }
}

fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    }
}

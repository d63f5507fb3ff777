//! Multipart upload operations. Orchestration is caller-driven: each part
//! upload is an independent, independently signed request, so parts may be
//! uploaded concurrently.

use http::Method;
use http::header::ETAG;
use ossify_common::{OssifyError, Result};
use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;
use crate::decode::{Sink, read_body};
use crate::object::{COPY_SOURCE_HEADER, Object, response_header};
use crate::request::{Body, CallOptions, header_value};

const MIN_PART_NUMBER: i32 = 1;
const MAX_PART_NUMBER: i32 = 10000;

impl Object<'_> {
    /// Starts a multipart upload and returns the upload id that every later
    /// part must carry.
    pub async fn initiate_multipart_upload(
        &self,
        opts: CallOptions,
    ) -> Result<InitiateMultipartUploadResult> {
        let opts = opts.with_query("uploads", "");
        self.do_request_xml(Method::POST, Body::None, &opts).await
    }

    /// Uploads one part and returns its ETag. Part numbers run from 1 to
    /// 10000; only byte and stream shapes are accepted.
    pub async fn upload_part(
        &self,
        part_number: i32,
        upload_id: &str,
        data: Body,
        opts: CallOptions,
    ) -> Result<String> {
        check_part_number(part_number)?;
        check_upload_id(upload_id)?;
        if !data.is_upload_data() {
            return Err(OssifyError::UnsupportedDataType);
        }

        let opts = opts
            .with_query("partNumber", part_number.to_string())
            .with_query("uploadId", upload_id);
        let response = self.get_response(Method::PUT, data, &opts).await?;
        let etag = response_header(&response, ETAG.as_str());
        read_body(response, Sink::Discard).await?;
        Ok(etag)
    }

    /// Uploads one part by copying from `source`.
    pub async fn upload_part_copy(
        &self,
        part_number: i32,
        upload_id: &str,
        source: &Object<'_>,
        opts: CallOptions,
    ) -> Result<CopyPartResult> {
        check_part_number(part_number)?;
        check_upload_id(upload_id)?;
        let source_name = source.full_name().ok_or(OssifyError::InvalidSourceObject)?;

        let opts = opts
            .with_header(COPY_SOURCE_HEADER, header_value(&source_name)?)
            .with_query("partNumber", part_number.to_string())
            .with_query("uploadId", upload_id);
        self.do_request_xml(Method::PUT, Body::None, &opts).await
    }

    /// Completes the upload from the accumulated part number/ETag pairs.
    pub async fn complete_multipart_upload(
        &self,
        upload_id: &str,
        parts: CompleteMultipartUpload,
        opts: CallOptions,
    ) -> Result<CompleteMultipartUploadResult> {
        check_upload_id(upload_id)?;
        let opts = opts.with_query("uploadId", upload_id);
        self.do_request_xml(Method::POST, Body::xml(&parts)?, &opts)
            .await
    }

    /// Aborts the upload and deletes the parts uploaded so far. Parts still
    /// in flight may survive one abort; call again to release them all.
    pub async fn abort_multipart_upload(&self, upload_id: &str, opts: CallOptions) -> Result<()> {
        check_upload_id(upload_id)?;
        let opts = opts.with_query("uploadId", upload_id);
        self.do_request(Method::DELETE, Body::None, &opts, Sink::Discard)
            .await
            .map(|_| ())
    }

    /// Lists the parts uploaded so far. Recognized query parameters:
    /// `max-parts`, `part-number-marker`, `encoding-type`.
    pub async fn list_parts(&self, upload_id: &str, opts: CallOptions) -> Result<ListPartsResult> {
        check_upload_id(upload_id)?;
        let opts = opts.with_query("uploadId", upload_id);
        self.do_request_xml(Method::GET, Body::None, &opts).await
    }
}

impl Bucket<'_> {
    /// Lists the multipart uploads that were initiated but neither completed
    /// nor aborted. Recognized query parameters: `delimiter`, `max-uploads`,
    /// `key-marker`, `prefix`, `upload-id-marker`, `encoding-type`.
    pub async fn list_multipart_uploads(
        &self,
        opts: CallOptions,
    ) -> Result<ListMultipartUploadsResult> {
        let opts = opts.with_query("uploads", "");
        self.do_request_xml(Method::GET, Body::None, &opts).await
    }
}

fn check_part_number(part_number: i32) -> Result<()> {
    if !(MIN_PART_NUMBER..=MAX_PART_NUMBER).contains(&part_number) {
        return Err(OssifyError::InvalidPartNumber(part_number));
    }
    Ok(())
}

fn check_upload_id(upload_id: &str) -> Result<()> {
    if upload_id.is_empty() {
        return Err(OssifyError::UploadIdRequired);
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
pub struct InitiateMultipartUploadResult {
    #[serde(rename = "Bucket", default)]
    pub bucket: String,
    #[serde(rename = "Key", default)]
    pub key: String,
    #[serde(rename = "UploadId", default)]
    pub upload_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CopyPartResult {
    #[serde(rename = "LastModified", default)]
    pub last_modified: String,
    #[serde(rename = "ETag", default)]
    pub etag: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename = "CompleteMultipartUpload")]
pub struct CompleteMultipartUpload {
    #[serde(rename = "Part")]
    pub parts: Vec<CompleteMultipartUploadPart>,
}

impl CompleteMultipartUpload {
    pub fn push(&mut self, part_number: i32, etag: impl Into<String>) {
        self.parts.push(CompleteMultipartUploadPart {
            part_number,
            etag: etag.into(),
        });
    }
}

#[derive(Debug, Serialize)]
pub struct CompleteMultipartUploadPart {
    #[serde(rename = "PartNumber")]
    pub part_number: i32,
    #[serde(rename = "ETag")]
    pub etag: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteMultipartUploadResult {
    #[serde(rename = "Bucket", default)]
    pub bucket: String,
    #[serde(rename = "ETag", default)]
    pub etag: String,
    #[serde(rename = "Location", default)]
    pub location: String,
    #[serde(rename = "Key", default)]
    pub key: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListMultipartUploadsResult {
    #[serde(rename = "Bucket", default)]
    pub bucket: String,
    #[serde(rename = "EncodingType", default)]
    pub encoding_type: String,
    #[serde(rename = "KeyMarker", default)]
    pub key_marker: String,
    #[serde(rename = "UploadIdMarker", default)]
    pub upload_id_marker: String,
    #[serde(rename = "NextKeyMarker", default)]
    pub next_key_marker: String,
    #[serde(rename = "NextUploadMarker", default)]
    pub next_upload_marker: String,
    #[serde(rename = "MaxUploads", default)]
    pub max_uploads: i32,
    #[serde(rename = "IsTruncated", default)]
    pub is_truncated: bool,
    #[serde(rename = "Upload", default)]
    pub uploads: Vec<UploadSummary>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadSummary {
    #[serde(rename = "Key", default)]
    pub key: String,
    #[serde(rename = "UploadId", default)]
    pub upload_id: String,
    #[serde(rename = "Initiated", default)]
    pub initiated: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPartsResult {
    #[serde(rename = "Bucket", default)]
    pub bucket: String,
    #[serde(rename = "EncodingType", default)]
    pub encoding_type: String,
    #[serde(rename = "Key", default)]
    pub key: String,
    #[serde(rename = "UploadId", default)]
    pub upload_id: String,
    #[serde(rename = "PartNumberMarker", default)]
    pub part_number_marker: i32,
    #[serde(rename = "NextPartNumberMarker", default)]
    pub next_part_number_marker: String,
    #[serde(rename = "MaxParts", default)]
    pub max_parts: i32,
    #[serde(rename = "IsTruncated", default)]
    pub is_truncated: bool,
    #[serde(rename = "Part", default)]
    pub parts: Vec<PartSummary>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartSummary {
    #[serde(rename = "PartNumber", default)]
    pub part_number: i32,
    #[serde(rename = "LastModified", default)]
    pub last_modified: String,
    #[serde(rename = "ETag", default)]
    pub etag: String,
    #[serde(rename = "Size", default)]
    pub size: i64,
}

#[cfg(test)]
mod tests {
    use crate::client::Client;

    use super::*;

    #[tokio::test]
    async fn part_number_bounds_are_enforced() {
        let client = Client::new("id", "secret");
        let object = client.object("bucket", "key");

        let err = object
            .upload_part(0, "upload", Body::bytes(&b"x"[..]), CallOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OssifyError::InvalidPartNumber(0)));

        let err = object
            .upload_part(10001, "upload", Body::bytes(&b"x"[..]), CallOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OssifyError::InvalidPartNumber(10001)));
    }

    #[tokio::test]
    async fn upload_id_is_required() {
        let client = Client::new("id", "secret");
        let object = client.object("bucket", "key");
        let err = object
            .abort_multipart_upload("", CallOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OssifyError::UploadIdRequired));
    }

    #[test]
    fn complete_payload_serializes_parts_in_order() {
        let mut parts = CompleteMultipartUpload::default();
        parts.push(1, "\"etag-one\"");
        parts.push(2, "\"etag-two\"");
        let xml = quick_xml::se::to_string(&parts).unwrap();
        assert_eq!(
            xml,
            "<CompleteMultipartUpload><Part><PartNumber>1</PartNumber><ETag>\"etag-one\"</ETag></Part><Part><PartNumber>2</PartNumber><ETag>\"etag-two\"</ETag></Part></CompleteMultipartUpload>"
        );
    }

    #[test]
    fn list_parts_result_decodes() {
        let xml = r#"<ListPartsResult>
  <Bucket>bucket</Bucket>
  <Key>key</Key>
  <UploadId>0004B999EF5A239BB9138C6227D69F95</UploadId>
  <MaxParts>1000</MaxParts>
  <IsTruncated>false</IsTruncated>
  <Part>
    <PartNumber>1</PartNumber>
    <LastModified>2026-02-05T12:00:00.000Z</LastModified>
    <ETag>"3349DC700140D7F86A0784842780"</ETag>
    <Size>6291456</Size>
  </Part>
</ListPartsResult>"#;
        let result: ListPartsResult = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(result.upload_id, "0004B999EF5A239BB9138C6227D69F95");
        assert_eq!(result.parts.len(), 1);
        assert_eq!(result.parts[0].part_number, 1);
        assert_eq!(result.parts[0].size, 6291456);
    }
}

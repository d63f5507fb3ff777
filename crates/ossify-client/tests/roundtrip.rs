//! End-to-end round trips against a local mock server: build, sign, send,
//! decode. Bucket-addressed operations put the bucket into the host name, so
//! these tests stay on service-level and plain-path requests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use http::Method;
use ossify_client::{Body, CallOptions, Client, Config, OssifyError, RequestPacer, Sink};
use tokio::io::AsyncReadExt;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mock_client(server: &MockServer) -> Client {
    let mut config = Config::new("test-access-key", "test-secret");
    config.domain = Some(server.address().to_string());
    config.insecure = true;
    Client::with_config(config)
}

#[tokio::test]
async fn list_buckets_round_trip_signs_and_decodes() {
    let server = MockServer::start().await;
    let body = r#"<ListAllMyBucketsResult>
  <Owner><ID>1000</ID><DisplayName>tester</DisplayName></Owner>
  <Buckets>
    <Bucket><Location>oss-cn-hangzhou</Location><Name>alpha</Name><CreationDate>2026-01-01T00:00:00.000Z</CreationDate></Bucket>
  </Buckets>
</ListAllMyBucketsResult>"#;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header_exists("authorization"))
        .and(header_exists("date"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/xml"))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let result = client.list_buckets(CallOptions::new()).await.unwrap();
    assert_eq!(result.owner.display_name, "tester");
    assert_eq!(result.buckets.bucket.len(), 1);
    assert_eq!(result.buckets.bucket[0].name, "alpha");
}

#[tokio::test]
async fn service_error_bodies_become_protocol_errors() {
    let server = MockServer::start().await;
    let body = r#"<Error>
  <Code>AccessDenied</Code>
  <Message>The bucket you access does not belong to you.</Message>
  <RequestId>1D842BC54255XXXX</RequestId>
  <HostId>oss-cn-hangzhou.aliyuncs.com</HostId>
</Error>"#;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_raw(body, "application/xml"))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let err = client.list_buckets(CallOptions::new()).await.unwrap_err();
    match err {
        OssifyError::Protocol(error) => {
            assert_eq!(error.code, "AccessDenied");
            assert_eq!(error.request_id, "1D842BC54255XXXX");
        }
        other => panic!("expected protocol error, got {other:?}"),
    }
}

#[tokio::test]
async fn plain_path_download_into_a_file_sink() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/archive.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(&b"file payload"[..]))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("archive.bin");
    let mut file = tokio::fs::File::create(&target).await.unwrap();

    let read = client
        .do_request(
            Method::GET,
            None,
            Some("archive.bin"),
            Body::None,
            &CallOptions::new(),
            Sink::File(&mut file),
        )
        .await
        .unwrap();
    assert_eq!(read, 12);
    drop(file);

    let mut contents = String::new();
    tokio::fs::File::open(&target)
        .await
        .unwrap()
        .read_to_string(&mut contents)
        .await
        .unwrap();
    assert_eq!(contents, "file payload");
}

#[tokio::test]
async fn gzip_response_is_decompressed_end_to_end() {
    use std::io::Write as _;

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(b"compressed on the wire").unwrap();
    let compressed = encoder.finish().unwrap();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zipped"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(compressed)
                .insert_header("Content-Encoding", "gzip"),
        )
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let mut buf = Vec::new();
    client
        .do_request(
            Method::GET,
            None,
            Some("zipped"),
            Body::None,
            &CallOptions::new(),
            Sink::Bytes(&mut buf),
        )
        .await
        .unwrap();
    assert_eq!(buf, b"compressed on the wire");
}

#[tokio::test]
async fn uploads_send_content_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/notes.txt"))
        .and(header_exists("content-md5"))
        .and(header_exists("content-type"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server);
    client
        .do_request(
            Method::PUT,
            None,
            Some("notes.txt"),
            Body::bytes(&b"some notes"[..]),
            &CallOptions::new(),
            Sink::Discard,
        )
        .await
        .unwrap();
}

struct CountingPacer(AtomicUsize);

#[async_trait]
impl RequestPacer for CountingPacer {
    async fn pause(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn the_injected_pacer_runs_before_each_dispatch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let pacer = Arc::new(CountingPacer(AtomicUsize::new(0)));
    let client = mock_client(&server).with_pacer(pacer.clone());

    client
        .do_request(
            Method::GET,
            None,
            None,
            Body::None,
            &CallOptions::new(),
            Sink::Discard,
        )
        .await
        .unwrap();
    client
        .do_request(
            Method::GET,
            None,
            None,
            Body::None,
            &CallOptions::new(),
            Sink::Discard,
        )
        .await
        .unwrap();

    assert_eq!(pacer.0.load(Ordering::SeqCst), 2);
}

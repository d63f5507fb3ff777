pub mod bucket;
pub mod client;
pub mod cors;
pub mod decode;
pub mod multipart;
pub mod naming;
pub mod object;
pub mod range;
pub mod request;
mod sniff;

pub use bucket::Bucket;
pub use client::{Client, Config, RequestPacer};
pub use decode::{Sink, read_body, read_xml};
pub use naming::{endpoint_domain, full_resource_name, is_bucket_name, is_object_name};
pub use object::Object;
pub use ossify_common::{OssifyError, ProtocolError, Result};
pub use ossify_sign::Credentials;
pub use range::{ContentRange, format_range, parse_content_range};
pub use request::{Body, CallOptions, OssRequest};

pub mod canonical;
pub mod credentials;
pub mod digest;
pub mod signer;

pub use canonical::{SUBRESOURCES, canonicalized_headers, canonicalized_resource};
pub use credentials::Credentials;
pub use digest::{hmac_sha1, hmac_sha256, md5_base64};
pub use signer::{sign_request, string_to_sign};

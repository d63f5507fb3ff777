/// Account credentials used to sign requests.
///
/// Read-only once constructed; a single value may be shared by any number of
/// concurrent operations. `security_token` carries an STS session token and
/// is sent alongside the long-lived key pair when present.
#[derive(Clone, Debug, Default)]
pub struct Credentials {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub security_token: Option<String>,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            security_token: None,
        }
    }

    pub fn with_security_token(mut self, token: impl Into<String>) -> Self {
        self.security_token = Some(token.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.access_key_id.is_empty() || self.access_key_secret.is_empty()
    }
}

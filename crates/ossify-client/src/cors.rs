//! Bucket CORS configuration and the object preflight request.

use http::{HeaderMap, Method};
use ossify_common::Result;
use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;
use crate::decode::{Sink, read_body};
use crate::object::Object;
use crate::request::{Body, CallOptions};

impl Bucket<'_> {
    /// Sets the CORS rules, replacing any existing configuration.
    pub async fn put_cors(&self, config: &CORSConfiguration, opts: CallOptions) -> Result<()> {
        let opts = opts.with_query("cors", "");
        self.do_request(Method::PUT, Body::xml(config)?, &opts, Sink::Discard)
            .await
            .map(|_| ())
    }

    /// The CORS rules; the service answers `NoSuchCORSConfiguration` when
    /// none are set.
    pub async fn get_cors(&self, opts: CallOptions) -> Result<CORSConfiguration> {
        let opts = opts.with_query("cors", "");
        self.do_request_xml(Method::GET, Body::None, &opts).await
    }

    /// Disables CORS and drops all rules.
    pub async fn delete_cors(&self, opts: CallOptions) -> Result<()> {
        let opts = opts.with_query("cors", "");
        self.do_request(Method::DELETE, Body::None, &opts, Sink::Discard)
            .await
            .map(|_| ())
    }
}

impl Object<'_> {
    /// CORS preflight for the object. The caller supplies `Origin` and
    /// `Access-Control-Request-*` headers and reads the answer from the
    /// returned headers.
    pub async fn options(&self, opts: CallOptions) -> Result<HeaderMap> {
        let response = self.get_response(Method::OPTIONS, Body::None, &opts).await?;
        let headers = response.headers().clone();
        read_body(response, Sink::Discard).await?;
        Ok(headers)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename = "CORSConfiguration")]
pub struct CORSConfiguration {
    #[serde(rename = "CORSRule", default)]
    pub rules: Vec<CORSRule>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CORSRule {
    #[serde(rename = "AllowedOrigin", default)]
    pub allowed_origin: String,
    #[serde(rename = "AllowedMethod", default)]
    pub allowed_method: String,
    #[serde(rename = "AllowedHeader", default)]
    pub allowed_header: String,
    #[serde(rename = "ExposeHeader", default)]
    pub expose_header: String,
    #[serde(rename = "MaxAgeSeconds", default)]
    pub max_age_seconds: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_configuration_round_trips_through_xml() {
        let config = CORSConfiguration {
            rules: vec![CORSRule {
                allowed_origin: "*".to_string(),
                allowed_method: "GET".to_string(),
                allowed_header: "*".to_string(),
                expose_header: "x-oss-test".to_string(),
                max_age_seconds: 10,
            }],
        };
        let xml = quick_xml::se::to_string(&config).unwrap();
        assert!(xml.starts_with("<CORSConfiguration><CORSRule>"));

        let decoded: CORSConfiguration = quick_xml::de::from_str(&xml).unwrap();
        assert_eq!(decoded.rules.len(), 1);
        assert_eq!(decoded.rules[0].allowed_origin, "*");
        assert_eq!(decoded.rules[0].max_age_seconds, 10);
    }
}

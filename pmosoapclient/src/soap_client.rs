use std::fmt;

use pmosoap::{Body, Envelope, decode_body, decode_fault, encode_fragments, to_fragment};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, trace};
use ureq::{Agent, http, tls::TlsConfig};

use crate::config::SoapClientConfig;
use crate::errors::SoapError;

pub const SOAP_CONTENT_TYPE: &str = r#"text/xml; charset="utf-8""#;

/// Blocking SOAP 1.1 client bound to one endpoint.
///
/// - `H`: type of the static header attached to every call (`()` when the
///   client was built without one)
///
/// The client holds no mutable state: it can be shared between threads and
/// each call is independent. Connections are never reused across calls.
#[derive(Clone)]
pub struct SoapClient<H = ()> {
    config: SoapClientConfig,
    header: Option<H>,
    agent: Agent,
}

impl SoapClient<()> {
    /// Client that sends envelopes without a SOAP header
    pub fn without_header(url: impl Into<String>, insecure_tls: bool) -> Self {
        Self::new(url, insecure_tls, None)
    }
}

impl<H> SoapClient<H> {
    /// - `url`: full HTTP(S) URL of the SOAP endpoint
    /// - `insecure_tls`: skip certificate verification
    /// - `header`: header content attached to every call
    pub fn new(url: impl Into<String>, insecure_tls: bool, header: Option<H>) -> Self {
        Self::from_config(
            SoapClientConfig::new(url).with_insecure_tls(insecure_tls),
            header,
        )
    }

    pub fn from_config(config: SoapClientConfig, header: Option<H>) -> Self {
        let agent = build_agent(&config);
        Self {
            config,
            header,
            agent,
        }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn config(&self) -> &SoapClientConfig {
        &self.config
    }

    pub fn header(&self) -> Option<&H> {
        self.header.as_ref()
    }
}

impl<H: Serialize> SoapClient<H> {
    /// Invoke a SOAP action and return the raw response body.
    ///
    /// - `action`: value of the `SOAPAction` HTTP header
    /// - `request`: body content, serialized under `soap:Body`
    ///
    /// A 200 response yields its body verbatim, possibly empty. Any other
    /// status yields [`SoapError::HttpStatus`] carrying the raw body; decoding
    /// it is left to the caller (see [`pmosoap::decode_fault`]).
    pub fn call<B: Serialize>(&self, action: &str, request: &B) -> Result<Vec<u8>, SoapError> {
        let envelope = Envelope::request(self.header.as_ref(), request);
        let payload = envelope.to_xml()?;
        self.post(action, payload)
    }

    /// Same as [`SoapClient::call`] with a body that is already serialized XML
    pub fn call_raw(&self, action: &str, body_xml: &str) -> Result<Vec<u8>, SoapError> {
        let header = self.header.as_ref().map(to_fragment).transpose()?;
        let payload = encode_fragments(header.as_deref(), body_xml)?;
        self.post(action, payload)
    }

    /// Invoke a SOAP action and decode the response body as `R`.
    ///
    /// A SOAP Fault, in a 200 response or in an error response, is returned
    /// as [`SoapError::Fault`].
    pub fn invoke<B, R>(&self, action: &str, request: &B) -> Result<R, SoapError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let response = match self.call(action, request) {
            Ok(response) => response,
            Err(SoapError::HttpStatus { status, body }) => {
                return Err(match decode_fault(body.as_bytes()) {
                    Ok(Some(fault)) => SoapError::Fault(fault),
                    _ => SoapError::HttpStatus { status, body },
                });
            }
            Err(err) => return Err(err),
        };

        match decode_body::<R>(&response)? {
            Body::Content(content) => Ok(content),
            Body::Fault(fault) => Err(SoapError::Fault(fault)),
        }
    }

    fn post(&self, action: &str, payload: Vec<u8>) -> Result<Vec<u8>, SoapError> {
        let url = self.config.url.as_str();

        debug!(url, action, bytes = payload.len(), "Sending SOAP request");
        trace!(envelope = %String::from_utf8_lossy(&payload), "SOAP request envelope");

        // Content-Length is set by ureq from the sized body
        let request = http::Request::builder()
            .method(http::Method::POST)
            .uri(url)
            .header(http::header::CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .header("SOAPAction", action)
            .header(http::header::USER_AGENT, self.config.user_agent.as_str())
            .header(http::header::CONNECTION, "close")
            .body(payload)?;

        let mut response = self.agent.run(request).map_err(|source| SoapError::Send {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        debug!(url, action, status = status.as_u16(), "SOAP response received");

        if status != http::StatusCode::OK {
            let body = self
                .read_body(&mut response)
                .map_err(|source| SoapError::ReadFault {
                    status: status.as_u16(),
                    source,
                })?;
            return Err(SoapError::HttpStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let body = self
            .read_body(&mut response)
            .map_err(SoapError::ReadBody)?;
        trace!(bytes = body.len(), "SOAP response body read");

        Ok(body)
    }

    fn read_body(&self, response: &mut http::Response<ureq::Body>) -> Result<Vec<u8>, ureq::Error> {
        response
            .body_mut()
            .with_config()
            .limit(self.config.max_response_bytes)
            .read_to_vec()
    }
}

impl<H> fmt::Debug for SoapClient<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoapClient")
            .field("config", &self.config)
            .field("has_header", &self.header.is_some())
            .finish()
    }
}

/// Agent for one client: no status-as-error, no idle connection kept.
fn build_agent(config: &SoapClientConfig) -> Agent {
    let tls = TlsConfig::builder()
        .disable_verification(config.insecure_tls)
        .build();

    Agent::config_builder()
        .tls_config(tls)
        .timeout_connect(Some(config.dial_timeout()))
        .timeout_global(config.request_timeout())
        .http_status_as_error(false)
        .max_idle_connections(0)
        .max_idle_connections_per_host(0)
        .build()
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_client_accessors() {
        let client = SoapClient::new("http://localhost/soap", true, Some("header"));

        assert_eq!(client.url(), "http://localhost/soap");
        assert!(client.config().insecure_tls);
        assert_eq!(client.config().dial_timeout(), Duration::from_secs(30));
        assert_eq!(client.header(), Some(&"header"));
    }

    #[test]
    fn test_debug_does_not_require_debug_header() {
        struct Opaque;

        let client = SoapClient::new("http://localhost/soap", false, Some(Opaque));
        let debug = format!("{client:?}");
        assert!(debug.contains("has_header: true"));
    }

    #[test]
    fn test_invalid_url_is_a_request_error() {
        #[derive(Serialize)]
        #[serde(rename = "ping")]
        struct Ping {
            message: String,
        }

        let client = SoapClient::without_header("not a url", false);
        let result = client.call(
            "Ping",
            &Ping {
                message: "hi".to_string(),
            },
        );

        assert!(matches!(result, Err(SoapError::Request(_))));
    }

    #[test]
    fn test_invalid_action_is_a_request_error() {
        let client = SoapClient::without_header("http://localhost/soap", false);
        let result = client.call_raw("Bad\nAction", "<ping/>");

        assert!(matches!(result, Err(SoapError::Request(_))));
    }
}

//! # pmosoapclient - SOAP 1.1 client
//!
//! Builds request envelopes with [`pmosoap`], posts them to an HTTP(S)
//! endpoint with `ureq` and hands the response back to the caller, either as
//! raw bytes ([`SoapClient::call`]) or decoded ([`SoapClient::invoke`]).
//!
//! ```no_run
//! use pmosoapclient::SoapClient;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! #[serde(rename = "myRequestHeader")]
//! struct Credentials {
//!     #[serde(rename = "userId")]
//!     user_id: String,
//!     password: String,
//! }
//!
//! #[derive(Serialize)]
//! #[serde(rename = "testRequest")]
//! struct TestRequest {
//!     message: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct Person {
//!     id: u32,
//! }
//!
//! let header = Credentials {
//!     user_id: "myname".to_string(),
//!     password: "pass".to_string(),
//! };
//! let client = SoapClient::new("https://example.com/soap", false, Some(header));
//! let request = TestRequest {
//!     message: "test".to_string(),
//! };
//!
//! let raw = client.call("DoThing", &request)?;
//! let person: Person = client.invoke("DoThing", &request)?;
//! # Ok::<(), pmosoapclient::SoapError>(())
//! ```

pub mod config;
pub mod errors;
pub mod soap_client;

pub use config::SoapClientConfig;
pub use errors::SoapError;
pub use soap_client::{SOAP_CONTENT_TYPE, SoapClient};

pub use pmosoap::{Body, Envelope, Fault, Header};

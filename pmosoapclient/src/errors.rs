use pmosoap::{DecodeError, EncodeError, Fault};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SoapError {
    #[error("failed to encode envelope: {0}")]
    Encode(#[from] EncodeError),

    #[error("failed to create POST request: {0}")]
    Request(#[from] ureq::http::Error),

    #[error("failed to send SOAP request to {url}: {source}")]
    Send {
        url: String,
        #[source]
        source: ureq::Error,
    },

    #[error("failed to read SOAP body: {0}")]
    ReadBody(#[source] ureq::Error),

    #[error("failed to read SOAP fault response body (HTTP status {status}): {source}")]
    ReadFault {
        status: u16,
        #[source]
        source: ureq::Error,
    },

    #[error("HTTP Status Code: {status}, SOAP Fault: \n{body}")]
    HttpStatus { status: u16, body: String },

    #[error("failed to decode SOAP response: {0}")]
    Decode(#[from] DecodeError),

    #[error("SOAP fault: {0}")]
    Fault(#[from] Fault),
}

impl SoapError {
    /// HTTP status of the response, when one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            SoapError::ReadFault { status, .. } | SoapError::HttpStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub fn fault(&self) -> Option<&Fault> {
        match self {
            SoapError::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}

use thiserror::Error;

/// Erreur de sérialisation d'une enveloppe SOAP
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to serialize SOAP content: {0}")]
    Serialize(#[from] quick_xml::SeError),

    #[error("malformed XML fragment: {0}")]
    Fragment(#[from] quick_xml::Error),

    #[error("failed to write SOAP envelope: {0}")]
    Io(#[from] std::io::Error),
}

/// Erreur de décodage d'une enveloppe SOAP
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("SOAP document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid entity reference: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    #[error("expected a SOAP Envelope, found <{0}>")]
    NotAnEnvelope(String),

    #[error("Missing SOAP Body")]
    MissingBody,

    #[error("Found multiple Body elements inside SOAP envelope")]
    DuplicateBody,

    #[error("No element found in SOAP Body")]
    EmptyBody,

    #[error(
        "Found multiple elements inside SOAP body; not wrapped-document/literal WS-I compliant"
    )]
    MultipleBodyElements,

    #[error("Found multiple elements inside SOAP header")]
    MultipleHeaderElements,

    #[error("failed to decode <{element}>: {source}")]
    Content {
        element: String,
        #[source]
        source: quick_xml::DeError,
    },

    #[error("unexpected end of SOAP document")]
    UnexpectedEof,
}

//! Structures de l'enveloppe SOAP

use serde::{Serialize, de::DeserializeOwned};

use crate::{DecodeError, EncodeError, Fault};

/// Enveloppe SOAP complète
///
/// `H` est le type du contenu de l'en-tête, `B` celui du contenu du corps.
/// Les deux sont choisis par l'appelant au moment de l'appel.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<H, B> {
    /// En-tête SOAP optionnel
    pub header: Option<Header<H>>,

    /// Corps SOAP contenant l'action, la réponse ou un Fault
    pub body: Body<B>,
}

/// En-tête SOAP
#[derive(Debug, Clone, PartialEq)]
pub struct Header<H> {
    /// Unique élément applicatif porté par l'en-tête
    pub content: H,
}

/// Corps SOAP : un élément applicatif ou un Fault, jamais les deux
#[derive(Debug, Clone, PartialEq)]
pub enum Body<B> {
    /// Élément applicatif
    Content(B),

    /// Erreur SOAP renvoyée à la place du contenu
    Fault(Fault),
}

impl<H, B> Envelope<H, B> {
    /// Crée une nouvelle enveloppe SOAP sans en-tête
    pub fn new(body: Body<B>) -> Self {
        Self { header: None, body }
    }

    /// Crée une nouvelle enveloppe avec header
    pub fn with_header(header: Header<H>, body: Body<B>) -> Self {
        Self {
            header: Some(header),
            body,
        }
    }

    /// Enveloppe de requête : en-tête optionnel et contenu applicatif
    pub fn request(header: Option<H>, content: B) -> Self {
        Self {
            header: header.map(Header::new),
            body: Body::Content(content),
        }
    }

    /// Contenu de l'en-tête, s'il est présent
    pub fn header_content(&self) -> Option<&H> {
        self.header.as_ref().map(|h| &h.content)
    }
}

impl<H: Serialize, B: Serialize> Envelope<H, B> {
    /// Sérialise l'enveloppe en document XML complet
    pub fn to_xml(&self) -> Result<Vec<u8>, EncodeError> {
        crate::encode(self)
    }
}

impl<H: DeserializeOwned, B: DeserializeOwned> Envelope<H, B> {
    /// Décode une enveloppe à partir d'un document XML
    pub fn from_xml(xml: &[u8]) -> Result<Self, DecodeError> {
        crate::decode(xml)
    }
}

impl<H> Header<H> {
    pub fn new(content: H) -> Self {
        Self { content }
    }
}

impl<B> Body<B> {
    /// Contenu applicatif, `None` si le corps porte un Fault
    pub fn content(&self) -> Option<&B> {
        match self {
            Body::Content(content) => Some(content),
            Body::Fault(_) => None,
        }
    }

    /// Fault porté par le corps
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Body::Content(_) => None,
            Body::Fault(fault) => Some(fault),
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Body::Fault(_))
    }

    /// Convertit le corps en `Result`, le Fault devenant l'erreur
    pub fn into_result(self) -> Result<B, Fault> {
        match self {
            Body::Content(content) => Ok(content),
            Body::Fault(fault) => Err(fault),
        }
    }
}

impl<B> From<Fault> for Body<B> {
    fn from(fault: Fault) -> Self {
        Body::Fault(fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_envelope() {
        let envelope = Envelope::request(Some("token"), 42);
        assert_eq!(envelope.header_content(), Some(&"token"));
        assert_eq!(envelope.body.content(), Some(&42));

        let envelope: Envelope<(), u32> = Envelope::request(None, 7);
        assert!(envelope.header.is_none());
    }

    #[test]
    fn test_body_into_result() {
        let body: Body<u32> = Body::Content(3);
        assert_eq!(body.into_result().unwrap(), 3);

        let body: Body<u32> = Fault::new("soap:Server", "boom").into();
        assert!(body.is_fault());
        assert!(body.content().is_none());
        let fault = body.into_result().unwrap_err();
        assert_eq!(fault.fault_code.as_deref(), Some("soap:Server"));
    }
}

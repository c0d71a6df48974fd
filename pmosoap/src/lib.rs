//! # pmosoap - Enveloppes SOAP 1.1
//!
//! Ce crate implémente le codec d'enveloppes SOAP 1.1 côté client : construction
//! et sérialisation des requêtes, décodage des réponses (contenu applicatif,
//! en-tête optionnel ou SOAP Fault).
//!
//! ## Fonctionnalités
//!
//! - ✅ Sérialisation d'enveloppes avec déclaration XML et indentation
//! - ✅ Décodage typé de l'en-tête et du corps (types fournis par l'appelant)
//! - ✅ Détection des SOAP Faults par namespace
//! - ✅ Rejet des corps contenant plusieurs éléments (WS-I wrapped-document/literal)
//!
//! ## Architecture
//!
//! - [`Envelope`] : Enveloppe SOAP complète
//! - [`Header`] : En-tête applicatif optionnel
//! - [`Body`] : Contenu applicatif **ou** Fault, jamais les deux
//! - [`Fault`] : Erreur SOAP, utilisable comme `std::error::Error`
//!
//! ## Example
//!
//! ```
//! use pmosoap::{Body, Envelope};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! #[serde(rename = "ping")]
//! struct Ping {
//!     message: String,
//! }
//!
//! let request: Envelope<(), Ping> = Envelope::new(Body::Content(Ping {
//!     message: "hello".to_string(),
//! }));
//! let xml = request.to_xml().unwrap();
//!
//! let decoded: Envelope<(), Ping> = Envelope::from_xml(&xml).unwrap();
//! assert_eq!(decoded.body.content().unwrap().message, "hello");
//! ```

mod builder;
mod envelope;
mod errors;
mod fault;
mod parser;

pub use builder::{encode, encode_fragments, to_fragment};
pub use envelope::{Body, Envelope, Header};
pub use errors::{DecodeError, EncodeError};
pub use fault::Fault;
pub use parser::{decode, decode_body, decode_fault};

/// Namespace des enveloppes SOAP 1.1
pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Préfixe utilisé pour le namespace de l'enveloppe lors de la sérialisation
pub const SOAP_ENV_PREFIX: &str = "soap";

/// Déclaration XML placée en tête de chaque document produit
pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

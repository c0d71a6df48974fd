//! SOAP Faults

use std::fmt;

use serde::Serialize;

/// Erreur SOAP (Fault)
///
/// Les quatre champs sont optionnels. Le texte de l'erreur est le
/// `faultstring`, une chaîne vide s'il est absent.
///
/// Le champ `detail` est décodé comme une chaîne plate : un détail structuré
/// n'est pas interprété.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Fault {
    /// Code d'erreur (ex: "soap:Client", "soap:Server")
    #[serde(rename = "faultcode", skip_serializing_if = "Option::is_none")]
    pub fault_code: Option<String>,

    /// Description de l'erreur
    #[serde(rename = "faultstring", skip_serializing_if = "Option::is_none")]
    pub fault_string: Option<String>,

    /// Origine du fault
    #[serde(rename = "faultactor", skip_serializing_if = "Option::is_none")]
    pub fault_actor: Option<String>,

    /// Détails applicatifs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Fault {
    /// Crée un fault SOAP simple
    pub fn new(fault_code: impl Into<String>, fault_string: impl Into<String>) -> Self {
        Self {
            fault_code: Some(fault_code.into()),
            fault_string: Some(fault_string.into()),
            ..Self::default()
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.fault_actor = Some(actor.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.fault_string.as_deref().unwrap_or_default())
    }
}

impl std::error::Error for Fault {}

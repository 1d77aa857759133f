//! Payload sent to the document registration endpoint.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DOC_TYPE_INTRODUCE_GOODS: &str = "LP_INTRODUCE_GOODS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    #[serde(rename = "participantInn")]
    pub participant_inn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub description: Description,
    pub doc_id: String,
    pub doc_status: String,
    pub doc_type: String,
    #[serde(rename = "importRequest", skip_serializing_if = "Option::is_none")]
    pub import_request: Option<bool>,
    pub owner_inn: String,
    pub participant_inn: String,
    pub producer_inn: String,
    pub production_date: NaiveDate,
    pub production_type: String,
    pub products: Vec<Product>,
    pub reg_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reg_number: Option<String>,
}

impl Document {
    /// The description block is derived from `participant_inn`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        doc_id: impl Into<String>,
        doc_status: impl Into<String>,
        doc_type: impl Into<String>,
        owner_inn: impl Into<String>,
        participant_inn: impl Into<String>,
        producer_inn: impl Into<String>,
        production_date: NaiveDate,
        production_type: impl Into<String>,
        products: Vec<Product>,
        reg_date: NaiveDate,
    ) -> Self {
        let participant_inn = participant_inn.into();
        Self {
            description: Description {
                participant_inn: participant_inn.clone(),
            },
            doc_id: doc_id.into(),
            doc_status: doc_status.into(),
            doc_type: doc_type.into(),
            import_request: None,
            owner_inn: owner_inn.into(),
            participant_inn,
            producer_inn: producer_inn.into(),
            production_date,
            production_type: production_type.into(),
            products,
            reg_date,
            reg_number: None,
        }
    }

    pub fn with_import_request(mut self, import_request: bool) -> Self {
        self.import_request = Some(import_request);
        self
    }

    pub fn with_reg_number(mut self, reg_number: impl Into<String>) -> Self {
        self.reg_number = Some(reg_number.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_document_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_document_number: Option<String>,
    pub owner_inn: String,
    pub producer_inn: String,
    pub production_date: NaiveDate,
    pub tnved_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uit_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uitu_code: Option<String>,
}

impl Product {
    pub fn new(
        owner_inn: impl Into<String>,
        producer_inn: impl Into<String>,
        production_date: NaiveDate,
        tnved_code: impl Into<String>,
    ) -> Self {
        Self {
            certificate_document: None,
            certificate_document_date: None,
            certificate_document_number: None,
            owner_inn: owner_inn.into(),
            producer_inn: producer_inn.into(),
            production_date,
            tnved_code: tnved_code.into(),
            uit_code: None,
            uitu_code: None,
        }
    }

    /// e.g. `CONFORMITY_CERTIFICATE` or `CONFORMITY_DECLARATION`
    pub fn with_certificate(
        mut self,
        document: impl Into<String>,
        date: NaiveDate,
        number: impl Into<String>,
    ) -> Self {
        self.certificate_document = Some(document.into());
        self.certificate_document_date = Some(date);
        self.certificate_document_number = Some(number.into());
        self
    }

    pub fn with_uit(mut self, uit_code: impl Into<String>) -> Self {
        self.uit_code = Some(uit_code.into());
        self
    }

    pub fn with_uitu(mut self, uitu_code: impl Into<String>) -> Self {
        self.uitu_code = Some(uitu_code.into());
        self
    }
}

/// Detached signature for a document, sent verbatim in the `Signature` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(String);

impl Signature {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Base64-encodes raw signature bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(STANDARD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep signatures out of logs.
impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({} bytes)", self.0.len())
    }
}

/// A document together with its signature: one unit of work for an executor.
#[derive(Debug, Clone)]
pub struct SignedDocument {
    pub document: Document,
    pub signature: Signature,
}

impl SignedDocument {
    pub fn new(document: Document, signature: Signature) -> Self {
        Self { document, signature }
    }
}

//! Company settings and document sequence counters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Document families that receive a sequential number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    Invoice,
    Purchase,
    Mission,
}

impl DocumentKind {
    pub fn default_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "SJ",
            DocumentKind::Purchase => "BA",
            DocumentKind::Mission => "MS",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::Purchase => "purchase",
            DocumentKind::Mission => "mission",
        }
    }
}

/// Per-family counter. `next_index` is the index the next issued number uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceCounter {
    pub prefix: String,
    pub year: i32,
    pub next_index: u32,
}

impl SequenceCounter {
    pub fn new(kind: DocumentKind, year: i32) -> Self {
        Self {
            prefix: kind.default_prefix().to_string(),
            year,
            next_index: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub company_name: String,
    pub ice: String,
    #[serde(rename = "if")]
    pub tax_id: String,
    pub rc: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub logo: String,
    pub signature: String,
    pub footer_message: String,
    pub language: String,
    pub sequences: BTreeMap<DocumentKind, SequenceCounter>,
    /// Single invoice counter written by older versions; folded into
    /// `sequences` on load.
    #[serde(skip_serializing)]
    pub next_invoice_index: Option<u32>,
    #[serde(skip_serializing)]
    pub current_year: Option<i32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Settings {
    pub fn company_defaults() -> Self {
        Self {
            company_name: "SAJITECH ENTERPRISE".to_string(),
            ice: "000000000000000".to_string(),
            tax_id: "00000000".to_string(),
            rc: "000000".to_string(),
            address: "Casablanca, Maroc".to_string(),
            phone: "+212 5XX XX XX XX".to_string(),
            email: "contact@sajitech.ma".to_string(),
            footer_message: "Merci de votre confiance.".to_string(),
            language: "FR".to_string(),
            ..Default::default()
        }
    }

    /// Moves the legacy single invoice counter into the sequence map.
    /// An existing invoice sequence wins over legacy fields.
    pub fn migrate_legacy_counter(&mut self) -> bool {
        let index = self.next_invoice_index.take();
        let year = self.current_year.take();
        let (Some(index), Some(year)) = (index, year) else {
            return false;
        };
        if self.sequences.contains_key(&DocumentKind::Invoice) {
            return false;
        }
        self.sequences.insert(
            DocumentKind::Invoice,
            SequenceCounter {
                prefix: DocumentKind::Invoice.default_prefix().to_string(),
                year,
                next_index: index.max(1),
            },
        );
        true
    }
}

//! Application roles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of the acting user. Serialized with the labels the back office stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Manager,
    #[serde(rename = "Vendeur", alias = "Seller")]
    Seller,
    #[serde(rename = "Technicien", alias = "Technician")]
    Technician,
    #[serde(rename = "Chauffeur", alias = "Driver")]
    Driver,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Seller => "seller",
            Role::Technician => "technician",
            Role::Driver => "driver",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

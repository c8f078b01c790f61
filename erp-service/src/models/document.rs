//! The persisted state document: every collection of the back office in one
//! JSON object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{
    AuditLog, Category, Client, ClientAction, Driver, Expense, FuelLog, Invoice, Mission,
    Notification, PriceHistoryEntry, Product, Purchase, Sale, ServiceItem, Settings,
    StockMovement, Supplier, Ticket, Vehicle,
};

pub const SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateDocument {
    pub schema_version: u32,
    /// Bumped by every checked save.
    pub revision: u64,
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub services: Vec<ServiceItem>,
    pub invoices: Vec<Invoice>,
    pub purchases: Vec<Purchase>,
    pub purchase_price_history: Vec<PriceHistoryEntry>,
    pub expenses: Vec<Expense>,
    pub stock_movements: Vec<StockMovement>,
    pub sales: Vec<Sale>,
    pub clients: Vec<Client>,
    pub suppliers: Vec<Supplier>,
    pub client_actions: Vec<ClientAction>,
    pub drivers: Vec<Driver>,
    pub vehicles: Vec<Vehicle>,
    pub missions: Vec<Mission>,
    pub fuel_logs: Vec<FuelLog>,
    pub tickets: Vec<Ticket>,
    pub notifications: Vec<Notification>,
    pub audit_logs: Vec<AuditLog>,
    pub settings: Settings,
    /// Collections this engine does not interpret (users, HR, chat, ...),
    /// kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StateDocument {
    /// Default document for a fresh installation: the walk-in client and the
    /// company profile.
    pub fn seeded(now: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            clients: vec![Client::walk_in(now)],
            settings: Settings::company_defaults(),
            ..Default::default()
        }
    }

    /// Brings a document written by an older version up to the current schema.
    pub fn normalize(&mut self) {
        if self.settings.migrate_legacy_counter() {
            tracing::info!("Migrated legacy invoice counter into sequences");
        }
        self.schema_version = SCHEMA_VERSION;
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn product_mut(&mut self, id: &str) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id == id)
    }

    pub fn client(&self, id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    pub fn invoice(&self, id: &str) -> Option<&Invoice> {
        self.invoices.iter().find(|i| i.id == id)
    }

    pub fn invoice_mut(&mut self, id: &str) -> Option<&mut Invoice> {
        self.invoices.iter_mut().find(|i| i.id == id)
    }

    pub fn purchase_mut(&mut self, id: &str) -> Option<&mut Purchase> {
        self.purchases.iter_mut().find(|p| p.id == id)
    }

    pub fn purchase(&self, id: &str) -> Option<&Purchase> {
        self.purchases.iter().find(|p| p.id == id)
    }
}

#![allow(dead_code)]

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use erp_service::models::{
    Driver, Product, StateDocument, Supplier, Vehicle, VehicleStatus, WALK_IN_CLIENT_ID,
};
use erp_service::services::FileStateStore;
use rust_decimal::Decimal;
use tempfile::TempDir;

pub const TEST_USER_ID: &str = "u1";
pub const TEST_CLIENT_ID: &str = WALK_IN_CLIENT_ID;
pub const TEST_SUPPLIER_ID: &str = "s1";

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Fixed clock so document numbers carry a known year.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 9, 30, 0).unwrap()
}

pub fn product(id: &str, price_ttc: &str, stock: &str, cost: &str) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Produit {id}"),
        sku: format!("SKU-{id}"),
        category_id: "cat1".to_string(),
        price: dec(price_ttc),
        cost: dec(cost),
        unit: "u".to_string(),
        stock_qty: dec(stock),
        min_stock: dec("2"),
        tax_rate: dec("20"),
        image: None,
    }
}

pub fn supplier(id: &str) -> Supplier {
    Supplier {
        id: id.to_string(),
        name: "Fournisseur Atlas".to_string(),
        ice: Some("001122334455667".to_string()),
        tax_id: None,
        phone: "0522000000".to_string(),
        email: "contact@atlas.ma".to_string(),
        city: "Casablanca".to_string(),
        created_at: now(),
    }
}

pub fn driver(id: &str) -> Driver {
    Driver {
        id: id.to_string(),
        name: format!("Chauffeur {id}"),
        cin: "BK123456".to_string(),
        phone: "0600000000".to_string(),
        license_expiry: "2028-01-01".to_string(),
        status: "Actif".to_string(),
        linked_user_id: None,
        smart_score: None,
        contract_type: "CDI".to_string(),
        created_at: now(),
    }
}

pub fn vehicle(id: &str, km: &str) -> Vehicle {
    Vehicle {
        id: id.to_string(),
        plate: "12345-A-6".to_string(),
        brand: "Renault".to_string(),
        model: "Master".to_string(),
        current_km: dec(km),
        status: VehicleStatus::Active,
        created_at: now(),
    }
}

/// Seeded document with one product (120 TTC, 10 in stock at cost 100) and
/// one supplier.
pub fn test_doc() -> StateDocument {
    let mut doc = StateDocument::seeded(now());
    doc.products.push(product("p1", "120", "10", "100"));
    doc.suppliers.push(supplier(TEST_SUPPLIER_ID));
    doc
}

pub struct TestStore {
    pub store: FileStateStore,
    pub dir: TempDir,
}

impl TestStore {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStateStore::new(dir.path().join("state").join("erp-state.json"));
        Self { store, dir }
    }
}

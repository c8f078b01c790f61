mod common;

use std::fs;

use common::{dec, now, test_doc, TestStore, TEST_CLIENT_ID, TEST_USER_ID};
use erp_service::config::StockPolicy;
use erp_service::models::{CatalogItem, DocumentKind, InvoiceType, SCHEMA_VERSION};
use erp_service::services::invoicing::{add_line, create_draft, save_draft, validate_invoice};
use erp_service::services::{support, StateStore};
use serde_json::json;

#[test]
fn saved_document_loads_back_unchanged() {
    let test = TestStore::new();
    let mut doc = test_doc();
    let id = create_draft(&mut doc, Some(TEST_CLIENT_ID), TEST_USER_ID, InvoiceType::Mixed, now());
    let product = doc.product("p1").unwrap().clone();
    let mut draft = doc.invoice(&id).unwrap().clone();
    add_line(&mut draft, CatalogItem::Product(&product), now()).unwrap();
    save_draft(&mut doc, draft).unwrap();
    validate_invoice(&mut doc, &id, now(), StockPolicy::Permissive).unwrap();

    test.store.save(&doc).unwrap();
    let loaded = test.store.load();

    assert_eq!(loaded, doc);
    assert_eq!(loaded.product("p1").unwrap().stock_qty, dec("9"));
}

#[test]
fn unknown_collections_survive_a_save() {
    let test = TestStore::new();
    fs::create_dir_all(test.store.path().parent().unwrap()).unwrap();
    fs::write(
        test.store.path(),
        json!({
            "products": [],
            "users": [{"id": "u1", "name": "Admin", "role": "Admin"}],
            "hrEmployees": [{"id": "e1"}]
        })
        .to_string(),
    )
    .unwrap();

    let doc = test.store.load();
    test.store.save(&doc).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(test.store.path()).unwrap()).unwrap();
    assert_eq!(raw["users"][0]["name"], "Admin");
    assert_eq!(raw["hrEmployees"][0]["id"], "e1");
    assert_eq!(raw["schemaVersion"], SCHEMA_VERSION);
}

#[test]
fn legacy_document_continues_its_invoice_numbering() {
    let test = TestStore::new();
    fs::create_dir_all(test.store.path().parent().unwrap()).unwrap();
    fs::write(
        test.store.path(),
        json!({
            "products": [{
                "id": "p1", "name": "Câble", "price": 120, "cost": 80,
                "stockQty": 5, "minStock": 1, "tva": 20, "unit": "m"
            }],
            "clients": [{
                "id": "c1", "name": "Client de Passage", "type": "Particulier",
                "status": "Actif", "createdAt": "2025-01-01T00:00:00.000Z"
            }],
            "settings": {"companyName": "SAJITECH", "nextInvoiceIndex": 42, "currentYear": 2026}
        })
        .to_string(),
    )
    .unwrap();

    let mut doc = test.store.load();
    assert_eq!(
        doc.settings.peek(DocumentKind::Invoice, 2026),
        "SJ-2026-000042"
    );
    assert_eq!(doc.settings.issue(DocumentKind::Invoice, 2026), "SJ-2026-000042");
    test.store.save(&doc).unwrap();

    let raw = fs::read_to_string(test.store.path()).unwrap();
    assert!(!raw.contains("nextInvoiceIndex"));
    assert_eq!(
        test.store.load().settings.peek(DocumentKind::Invoice, 2026),
        "SJ-2026-000043"
    );
}

#[test]
fn failed_save_leaves_previous_document_in_place() {
    let test = TestStore::new();
    test.store.save(&test_doc()).unwrap();

    // A directory squatting on the temp file name makes the write fail.
    let mut tmp = test.store.path().as_os_str().to_owned();
    tmp.push(".tmp");
    fs::create_dir_all(&tmp).unwrap();

    let mut changed = test_doc();
    changed.products.clear();
    assert!(test.store.save(&changed).is_err());
    assert_eq!(test.store.load().products.len(), 1);
}

#[test]
fn checked_save_never_replaces_an_unreadable_document() {
    let test = TestStore::new();
    fs::create_dir_all(test.store.path().parent().unwrap()).unwrap();
    let original = json!({
        "users": [{"id": "u1", "name": "Admin", "role": "Admin"}],
        "clients": [{
            "id": "c1", "name": "Client de Passage", "type": "Particulier",
            "status": "Actif", "createdAt": "2025-01-01T00:00:00.000Z"
        }],
        "products": [{"id": "p1", "name": "Câble", "price": null}],
        "settings": {"nextInvoiceIndex": 57}
    })
    .to_string();
    fs::write(test.store.path(), &original).unwrap();

    let mut doc = test.store.load();
    assert!(doc.products.is_empty());
    support::run_pulse(&mut doc, now());

    let err = test.store.save_checked(&mut doc).unwrap_err();
    assert_eq!(err.kind(), "storage");
    assert_eq!(fs::read_to_string(test.store.path()).unwrap(), original);
}

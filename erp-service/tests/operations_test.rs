mod common;

use chrono::Duration;
use common::{dec, driver, now, product, test_doc, vehicle, TEST_CLIENT_ID, TEST_USER_ID};
use erp_service::config::{ScoringConfig, SlaHours, StockPolicy};
use erp_service::models::{
    CatalogItem, Client, ClientStatus, ClientType, FuelLog, InvoiceType, LinePatch, PaymentMode,
    NewTicket, Role, StateDocument, TicketPriority, TicketStatus,
};
use erp_service::services::fleet::{complete_mission, plan_mission, NewMission};
use erp_service::services::invoicing::{add_line, create_draft, save_draft, update_line, validate_invoice};
use erp_service::services::journal::notifications_for;
use erp_service::services::pos::{checkout, Cart};
use erp_service::services::scoring::{client_segments, Segment, DEFAULT_DRIVER_SCORE};
use erp_service::services::support::{open_ticket, run_pulse, set_ticket_status};
use erp_service::services::ServiceError;

fn invoice_client(doc: &mut StateDocument, unit_price: &str) {
    let id = create_draft(doc, Some(TEST_CLIENT_ID), TEST_USER_ID, InvoiceType::Product, now());
    let product = doc.product("p1").unwrap().clone();
    let mut draft = doc.invoice(&id).unwrap().clone();
    let line = add_line(&mut draft, CatalogItem::Product(&product), now()).unwrap();
    update_line(
        &mut draft,
        &line,
        LinePatch {
            unit_price: Some(dec(unit_price)),
            ..Default::default()
        },
    )
    .unwrap();
    save_draft(doc, draft).unwrap();
    validate_invoice(doc, &id, now(), StockPolicy::Permissive).unwrap();
}

#[test]
fn segments_rank_clients_by_score() {
    let mut doc = test_doc();
    doc.clients.push(Client {
        id: "c2".to_string(),
        name: "Garage Anfa".to_string(),
        kind: ClientType::Company,
        status: ClientStatus::Active,
        phone: String::new(),
        city: "Rabat".to_string(),
        ice: None,
        address: None,
        created_at: now() - Duration::days(200),
    });
    // 100000 HT -> 120000 TTC
    invoice_client(&mut doc, "100000");

    let scores = client_segments(&doc, now() + Duration::days(1), &ScoringConfig::default());

    assert_eq!(scores.len(), 2);
    assert_eq!(scores[0].client_id, TEST_CLIENT_ID);
    assert_eq!(scores[0].order_count, 1);
    assert_eq!(scores[0].revenue, dec("120000"));
    // 1200 + 10 + 50 recency bonus
    assert_eq!(scores[0].score, 1260.0);
    assert_eq!(scores[0].segment, Segment::Vip);
    assert_eq!(scores[1].segment, Segment::NeedsReactivation);
}

#[test]
fn completing_a_mission_scores_the_driver() {
    let mut doc = test_doc();
    doc.drivers.push(driver("d1"));
    doc.vehicles.push(vehicle("v1", "50000"));

    let number = plan_mission(
        &mut doc,
        NewMission {
            driver_id: "d1".to_string(),
            vehicle_id: "v1".to_string(),
            destination: "Marrakech".to_string(),
            start_km: dec("50000"),
        },
        now(),
    )
    .unwrap();
    assert_eq!(number, "MS-2026-000001");
    doc.fuel_logs.push(FuelLog {
        id: "f1".to_string(),
        date: "2026-03-10".to_string(),
        vehicle_id: "v1".to_string(),
        driver_id: "d1".to_string(),
        liters: dec("8"),
        total_amount: dec("100"),
        odometer: dec("50100"),
    });
    let mission_id = doc.missions[0].id.clone();

    // 100 km on 8 L: every component is full.
    assert_eq!(complete_mission(&mut doc, &mission_id, dec("50100")).unwrap(), 100);
    assert_eq!(doc.vehicles[0].current_km, dec("50100"));
    assert_eq!(doc.drivers[0].smart_score, Some(100));
    assert!(matches!(
        complete_mission(&mut doc, &mission_id, dec("50200")),
        Err(ServiceError::InvalidTransition { .. })
    ));
}

#[test]
fn pulse_alerts_managers_once_per_breached_ticket() {
    let mut doc = test_doc();
    doc.drivers.push(driver("idle"));
    let hours = SlaHours::default();
    let late = open_ticket(
        &mut doc,
        NewTicket {
            client_id: Some(TEST_CLIENT_ID.to_string()),
            subject: "Panne GPS".to_string(),
            description: "Le boîtier ne remonte plus".to_string(),
            category: Default::default(),
            priority: TicketPriority::Critical,
            related_vehicle_id: None,
            related_driver_id: None,
        },
        TEST_USER_ID,
        &hours,
        now(),
    )
    .unwrap();
    let resolved = open_ticket(
        &mut doc,
        NewTicket {
            client_id: None,
            subject: "Facture en double".to_string(),
            description: String::new(),
            category: Default::default(),
            priority: TicketPriority::Critical,
            related_vehicle_id: None,
            related_driver_id: None,
        },
        TEST_USER_ID,
        &hours,
        now(),
    )
    .unwrap();
    set_ticket_status(&mut doc, &resolved, TicketStatus::Resolved, now() + Duration::minutes(45)).unwrap();

    let later = now() + Duration::hours(3);
    assert_eq!(run_pulse(&mut doc, later), 1);
    assert_eq!(run_pulse(&mut doc, later), 0);

    let visible = notifications_for(&doc, "someone", Role::Manager);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].related_entity_id.as_deref(), Some(late.as_str()));
    assert!(notifications_for(&doc, "someone", Role::Seller).is_empty());
    assert_eq!(doc.drivers[0].smart_score, Some(DEFAULT_DRIVER_SCORE));
    assert_eq!(
        doc.tickets.iter().find(|t| t.id == resolved).unwrap().resolution_time,
        Some(45)
    );
}

#[test]
fn counter_sale_respects_seller_discount_ceiling() {
    let mut doc = test_doc();
    doc.products.push(product("p2", "60", "4", "30"));
    let mut cart = Cart::new();
    cart.add_product(doc.product("p1").unwrap()).unwrap();
    cart.add_product(doc.product("p2").unwrap()).unwrap();
    cart.set_quantity("p2", dec("2")).unwrap();
    // Gross 200 HT: a seller may grant 20.
    cart.set_global_discount(dec("25")).unwrap();

    let err = checkout(&mut doc, cart.clone(), PaymentMode::Cash, TEST_USER_ID, Role::Seller, now())
        .unwrap_err();
    assert!(matches!(err, ServiceError::DiscountLimitExceeded { .. }));
    assert!(doc.sales.is_empty());

    cart.set_global_discount(dec("20")).unwrap();
    let sale = checkout(&mut doc, cart, PaymentMode::Card, TEST_USER_ID, Role::Seller, now()).unwrap();

    assert_eq!(sale.total_excl_tax, dec("180"));
    assert_eq!(sale.total_tax, dec("36"));
    assert_eq!(sale.total_incl_tax, dec("216"));
    assert!(sale.id.starts_with("TCK-"));
    assert_eq!(doc.product("p1").unwrap().stock_qty, dec("9"));
    assert_eq!(doc.product("p2").unwrap().stock_qty, dec("2"));
    assert_eq!(doc.sales.len(), 1);
}

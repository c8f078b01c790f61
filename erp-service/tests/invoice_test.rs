mod common;

use common::{dec, now, test_doc, TEST_CLIENT_ID, TEST_USER_ID};
use erp_service::config::StockPolicy;
use erp_service::models::{
    CatalogItem, InvoiceStatus, InvoiceType, LinePatch, MovementKind, StateDocument,
};
use erp_service::services::invoicing::{
    add_line, cancel_invoice, create_draft, delete_draft, recompute_invoice_totals, save_draft,
    update_line, validate_invoice,
};
use erp_service::services::ServiceError;

/// Draft for the walk-in client with one line of `qty` units of p1.
fn draft_with_line(doc: &mut StateDocument, qty: &str) -> (String, String) {
    let id = create_draft(doc, Some(TEST_CLIENT_ID), TEST_USER_ID, InvoiceType::Mixed, now());
    let product = doc.product("p1").unwrap().clone();
    let mut draft = doc.invoice(&id).unwrap().clone();
    let line_id = add_line(&mut draft, CatalogItem::Product(&product), now()).unwrap();
    update_line(
        &mut draft,
        &line_id,
        LinePatch {
            quantity: Some(dec(qty)),
            ..Default::default()
        },
    )
    .unwrap();
    save_draft(doc, draft).unwrap();
    (id, line_id)
}

#[test]
fn validation_issues_number_and_decrements_stock_exactly() {
    let mut doc = test_doc();
    let (id, _) = draft_with_line(&mut doc, "3");

    let number = validate_invoice(&mut doc, &id, now(), StockPolicy::Permissive).unwrap();

    assert_eq!(number, "SJ-2026-000001");
    assert_eq!(doc.product("p1").unwrap().stock_qty, dec("7"));
    let invoice = doc.invoice(&id).unwrap();
    assert_eq!(invoice.number(), Some("SJ-2026-000001"));
    // 3 x 100 HT at 20%
    assert_eq!(invoice.totals.total_excl_tax, dec("300"));
    assert_eq!(invoice.totals.total_tax, dec("60"));
    assert_eq!(invoice.totals.total_incl_tax, dec("360"));

    assert_eq!(doc.stock_movements.len(), 1);
    assert_eq!(doc.stock_movements[0].kind, MovementKind::Sale);
    assert_eq!(doc.stock_movements[0].quantity, dec("3"));
    assert_eq!(doc.client_actions.len(), 1);
}

#[test]
fn second_validation_is_rejected_without_touching_stock() {
    let mut doc = test_doc();
    let (id, _) = draft_with_line(&mut doc, "2");
    validate_invoice(&mut doc, &id, now(), StockPolicy::Permissive).unwrap();
    let before = doc.clone();

    let err = validate_invoice(&mut doc, &id, now(), StockPolicy::Permissive).unwrap_err();

    assert_eq!(err, ServiceError::AlreadyValidated(id));
    assert_eq!(doc, before);
}

#[test]
fn consecutive_invoices_get_consecutive_numbers() {
    let mut doc = test_doc();
    let (first, _) = draft_with_line(&mut doc, "1");
    let (second, _) = draft_with_line(&mut doc, "1");

    assert_eq!(
        validate_invoice(&mut doc, &first, now(), StockPolicy::Permissive).unwrap(),
        "SJ-2026-000001"
    );
    assert_eq!(
        validate_invoice(&mut doc, &second, now(), StockPolicy::Permissive).unwrap(),
        "SJ-2026-000002"
    );
}

#[test]
fn empty_or_clientless_drafts_cannot_be_validated() {
    let mut doc = test_doc();
    let empty = create_draft(&mut doc, Some(TEST_CLIENT_ID), TEST_USER_ID, InvoiceType::Mixed, now());
    assert_eq!(
        validate_invoice(&mut doc, &empty, now(), StockPolicy::Permissive),
        Err(ServiceError::EmptyDocument)
    );

    let (id, _) = draft_with_line(&mut doc, "1");
    doc.invoice_mut(&id).unwrap().client_id = None;
    assert_eq!(
        validate_invoice(&mut doc, &id, now(), StockPolicy::Permissive),
        Err(ServiceError::MissingParty("client"))
    );
    assert_eq!(doc.product("p1").unwrap().stock_qty, dec("10"));
    assert!(doc.invoices.iter().all(|i| i.is_draft()));
}

#[test]
fn permissive_policy_lets_stock_go_negative() {
    let mut doc = test_doc();
    let (id, _) = draft_with_line(&mut doc, "12");

    validate_invoice(&mut doc, &id, now(), StockPolicy::Permissive).unwrap();

    assert_eq!(doc.product("p1").unwrap().stock_qty, dec("-2"));
}

#[test]
fn strict_policy_rejects_oversold_invoice_before_numbering() {
    let mut doc = test_doc();
    let (id, _) = draft_with_line(&mut doc, "12");
    let before = doc.clone();

    let err = validate_invoice(&mut doc, &id, now(), StockPolicy::Strict).unwrap_err();

    assert!(matches!(err, ServiceError::InsufficientStock { .. }));
    assert_eq!(doc, before);
}

#[test]
fn discount_above_gross_clamps_line_to_zero() {
    let mut doc = test_doc();
    let (id, line_id) = draft_with_line(&mut doc, "2");
    let mut draft = doc.invoice(&id).unwrap().clone();

    update_line(
        &mut draft,
        &line_id,
        LinePatch {
            unit_price: Some(dec("50")),
            discount: Some(dec("150")),
            tax_rate: Some(dec("20")),
            ..Default::default()
        },
    )
    .unwrap();

    let line = &draft.lines[0];
    assert_eq!(line.totals.total_excl_tax, dec("0"));
    assert_eq!(line.totals.total_tax, dec("0"));
    assert_eq!(line.totals.total_incl_tax, dec("0"));
    assert_eq!(draft.totals.total_incl_tax, dec("0"));
}

#[test]
fn recomputing_totals_is_stable() {
    let mut doc = test_doc();
    let (id, line_id) = draft_with_line(&mut doc, "3");
    let mut draft = doc.invoice(&id).unwrap().clone();
    update_line(
        &mut draft,
        &line_id,
        LinePatch {
            unit_price: Some(dec("33.333")),
            discount: Some(dec("0.01")),
            ..Default::default()
        },
    )
    .unwrap();

    let once = recompute_invoice_totals(&draft.lines, draft.global_discount);
    let twice = recompute_invoice_totals(&draft.lines, draft.global_discount);

    assert_eq!(once, twice);
    assert_eq!(once, draft.totals);
}

#[test]
fn cancellation_requires_a_reason_and_keeps_stock() {
    let mut doc = test_doc();
    let (id, _) = draft_with_line(&mut doc, "4");
    validate_invoice(&mut doc, &id, now(), StockPolicy::Permissive).unwrap();

    assert_eq!(
        cancel_invoice(&mut doc, &id, "   ", TEST_USER_ID, now()),
        Err(ServiceError::MissingReason)
    );
    cancel_invoice(&mut doc, &id, "Erreur de saisie", TEST_USER_ID, now()).unwrap();

    match &doc.invoice(&id).unwrap().status {
        InvoiceStatus::Cancelled {
            number,
            cancellation_reason,
            ..
        } => {
            assert_eq!(number, "SJ-2026-000001");
            assert_eq!(cancellation_reason, "Erreur de saisie");
        }
        other => panic!("unexpected status {other:?}"),
    }
    assert_eq!(doc.product("p1").unwrap().stock_qty, dec("6"));
    assert!(matches!(
        cancel_invoice(&mut doc, &id, "encore", TEST_USER_ID, now()),
        Err(ServiceError::InvalidTransition { .. })
    ));
}

#[test]
fn only_drafts_can_be_deleted() {
    let mut doc = test_doc();
    let (draft, _) = draft_with_line(&mut doc, "1");
    let (validated, _) = draft_with_line(&mut doc, "1");
    validate_invoice(&mut doc, &validated, now(), StockPolicy::Permissive).unwrap();

    delete_draft(&mut doc, &draft).unwrap();
    assert!(doc.invoice(&draft).is_none());
    assert_eq!(
        delete_draft(&mut doc, &validated),
        Err(ServiceError::NotDraft(validated.clone()))
    );
    assert_eq!(doc.invoices.len(), 1);
}

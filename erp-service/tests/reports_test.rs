mod common;

use common::{dec, now, test_doc, TEST_CLIENT_ID, TEST_SUPPLIER_ID, TEST_USER_ID};
use erp_service::config::{ReportsConfig, StockPolicy};
use erp_service::models::{
    CatalogItem, Category, Expense, InvoiceType, LinePatch, StateDocument,
};
use erp_service::services::invoicing::{add_line, create_draft, save_draft, validate_invoice};
use erp_service::services::purchasing::{
    add_purchase_line, create_purchase, update_purchase_line, validate_purchase,
};
use erp_service::services::reports::{summary, Insight};

fn invoice_one_unit(doc: &mut StateDocument, validate: bool) {
    let id = create_draft(doc, Some(TEST_CLIENT_ID), TEST_USER_ID, InvoiceType::Product, now());
    let product = doc.product("p1").unwrap().clone();
    let mut draft = doc.invoice(&id).unwrap().clone();
    add_line(&mut draft, CatalogItem::Product(&product), now()).unwrap();
    save_draft(doc, draft).unwrap();
    if validate {
        validate_invoice(doc, &id, now(), StockPolicy::Permissive).unwrap();
    }
}

fn receive(doc: &mut StateDocument, qty: &str, cost: &str) {
    let id = create_purchase(doc, TEST_SUPPLIER_ID, TEST_USER_ID, now()).unwrap();
    let line = add_purchase_line(doc, &id, "p1", now()).unwrap();
    update_purchase_line(
        doc,
        &id,
        &line,
        LinePatch {
            quantity: Some(dec(qty)),
            unit_price: Some(dec(cost)),
            ..Default::default()
        },
    )
    .unwrap();
    validate_purchase(doc, &id, TEST_USER_ID, now()).unwrap();
}

#[test]
fn summary_nets_revenue_against_purchases_and_expenses() {
    let mut doc = test_doc();
    doc.categories.push(Category {
        id: "cat1".to_string(),
        name: "Câblage".to_string(),
        description: None,
        created_at: Some(now()),
    });
    invoice_one_unit(&mut doc, true);
    invoice_one_unit(&mut doc, false);
    receive(&mut doc, "5", "130");
    doc.expenses.push(Expense {
        id: "EXP-1".to_string(),
        category: "Transport".to_string(),
        amount: dec("200"),
        label: "Livraison".to_string(),
        date: Some(now().date_naive()),
        payment_method: "Espèces".to_string(),
    });

    let report = summary(&doc, &ReportsConfig::default());

    // The draft invoice is not revenue.
    assert_eq!(report.revenue, dec("120"));
    // 5 x 130 HT at 20%
    assert_eq!(report.purchases, dec("780"));
    assert_eq!(report.expenses, dec("200"));
    assert_eq!(report.net_result, dec("-860"));
    assert!(report.insights.contains(&Insight::Unprofitable));

    // 9 left after the sale, plus 5 received: 14 at (9 x 100 + 650) / 14
    assert_eq!(report.stock_value, dec("1550"));
    assert_eq!(report.stock_by_category.len(), 1);
    assert_eq!(report.stock_by_category[0].name, "Câblage");
    assert_eq!(report.stock_by_category[0].value, dec("1550"));
}

#[test]
fn revenue_target_is_configurable() {
    let mut doc = test_doc();
    invoice_one_unit(&mut doc, true);
    let cfg = ReportsConfig {
        revenue_target: dec("100"),
        ..ReportsConfig::default()
    };

    let report = summary(&doc, &cfg);

    assert_eq!(report.insights, vec![Insight::RevenueTargetReached]);
}

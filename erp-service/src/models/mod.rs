//! Domain models for erp-service.

mod catalog;
mod document;
mod expense;
mod fleet;
mod invoice;
mod notification;
mod party;
mod purchase;
mod role;
mod sale;
mod settings;
mod stock;
mod support;

pub use catalog::{CatalogItem, Category, Product, ServiceItem};
pub use document::{StateDocument, SCHEMA_VERSION};
pub use expense::Expense;
pub use fleet::{Driver, FuelLog, Mission, MissionStatus, Vehicle, VehicleStatus};
pub use invoice::{
    DocumentTotals, Invoice, InvoiceLine, InvoiceStatus, InvoiceType, ItemType, LinePatch,
    LineTotals,
};
pub use notification::{NewNotification, Notification, NotificationKind, NotificationPriority};
pub use party::{
    AuditLog, Client, ClientAction, ClientStatus, ClientType, Supplier, WALK_IN_CLIENT_ID,
};
pub use purchase::{PriceHistoryEntry, Purchase, PurchaseLine, PurchaseStatus};
pub use role::Role;
pub use sale::{PaymentMode, Sale, SaleItem};
pub use settings::{DocumentKind, SequenceCounter, Settings};
pub use stock::{MovementKind, StockMovement};
pub use support::{NewTicket, Ticket, TicketCategory, TicketPriority, TicketStatus};

//! Small-business bookkeeping on top of a kvdoc document store.
//!
//! Orders, expenses, taxes and customers are stored per user in the
//! `orders`, `expenses`, `taxes` and `customers` collections. [`BusinessData`]
//! scopes every read and write to one user and derives headline metrics,
//! marketplace rankings and monthly profit trends from the stored records.

#[allow(unused_extern_crates)]
extern crate self as kvdoc_business;

pub mod analytics;
pub mod records;
pub mod service;

pub use analytics::{BusinessMetrics, MarketplacePerformance, ProfitPoint};
pub use records::{
    Customer, Expense, ExpenseCategory, Order, OrderItem, OrderStatus, PaymentMethod, TaxKind,
    TaxRecord,
};
pub use service::BusinessData;

//! Stored business records.
//!
//! Every record carries the owning `userId`; the id is assigned by the store
//! on creation and filled back in when a record is read.

use serde::{Deserialize, Serialize};

use kvdoc_core::document::Record;

pub const ORDERS: &str = "orders";
pub const EXPENSES: &str = "expenses";
pub const TAXES: &str = "taxes";
pub const CUSTOMERS: &str = "customers";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Cash,
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Advertising,
    Logistics,
    Office,
    Inventory,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxKind {
    Esv,
    SingleTax,
    Other,
}

/// A sale on one marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    /// `YYYY-MM-DD`; orders sort and group by it.
    pub date: String,
    pub amount: f64,
    pub marketplace: String,
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub commission: f64,
    pub net_amount: f64,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Order {
    pub fn is_completed(&self) -> bool {
        self.status == OrderStatus::Completed
    }
}

impl Record for Order {
    fn collection_name() -> &'static str {
        ORDERS
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub quantity: u32,
    pub unit_price: f64,
    pub total_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub date: String,
    pub category: ExpenseCategory,
    pub description: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,
    pub is_tax_deductible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
}

impl Record for Expense {
    fn collection_name() -> &'static str {
        EXPENSES
    }
}

/// A tax obligation for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: TaxKind,
    /// `YYYY-MM`.
    pub period: String,
    pub amount: f64,
    pub due_date: String,
    pub is_paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Record for TaxRecord {
    fn collection_name() -> &'static str {
        TAXES
    }
}

/// A buyer together with running purchase statistics.
///
/// `total_spent`, `orders_count` and the order dates are maintained by the
/// business layer; values passed in when adding a customer are replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub total_spent: f64,
    #[serde(default)]
    pub orders_count: u64,
    #[serde(default)]
    pub last_order_date: String,
    #[serde(default)]
    pub first_order_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Customer {
    /// A new customer with no purchases yet.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            user_id: String::new(),
            name: name.into(),
            email: email.into(),
            phone: None,
            total_spent: 0.0,
            orders_count: 0,
            last_order_date: String::new(),
            first_order_date: String::new(),
            notes: None,
        }
    }
}

impl Record for Customer {
    fn collection_name() -> &'static str {
        CUSTOMERS
    }
}

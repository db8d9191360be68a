//! Aggregates computed from a user's orders, expenses and taxes.
//!
//! These are plain functions over already-loaded records; the service in
//! [`crate::service`] loads the records and calls them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::records::{Expense, Order, TaxRecord};

/// Headline figures for one user.
///
/// The `Default` value is all zeros and is what callers get when the
/// underlying records cannot be loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessMetrics {
    /// Net amount of completed orders.
    pub revenue: f64,
    pub expenses: f64,
    /// Revenue minus expenses minus unpaid taxes.
    pub profit: f64,
    /// Number of completed orders.
    pub orders_count: usize,
    pub average_order_value: f64,
    pub customer_count: usize,
    /// Sum of unpaid taxes.
    pub tax_obligations: f64,
    /// Revenue minus expenses.
    pub cash_flow: f64,
}

/// Totals for one marketplace over completed orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplacePerformance {
    pub name: String,
    pub revenue: f64,
    pub orders: usize,
    pub average_order: f64,
    pub commission: f64,
    pub net_revenue: f64,
    pub last_order_date: String,
}

/// Profit for one `YYYY-MM` month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitPoint {
    pub date: String,
    pub profit: f64,
}

pub fn business_metrics(
    orders: &[Order],
    expenses: &[Expense],
    taxes: &[TaxRecord],
    customer_count: usize,
) -> BusinessMetrics {
    let completed = orders.iter().filter(|o| o.is_completed());
    let (revenue, orders_count) =
        completed.fold((0.0_f64, 0_usize), |(sum, count), o| (sum + o.net_amount, count + 1));

    let total_expenses: f64 = expenses.iter().map(|e| e.amount).sum();
    let tax_obligations: f64 = taxes.iter().filter(|t| !t.is_paid).map(|t| t.amount).sum();

    BusinessMetrics {
        revenue,
        expenses: total_expenses,
        profit: revenue - total_expenses - tax_obligations,
        orders_count,
        average_order_value: if orders_count > 0 {
            revenue / orders_count as f64
        } else {
            0.0
        },
        customer_count,
        tax_obligations,
        cash_flow: revenue - total_expenses,
    }
}

/// Groups completed orders by marketplace, highest revenue first.
///
/// `net_revenue` is the net amount less commission, and `last_order_date` is
/// the latest order date seen for the marketplace.
pub fn marketplace_performance(orders: &[Order]) -> Vec<MarketplacePerformance> {
    let mut by_name: BTreeMap<&str, MarketplacePerformance> = BTreeMap::new();

    for order in orders.iter().filter(|o| o.is_completed()) {
        let entry = by_name
            .entry(order.marketplace.as_str())
            .or_insert_with(|| MarketplacePerformance {
                name: order.marketplace.clone(),
                revenue: 0.0,
                orders: 0,
                average_order: 0.0,
                commission: 0.0,
                net_revenue: 0.0,
                last_order_date: String::new(),
            });

        entry.revenue += order.net_amount;
        entry.orders += 1;
        entry.commission += order.commission;
        entry.net_revenue += order.net_amount - order.commission;
        if order.date > entry.last_order_date {
            entry.last_order_date = order.date.clone();
        }
    }

    let mut performance: Vec<_> = by_name
        .into_values()
        .map(|mut p| {
            p.average_order = p.revenue / p.orders as f64;
            p
        })
        .collect();
    performance.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));

    performance
}

/// Monthly revenue of completed orders minus expenses, oldest month first.
pub fn profit_trends(orders: &[Order], expenses: &[Expense]) -> Vec<ProfitPoint> {
    let mut months: BTreeMap<&str, f64> = BTreeMap::new();

    for order in orders.iter().filter(|o| o.is_completed()) {
        *months.entry(month_of(&order.date)).or_default() += order.net_amount;
    }
    for expense in expenses {
        *months.entry(month_of(&expense.date)).or_default() -= expense.amount;
    }

    months
        .into_iter()
        .map(|(month, profit)| ProfitPoint {
            date: month.to_string(),
            profit,
        })
        .collect()
}

fn month_of(date: &str) -> &str {
    date.get(..7).unwrap_or(date)
}

//! Per-user business data over a [`DocumentStore`].

use chrono::{SecondsFormat, Utc};
use tracing::{debug, error, trace, warn};

use kvdoc_core::{
    document,
    document::{Document, Record},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Filter, Query},
    store::DocumentStore,
    substrate::KeyValueStore,
};

use crate::{
    analytics::{self, BusinessMetrics, MarketplacePerformance, ProfitPoint},
    records::{CUSTOMERS, Customer, Expense, Order, TaxRecord},
};

const USER_ID_FIELD: &str = "userId";

/// Orders, expenses, taxes and customers belonging to one user.
///
/// Every listing is scoped to the user and sorted newest first. Records added
/// through this type are stamped with the user's id.
///
/// # Example
///
/// ```ignore
/// let business = BusinessData::new(&store, "user-1")?;
/// let order = business.add_order(order).await?;
/// let metrics = business.business_metrics().await;
/// ```
#[derive(Debug)]
pub struct BusinessData<'a, S: KeyValueStore> {
    store: &'a DocumentStore<S>,
    user_id: String,
}

impl<'a, S: KeyValueStore> BusinessData<'a, S> {
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidArgument`] for an empty user id.
    pub fn new(store: &'a DocumentStore<S>, user_id: impl Into<String>) -> DocumentStoreResult<Self> {
        let user_id = user_id.into();
        if user_id.is_empty() {
            return Err(DocumentStoreError::InvalidArgument(
                "user id must not be empty".to_string(),
            ));
        }

        Ok(Self { store, user_id })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Stores an order and bumps the statistics of the customer with the
    /// order's email, if there is one.
    ///
    /// A failure to update the customer is logged and does not fail the order.
    pub async fn add_order(&self, mut order: Order) -> DocumentStoreResult<Order> {
        order.user_id = self.user_id.clone();
        order.id = self.create(&order).await?;

        if let Some(email) = order.customer_email.as_deref().filter(|e| !e.is_empty()) {
            if let Err(err) = self.record_purchase(email, order.amount).await {
                error!(user_id = %self.user_id, email, error = %err, "failed to update customer statistics");
            }
        }

        Ok(order)
    }

    /// Looks up one of the user's orders.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DocumentNotFound`] when the order does not
    /// exist or belongs to another user.
    pub async fn order(&self, id: &str) -> DocumentStoreResult<Order> {
        match self.store.typed_collection::<Order>().get(id).await? {
            Some(order) if order.user_id == self.user_id => Ok(order),
            _ => Err(DocumentStoreError::DocumentNotFound(
                id.to_string(),
                Order::collection_name().to_string(),
            )),
        }
    }

    /// Merges `patch` into an order. The owner cannot be changed.
    ///
    /// Returns `false` when the order does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidDocument`] without writing when
    /// the patched order would not be a valid [`Order`], e.g. an unknown
    /// status.
    pub async fn update_order(&self, id: &str, mut patch: Document) -> DocumentStoreResult<bool> {
        patch.remove(USER_ID_FIELD);

        self.store
            .typed_collection::<Order>()
            .update(id, patch)
            .await
    }

    pub async fn orders(&self) -> DocumentStoreResult<Vec<Order>> {
        self.list("date").await
    }

    pub async fn add_expense(&self, mut expense: Expense) -> DocumentStoreResult<Expense> {
        expense.user_id = self.user_id.clone();
        expense.id = self.create(&expense).await?;

        Ok(expense)
    }

    pub async fn expenses(&self) -> DocumentStoreResult<Vec<Expense>> {
        self.list("date").await
    }

    pub async fn add_tax(&self, mut tax: TaxRecord) -> DocumentStoreResult<TaxRecord> {
        tax.user_id = self.user_id.clone();
        tax.id = self.create(&tax).await?;

        Ok(tax)
    }

    /// Taxes, latest due date first.
    pub async fn taxes(&self) -> DocumentStoreResult<Vec<TaxRecord>> {
        self.list("dueDate").await
    }

    /// Stores a customer with zeroed statistics and both order dates set to now.
    pub async fn add_customer(&self, mut customer: Customer) -> DocumentStoreResult<Customer> {
        let now = timestamp();
        customer.user_id = self.user_id.clone();
        customer.total_spent = 0.0;
        customer.orders_count = 0;
        customer.first_order_date = now.clone();
        customer.last_order_date = now;
        customer.id = self.create(&customer).await?;

        Ok(customer)
    }

    /// Customers, most recent buyer first.
    pub async fn customers(&self) -> DocumentStoreResult<Vec<Customer>> {
        self.list("lastOrderDate").await
    }

    pub async fn customer_by_email(&self, email: &str) -> DocumentStoreResult<Option<Customer>> {
        let query = Query::builder()
            .filter(Filter::eq(USER_ID_FIELD, self.user_id.as_str()))
            .filter(Filter::eq("email", email))
            .limit(1)
            .build();

        Ok(self
            .store
            .typed_collection::<Customer>()
            .query(query)
            .await?
            .into_iter()
            .next())
    }

    /// Adds a purchase of `amount` to the customer with `email`.
    ///
    /// The statistics are read and written under the document's lock, so
    /// concurrent orders for one customer are all counted. Returns `false`
    /// when the user has no such customer.
    pub async fn record_purchase(&self, email: &str, amount: f64) -> DocumentStoreResult<bool> {
        let Some(customer) = self.customer_by_email(email).await? else {
            warn!(user_id = %self.user_id, email, "no customer for order email");
            return Ok(false);
        };
        let now = timestamp();

        let updated = self
            .store
            .update_with(CUSTOMERS, &customer.id, move |current| {
                let spent = current.get_f64("totalSpent").unwrap_or(0.0);
                let count = current.get_f64("ordersCount").unwrap_or(0.0);

                document! {
                    "totalSpent" => spent + amount,
                    "ordersCount" => count + 1.0,
                    "lastOrderDate" => now,
                }
            })
            .await?;
        debug!(user_id = %self.user_id, customer = %customer.id, "customer statistics updated");

        Ok(updated.is_some())
    }

    /// Headline figures for the user, or all zeros if any record set cannot
    /// be loaded. The failure is logged.
    pub async fn business_metrics(&self) -> BusinessMetrics {
        match self.try_business_metrics().await {
            Ok(metrics) => metrics,
            Err(err) => {
                error!(user_id = %self.user_id, error = %err, "failed to compute business metrics, using defaults");
                BusinessMetrics::default()
            }
        }
    }

    /// Like [`Self::business_metrics`] but reports load failures.
    pub async fn try_business_metrics(&self) -> DocumentStoreResult<BusinessMetrics> {
        let (orders, expenses, taxes, customers) = futures::try_join!(
            self.orders(),
            self.expenses(),
            self.taxes(),
            self.customers()
        )?;

        Ok(analytics::business_metrics(
            &orders,
            &expenses,
            &taxes,
            customers.len(),
        ))
    }

    pub async fn marketplace_performance(&self) -> DocumentStoreResult<Vec<MarketplacePerformance>> {
        Ok(analytics::marketplace_performance(&self.orders().await?))
    }

    pub async fn profit_trends(&self) -> DocumentStoreResult<Vec<ProfitPoint>> {
        let (orders, expenses) = futures::try_join!(self.orders(), self.expenses())?;

        Ok(analytics::profit_trends(&orders, &expenses))
    }

    async fn create<R: Record>(&self, record: &R) -> DocumentStoreResult<String> {
        let id = self.store.typed_collection::<R>().create(record, None).await?;
        trace!(user_id = %self.user_id, collection = R::collection_name(), id = %id, "record added");

        Ok(id)
    }

    async fn list<R: Record>(&self, order_by: &str) -> DocumentStoreResult<Vec<R>> {
        let query = Query::builder()
            .filter(Filter::eq(USER_ID_FIELD, self.user_id.as_str()))
            .order_by(order_by)
            .build();

        self.store.typed_collection::<R>().query(query).await
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

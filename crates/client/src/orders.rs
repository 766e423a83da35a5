//! Order submission and the local recent-orders cache.

use std::sync::Arc;

use hotmeal_core::{OrderId, OrderState};

use crate::api;
use crate::api::types::{Order, OrderUpdate};
use crate::draft::{DraftOrder, DraftOrderModel};
use crate::error::{ClientError, Result};
use crate::notice::Notice;
use crate::request::RequestClient;
use crate::storage::{StorageError, StorageGateway, keys, restore_or_default, save_json};

/// Most orders kept in the local cache.
pub const RECENT_ORDERS_LIMIT: usize = 50;

/// Message for a submission with nothing to order.
pub const EMPTY_ORDER_MESSAGE: &str = "Your order is empty";

/// Warning for a submitted order whose persisted draft outlived it.
pub const DRAFT_NOT_CLEARED_MESSAGE: &str =
    "Order placed, but the saved draft could not be removed. Discard it before ordering again";

/// Read-only copies of recently seen orders, newest first.
pub struct RecentOrders {
    orders: Vec<Order>,
    storage: Arc<dyn StorageGateway>,
}

impl std::fmt::Debug for RecentOrders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecentOrders")
            .field("orders", &self.orders.len())
            .finish_non_exhaustive()
    }
}

impl RecentOrders {
    /// Load the persisted cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage gateway fails.
    pub fn restore(storage: Arc<dyn StorageGateway>) -> std::result::Result<Self, StorageError> {
        let mut orders: Vec<Order> = restore_or_default(storage.as_ref(), keys::RECENT_ORDERS)?;
        orders.truncate(RECENT_ORDERS_LIMIT);
        Ok(Self { orders, storage })
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.order_id == id)
    }

    /// Put `order` at the front, replacing any older copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be persisted.
    pub fn prepend(&mut self, order: Order) -> std::result::Result<(), StorageError> {
        self.orders.retain(|o| o.order_id != order.order_id);
        self.orders.insert(0, order);
        self.orders.truncate(RECENT_ORDERS_LIMIT);
        self.persist()
    }

    /// Replace the whole cache with a fresh listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be persisted.
    pub fn replace_all(&mut self, mut orders: Vec<Order>) -> std::result::Result<(), StorageError> {
        orders.truncate(RECENT_ORDERS_LIMIT);
        self.orders = orders;
        self.persist()
    }

    /// Overwrite the cached copy of `order`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be persisted.
    pub fn update_if_present(&mut self, order: &Order) -> std::result::Result<bool, StorageError> {
        let Some(cached) = self.orders.iter_mut().find(|o| o.order_id == order.order_id) else {
            return Ok(false);
        };
        cached.clone_from(order);
        self.persist()?;
        Ok(true)
    }

    /// Set the state of a cached order, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be persisted.
    pub fn mark_state(
        &mut self,
        id: OrderId,
        state: OrderState,
    ) -> std::result::Result<bool, StorageError> {
        let Some(cached) = self.orders.iter_mut().find(|o| o.order_id == id) else {
            return Ok(false);
        };
        cached.state = state;
        self.persist()?;
        Ok(true)
    }

    /// Drop every cached order.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be removed.
    pub fn clear(&mut self) -> std::result::Result<(), StorageError> {
        self.orders.clear();
        self.storage.remove(keys::RECENT_ORDERS)
    }

    fn persist(&self) -> std::result::Result<(), StorageError> {
        save_json(self.storage.as_ref(), keys::RECENT_ORDERS, &self.orders)
    }
}

/// Turns the draft into a backend order and keeps local state in step.
#[derive(Debug)]
pub struct OrderSubmission {
    client: RequestClient,
    recent: RecentOrders,
}

impl OrderSubmission {
    #[must_use]
    pub const fn new(client: RequestClient, recent: RecentOrders) -> Self {
        Self { client, recent }
    }

    #[must_use]
    pub const fn recent(&self) -> &RecentOrders {
        &self.recent
    }

    /// Submit the current draft.
    ///
    /// On success the draft is cleared and the created order is put at the
    /// front of the recent-orders cache. On any error the draft is left
    /// exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` without a network call if the draft
    /// has no line with a positive quantity; otherwise any request error.
    pub async fn submit(&mut self, drafts: &mut DraftOrderModel) -> Result<Order> {
        if drafts.is_empty() {
            tracing::debug!("Refusing to submit empty draft");
            self.client
                .notifier()
                .notify(Notice::warning(EMPTY_ORDER_MESSAGE));
            return Err(ClientError::Validation(EMPTY_ORDER_MESSAGE.to_string()));
        }

        let draft = drafts.draft();
        let body = DraftOrder {
            dish_list: draft
                .dish_list
                .iter()
                .filter(|l| l.quantity > 0)
                .copied()
                .collect(),
            area_id: draft.area_id,
        };

        let order = api::orders::create(&self.client, &body).await?;
        tracing::info!(order_id = %order.order_id, price = %order.price, "Order submitted");

        // The order exists on the backend; bookkeeping failures are only logged.
        if let Err(e) = drafts.clear_draft() {
            tracing::warn!(error = %e, "Failed to clear draft after submission");
            self.client
                .notifier()
                .notify(Notice::warning(DRAFT_NOT_CLEARED_MESSAGE));
        }
        if let Err(e) = self.recent.prepend(order.clone()) {
            tracing::warn!(error = %e, "Failed to cache submitted order");
        }
        Ok(order)
    }

    /// Fetch the account's orders and refresh the cache with them.
    ///
    /// # Errors
    ///
    /// Returns any request error.
    pub async fn list_mine(&mut self, include_items: bool) -> Result<Vec<Order>> {
        let orders = api::orders::mine(&self.client, include_items).await?;
        if let Err(e) = self.recent.replace_all(orders.clone()) {
            tracing::warn!(error = %e, "Failed to cache order list");
        }
        Ok(orders)
    }

    /// Fetch one order and refresh its cached copy.
    ///
    /// # Errors
    ///
    /// Returns any request error.
    pub async fn detail(&mut self, id: OrderId) -> Result<Order> {
        let order = api::orders::get(&self.client, id).await?;
        self.refresh(&order);
        Ok(order)
    }

    /// Cancel an order and mark its cached copy canceled.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` without a network call if the
    /// cached copy is already past `PENDING`; otherwise any request error.
    pub async fn cancel(&mut self, id: OrderId) -> Result<()> {
        let cached_state = self.recent.get(id).map(|o| o.state);
        if let Some(state) = cached_state.filter(|s| !s.is_cancelable()) {
            let message = format!("Order #{id} is {state} and can no longer be canceled");
            self.client
                .notifier()
                .notify(Notice::warning(message.clone()));
            return Err(ClientError::Validation(message));
        }
        api::orders::cancel(&self.client, id).await?;
        tracing::info!(order_id = %id, "Order canceled");
        if let Err(e) = self.recent.mark_state(id, OrderState::Canceled) {
            tracing::warn!(error = %e, "Failed to update cached order");
        }
        Ok(())
    }

    /// Update an order's state or payment details.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` without a network call if `update`
    /// changes nothing; otherwise any request error.
    pub async fn update(&mut self, id: OrderId, update: &OrderUpdate) -> Result<Order> {
        if update.is_empty() {
            let message = "Nothing to update";
            self.client.notifier().notify(Notice::warning(message));
            return Err(ClientError::Validation(message.to_string()));
        }
        let order = api::orders::update(&self.client, id, update).await?;
        self.refresh(&order);
        Ok(order)
    }

    fn refresh(&mut self, order: &Order) {
        if let Err(e) = self.recent.update_if_present(order) {
            tracing::warn!(error = %e, "Failed to update cached order");
        }
    }
}

#[cfg(test)]
mod tests {
    use hotmeal_core::{AreaId, DishId, PaymentMethod, Price};
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use url::Url;

    use super::*;
    use crate::draft::DraftLine;
    use crate::session::SessionStore;
    use crate::storage::MemoryStorage;
    use crate::testing::{RecordingNavigator, RecordingNotifier, ScriptedTransport};

    struct Harness {
        submission: OrderSubmission,
        drafts: DraftOrderModel,
        transport: Arc<ScriptedTransport>,
        notifier: Arc<RecordingNotifier>,
        storage: Arc<MemoryStorage>,
    }

    /// Storage that refuses to delete the draft snapshot.
    struct StickyDraft(Arc<MemoryStorage>);

    impl StorageGateway for StickyDraft {
        fn load(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
            self.0.load(key)
        }

        fn save(&self, key: &str, blob: &str) -> std::result::Result<(), StorageError> {
            self.0.save(key, blob)
        }

        fn remove(&self, key: &str) -> std::result::Result<(), StorageError> {
            if key == keys::DRAFT_ORDER {
                return Err(StorageError::InvalidKey(key.to_string()));
            }
            self.0.remove(key)
        }
    }

    fn harness() -> Harness {
        build(false)
    }

    fn build(sticky_draft: bool) -> Harness {
        let storage = Arc::new(MemoryStorage::new());
        let gateway: Arc<dyn StorageGateway> = if sticky_draft {
            Arc::new(StickyDraft(storage.clone()))
        } else {
            storage.clone()
        };
        let session = Arc::new(SessionStore::new(gateway.clone()));
        session
            .login("alice", SecretString::from("tok"))
            .expect("login");
        let transport = Arc::new(ScriptedTransport::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let client = RequestClient::new(
            Url::parse("http://backend.test").expect("url"),
            transport.clone(),
            session,
            notifier.clone(),
            Arc::new(RecordingNavigator::new()),
            "/pages/auth/login",
        );
        let recent = RecentOrders::restore(gateway.clone()).expect("restore");
        let drafts = DraftOrderModel::restore(gateway).expect("restore");
        Harness {
            submission: OrderSubmission::new(client, recent),
            drafts,
            transport,
            notifier,
            storage,
        }
    }

    fn order_json(id: i32, state: &str) -> Value {
        json!({
            "order_id": id,
            "user_id": 1,
            "area_id": 4,
            "state": state,
            "price": "47.98",
            "order_items": []
        })
    }

    fn order(id: i32) -> Order {
        serde_json::from_value(order_json(id, "PENDING")).expect("order")
    }

    fn line(id: i32, quantity: u32) -> DraftLine {
        DraftLine {
            dish_id: DishId::new(id),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_empty_draft_is_rejected_without_network() {
        let mut h = harness();

        let err = h
            .submission
            .submit(&mut h.drafts)
            .await
            .expect_err("empty");

        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(h.transport.request_count(), 0);
        assert_eq!(h.notifier.messages(), vec![EMPTY_ORDER_MESSAGE.to_string()]);
    }

    #[tokio::test]
    async fn test_zero_quantity_draft_is_rejected_without_network() {
        let mut h = harness();
        h.drafts.set_draft(vec![line(1, 0)], None).expect("set");

        let err = h
            .submission
            .submit(&mut h.drafts)
            .await
            .expect_err("empty");

        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(h.transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_success_clears_draft_and_prepends_order() {
        let mut h = harness();
        h.submission.recent.prepend(order(1)).expect("seed");
        h.drafts
            .set_draft(vec![line(1, 2), line(2, 0), line(3, 1)], Some(AreaId::new(4)))
            .expect("set");
        h.transport.push_json(
            201,
            &json!({
                "status": "success",
                "error_code": 0,
                "message": "Created",
                "data": order_json(2, "PENDING")
            }),
        );

        let created = h.submission.submit(&mut h.drafts).await.expect("submit");

        assert_eq!(created.order_id, OrderId::new(2));
        assert_eq!(created.price, Price::parse("47.98").expect("price"));
        assert!(h.drafts.is_empty());
        assert!(!h.storage.contains(keys::DRAFT_ORDER));

        let ids: Vec<i32> = h
            .submission
            .recent()
            .orders()
            .iter()
            .map(|o| o.order_id.as_i32())
            .collect();
        assert_eq!(ids, vec![2, 1]);

        let sent = h.transport.requests();
        assert_eq!(sent[0].url.path(), "/orders/");
        assert_eq!(
            sent[0].body,
            Some(json!({
                "dish_list": [{"dish_id": 1, "quantity": 2}, {"dish_id": 3, "quantity": 1}],
                "area_id": 4
            }))
        );
    }

    #[tokio::test]
    async fn test_undeletable_draft_is_reported() {
        let mut h = build(true);
        h.drafts.set_draft(vec![line(1, 1)], None).expect("set");
        h.transport.push_ok(order_json(3, "PENDING"));

        h.submission.submit(&mut h.drafts).await.expect("submit");

        assert!(h.drafts.is_empty());
        assert!(h.storage.contains(keys::DRAFT_ORDER));
        assert_eq!(h.notifier.messages(), vec![DRAFT_NOT_CLEARED_MESSAGE.to_string()]);
        assert_eq!(h.submission.recent().orders().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_refuses_cached_non_pending_order() {
        let mut h = harness();
        h.submission
            .recent
            .prepend(serde_json::from_value(order_json(8, "COMPLETED")).expect("order"))
            .expect("seed");

        let err = h
            .submission
            .cancel(OrderId::new(8))
            .await
            .expect_err("completed");

        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(h.transport.request_count(), 0);
        assert_eq!(h.notifier.notices().len(), 1);
        assert_eq!(
            h.submission.recent().get(OrderId::new(8)).map(|o| o.state),
            Some(OrderState::Completed)
        );
    }

    #[tokio::test]
    async fn test_cancel_uncached_order_asks_backend() {
        let mut h = harness();
        h.transport.push_ok(Value::Null);

        h.submission.cancel(OrderId::new(9)).await.expect("cancel");

        assert_eq!(h.transport.request_count(), 1);
        assert!(h.submission.recent().get(OrderId::new(9)).is_none());
    }

    #[tokio::test]
    async fn test_failure_leaves_draft_unchanged() {
        let mut h = harness();
        h.drafts
            .set_draft(vec![line(1, 2)], Some(AreaId::new(4)))
            .expect("set");
        let before = h.drafts.draft().clone();
        h.transport.push_error_envelope(409, "Dish sold out");

        let err = h
            .submission
            .submit(&mut h.drafts)
            .await
            .expect_err("409");

        assert!(matches!(err, ClientError::Business { status: 409, .. }));
        assert_eq!(h.drafts.draft(), &before);
        assert!(h.storage.contains(keys::DRAFT_ORDER));
        assert!(h.submission.recent().orders().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_marks_cached_order() {
        let mut h = harness();
        h.submission.recent.prepend(order(7)).expect("seed");
        h.transport
            .push_json(200, &json!({"status": "success", "error_code": 0, "message": "Canceled"}));

        h.submission.cancel(OrderId::new(7)).await.expect("cancel");

        let cached = h.submission.recent().get(OrderId::new(7)).expect("cached");
        assert_eq!(cached.state, OrderState::Canceled);
        assert_eq!(h.transport.requests()[0].url.path(), "/orders/7/cancel");
    }

    #[tokio::test]
    async fn test_detail_refreshes_cached_copy() {
        let mut h = harness();
        h.submission.recent.prepend(order(7)).expect("seed");
        h.transport.push_ok(order_json(7, "PAID"));

        let fetched = h.submission.detail(OrderId::new(7)).await.expect("detail");

        assert_eq!(fetched.state, OrderState::Paid);
        assert_eq!(
            h.submission.recent().get(OrderId::new(7)).map(|o| o.state),
            Some(OrderState::Paid)
        );
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected_without_network() {
        let mut h = harness();
        let err = h
            .submission
            .update(OrderId::new(7), &OrderUpdate::default())
            .await
            .expect_err("empty update");
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(h.transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_update_sends_only_changed_fields() {
        let mut h = harness();
        h.transport.push_ok(order_json(7, "PAID"));
        let update = OrderUpdate {
            state: Some(OrderState::Paid),
            payment_method: Some(PaymentMethod::Cash),
            image_url: None,
        };

        h.submission
            .update(OrderId::new(7), &update)
            .await
            .expect("update");

        assert_eq!(
            h.transport.requests()[0].body,
            Some(json!({"state": "PAID", "payment_method": "CASH"}))
        );
    }

    #[tokio::test]
    async fn test_list_mine_replaces_cache() {
        let mut h = harness();
        h.submission.recent.prepend(order(1)).expect("seed");
        h.transport
            .push_ok(json!([order_json(5, "PAID"), order_json(4, "COMPLETED")]));

        let orders = h.submission.list_mine(false).await.expect("list");

        assert_eq!(orders.len(), 2);
        assert!(h.submission.recent().get(OrderId::new(1)).is_none());
        assert_eq!(
            h.transport.requests()[0].url.query(),
            Some("include_items=false")
        );
    }

    #[test]
    fn test_recent_orders_are_bounded_and_deduplicated() {
        let storage = Arc::new(MemoryStorage::new());
        let mut recent = RecentOrders::restore(storage.clone()).expect("restore");
        for id in 0..60 {
            recent.prepend(order(id)).expect("prepend");
        }
        recent.prepend(order(55)).expect("prepend");

        assert_eq!(recent.orders().len(), RECENT_ORDERS_LIMIT);
        assert_eq!(recent.orders()[0].order_id, OrderId::new(55));
        assert_eq!(
            recent
                .orders()
                .iter()
                .filter(|o| o.order_id == OrderId::new(55))
                .count(),
            1
        );

        let reloaded = RecentOrders::restore(storage).expect("restore");
        assert_eq!(reloaded.orders().len(), RECENT_ORDERS_LIMIT);
    }
}

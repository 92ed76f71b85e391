//! End-to-end checkout flow against mock collaborators.

use async_trait::async_trait;
use dash_checkout::prelude::*;
use dash_commerce::cart::LineItemKind;
use dash_commerce::order::{Order, OrderDraft, OrderLineItem, OrderStatus, PaymentStatus};
use dash_commerce::{Currency, ItemId, Money, OrderId, PaymentMethod, SessionId, TransactionId};
use dash_payments::{
    CustomerContact, InitiatedPayment, PaymentError, PaymentOutcome, PaymentProvider,
    PaymentRequest, ProviderPaymentStatus, StatusReport,
};
use dash_store::{KeyValueStore, MemoryStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory stand-in for the fulfillment backend.
#[derive(Default)]
struct MockBackend {
    orders: Mutex<HashMap<OrderId, Order>>,
    attached: Mutex<HashMap<OrderId, Vec<OrderLineItem>>>,
    status_updates: Mutex<Vec<(OrderId, OrderStatus, StatusUpdate)>>,
    create_calls: AtomicU32,
    attach_failures_left: AtomicU32,
    seq: AtomicU32,
}

impl MockBackend {
    fn new() -> Self {
        Self::default()
    }

    fn failing_attach(times: u32) -> Self {
        let backend = Self::default();
        backend.attach_failures_left.store(times, Ordering::SeqCst);
        backend
    }

    fn payment_updates(&self) -> Vec<PaymentStatus> {
        self.status_updates
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, _, extra)| extra.payment_status)
            .collect()
    }
}

#[async_trait]
impl OrderBackend for MockBackend {
    async fn create_order(&self, draft: &OrderDraft) -> Result<Order, BackendError> {
        let n = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let order = Order::from_draft(
            draft.clone(),
            OrderId::new(format!("ord-{}", n)),
            format!("CD-{}", 1000 + n),
        );
        self.orders
            .lock()
            .unwrap()
            .insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn add_order_line_items(
        &self,
        order_id: &OrderId,
        items: &[OrderLineItem],
    ) -> Result<(), BackendError> {
        let left = self.attach_failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.attach_failures_left.store(left - 1, Ordering::SeqCst);
            return Err(BackendError::Network("connection reset".to_string()));
        }
        self.attached
            .lock()
            .unwrap()
            .insert(order_id.clone(), items.to_vec());
        Ok(())
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
        extra: StatusUpdate,
    ) -> Result<(), BackendError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| BackendError::NotFound(order_id.to_string()))?;
        order.status = status;
        if let Some(payment_status) = extra.payment_status {
            order.payment_status = payment_status;
        }
        self.status_updates
            .lock()
            .unwrap()
            .push((order_id.clone(), status, extra));
        Ok(())
    }

    async fn get_order(&self, order_id: &OrderId) -> Result<Order, BackendError> {
        self.orders
            .lock()
            .unwrap()
            .get(order_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(order_id.to_string()))
    }
}

/// Provider whose reported status can be switched mid-test.
struct SwitchableProvider {
    status: Mutex<ProviderPaymentStatus>,
    checks: AtomicU32,
}

impl SwitchableProvider {
    fn new(status: ProviderPaymentStatus) -> Self {
        Self {
            status: Mutex::new(status),
            checks: AtomicU32::new(0),
        }
    }

    fn switch_to(&self, status: ProviderPaymentStatus) {
        *self.status.lock().unwrap() = status;
    }
}

#[async_trait]
impl PaymentProvider for SwitchableProvider {
    async fn initiate_payment(
        &self,
        _request: &PaymentRequest,
    ) -> Result<InitiatedPayment, PaymentError> {
        Ok(InitiatedPayment {
            transaction_id: TransactionId::new("tx-1"),
            checkout_url: Some("https://pay.example/checkout/tx-1".to_string()),
        })
    }

    async fn check_payment_status(
        &self,
        _transaction_id: &TransactionId,
    ) -> Result<StatusReport, PaymentError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(StatusReport {
            status: *self.status.lock().unwrap(),
            reason: None,
        })
    }
}

fn fast_config(max_attempts: u32) -> CheckoutConfig {
    CheckoutConfig {
        poll: PollConfig {
            initial_delay_ms: 1,
            interval_ms: 1,
            max_attempts,
        },
        ..CheckoutConfig::default()
    }
}

fn catalog(id: &str, price_cents: i64) -> LineItemKind {
    LineItemKind::Catalog {
        item_id: ItemId::new(id),
        name: format!("Item {}", id),
        unit_price: Money::new(price_cents, Currency::GHS),
        unit: None,
    }
}

fn contact() -> CustomerContact {
    CustomerContact {
        name: "Ama".to_string(),
        phone: "+233201234567".to_string(),
        email: Some("ama@example.edu".to_string()),
    }
}

struct Harness {
    session: SessionContext,
    backend: Arc<MockBackend>,
    provider: Arc<SwitchableProvider>,
    storage: Arc<MemoryStore>,
}

async fn harness(
    backend: MockBackend,
    initial_status: ProviderPaymentStatus,
    max_attempts: u32,
) -> Harness {
    let backend = Arc::new(backend);
    let provider = Arc::new(SwitchableProvider::new(initial_status));
    let storage = Arc::new(MemoryStore::new());
    let session = SessionContext::start(
        SessionId::new("session-1"),
        Arc::clone(&storage) as Arc<dyn KeyValueStore>,
        Arc::clone(&backend) as Arc<dyn OrderBackend>,
        Arc::clone(&provider) as Arc<dyn PaymentProvider>,
        fast_config(max_attempts),
    )
    .await;
    Harness {
        session,
        backend,
        provider,
        storage,
    }
}

async fn fill_cart(session: &mut SessionContext) {
    session
        .cart_mut()
        .add_item(catalog("jollof", 1500), 2, None)
        .await
        .unwrap();
    session
        .cart_mut()
        .set_delivery_address("Unity Hall, Room 204")
        .await;
}

#[tokio::test]
async fn place_order_happy_path() {
    let mut h = harness(MockBackend::new(), ProviderPaymentStatus::Pending, 5).await;
    fill_cart(&mut h.session).await;
    assert!(h.session.cart().can_checkout());

    let order = h
        .session
        .place_order(PaymentMethod::MobileMoney, None)
        .await
        .unwrap();

    assert_eq!(order.order_number, "CD-1001");
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.line_items.len(), 1);

    // Cart cleared, persisted record gone, items attached server-side.
    assert!(h.session.cart().is_empty());
    let key = CartStore::storage_key(&SessionId::new("session-1"));
    assert!(h.storage.get(&key).await.unwrap().is_none());
    assert_eq!(
        h.backend.attached.lock().unwrap().get(&order.id).map(Vec::len),
        Some(1)
    );

    // The tracking screen's refresh reads back through the backend.
    let fetched = h.session.fetch_order(&order.id).await.unwrap();
    assert_eq!(fetched.order_number, order.order_number);
}

#[tokio::test]
async fn place_order_on_empty_cart_is_rejected() {
    let mut h = harness(MockBackend::new(), ProviderPaymentStatus::Pending, 5).await;

    let result = h.session.place_order(PaymentMethod::Cash, None).await;
    assert!(matches!(result, Err(CheckoutError::Commerce(_))));
    assert_eq!(h.backend.create_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn partial_creation_keeps_cart_and_retries_without_duplicate_header() {
    let mut h = harness(
        MockBackend::failing_attach(1),
        ProviderPaymentStatus::Pending,
        5,
    )
    .await;
    fill_cart(&mut h.session).await;

    let err = h
        .session
        .place_order(PaymentMethod::Cash, None)
        .await
        .unwrap_err();
    let order = match err {
        CheckoutError::PartialCreation { order, .. } => *order,
        other => panic!("expected PartialCreation, got {:?}", other),
    };

    // The student's items are not lost: cart intact, record persisted.
    assert!(!h.session.cart().is_empty());
    let key = CartStore::storage_key(&SessionId::new("session-1"));
    assert!(h.storage.get(&key).await.unwrap().is_some());

    // Retry attaches to the existing order; no second header.
    h.session.retry_line_items(&order).await.unwrap();
    assert_eq!(h.backend.create_calls.load(Ordering::SeqCst), 1);
    assert!(h.session.cart().is_empty());
    assert!(h.backend.attached.lock().unwrap().contains_key(&order.id));
}

#[tokio::test]
async fn pay_applies_paid_status_once() {
    let mut h = harness(MockBackend::new(), ProviderPaymentStatus::Successful, 5).await;
    fill_cart(&mut h.session).await;
    let mut order = h
        .session
        .place_order(PaymentMethod::MobileMoney, None)
        .await
        .unwrap();

    let outcome = h
        .session
        .pay(&mut order, PaymentMethod::MobileMoney, &contact())
        .await
        .unwrap();

    assert!(outcome.is_paid());
    assert!(order.is_paid());
    assert_eq!(h.backend.payment_updates(), vec![PaymentStatus::Paid]);

    // Paying again confirms idempotently: no second backend update.
    let outcome = h
        .session
        .pay(&mut order, PaymentMethod::MobileMoney, &contact())
        .await
        .unwrap();
    assert!(outcome.is_paid());
    assert_eq!(h.backend.payment_updates(), vec![PaymentStatus::Paid]);
}

#[tokio::test]
async fn cash_order_stays_pending_until_delivery() {
    let mut h = harness(MockBackend::new(), ProviderPaymentStatus::Pending, 5).await;
    fill_cart(&mut h.session).await;
    let mut order = h.session.place_order(PaymentMethod::Cash, None).await.unwrap();

    let outcome = h
        .session
        .pay(&mut order, PaymentMethod::Cash, &contact())
        .await
        .unwrap();

    assert_eq!(outcome, PaymentOutcome::CashOnDelivery);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(h.provider.checks.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn timeout_keeps_payment_pending_and_refresh_resolves_it() {
    let mut h = harness(MockBackend::new(), ProviderPaymentStatus::Pending, 3).await;
    fill_cart(&mut h.session).await;
    let mut order = h
        .session
        .place_order(PaymentMethod::MobileMoney, None)
        .await
        .unwrap();

    let outcome = h
        .session
        .pay(&mut order, PaymentMethod::MobileMoney, &contact())
        .await
        .unwrap();

    let transaction_id = match &outcome {
        PaymentOutcome::TimedOut(attempt) => attempt.transaction_id.clone(),
        other => panic!("expected TimedOut, got {:?}", other),
    };
    // Timed out is not failed: payment still pending, nothing synced.
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert!(h.backend.payment_updates().is_empty());

    // The charge settles server-side later; a manual refresh applies it.
    h.provider.switch_to(ProviderPaymentStatus::Successful);
    let report = h
        .session
        .refresh_payment(&mut order, &transaction_id)
        .await
        .unwrap();
    assert_eq!(report.status, ProviderPaymentStatus::Successful);
    assert!(order.is_paid());
    assert_eq!(h.backend.payment_updates(), vec![PaymentStatus::Paid]);
}

#[tokio::test]
async fn failed_payment_can_be_retried_with_another_method() {
    let mut h = harness(MockBackend::new(), ProviderPaymentStatus::Failed, 5).await;
    fill_cart(&mut h.session).await;
    let mut order = h
        .session
        .place_order(PaymentMethod::MobileMoney, None)
        .await
        .unwrap();

    let outcome = h
        .session
        .pay(&mut order, PaymentMethod::MobileMoney, &contact())
        .await
        .unwrap();
    assert!(matches!(outcome, PaymentOutcome::Failed { .. }));
    assert_eq!(order.payment_status, PaymentStatus::Failed);

    // Same order, different method.
    h.provider.switch_to(ProviderPaymentStatus::Successful);
    let outcome = h
        .session
        .pay(&mut order, PaymentMethod::Card, &contact())
        .await
        .unwrap();
    assert!(outcome.is_paid());
    assert!(order.is_paid());
}

#[tokio::test]
async fn cancel_order_respects_the_window() {
    let mut h = harness(MockBackend::new(), ProviderPaymentStatus::Pending, 5).await;
    fill_cart(&mut h.session).await;
    let mut order = h.session.place_order(PaymentMethod::Cash, None).await.unwrap();

    h.session.cancel_order(&mut order).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);

    // Once shopping has begun, cancellation is rejected.
    fill_cart(&mut h.session).await;
    let mut order = h.session.place_order(PaymentMethod::Cash, None).await.unwrap();
    order.update_status(OrderStatus::Accepted).unwrap();
    order.update_status(OrderStatus::Shopping).unwrap();

    let result = h.session.cancel_order(&mut order).await;
    assert!(matches!(result, Err(CheckoutError::Commerce(_))));
    assert_eq!(order.status, OrderStatus::Shopping);
}

#[tokio::test]
async fn session_end_cancels_active_payment_token() {
    let h = harness(MockBackend::new(), ProviderPaymentStatus::Pending, 5).await;
    // No payment in flight: teardown is clean.
    h.session.end();
}

//! Payment orchestration: initiation plus the confirmation polling loop.

use crate::attempt::{AttemptStatus, PaymentAttempt};
use crate::poll::{CancelToken, PollPolicy};
use crate::provider::{
    CustomerContact, PaymentProvider, PaymentRequest, ProviderPaymentStatus, StatusReport,
};
use crate::PaymentError;
use dash_commerce::cart::FeeSchedule;
use dash_commerce::order::Order;
use dash_commerce::{OrderId, PaymentMethod, TransactionId};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// How a payment attempt resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    /// Cash settles when the runner delivers; the order's payment stays
    /// pending and there is nothing to poll.
    CashOnDelivery,
    /// Provider confirmed the charge.
    Paid(PaymentAttempt),
    /// Provider reported the charge failed. The order can be retried
    /// with the same or another method.
    Failed {
        attempt: PaymentAttempt,
        reason: Option<String>,
    },
    /// Poll budget exhausted without resolution. The order is NOT marked
    /// failed; the user is told to check back, since the charge may
    /// still settle server-side.
    TimedOut(PaymentAttempt),
    /// The loop was cancelled before resolution.
    Cancelled(PaymentAttempt),
}

impl PaymentOutcome {
    /// Check if the charge was confirmed.
    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentOutcome::Paid(_))
    }

    /// Transaction id of the underlying attempt, if one was initiated.
    pub fn transaction_id(&self) -> Option<&TransactionId> {
        match self {
            PaymentOutcome::CashOnDelivery => None,
            PaymentOutcome::Paid(a)
            | PaymentOutcome::TimedOut(a)
            | PaymentOutcome::Cancelled(a)
            | PaymentOutcome::Failed { attempt: a, .. } => Some(&a.transaction_id),
        }
    }
}

/// Drives a payment attempt from initiation to a terminal status.
///
/// Owns the per-order in-flight guard: starting a second attempt for an
/// order whose loop is still running is rejected, so two loops can never
/// race to apply conflicting results.
pub struct PaymentOrchestrator {
    provider: Arc<dyn PaymentProvider>,
    policy: PollPolicy,
    in_flight: Mutex<HashSet<OrderId>>,
}

impl PaymentOrchestrator {
    /// Create a new orchestrator.
    pub fn new(provider: Arc<dyn PaymentProvider>, policy: PollPolicy) -> Self {
        Self {
            provider,
            policy,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// The configured polling bounds.
    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Charge an order with the given method.
    ///
    /// Cash resolves synchronously. Card and mobile money initiate with
    /// the provider and then poll until the charge resolves, the attempt
    /// budget runs out, or `cancel` fires. The charge amount reuses the
    /// order's frozen totals with the surcharge of the method actually
    /// being charged.
    pub async fn pay(
        &self,
        order: &Order,
        method: PaymentMethod,
        contact: &CustomerContact,
        schedule: &FeeSchedule,
        cancel: &CancelToken,
    ) -> Result<PaymentOutcome, PaymentError> {
        if !method.is_asynchronous() {
            info!(order = %order.id, "cash on delivery; payment settles with the runner");
            return Ok(PaymentOutcome::CashOnDelivery);
        }

        let _guard = self.claim(order.id.clone())?;

        let amount = order.charge_total(method, schedule);
        let request = PaymentRequest {
            order_id: order.id.clone(),
            amount,
            method,
            contact: contact.clone(),
        };

        let initiated = self.provider.initiate_payment(&request).await?;
        info!(
            order = %order.id,
            transaction = %initiated.transaction_id,
            method = method.as_str(),
            amount = %amount,
            "payment initiated"
        );

        let mut attempt = PaymentAttempt::new(initiated, method, amount);
        self.poll_until_resolved(&mut attempt, cancel).await
    }

    /// One immediate status check, for the manual "refresh" affordance
    /// after a timeout. No polling, no in-flight claim.
    pub async fn check_once(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<StatusReport, PaymentError> {
        self.provider.check_payment_status(transaction_id).await
    }

    /// The bounded confirmation loop.
    ///
    /// A transient provider error consumes an attempt and counts as
    /// still-pending. The attempt budget is the sole timeout.
    async fn poll_until_resolved(
        &self,
        attempt: &mut PaymentAttempt,
        cancel: &CancelToken,
    ) -> Result<PaymentOutcome, PaymentError> {
        attempt.status = AttemptStatus::Processing;
        sleep(self.policy.initial_delay).await;

        for poll in 1..=self.policy.max_attempts {
            if cancel.is_cancelled() {
                // Abandoned mid-processing; the attempt never resolves.
                debug!(transaction = %attempt.transaction_id, "polling cancelled");
                return Ok(PaymentOutcome::Cancelled(attempt.clone()));
            }

            attempt.polls = poll;
            match self.provider.check_payment_status(&attempt.transaction_id).await {
                Ok(report) => {
                    if cancel.is_cancelled() {
                        // The loop was cancelled while the check was in
                        // flight; the late result is discarded.
                        debug!(
                            transaction = %attempt.transaction_id,
                            "discarding poll result received after cancellation"
                        );
                        return Ok(PaymentOutcome::Cancelled(attempt.clone()));
                    }
                    match report.status {
                        ProviderPaymentStatus::Successful => {
                            attempt.status = AttemptStatus::Successful;
                            info!(
                                transaction = %attempt.transaction_id,
                                polls = poll,
                                "payment confirmed"
                            );
                            return Ok(PaymentOutcome::Paid(attempt.clone()));
                        }
                        ProviderPaymentStatus::Failed => {
                            attempt.status = AttemptStatus::Failed;
                            warn!(
                                transaction = %attempt.transaction_id,
                                reason = report.reason.as_deref().unwrap_or("unspecified"),
                                "payment failed"
                            );
                            return Ok(PaymentOutcome::Failed {
                                attempt: attempt.clone(),
                                reason: report.reason,
                            });
                        }
                        ProviderPaymentStatus::Pending => {}
                    }
                }
                Err(e) => {
                    // Transient check failure: consumes this attempt but
                    // does not fail the payment.
                    warn!(
                        transaction = %attempt.transaction_id,
                        poll,
                        error = %e,
                        "status check failed; treating as still pending"
                    );
                }
            }

            if poll < self.policy.max_attempts {
                sleep(self.policy.interval).await;
            }
        }

        attempt.status = AttemptStatus::TimedOut;
        warn!(
            transaction = %attempt.transaction_id,
            polls = attempt.polls,
            "payment unresolved after poll budget; ask the user to check back"
        );
        Ok(PaymentOutcome::TimedOut(attempt.clone()))
    }

    /// Claim the order for a polling loop; released when the guard drops.
    fn claim(&self, order_id: OrderId) -> Result<InFlightGuard<'_>, PaymentError> {
        let mut set = self
            .in_flight
            .lock()
            .map_err(|e| PaymentError::Provider(e.to_string()))?;
        if !set.insert(order_id.clone()) {
            return Err(PaymentError::AttemptInFlight(order_id));
        }
        Ok(InFlightGuard {
            set: &self.in_flight,
            order_id,
        })
    }
}

/// Removes the order from the in-flight set on drop, so the claim is
/// released on every exit path, including early returns.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<OrderId>>,
    order_id: OrderId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.order_id);
        }
    }
}

//! Payment provider interface.

use crate::PaymentError;
use async_trait::async_trait;
use dash_commerce::{Money, OrderId, PaymentMethod, TransactionId};
use serde::{Deserialize, Serialize};

/// Who is paying; the provider needs the phone number for mobile-money
/// prompts and card receipts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerContact {
    /// Customer display name.
    pub name: String,
    /// Phone number in international format.
    pub phone: String,
    /// Email for receipts, if known.
    pub email: Option<String>,
}

/// A charge request sent to the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRequest {
    /// Order being paid for.
    pub order_id: OrderId,
    /// Exact amount to charge, surcharge included.
    pub amount: Money,
    /// Method being charged.
    pub method: PaymentMethod,
    /// Paying customer.
    pub contact: CustomerContact,
}

/// Provider response to a successful initiation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitiatedPayment {
    /// Provider-assigned transaction identifier.
    pub transaction_id: TransactionId,
    /// Hosted checkout page, for card payments.
    pub checkout_url: Option<String>,
}

/// Transaction state as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderPaymentStatus {
    /// Charge not yet resolved.
    Pending,
    /// Charge confirmed.
    Successful,
    /// Charge failed or was declined.
    Failed,
}

/// A status check result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusReport {
    /// Current transaction state.
    pub status: ProviderPaymentStatus,
    /// Provider-supplied failure reason, when failed.
    pub reason: Option<String>,
}

/// The payment gateway collaborator.
///
/// Both calls are fallible network calls. A `check_payment_status` error
/// is treated as transient by the polling loop; an `initiate_payment`
/// error is terminal for the attempt.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Start a charge. For mobile money this triggers the phone prompt;
    /// for cards it returns a hosted checkout URL.
    async fn initiate_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<InitiatedPayment, PaymentError>;

    /// Look up the current state of a transaction.
    async fn check_payment_status(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<StatusReport, PaymentError>;
}

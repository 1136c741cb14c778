use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the guest chose to pay.
///
/// `Cash` means "pay in person later": no payment record is created for it.
/// Unknown codes are kept verbatim as gateway methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMethod {
    Cash,
    Yape,
    Plin,
    BankTransfer,
    Gateway(String),
}

impl PaymentMethod {
    pub fn requires_payment_record(&self) -> bool {
        !matches!(self, PaymentMethod::Cash)
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Yape => "yape",
            PaymentMethod::Plin => "plin",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Gateway(code) => code,
        }
    }
}

impl From<String> for PaymentMethod {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "cash" => PaymentMethod::Cash,
            "yape" => PaymentMethod::Yape,
            "plin" => PaymentMethod::Plin,
            "bank_transfer" => PaymentMethod::BankTransfer,
            other => PaymentMethod::Gateway(other.to_string()),
        }
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self {
        method.as_str().to_string()
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub booking_id: String,
    pub amount: BigDecimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    #[serde(default)]
    pub provider_transaction_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `POST /payments`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub booking_id: String,
    pub amount: BigDecimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
}

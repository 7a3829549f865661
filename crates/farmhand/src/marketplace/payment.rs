//! Payment method variants and deterministic payment-intent payloads.
//!
//! Nothing here talks to a gateway: addresses are derived from the worker's contact
//! handle and the payload mirrors what a UPI QR code would encode.

use serde::{Deserialize, Serialize};

use super::domain::BookingRequest;

pub const PAYMENT_CURRENCY: &str = "INR";

/// How the farmer intends to settle a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Upi,
    #[serde(rename = "phonepe")]
    PhonePe,
    #[serde(rename = "gpay")]
    GooglePay,
}

impl PaymentMethod {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cash => "Cash Payment",
            Self::Upi => "UPI Payment",
            Self::PhonePe => "PhonePe",
            Self::GooglePay => "Google Pay",
        }
    }

    /// Provider handle appended to the payee address; cash has none.
    pub const fn handle_suffix(self) -> Option<&'static str> {
        match self {
            Self::Cash => None,
            Self::Upi => Some("upi"),
            Self::PhonePe => Some("ybl"),
            Self::GooglePay => Some("okaxis"),
        }
    }

    /// Wallet apps settle by scanning a QR code.
    pub const fn is_wallet(self) -> bool {
        matches!(self, Self::PhonePe | Self::GooglePay)
    }
}

/// Structured payload for a UPI-style payment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub payee_address: String,
    pub payee_name: String,
    pub amount: u64,
    pub currency: String,
    pub note: String,
}

impl PaymentIntent {
    /// `upi://pay?...` link suitable for rendering as a QR code.
    pub fn to_uri(&self) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("pa", &self.payee_address)
            .append_pair("pn", &self.payee_name)
            .append_pair("am", &self.amount.to_string())
            .append_pair("cu", &self.currency)
            .append_pair("tn", &self.note)
            .finish();
        format!("upi://pay?{query}")
    }
}

/// Synthetic payee address: the handle with whitespace removed, at the provider's suffix.
pub fn payment_address(contact_handle: &str, method: PaymentMethod) -> Option<String> {
    let suffix = method.handle_suffix()?;
    let handle: String = contact_handle
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    Some(format!("{handle}@{suffix}"))
}

pub fn build_payment_intent(
    payee_address: impl Into<String>,
    payee_name: impl Into<String>,
    amount: u64,
    note: impl Into<String>,
) -> PaymentIntent {
    PaymentIntent {
        payee_address: payee_address.into(),
        payee_name: payee_name.into(),
        amount,
        currency: PAYMENT_CURRENCY.to_string(),
        note: note.into(),
    }
}

/// Payment intent for a booking's total, or `None` for cash bookings.
pub fn intent_for_booking(booking: &BookingRequest) -> Option<PaymentIntent> {
    let address = payment_address(&booking.worker_phone, booking.payment_method)?;
    Some(build_payment_intent(
        address,
        booking.worker_name.clone(),
        booking.total_amount,
        format!("Payment for agricultural work - {}", booking.worker_name),
    ))
}

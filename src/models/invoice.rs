use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::billing;
use crate::models::InvoiceLineItem;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Due,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Due => "due",
            InvoiceStatus::Paid => "paid",
        }
    }

    /// The other state. Both transitions are always allowed.
    pub fn toggled(self) -> Self {
        match self {
            InvoiceStatus::Due => InvoiceStatus::Paid,
            InvoiceStatus::Paid => InvoiceStatus::Due,
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "due" => Ok(InvoiceStatus::Due),
            "paid" => Ok(InvoiceStatus::Paid),
            other => Err(format!("unknown invoice status '{}', expected due or paid", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[validate(length(min = 1, message = "Contact name cannot be empty"))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Contact {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// An invoice as submitted by a client, before a number is assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    #[validate(nested)]
    pub seller_contact: Contact,
    #[validate(nested)]
    pub buyer_contact: Contact,
    #[validate(nested)]
    pub items: Vec<InvoiceLineItem>,
    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 100.0, message = "Tax rate must be between 0 and 100"))]
    pub tax_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 100.0, message = "Discount rate must be between 0 and 100"))]
    pub discount_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl InvoiceRequest {
    pub fn tax_rate(&self) -> f64 {
        self.tax_rate.unwrap_or(0.0)
    }

    pub fn discount_rate(&self) -> f64 {
        self.discount_rate.unwrap_or(0.0)
    }

    pub fn initial_status(&self) -> InvoiceStatus {
        self.status.unwrap_or_default()
    }
}

/// The persisted summary of an invoice.
///
/// `total` is the rounded line item total. Invoice level tax and discount only
/// show up in [`Totals`] and the rendered document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    pub id: String,
    pub user_id: String,
    pub folder_id: String,
    pub sequence: u64,
    pub buyer: String,
    pub seller: String,
    pub total: f64,
    pub currency: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
}

impl InvoiceRecord {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == InvoiceStatus::Due && self.due_date < today
    }
}

/// A record together with the request it was created from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredInvoice {
    pub record: InvoiceRecord,
    pub request: InvoiceRequest,
}

impl StoredInvoice {
    pub fn totals(&self) -> Totals {
        Totals::compute(&self.request)
    }
}

/// Full breakdown of an invoice as it appears on the rendered document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub final_total: f64,
}

impl Totals {
    /// Compute at full precision from the submitted items and rates
    pub fn compute(request: &InvoiceRequest) -> Self {
        let subtotal = billing::items_total(&request.items);
        let adjusted = billing::invoice_total(subtotal, request.tax_rate(), request.discount_rate());

        Self {
            subtotal,
            tax_amount: adjusted.tax_amount,
            discount_amount: adjusted.discount_amount,
            final_total: adjusted.final_total,
        }
    }

    /// Same figures rounded to cents, for transport and display
    pub fn rounded(self) -> Self {
        Self {
            subtotal: billing::round_cents(self.subtotal),
            tax_amount: billing::round_cents(self.tax_amount),
            discount_amount: billing::round_cents(self.discount_amount),
            final_total: billing::round_cents(self.final_total),
        }
    }
}

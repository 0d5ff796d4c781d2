use serde::{Deserialize, Serialize};

use crate::models::InvoiceLineItem;

/// Invoice level adjustments applied on top of the line item subtotal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotal {
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub final_total: f64,
}

/// Total for a single line: subtotal plus the line's own tax on that subtotal
pub fn line_total(item: &InvoiceLineItem) -> f64 {
    let subtotal = item.qty * item.unit;
    subtotal + subtotal * (item.tax / 100.0)
}

/// Sum of all line totals, unrounded
pub fn items_total(items: &[InvoiceLineItem]) -> f64 {
    items.iter().map(line_total).sum()
}

/// Apply invoice level tax and discount rates (both percentages) to a subtotal.
///
/// Rates are expected to be validated to 0..=100 by the caller.
pub fn invoice_total(subtotal: f64, tax_rate: f64, discount_rate: f64) -> InvoiceTotal {
    let tax_amount = subtotal * (tax_rate / 100.0);
    let discount_amount = subtotal * (discount_rate / 100.0);

    InvoiceTotal {
        tax_amount,
        discount_amount,
        final_total: subtotal + tax_amount - discount_amount,
    }
}

/// Round to whole cents, halves away from zero
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// The total that gets persisted on a record: line items only, rounded to cents
pub fn stored_total(items: &[InvoiceLineItem]) -> f64 {
    round_cents(items_total(items))
}

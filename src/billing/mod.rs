//! Invoice arithmetic and identifier derivation.
//!
//! Everything in here is pure: no storage, no clock, no I/O.

mod identifier;
mod totals;

pub use identifier::derive_invoice_id;
pub use totals::{
    InvoiceTotal, invoice_total, items_total, line_total, round_cents, stored_total,
};

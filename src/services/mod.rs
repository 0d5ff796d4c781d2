pub mod invoicing;
pub mod stats;

pub use invoicing::{CreatedInvoice, InvoiceDetail, SearchQuery};

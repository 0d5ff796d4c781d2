mod folder;
mod invoice;
mod invoice_line_item;
mod stats;
mod user;

pub use folder::{Folder, NewFolder};
pub use invoice::{Contact, InvoiceRecord, InvoiceRequest, InvoiceStatus, StoredInvoice, Totals};
pub use invoice_line_item::InvoiceLineItem;
pub use stats::{CurrencyTotals, RevenueStats};
pub use user::User;

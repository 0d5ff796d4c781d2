//! Invoice creation, status transitions and search.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::billing;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{InvoiceRecord, InvoiceRequest, InvoiceStatus, StoredInvoice, Totals};

/// Give up after this many taken identifiers in a row
const MAX_ID_ATTEMPTS: usize = 64;

/// Result of creating an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedInvoice {
    pub invoice: InvoiceRecord,
    pub totals: Totals,
}

/// A single invoice with everything needed to show it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetail {
    pub invoice: InvoiceRecord,
    pub request: InvoiceRequest,
    pub totals: Totals,
}

impl From<StoredInvoice> for InvoiceDetail {
    fn from(stored: StoredInvoice) -> Self {
        let totals = stored.totals().rounded();
        Self {
            invoice: stored.record,
            request: stored.request,
            totals,
        }
    }
}

/// Filters for listing a user's invoices
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
}

/// Check an incoming request and normalize what can be normalized.
///
/// Runs the derived field rules first, then the checks that need the whole request.
pub fn validate_request(request: &mut InvoiceRequest) -> AppResult<()> {
    request.validate()?;

    if request.items.is_empty() {
        return Err(AppError::Validation("At least one line item is required".to_string()));
    }

    for (idx, item) in request.items.iter().enumerate() {
        if item.description.trim().is_empty() {
            return Err(AppError::Validation(format!("Item {} has an empty description", idx + 1)));
        }
        if !(item.qty.is_finite() && item.unit.is_finite() && item.tax.is_finite()) {
            return Err(AppError::Validation(format!("Item {} has a non-numeric amount", idx + 1)));
        }
    }

    let rates = [request.tax_rate, request.discount_rate];
    if rates.iter().flatten().any(|rate| !rate.is_finite()) {
        return Err(AppError::Validation("Rates must be finite numbers".to_string()));
    }

    let totals = Totals::compute(request);
    let figures = [
        billing::stored_total(&request.items),
        totals.subtotal,
        totals.tax_amount,
        totals.discount_amount,
        totals.final_total,
    ];
    if !figures.iter().all(|figure| figure.is_finite()) {
        return Err(AppError::Validation("Invoice amounts are too large to total".to_string()));
    }

    if request.seller_contact.name.trim().is_empty() || request.buyer_contact.name.trim().is_empty() {
        return Err(AppError::Validation("Seller and buyer names are required".to_string()));
    }

    if !request.currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::Validation(format!(
            "Currency '{}' must be a 3-letter code",
            request.currency
        )));
    }
    request.currency = request.currency.to_ascii_uppercase();

    Ok(())
}

/// Create an invoice in one of the user's folders.
///
/// The folder's sequence is bumped until an unused identifier comes up, so two
/// folders sharing a name prefix never overwrite each other's invoices.
pub async fn create_invoice(
    db: &Database,
    user_id: &str,
    folder_id: &str,
    mut request: InvoiceRequest,
) -> AppResult<CreatedInvoice> {
    validate_request(&mut request)?;

    let folder = db
        .get_folder(user_id, folder_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Folder {} not found", folder_id)))?;

    let total = billing::stored_total(&request.items);
    let totals = Totals::compute(&request).rounded();

    for _ in 0..MAX_ID_ATTEMPTS {
        let sequence = db.next_sequence(user_id, &folder.id).await?;
        let id = billing::derive_invoice_id(user_id, &folder.name, sequence);

        let invoice = StoredInvoice {
            record: InvoiceRecord {
                id: id.clone(),
                user_id: user_id.to_string(),
                folder_id: folder.id.clone(),
                sequence,
                buyer: request.buyer_contact.name.clone(),
                seller: request.seller_contact.name.clone(),
                total,
                currency: request.currency.clone(),
                issue_date: request.issue_date,
                due_date: request.due_date,
                status: request.initial_status(),
                created_at: Utc::now(),
            },
            request: request.clone(),
        };

        if db.insert_invoice(&invoice).await? {
            tracing::info!(
                invoice_id = %id,
                user_id,
                folder_id = %folder.id,
                sequence,
                total,
                currency = %invoice.record.currency,
                "Created invoice"
            );
            return Ok(CreatedInvoice {
                invoice: invoice.record,
                totals,
            });
        }

        tracing::warn!(invoice_id = %id, "Invoice identifier already taken, advancing sequence");
    }

    Err(AppError::Conflict(format!(
        "Could not allocate an invoice number for folder {}",
        folder.id
    )))
}

pub async fn get_invoice(db: &Database, user_id: &str, invoice_id: &str) -> AppResult<StoredInvoice> {
    db.get_invoice(user_id, invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Invoice {} not found", invoice_id)))
}

/// Move an invoice between `due` and `paid`. Nothing else on the record changes.
pub async fn update_status(
    db: &Database,
    user_id: &str,
    invoice_id: &str,
    status: InvoiceStatus,
) -> AppResult<InvoiceRecord> {
    let invoice = db
        .set_invoice_status(user_id, invoice_id, status)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Invoice {} not found", invoice_id)))?;

    tracing::info!(invoice_id, user_id, status = %status, "Updated invoice status");

    Ok(invoice.record)
}

/// List a user's invoices, newest first
pub async fn search(db: &Database, user_id: &str, query: &SearchQuery) -> AppResult<Vec<InvoiceRecord>> {
    let invoices = db.list_invoices(user_id).await?;
    let records = invoices.into_iter().map(|invoice| invoice.record).collect();
    Ok(filter_records(records, query))
}

pub fn filter_records(records: Vec<InvoiceRecord>, query: &SearchQuery) -> Vec<InvoiceRecord> {
    let needle = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let mut matched: Vec<InvoiceRecord> = records
        .into_iter()
        .filter(|r| query.folder.as_deref().is_none_or(|f| r.folder_id == f))
        .filter(|r| query.status.is_none_or(|s| r.status == s))
        .filter(|r| match &needle {
            Some(needle) => [&r.id, &r.buyer, &r.seller]
                .iter()
                .any(|field| field.to_lowercase().contains(needle.as_str())),
            None => true,
        })
        .collect();

    matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    matched
}

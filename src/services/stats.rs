use chrono::NaiveDate;

use crate::billing::round_cents;
use crate::db::Database;
use crate::error::AppResult;
use crate::models::{InvoiceRecord, InvoiceStatus, RevenueStats};

/// Aggregate stored totals per currency. `today` decides what counts as overdue.
pub fn revenue_stats(records: &[InvoiceRecord], today: NaiveDate) -> RevenueStats {
    let mut stats = RevenueStats::default();

    for record in records {
        stats.invoice_count += 1;
        let totals = stats.by_currency.entry(record.currency.clone()).or_default();
        totals.invoiced += record.total;

        match record.status {
            InvoiceStatus::Paid => {
                stats.paid_count += 1;
                totals.paid += record.total;
            }
            InvoiceStatus::Due => {
                stats.due_count += 1;
                totals.outstanding += record.total;
                if record.is_overdue(today) {
                    stats.overdue_count += 1;
                    totals.overdue += record.total;
                }
            }
        }
    }

    for totals in stats.by_currency.values_mut() {
        totals.invoiced = round_cents(totals.invoiced);
        totals.paid = round_cents(totals.paid);
        totals.outstanding = round_cents(totals.outstanding);
        totals.overdue = round_cents(totals.overdue);
    }

    stats
}

/// Stats over a user's invoices, optionally limited to one folder
pub async fn stats_for_user(
    db: &Database,
    user_id: &str,
    folder_id: Option<&str>,
    today: NaiveDate,
) -> AppResult<RevenueStats> {
    let records: Vec<InvoiceRecord> = db
        .list_invoices(user_id)
        .await?
        .into_iter()
        .map(|invoice| invoice.record)
        .filter(|record| folder_id.is_none_or(|f| record.folder_id == f))
        .collect();

    Ok(revenue_stats(&records, today))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str, total: f64, currency: &str, status: InvoiceStatus, due: (i32, u32, u32)) -> InvoiceRecord {
        InvoiceRecord {
            id: id.to_string(),
            user_id: "u".to_string(),
            folder_id: "f".to_string(),
            sequence: 1,
            buyer: "B".to_string(),
            seller: "S".to_string(),
            total,
            currency: currency.to_string(),
            issue_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(due.0, due.1, due.2).unwrap(),
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_input_gives_zeroed_stats() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        assert_eq!(revenue_stats(&[], today), RevenueStats::default());
    }

    #[test]
    fn splits_paid_outstanding_and_overdue_per_currency() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let records = vec![
            record("a", 100.10, "USD", InvoiceStatus::Paid, (2026, 1, 10)),
            record("b", 50.20, "USD", InvoiceStatus::Due, (2026, 1, 20)),
            record("c", 25.00, "USD", InvoiceStatus::Due, (2026, 2, 1)),
            record("d", 80.00, "EUR", InvoiceStatus::Due, (2026, 3, 1)),
        ];

        let stats = revenue_stats(&records, today);

        assert_eq!(stats.invoice_count, 4);
        assert_eq!(stats.paid_count, 1);
        assert_eq!(stats.due_count, 3);
        // due today is not overdue yet
        assert_eq!(stats.overdue_count, 1);

        let usd = &stats.by_currency["USD"];
        assert_eq!(usd.invoiced, 175.3);
        assert_eq!(usd.paid, 100.1);
        assert_eq!(usd.outstanding, 75.2);
        assert_eq!(usd.overdue, 50.2);

        let eur = &stats.by_currency["EUR"];
        assert_eq!(eur.invoiced, 80.0);
        assert_eq!(eur.overdue, 0.0);
    }
}

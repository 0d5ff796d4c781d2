use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Revenue figures for one currency, summed from stored invoice totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyTotals {
    pub invoiced: f64,
    pub paid: f64,
    pub outstanding: f64,
    pub overdue: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueStats {
    pub invoice_count: usize,
    pub paid_count: usize,
    pub due_count: usize,
    pub overdue_count: usize,
    pub by_currency: BTreeMap<String, CurrencyTotals>,
}

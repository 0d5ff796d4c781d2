use serde::{Deserialize, Serialize};
use validator::Validate;

/// One billable line. `tax` is a percentage applied to this line's subtotal only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct InvoiceLineItem {
    #[validate(length(min = 1, message = "Item description cannot be empty"))]
    pub description: String,
    #[validate(range(exclusive_min = 0.0, message = "Quantity must be greater than zero"))]
    pub qty: f64,
    #[validate(range(min = 0.0, message = "Unit price cannot be negative"))]
    pub unit: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0, message = "Line tax must be between 0 and 100"))]
    pub tax: f64,
}

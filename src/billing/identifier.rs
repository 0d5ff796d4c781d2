/// Derive the human readable identifier for an invoice.
///
/// The identifier has the shape `INV-{owner}-{company}-{sequence}` where:
/// - `owner` is the first three characters of the owner id, upper-cased
/// - `company` is the first four characters of the company name, upper-cased,
///   with everything outside `A-Z` removed afterwards
/// - `sequence` is zero padded to four digits
///
/// Any input is accepted. Empty or letter-free prefixes produce empty segments,
/// e.g. `INV-USE--0001`.
pub fn derive_invoice_id(owner_id: &str, company_name: &str, sequence: u64) -> String {
    let owner_prefix: String = owner_id.chars().take(3).collect::<String>().to_uppercase();

    // Only the first four raw characters are considered, so "123-ABC" has no prefix
    let company_prefix: String = company_name
        .chars()
        .take(4)
        .collect::<String>()
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase())
        .collect();

    format!("INV-{}-{}-{:04}", owner_prefix, company_prefix, sequence)
}

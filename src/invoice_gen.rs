use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point,
};

use crate::billing;
use crate::error::{AppError, AppResult};
use crate::format::{format_amount, trim_number, wrap_text};
use crate::models::{Contact, StoredInvoice};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const LEFT: f32 = 15.0;
const RIGHT: f32 = 195.0;
const TOP: f32 = 282.0;
const BOTTOM: f32 = 20.0;

// Item table columns (x positions in mm); numeric columns are right aligned at these edges
const COL_DESC: f32 = LEFT;
const COL_QTY_END: f32 = 122.0;
const COL_UNIT_END: f32 = 147.0;
const COL_TAX_END: f32 = 165.0;
const COL_TOTAL_END: f32 = RIGHT;

const DESC_WRAP_CHARS: usize = 52;
const NOTES_WRAP_CHARS: usize = 95;
const ROW_HEIGHT: f32 = 5.0;

/// Rough Helvetica width: half an em per character, points to mm
fn text_width_mm(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5 * 0.3528
}

/// Cursor over the pages of a document being drawn top to bottom
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    pages: usize,
}

impl PageWriter {
    fn new(title: &str) -> AppResult<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);

        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| AppError::Render(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| AppError::Render(e.to_string()))?;

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: TOP,
            pages: 1,
        })
    }

    fn text(&self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn text_right(&self, text: &str, size: f32, right_edge: f32, bold: bool) {
        self.text(text, size, right_edge - text_width_mm(text, size), bold);
    }

    fn rule(&self) {
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(LEFT), Mm(self.y)), false),
                (Point::new(Mm(RIGHT), Mm(self.y)), false),
            ],
            is_closed: false,
        });
    }

    fn advance(&mut self, by: f32) {
        self.y -= by;
    }

    /// Start a new page when `height` no longer fits above the bottom margin
    fn ensure_space(&mut self, height: f32) {
        if self.y - height >= BOTTOM {
            return;
        }
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = TOP;
        self.pages += 1;
    }

    fn finish(self) -> AppResult<Vec<u8>> {
        let mut writer = BufWriter::new(Vec::<u8>::new());
        self.doc
            .save(&mut writer)
            .map_err(|e| AppError::Render(e.to_string()))?;
        writer
            .into_inner()
            .map_err(|e| AppError::Render(e.to_string()))
    }
}

/// Renders stored invoices to PDF
#[derive(Debug, Clone, Default)]
pub struct InvoiceGenerator;

impl InvoiceGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Draw the invoice onto as many A4 pages as the item rows need.
    ///
    /// The summary shows invoice level tax and discount, so the total printed
    /// here is the adjusted total rather than the stored line item total.
    pub fn render_pdf(&self, invoice: &StoredInvoice) -> AppResult<Vec<u8>> {
        let record = &invoice.record;
        let request = &invoice.request;
        let currency = record.currency.as_str();
        let totals = invoice.totals();

        let mut page = PageWriter::new(&format!("Invoice {}", record.id))?;

        // Header
        page.text("INVOICE", 24.0, LEFT, true);
        page.text_right(&record.id, 12.0, RIGHT, true);
        page.advance(8.0);
        page.text_right(&format!("Status: {}", record.status.as_str().to_uppercase()), 10.0, RIGHT, false);
        page.advance(6.0);
        page.rule();
        page.advance(8.0);

        // Parties and dates
        page.text("From", 11.0, LEFT, true);
        page.text("Bill to", 11.0, 85.0, true);
        page.text("Details", 11.0, 150.0, true);
        page.advance(6.0);

        let seller_lines = contact_lines(&request.seller_contact);
        let buyer_lines = contact_lines(&request.buyer_contact);
        let details = [
            format!("Issued: {}", record.issue_date.format("%Y-%m-%d")),
            format!("Due: {}", record.due_date.format("%Y-%m-%d")),
            format!("Currency: {}", currency),
        ];
        let rows = seller_lines.len().max(buyer_lines.len()).max(details.len());
        for i in 0..rows {
            if let Some(line) = seller_lines.get(i) {
                page.text(line, 10.0, LEFT, false);
            }
            if let Some(line) = buyer_lines.get(i) {
                page.text(line, 10.0, 85.0, false);
            }
            if let Some(line) = details.get(i) {
                page.text(line, 10.0, 150.0, false);
            }
            page.advance(ROW_HEIGHT);
        }
        page.advance(6.0);

        // Item table
        draw_item_header(&mut page);
        for item in &request.items {
            let desc_lines = wrap_text(&item.description, DESC_WRAP_CHARS);
            let height = desc_lines.len().max(1) as f32 * ROW_HEIGHT + 2.0;
            if page.y - height < BOTTOM {
                page.ensure_space(height);
                draw_item_header(&mut page);
            }

            page.text_right(&trim_number(item.qty), 10.0, COL_QTY_END, false);
            page.text_right(&format_amount(item.unit, currency), 10.0, COL_UNIT_END, false);
            page.text_right(&format!("{}%", trim_number(item.tax)), 10.0, COL_TAX_END, false);
            page.text_right(
                &format_amount(billing::line_total(item), currency),
                10.0,
                COL_TOTAL_END,
                false,
            );
            for line in &desc_lines {
                page.text(line, 10.0, COL_DESC, false);
                page.advance(ROW_HEIGHT);
            }
            if desc_lines.is_empty() {
                page.advance(ROW_HEIGHT);
            }
            page.advance(2.0);
        }

        page.rule();
        page.advance(8.0);

        // Summary
        page.ensure_space(4.0 * 7.0);
        let tax_label = format!("Tax ({}%)", trim_number(request.tax_rate()));
        let discount_label = format!("Discount ({}%)", trim_number(request.discount_rate()));
        let summary = [
            ("Subtotal", totals.subtotal),
            (tax_label.as_str(), totals.tax_amount),
            (discount_label.as_str(), -totals.discount_amount),
        ];
        for (label, amount) in summary {
            page.text(label, 10.0, 130.0, false);
            page.text_right(&format_amount(amount, currency), 10.0, RIGHT, false);
            page.advance(6.0);
        }
        page.text("Total", 13.0, 130.0, true);
        page.text_right(
            &format!("{} {}", format_amount(totals.final_total, currency), currency),
            13.0,
            RIGHT,
            true,
        );
        page.advance(12.0);

        // Notes
        if let Some(notes) = request.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            page.ensure_space(12.0);
            page.text("Notes", 11.0, LEFT, true);
            page.advance(6.0);
            for line in wrap_text(notes, NOTES_WRAP_CHARS) {
                page.ensure_space(ROW_HEIGHT);
                page.text(&line, 10.0, LEFT, false);
                page.advance(ROW_HEIGHT);
            }
        }

        tracing::debug!(invoice_id = %record.id, pages = page.pages, "Rendered invoice PDF");
        page.finish()
    }
}

fn draw_item_header(page: &mut PageWriter) {
    page.text("Description", 10.0, COL_DESC, true);
    page.text_right("Qty", 10.0, COL_QTY_END, true);
    page.text_right("Unit", 10.0, COL_UNIT_END, true);
    page.text_right("Tax", 10.0, COL_TAX_END, true);
    page.text_right("Amount", 10.0, COL_TOTAL_END, true);
    page.advance(3.0);
    page.rule();
    page.advance(6.0);
}

fn contact_lines(contact: &Contact) -> Vec<String> {
    let mut lines = vec![contact.name.clone()];
    for field in [&contact.email, &contact.phone] {
        if let Some(value) = field.as_deref().filter(|v| !v.trim().is_empty()) {
            lines.push(value.to_string());
        }
    }
    if let Some(address) = contact.address.as_deref() {
        lines.extend(address.lines().flat_map(|l| wrap_text(l, 30)));
    }
    lines
}

/// Write a rendered PDF into `output_dir` (created if missing) as `{invoice_id}.pdf`
pub fn write_pdf(output_dir: &Path, invoice_id: &str, bytes: &[u8]) -> Result<PathBuf> {
    if invoice_id.is_empty() || invoice_id.contains(['/', '\\']) || invoice_id.contains("..") {
        anyhow::bail!("Invalid invoice id for a file name: {}", invoice_id);
    }

    if !output_dir.exists() {
        fs::create_dir_all(output_dir)?;
    }

    let path = output_dir.join(format!("{}.pdf", invoice_id));
    let mut file = File::create(&path)?;
    file.write_all(bytes)?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvoiceLineItem, InvoiceRecord, InvoiceRequest, InvoiceStatus};
    use chrono::{NaiveDate, Utc};

    fn invoice(items: usize) -> StoredInvoice {
        let issue = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let due = NaiveDate::from_ymd_opt(2026, 4, 15).unwrap();
        let items: Vec<InvoiceLineItem> = (0..items)
            .map(|i| InvoiceLineItem {
                description: format!("Line {} with a fairly long description that needs to wrap across the column", i),
                qty: 1.5,
                unit: 120.0,
                tax: 10.0,
            })
            .collect();
        StoredInvoice {
            record: InvoiceRecord {
                id: "INV-JOH-ACME-0001".to_string(),
                user_id: "john_doe".to_string(),
                folder_id: "f1".to_string(),
                sequence: 1,
                buyer: "ACME Corporation".to_string(),
                seller: "John Doe".to_string(),
                total: crate::billing::stored_total(&items),
                currency: "USD".to_string(),
                issue_date: issue,
                due_date: due,
                status: InvoiceStatus::Due,
                created_at: Utc::now(),
            },
            request: InvoiceRequest {
                seller_contact: Contact {
                    name: "John Doe".to_string(),
                    email: Some("john@example.com".to_string()),
                    address: Some("1 Main St\nSpringfield".to_string()),
                    phone: None,
                },
                buyer_contact: Contact::named("ACME Corporation"),
                items,
                currency: "USD".to_string(),
                issue_date: issue,
                due_date: due,
                tax_rate: Some(20.0),
                discount_rate: Some(15.0),
                status: None,
                notes: Some("Payment by bank transfer within 14 days.".to_string()),
            },
        }
    }

    #[test]
    fn renders_a_pdf_document() {
        let bytes = InvoiceGenerator::new().render_pdf(&invoice(3)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_item_lists_spill_onto_more_pages() {
        let short = InvoiceGenerator::new().render_pdf(&invoice(2)).unwrap();
        let long = InvoiceGenerator::new().render_pdf(&invoice(60)).unwrap();
        assert!(long.starts_with(b"%PDF"));
        assert!(long.len() > short.len());
    }

    #[test]
    fn writes_pdf_into_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");

        let path = write_pdf(&target, "INV-X-Y-0001", b"%PDF-1.3").unwrap();
        assert_eq!(path, target.join("INV-X-Y-0001.pdf"));
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-1.3");
    }

    #[test]
    fn refuses_ids_that_leave_the_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");

        for id in ["../escape", "a/b", "a\\b", "..", ""] {
            assert!(write_pdf(&target, id, b"%PDF-1.3").is_err(), "accepted {:?}", id);
        }
        assert!(!dir.path().join("escape.pdf").exists());
    }
}

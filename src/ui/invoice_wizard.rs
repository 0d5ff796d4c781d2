use anyhow::Result;
use chrono::{Duration, NaiveDate};
use crossterm::event::{self, Event, KeyCode};
use tui::{
    Frame,
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::billing::line_total;
use crate::config::QuickDefaults;
use crate::format::{format_money, trim_number};
use crate::models::{Contact, Folder, InvoiceLineItem, InvoiceRequest, Totals};
use crate::ui::components::date_input::DateInputState;
use crate::ui::components::{render_error, step_selection};

// Represents a field in the invoice form
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvoiceField {
    Seller,
    Buyer,
    Currency,
    IssueDate,
    DueDate,
    TaxRate,
    DiscountRate,
    Notes,
    LineItems,
}

const FIELDS: [InvoiceField; 9] = [
    InvoiceField::Seller,
    InvoiceField::Buyer,
    InvoiceField::Currency,
    InvoiceField::IssueDate,
    InvoiceField::DueDate,
    InvoiceField::TaxRate,
    InvoiceField::DiscountRate,
    InvoiceField::Notes,
    InvoiceField::LineItems,
];

impl InvoiceField {
    fn label(self) -> &'static str {
        match self {
            InvoiceField::Seller => "Seller",
            InvoiceField::Buyer => "Buyer",
            InvoiceField::Currency => "Currency",
            InvoiceField::IssueDate => "Issue Date",
            InvoiceField::DueDate => "Due Date",
            InvoiceField::TaxRate => "Tax %",
            InvoiceField::DiscountRate => "Discount %",
            InvoiceField::Notes => "Notes",
            InvoiceField::LineItems => "Line Items",
        }
    }

    fn position(self) -> usize {
        FIELDS.iter().position(|f| *f == self).unwrap_or(0)
    }
}

// Represents a field being edited in the line items step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineItemField {
    Description,
    Qty,
    Unit,
    Tax,
}

impl LineItemField {
    fn label(self) -> &'static str {
        match self {
            LineItemField::Description => "Description",
            LineItemField::Qty => "Quantity",
            LineItemField::Unit => "Unit Price",
            LineItemField::Tax => "Tax %",
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            LineItemField::Description => Some(LineItemField::Qty),
            LineItemField::Qty => Some(LineItemField::Unit),
            LineItemField::Unit => Some(LineItemField::Tax),
            LineItemField::Tax => None,
        }
    }
}

fn line_item_value(item: &InvoiceLineItem, field: LineItemField) -> String {
    match field {
        LineItemField::Description => item.description.clone(),
        LineItemField::Qty => trim_number(item.qty),
        LineItemField::Unit => trim_number(item.unit),
        LineItemField::Tax => trim_number(item.tax),
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

// Represents the wizard state
pub struct InvoiceWizardState {
    folder_id: String,
    seller: String,
    buyer: String,
    buyer_email: Option<String>,
    buyer_address: Option<String>,
    currency: String,
    issue_date: DateInputState,
    due_date: DateInputState,
    tax_rate: String,
    discount_rate: String,
    notes: String,
    default_item_tax: f64,
    line_items: Vec<InvoiceLineItem>,
    line_items_list_state: ListState,
    editing_line_item: Option<(usize, LineItemField, String)>, // (index, field, current value)
    current_field: InvoiceField,
    editing: bool,
    show_error: Option<String>,
}

impl InvoiceWizardState {
    /// Pre-filled from the folder, the signed-in user and the configured quick defaults
    pub fn new(folder: &Folder, seller: &str, defaults: &QuickDefaults, today: NaiveDate) -> Self {
        let due = Duration::try_days(defaults.due_in_days)
            .and_then(|days| today.checked_add_signed(days))
            .unwrap_or(today);

        Self {
            folder_id: folder.id.clone(),
            seller: seller.to_string(),
            buyer: folder.name.clone(),
            buyer_email: folder.email.clone(),
            buyer_address: folder.address.clone(),
            currency: "USD".to_string(),
            issue_date: DateInputState::new(today),
            due_date: DateInputState::new(due),
            tax_rate: trim_number(defaults.default_tax_rate),
            discount_rate: trim_number(defaults.default_discount_rate),
            notes: String::new(),
            default_item_tax: 0.0,
            line_items: Vec::new(),
            line_items_list_state: ListState::default(),
            editing_line_item: None,
            current_field: InvoiceField::Seller,
            editing: false,
            show_error: None,
        }
    }

    pub fn folder_id(&self) -> &str {
        &self.folder_id
    }

    pub fn set_error(&mut self, message: String) {
        self.show_error = Some(message);
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;

        match self.current_field {
            InvoiceField::IssueDate => self.issue_date.toggle_editing(),
            InvoiceField::DueDate => self.due_date.toggle_editing(),
            _ => {}
        }

        if !self.editing {
            self.issue_date.editing = false;
            self.due_date.editing = false;
            self.editing_line_item = None;
        }
    }

    pub fn next_field(&mut self) {
        let i = (self.current_field.position() + 1) % FIELDS.len();
        self.current_field = FIELDS[i];
    }

    pub fn previous_field(&mut self) {
        let i = (self.current_field.position() + FIELDS.len() - 1) % FIELDS.len();
        self.current_field = FIELDS[i];
    }

    fn text_field_mut(&mut self) -> Option<&mut String> {
        match self.current_field {
            InvoiceField::Seller => Some(&mut self.seller),
            InvoiceField::Buyer => Some(&mut self.buyer),
            InvoiceField::Currency => Some(&mut self.currency),
            InvoiceField::TaxRate => Some(&mut self.tax_rate),
            InvoiceField::DiscountRate => Some(&mut self.discount_rate),
            InvoiceField::Notes => Some(&mut self.notes),
            InvoiceField::IssueDate | InvoiceField::DueDate | InvoiceField::LineItems => None,
        }
    }

    pub fn add_line_item(&mut self) {
        self.line_items.push(InvoiceLineItem {
            description: String::new(),
            qty: 1.0,
            unit: 0.0,
            tax: self.default_item_tax,
        });
        let idx = self.line_items.len() - 1;
        self.line_items_list_state.select(Some(idx));
        self.editing_line_item = Some((idx, LineItemField::Description, String::new()));
    }

    pub fn edit_line_item(&mut self) {
        if let Some(selected) = self.line_items_list_state.selected() {
            if let Some(item) = self.line_items.get(selected) {
                let value = line_item_value(item, LineItemField::Description);
                self.editing_line_item = Some((selected, LineItemField::Description, value));
            }
        }
    }

    pub fn delete_line_item(&mut self) {
        let Some(selected) = self.line_items_list_state.selected() else {
            return;
        };
        if selected >= self.line_items.len() {
            return;
        }

        self.line_items.remove(selected);
        let selection = if self.line_items.is_empty() {
            None
        } else {
            Some(selected.min(self.line_items.len() - 1))
        };
        self.line_items_list_state.select(selection);
        self.editing_line_item = None;
    }

    /// Commit the value being typed and move to the next column of the row
    pub fn next_field_in_line_item(&mut self) {
        let Some((idx, field, value)) = self.editing_line_item.take() else {
            return;
        };
        if idx >= self.line_items.len() {
            return;
        }

        let number = match field {
            LineItemField::Description => 0.0,
            _ => match parse_number(&value) {
                Some(n) => n,
                None => {
                    self.show_error = Some(format!("Invalid {}. Please enter a number.", field.label().to_lowercase()));
                    self.editing_line_item = Some((idx, field, value));
                    return;
                }
            },
        };

        let item = &mut self.line_items[idx];
        match field {
            LineItemField::Description => item.description = value.trim().to_string(),
            LineItemField::Qty => item.qty = number,
            LineItemField::Unit => item.unit = number,
            LineItemField::Tax => {
                item.tax = number;
                self.default_item_tax = number;
            }
        }

        self.editing_line_item = field
            .next()
            .map(|next| (idx, next, line_item_value(&self.line_items[idx], next)));
    }

    pub fn move_line_item_selection(&mut self, forward: bool) {
        let i = step_selection(self.line_items_list_state.selected(), self.line_items.len(), forward);
        self.line_items_list_state.select(i);
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        match self.current_field {
            InvoiceField::IssueDate => self.issue_date.handle_input(key),
            InvoiceField::DueDate => self.due_date.handle_input(key),
            InvoiceField::LineItems => {
                if let Some((_, _, ref mut value)) = self.editing_line_item {
                    match key {
                        KeyCode::Char(c) => value.push(c),
                        KeyCode::Backspace => {
                            value.pop();
                        }
                        _ => {}
                    }
                }
            }
            _ => {
                let numeric = matches!(self.current_field, InvoiceField::TaxRate | InvoiceField::DiscountRate);
                if let Some(value) = self.text_field_mut() {
                    match key {
                        KeyCode::Char(c) if !numeric || c.is_ascii_digit() || c == '.' => value.push(c),
                        KeyCode::Backspace => {
                            value.pop();
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    fn rate(value: &str) -> Option<f64> {
        if value.trim().is_empty() {
            return Some(0.0);
        }
        parse_number(value)
    }

    /// The request as currently entered, with unparseable rates read as zero
    pub fn draft_request(&self) -> InvoiceRequest {
        let notes = self.notes.trim();

        InvoiceRequest {
            seller_contact: Contact::named(self.seller.trim()),
            buyer_contact: Contact {
                name: self.buyer.trim().to_string(),
                email: self.buyer_email.clone(),
                address: self.buyer_address.clone(),
                phone: None,
            },
            items: self.line_items.clone(),
            currency: self.currency.trim().to_uppercase(),
            issue_date: self.issue_date.date,
            due_date: self.due_date.date,
            tax_rate: Self::rate(&self.tax_rate).filter(|r| *r > 0.0),
            discount_rate: Self::rate(&self.discount_rate).filter(|r| *r > 0.0),
            status: None,
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        }
    }

    pub fn preview(&self) -> Totals {
        Totals::compute(&self.draft_request()).rounded()
    }

    /// Local checks before the request goes to the server, which validates again
    pub fn to_request(&self) -> Result<InvoiceRequest, String> {
        if self.seller.trim().is_empty() || self.buyer.trim().is_empty() {
            return Err("Seller and buyer names are required.".to_string());
        }
        let currency = self.currency.trim();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err("Currency must be a 3-letter code such as USD.".to_string());
        }
        for (label, value) in [("Tax", &self.tax_rate), ("Discount", &self.discount_rate)] {
            match Self::rate(value) {
                Some(rate) if (0.0..=100.0).contains(&rate) => {}
                _ => return Err(format!("{} rate must be a number between 0 and 100.", label)),
            }
        }
        if self.line_items.is_empty() {
            return Err("Add at least one line item.".to_string());
        }
        if self.line_items.iter().any(|item| item.description.trim().is_empty()) {
            return Err("Every line item needs a description.".to_string());
        }

        Ok(self.draft_request())
    }
}

pub enum InvoiceWizardAction {
    Cancel,
    Save(InvoiceRequest),
}

pub fn render_invoice_wizard<B: Backend>(frame: &mut Frame<B>, state: &mut InvoiceWizardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3), // Title
                Constraint::Min(12),   // Form
                Constraint::Length(3), // Help
            ]
            .as_ref(),
        )
        .split(frame.size());

    let title = Paragraph::new(format!("New invoice for {}", state.buyer))
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    render_form(frame, state, chunks[1]);

    let help_text = match (state.editing, state.current_field) {
        (false, _) => "Enter - Edit field | Up/Down - Navigate fields | S - Save invoice | Esc - Cancel",
        (true, InvoiceField::IssueDate | InvoiceField::DueDate) => {
            "Enter - Done | Left/Right - Switch date part | +/- - Move a day | Esc - Done"
        }
        (true, InvoiceField::LineItems) => {
            if state.editing_line_item.is_some() {
                "Enter/Tab - Next column | Esc - Stop editing"
            } else {
                "A - Add item | E - Edit selected | D - Delete selected | Enter - Done"
            }
        }
        (true, _) => "Enter - Save field | Esc - Stop editing",
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, chunks[2]);

    if let Some(error) = &state.show_error {
        render_error(frame, error);
    }
}

fn field_value(state: &InvoiceWizardState, field: InvoiceField) -> String {
    let active = state.editing && state.current_field == field;
    let text = |value: &str| {
        if active {
            format!("{}|", value)
        } else {
            value.to_string()
        }
    };

    match field {
        InvoiceField::Seller => text(&state.seller),
        InvoiceField::Buyer => text(&state.buyer),
        InvoiceField::Currency => text(&state.currency),
        InvoiceField::IssueDate => state.issue_date.get_display_string(),
        InvoiceField::DueDate => state.due_date.get_display_string(),
        InvoiceField::TaxRate => text(&state.tax_rate),
        InvoiceField::DiscountRate => text(&state.discount_rate),
        InvoiceField::Notes => text(&state.notes),
        InvoiceField::LineItems => format!("{} item(s)", state.line_items.len()),
    }
}

fn render_form<B: Backend>(frame: &mut Frame<B>, state: &mut InvoiceWizardState, area: Rect) {
    let form_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(FIELDS.len() as u16 + 2), Constraint::Min(6)].as_ref())
        .split(area);

    let fields: Vec<ListItem> = FIELDS
        .iter()
        .map(|field| {
            let selected = *field == state.current_field;
            let label_style = if selected {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            let value_style = if selected && state.editing {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            ListItem::new(Spans::from(vec![
                Span::styled(format!("{:<12}", field.label()), label_style),
                Span::styled(field_value(state, *field), value_style),
            ]))
        })
        .collect();

    let fields_list = List::new(fields).block(Block::default().borders(Borders::ALL).title("Invoice Details"));
    frame.render_widget(fields_list, form_chunks[0]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
        .split(form_chunks[1]);

    render_line_items(frame, state, bottom[0]);
    render_preview(frame, state, bottom[1]);
}

fn render_line_items<B: Backend>(frame: &mut Frame<B>, state: &mut InvoiceWizardState, area: Rect) {
    let selected = state.current_field == InvoiceField::LineItems;
    let line_items_block = Block::default()
        .title(if selected { "Line Items (selected)" } else { "Line Items" })
        .borders(Borders::ALL)
        .style(if selected {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        });

    if let (true, Some((idx, field, value))) = (state.editing && selected, &state.editing_line_item) {
        let inner = line_items_block.inner(area);
        frame.render_widget(line_items_block, area);

        let rows: Vec<Spans> = [
            LineItemField::Description,
            LineItemField::Qty,
            LineItemField::Unit,
            LineItemField::Tax,
        ]
        .iter()
        .map(|column| {
            let (shown, style) = if column == field {
                (
                    format!("{}|", value),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )
            } else {
                let shown = state
                    .line_items
                    .get(*idx)
                    .map(|item| line_item_value(item, *column))
                    .unwrap_or_default();
                (shown, Style::default())
            };
            Spans::from(vec![
                Span::raw(format!("{:<13}", format!("{}:", column.label()))),
                Span::styled(shown, style),
            ])
        })
        .collect();

        frame.render_widget(Paragraph::new(rows), inner);
        return;
    }

    let currency = state.currency.trim().to_uppercase();
    let items: Vec<ListItem> = if state.line_items.is_empty() {
        vec![ListItem::new("No line items added yet")]
    } else {
        state
            .line_items
            .iter()
            .map(|item| {
                ListItem::new(format!(
                    "{}: {} x {} +{}% = {}",
                    item.description,
                    trim_number(item.qty),
                    trim_number(item.unit),
                    trim_number(item.tax),
                    format_money(line_total(item), &currency),
                ))
            })
            .collect()
    };

    let list = List::new(items)
        .block(line_items_block)
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));

    frame.render_stateful_widget(list, area, &mut state.line_items_list_state);
}

fn render_preview<B: Backend>(frame: &mut Frame<B>, state: &InvoiceWizardState, area: Rect) {
    let currency = state.currency.trim().to_uppercase();
    let totals = state.preview();
    let money = |amount: f64| format_money(amount, &currency);

    let lines = vec![
        Spans::from(format!("Subtotal:  {}", money(totals.subtotal))),
        Spans::from(format!("Tax:       {}", money(totals.tax_amount))),
        Spans::from(format!("Discount: -{}", money(totals.discount_amount))),
        Spans::from(""),
        Spans::from(Span::styled(
            format!("Total:     {}", money(totals.final_total)),
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];

    let preview = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Preview"));
    frame.render_widget(preview, area);
}

pub fn handle_input(state: &mut InvoiceWizardState) -> Result<Option<InvoiceWizardAction>> {
    if let Event::Key(key) = event::read()? {
        if state.show_error.take().is_some() {
            return Ok(None);
        }
        return Ok(apply_key(state, key.code));
    }

    Ok(None)
}

fn apply_key(state: &mut InvoiceWizardState, key: KeyCode) -> Option<InvoiceWizardAction> {
    let in_items = state.current_field == InvoiceField::LineItems && state.editing;
    let browsing_items = in_items && state.editing_line_item.is_none();

    match key {
        KeyCode::Esc => {
            if state.editing {
                state.toggle_editing();
            } else {
                return Some(InvoiceWizardAction::Cancel);
            }
        }
        KeyCode::Enter | KeyCode::Tab if in_items && state.editing_line_item.is_some() => {
            state.next_field_in_line_item();
        }
        KeyCode::Enter => state.toggle_editing(),
        KeyCode::Char('s') if !state.editing => match state.to_request() {
            Ok(request) => return Some(InvoiceWizardAction::Save(request)),
            Err(message) => state.show_error = Some(message),
        },
        KeyCode::Char('a') if browsing_items => state.add_line_item(),
        KeyCode::Char('e') if browsing_items && state.line_items_list_state.selected().is_some() => {
            state.edit_line_item()
        }
        KeyCode::Char('d') if browsing_items && state.line_items_list_state.selected().is_some() => {
            state.delete_line_item()
        }
        KeyCode::Up if !state.editing => state.previous_field(),
        KeyCode::Down if !state.editing => state.next_field(),
        KeyCode::Up if browsing_items => state.move_line_item_selection(false),
        KeyCode::Down if browsing_items => state.move_line_item_selection(true),
        _ if state.editing => state.edit_current_field(key),
        _ => {}
    }

    None
}

use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode};
use tui::{
    Frame,
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
};

use crate::format::format_money;
use crate::models::{Folder, InvoiceRecord, InvoiceStatus};
use crate::ui::components::{render_footer, step_selection};

// Represents the state of the invoice table screen
pub struct InvoicesState {
    folder: Folder,
    invoices: Vec<InvoiceRecord>,
    table_state: TableState,
    pub message: Option<String>,
}

impl InvoicesState {
    pub fn new(folder: Folder, invoices: Vec<InvoiceRecord>) -> Self {
        let mut table_state = TableState::default();
        if !invoices.is_empty() {
            table_state.select(Some(0));
        }

        Self {
            folder,
            invoices,
            table_state,
            message: None,
        }
    }

    pub fn next(&mut self) {
        let i = step_selection(self.table_state.selected(), self.invoices.len(), true);
        self.table_state.select(i);
    }

    pub fn previous(&mut self) {
        let i = step_selection(self.table_state.selected(), self.invoices.len(), false);
        self.table_state.select(i);
    }

    pub fn selected_invoice(&self) -> Option<&InvoiceRecord> {
        self.table_state.selected().and_then(|i| self.invoices.get(i))
    }

    pub fn folder(&self) -> &Folder {
        &self.folder
    }

    /// Swap in a record returned by a status change, keeping the cursor where it is
    pub fn replace(&mut self, record: InvoiceRecord) {
        if let Some(existing) = self.invoices.iter_mut().find(|r| r.id == record.id) {
            *existing = record;
        }
    }

    pub fn select_id(&mut self, invoice_id: &str) {
        if let Some(i) = self.invoices.iter().position(|r| r.id == invoice_id) {
            self.table_state.select(Some(i));
        }
    }
}

pub enum InvoiceAction {
    Back,
    NewInvoice,
    ToggleStatus { id: String, status: InvoiceStatus },
    DownloadPdf(String),
    Stats,
}

fn status_cell(record: &InvoiceRecord, today: NaiveDate) -> Cell<'static> {
    match record.status {
        InvoiceStatus::Paid => Cell::from("paid").style(Style::default().fg(Color::Green)),
        InvoiceStatus::Due if record.is_overdue(today) => {
            Cell::from("overdue").style(Style::default().fg(Color::Red))
        }
        InvoiceStatus::Due => Cell::from("due"),
    }
}

pub fn render_invoices<B: Backend>(frame: &mut Frame<B>, state: &mut InvoicesState) {
    let size = frame.size();
    let today = Local::now().date_naive();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(4)].as_ref())
        .split(size);

    let header_cells = ["Number", "Buyer", "Issued", "Due", "Total", "Status"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let rows = state.invoices.iter().map(|invoice| {
        Row::new(vec![
            Cell::from(invoice.id.clone()),
            Cell::from(invoice.buyer.clone()),
            Cell::from(invoice.issue_date.format("%Y-%m-%d").to_string()),
            Cell::from(invoice.due_date.format("%Y-%m-%d").to_string()),
            Cell::from(format_money(invoice.total, &invoice.currency)),
            status_cell(invoice, today),
        ])
        .height(1)
    });

    let title = format!("Invoices for {}", state.folder.name);
    let table = Table::new(rows)
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .widths(&[
            Constraint::Percentage(22),
            Constraint::Percentage(22),
            Constraint::Percentage(13),
            Constraint::Percentage(13),
            Constraint::Percentage(18),
            Constraint::Percentage(12),
        ]);

    frame.render_stateful_widget(table, chunks[0], &mut state.table_state);

    let hints = if state.selected_invoice().is_some() {
        "<N> New Invoice | <P> Toggle Paid | <D> Save PDF | <T> Stats | <Esc> Back"
    } else {
        "<N> New Invoice | <T> Stats | <Esc> Back"
    };
    render_footer(frame, chunks[1], hints, state.message.as_deref());
}

pub fn handle_input(state: &mut InvoicesState) -> Result<Option<InvoiceAction>> {
    if let Event::Key(key) = event::read()? {
        state.message = None;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(Some(InvoiceAction::Back)),
            KeyCode::Char('n') => return Ok(Some(InvoiceAction::NewInvoice)),
            KeyCode::Char('t') => return Ok(Some(InvoiceAction::Stats)),
            KeyCode::Char('p') => {
                if let Some(invoice) = state.selected_invoice() {
                    return Ok(Some(InvoiceAction::ToggleStatus {
                        id: invoice.id.clone(),
                        status: invoice.status.toggled(),
                    }));
                }
            }
            KeyCode::Char('d') => {
                if let Some(invoice) = state.selected_invoice() {
                    return Ok(Some(InvoiceAction::DownloadPdf(invoice.id.clone())));
                }
            }
            KeyCode::Down => state.next(),
            KeyCode::Up => state.previous(),
            _ => {}
        }
    }
    Ok(None)
}

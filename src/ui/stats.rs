use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    Frame,
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};

use crate::format::format_money;
use crate::models::RevenueStats;
use crate::ui::components::render_footer;

pub struct StatsState {
    title: String,
    stats: RevenueStats,
}

impl StatsState {
    pub fn new(title: impl Into<String>, stats: RevenueStats) -> Self {
        Self {
            title: title.into(),
            stats,
        }
    }
}

pub enum StatsAction {
    Back,
}

fn summary_lines(stats: &RevenueStats) -> Vec<Spans<'static>> {
    let count = |label: &str, value: usize, color: Color| {
        Spans::from(vec![
            Span::raw(format!("{:<10}", label)),
            Span::styled(value.to_string(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
        ])
    };

    vec![
        count("Invoices", stats.invoice_count, Color::White),
        count("Paid", stats.paid_count, Color::Green),
        count("Due", stats.due_count, Color::Yellow),
        count("Overdue", stats.overdue_count, Color::Red),
    ]
}

pub fn render_stats<B: Backend>(frame: &mut Frame<B>, state: &StatsState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(3), Constraint::Length(2)].as_ref())
        .split(frame.size());

    let summary = Paragraph::new(summary_lines(&state.stats))
        .block(Block::default().title(format!("Stats: {}", state.title)).borders(Borders::ALL));
    frame.render_widget(summary, chunks[0]);

    let header = Row::new(
        ["Currency", "Invoiced", "Paid", "Outstanding", "Overdue"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow))),
    )
    .bottom_margin(1);

    let rows = state.stats.by_currency.iter().map(|(currency, totals)| {
        Row::new(vec![
            Cell::from(currency.clone()),
            Cell::from(format_money(totals.invoiced, currency)),
            Cell::from(format_money(totals.paid, currency)),
            Cell::from(format_money(totals.outstanding, currency)),
            Cell::from(format_money(totals.overdue, currency)).style(if totals.overdue > 0.0 {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            }),
        ])
    });

    let table = Table::new(rows)
        .header(header)
        .block(Block::default().title("By currency").borders(Borders::ALL))
        .widths(&[
            Constraint::Percentage(12),
            Constraint::Percentage(22),
            Constraint::Percentage(22),
            Constraint::Percentage(22),
            Constraint::Percentage(22),
        ]);
    frame.render_widget(table, chunks[1]);

    render_footer(frame, chunks[2], "<Esc> Back", None);
}

pub fn handle_input(_state: &mut StatsState) -> Result<Option<StatsAction>> {
    if let Event::Key(key) = event::read()? {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter) {
            return Ok(Some(StatsAction::Back));
        }
    }
    Ok(None)
}

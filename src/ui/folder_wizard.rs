use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    Frame,
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use crate::models::NewFolder;
use crate::ui::components::render_error;

pub enum FolderWizardAction {
    Cancel,
    Save(NewFolder),
}

#[derive(Clone, PartialEq, Copy)]
pub enum FolderField {
    Name,
    Email,
    Address,
}

pub struct FolderWizardState {
    pub name: String,
    pub email: String,
    pub address: String,
    pub current_field: FolderField,
    pub editing: bool,
    pub error: Option<String>,
}

impl FolderWizardState {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            address: String::new(),
            current_field: FolderField::Name,
            editing: false,
            error: None,
        }
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            FolderField::Name => FolderField::Email,
            FolderField::Email => FolderField::Address,
            FolderField::Address => FolderField::Name,
        };
    }

    pub fn previous_field(&mut self) {
        self.current_field = match self.current_field {
            FolderField::Name => FolderField::Address,
            FolderField::Email => FolderField::Name,
            FolderField::Address => FolderField::Email,
        };
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        let field_value = match self.current_field {
            FolderField::Name => &mut self.name,
            FolderField::Email => &mut self.email,
            FolderField::Address => &mut self.address,
        };

        match key {
            KeyCode::Char(c) => field_value.push(c),
            KeyCode::Backspace => {
                field_value.pop();
            }
            _ => {}
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Blank optional fields are sent as absent
    pub fn to_new_folder(&self) -> NewFolder {
        let optional = |value: &str| {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        NewFolder {
            name: self.name.trim().to_string(),
            email: optional(&self.email),
            address: optional(&self.address),
        }
    }
}

impl Default for FolderWizardState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render_folder_wizard<B: Backend>(f: &mut Frame<B>, state: &mut FolderWizardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(3)].as_ref())
        .split(f.size());

    let title = Paragraph::new("New Folder")
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_form(f, state, chunks[1]);

    let help_text = if state.editing {
        "Enter - Save field | Esc - Cancel editing"
    } else {
        "Enter - Edit field | Up/Down - Navigate fields | S - Save folder | Esc - Cancel"
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);

    if let Some(error) = &state.error {
        render_error(f, error);
    }
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &FolderWizardState, area: Rect) {
    let fields = [
        (FolderField::Name, "Name", &state.name),
        (FolderField::Email, "Email", &state.email),
        (FolderField::Address, "Address", &state.address),
    ];

    let items: Vec<ListItem> = fields
        .iter()
        .map(|(field, name, value)| {
            let selected = *field == state.current_field;
            let label_style = if selected {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };

            let content = if selected && state.editing {
                Spans::from(vec![
                    Span::styled(format!("{}: ", name), label_style),
                    Span::styled(format!("{}|", value), Style::default().add_modifier(Modifier::BOLD)),
                ])
            } else {
                Spans::from(vec![
                    Span::styled(format!("{}: ", name), label_style),
                    Span::raw(value.as_str()),
                ])
            };

            ListItem::new(content)
        })
        .collect();

    let form_list = List::new(items).block(Block::default().borders(Borders::ALL).title("Folder Details"));

    f.render_widget(form_list, area);
}

pub fn handle_input(state: &mut FolderWizardState) -> Result<Option<FolderWizardAction>> {
    if let Event::Key(key) = event::read()? {
        if state.error.take().is_some() {
            return Ok(None);
        }

        match key.code {
            KeyCode::Esc => {
                if state.editing {
                    state.toggle_editing();
                } else {
                    return Ok(Some(FolderWizardAction::Cancel));
                }
            }
            KeyCode::Enter => state.toggle_editing(),
            KeyCode::Up if !state.editing => state.previous_field(),
            KeyCode::Down if !state.editing => state.next_field(),
            KeyCode::Char('s') if !state.editing => {
                if state.is_valid() {
                    return Ok(Some(FolderWizardAction::Save(state.to_new_folder())));
                }
                state.error = Some("A folder needs a name.".to_string());
            }
            _ if state.editing => state.edit_current_field(key.code),
            _ => {}
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(state: &mut FolderWizardState, text: &str) {
        for c in text.chars() {
            state.edit_current_field(KeyCode::Char(c));
        }
    }

    #[test]
    fn builds_folder_from_fields() {
        let mut state = FolderWizardState::new();
        state.toggle_editing();
        type_text(&mut state, " Acme Corp ");
        state.toggle_editing();
        state.next_field();
        state.toggle_editing();
        type_text(&mut state, "billing@acme.test");

        let folder = state.to_new_folder();
        assert_eq!(folder.name, "Acme Corp");
        assert_eq!(folder.email.as_deref(), Some("billing@acme.test"));
        assert_eq!(folder.address, None);
    }

    #[test]
    fn typing_requires_edit_mode() {
        let mut state = FolderWizardState::new();
        type_text(&mut state, "ignored");
        assert!(state.name.is_empty());
        assert!(!state.is_valid());
    }

    #[test]
    fn backspace_and_field_cycle() {
        let mut state = FolderWizardState::new();
        state.previous_field();
        assert!(state.current_field == FolderField::Address);
        state.toggle_editing();
        type_text(&mut state, "Main St");
        state.edit_current_field(KeyCode::Backspace);
        assert_eq!(state.address, "Main S");
    }
}

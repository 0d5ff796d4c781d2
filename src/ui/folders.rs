use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    Frame,
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState},
};

use crate::models::Folder;
use crate::ui::components::{render_footer, step_selection};

// Represents the state of the folder selection screen
pub struct FoldersState {
    user_name: String,
    folders: Vec<Folder>,
    list_state: ListState,
    pub message: Option<String>,
}

impl FoldersState {
    pub fn new(user_name: String, folders: Vec<Folder>) -> Self {
        let mut list_state = ListState::default();
        if !folders.is_empty() {
            list_state.select(Some(0));
        }

        Self {
            user_name,
            folders,
            list_state,
            message: None,
        }
    }

    pub fn next(&mut self) {
        let i = step_selection(self.list_state.selected(), self.folders.len(), true);
        self.list_state.select(i);
    }

    pub fn previous(&mut self) {
        let i = step_selection(self.list_state.selected(), self.folders.len(), false);
        self.list_state.select(i);
    }

    pub fn selected_folder(&self) -> Option<&Folder> {
        self.list_state.selected().and_then(|i| self.folders.get(i))
    }

    /// Keep the cursor on `folder_id` after a reload
    pub fn select_id(&mut self, folder_id: &str) {
        if let Some(i) = self.folders.iter().position(|f| f.id == folder_id) {
            self.list_state.select(Some(i));
        }
    }
}

pub enum FolderAction {
    Quit,
    NewFolder,
    OpenFolder(Folder),
    Stats,
}

pub fn render_folders<B: Backend>(frame: &mut Frame<B>, state: &mut FoldersState) {
    let size = frame.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(4)].as_ref())
        .split(size);

    let items: Vec<ListItem> = state
        .folders
        .iter()
        .map(|folder| {
            let mut spans = vec![Span::raw(folder.name.clone())];
            if let Some(email) = &folder.email {
                spans.push(Span::styled(format!("  <{}>", email), Style::default().fg(Color::DarkGray)));
            }
            ListItem::new(Spans::from(spans))
        })
        .collect();

    let title = format!("Folders ({})", state.user_name);
    let folders_list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(folders_list, chunks[0], &mut state.list_state);

    let hints = if state.selected_folder().is_some() {
        "<N> New Folder | <Enter> View Invoices | <T> Stats | <Q> Quit"
    } else {
        "<N> New Folder | <T> Stats | <Q> Quit"
    };
    render_footer(frame, chunks[1], hints, state.message.as_deref());
}

pub fn handle_input(state: &mut FoldersState) -> Result<Option<FolderAction>> {
    if let Event::Key(key) = event::read()? {
        state.message = None;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(Some(FolderAction::Quit)),
            KeyCode::Char('n') => return Ok(Some(FolderAction::NewFolder)),
            KeyCode::Char('t') => return Ok(Some(FolderAction::Stats)),
            KeyCode::Down => state.next(),
            KeyCode::Up => state.previous(),
            KeyCode::Enter => {
                if let Some(folder) = state.selected_folder() {
                    return Ok(Some(FolderAction::OpenFolder(folder.clone())));
                }
            }
            _ => {}
        }
    }
    Ok(None)
}

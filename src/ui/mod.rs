//! Terminal interface that drives the HTTP API.

mod components;
mod folder_wizard;
mod folders;
mod invoice_wizard;
mod invoices;
mod stats;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};

use crate::client::ApiClient;
use crate::invoice_gen::write_pdf;
use crate::models::{Folder, User};

use self::{
    folder_wizard::{FolderWizardAction, FolderWizardState, handle_input as handle_folder_wizard_input, render_folder_wizard},
    folders::{FolderAction, FoldersState, handle_input as handle_folders_input, render_folders},
    invoice_wizard::{
        InvoiceWizardAction, InvoiceWizardState, handle_input as handle_invoice_wizard_input, render_invoice_wizard,
    },
    invoices::{InvoiceAction, InvoicesState, handle_input as handle_invoices_input, render_invoices},
    stats::{StatsAction, StatsState, handle_input as handle_stats_input, render_stats},
};

// Represents the current screen in the app
#[derive(Clone, Copy, PartialEq)]
enum AppScreen {
    Folders,
    FolderWizard,
    Invoices,
    InvoiceWizard,
    Stats(StatsOrigin),
}

// Where the stats screen returns to
#[derive(Clone, Copy, PartialEq)]
enum StatsOrigin {
    Folders,
    Invoices,
}

struct AppState {
    client: ApiClient,
    user: User,
    out_dir: PathBuf,
    screen: AppScreen,
    folders_state: FoldersState,
    folder_wizard_state: Option<FolderWizardState>,
    invoices_state: Option<InvoicesState>,
    invoice_wizard_state: Option<InvoiceWizardState>,
    stats_state: Option<StatsState>,
}

impl AppState {
    fn new(client: ApiClient, user: User, out_dir: PathBuf, folders: Vec<Folder>) -> Self {
        let folders_state = FoldersState::new(user.name.clone(), folders);
        Self {
            client,
            user,
            out_dir,
            screen: AppScreen::Folders,
            folders_state,
            folder_wizard_state: None,
            invoices_state: None,
            invoice_wizard_state: None,
            stats_state: None,
        }
    }
}

/// Run the interactive interface until the user quits
pub async fn run(client: ApiClient, out_dir: PathBuf) -> Result<()> {
    // Fail before touching the terminal if the API or token is unusable
    let user = client.me().await?;
    let folders = client.list_folders().await?;

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app_state = AppState::new(client, user, out_dir, folders);
    let result = run_app(&mut terminal, &mut app_state).await;

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app_state: &mut AppState) -> Result<()> {
    loop {
        terminal.draw(|f| match app_state.screen {
            AppScreen::Folders => render_folders(f, &mut app_state.folders_state),
            AppScreen::FolderWizard => {
                if let Some(state) = &mut app_state.folder_wizard_state {
                    render_folder_wizard(f, state);
                }
            }
            AppScreen::Invoices => {
                if let Some(state) = &mut app_state.invoices_state {
                    render_invoices(f, state);
                }
            }
            AppScreen::InvoiceWizard => {
                if let Some(state) = &mut app_state.invoice_wizard_state {
                    render_invoice_wizard(f, state);
                }
            }
            AppScreen::Stats(_) => {
                if let Some(state) = &app_state.stats_state {
                    render_stats(f, state);
                }
            }
        })?;

        let should_quit = match app_state.screen {
            AppScreen::Folders => handle_folders_screen(app_state).await?,
            AppScreen::FolderWizard => handle_folder_wizard_screen(app_state).await?,
            AppScreen::Invoices => handle_invoices_screen(app_state).await?,
            AppScreen::InvoiceWizard => handle_invoice_wizard_screen(app_state).await?,
            AppScreen::Stats(origin) => handle_stats_screen(app_state, origin)?,
        };

        if should_quit {
            break;
        }
    }

    Ok(())
}

async fn reload_folders(app_state: &mut AppState, select: Option<&str>) {
    match app_state.client.list_folders().await {
        Ok(folders) => {
            app_state.folders_state = FoldersState::new(app_state.user.name.clone(), folders);
            if let Some(id) = select {
                app_state.folders_state.select_id(id);
            }
        }
        Err(e) => app_state.folders_state.message = Some(e.to_string()),
    }
    app_state.screen = AppScreen::Folders;
}

async fn open_folder(app_state: &mut AppState, folder: Folder, select: Option<&str>) -> bool {
    match app_state.client.list_folder_invoices(&folder.id).await {
        Ok(invoices) => {
            let mut state = InvoicesState::new(folder, invoices);
            if let Some(id) = select {
                state.select_id(id);
            }
            app_state.invoices_state = Some(state);
            app_state.screen = AppScreen::Invoices;
            true
        }
        Err(e) => {
            app_state.folders_state.message = Some(format!("Could not load invoices: {}", e));
            false
        }
    }
}

async fn handle_folders_screen(app_state: &mut AppState) -> Result<bool> {
    match handle_folders_input(&mut app_state.folders_state)? {
        Some(FolderAction::Quit) => return Ok(true),
        Some(FolderAction::NewFolder) => {
            app_state.folder_wizard_state = Some(FolderWizardState::new());
            app_state.screen = AppScreen::FolderWizard;
        }
        Some(FolderAction::OpenFolder(folder)) => {
            open_folder(app_state, folder, None).await;
        }
        Some(FolderAction::Stats) => match app_state.client.stats(None).await {
            Ok(stats) => {
                app_state.stats_state = Some(StatsState::new("all folders", stats));
                app_state.screen = AppScreen::Stats(StatsOrigin::Folders);
            }
            Err(e) => app_state.folders_state.message = Some(e.to_string()),
        },
        None => {}
    }

    Ok(false)
}

async fn handle_folder_wizard_screen(app_state: &mut AppState) -> Result<bool> {
    let Some(state) = &mut app_state.folder_wizard_state else {
        return Ok(false);
    };

    match handle_folder_wizard_input(state)? {
        Some(FolderWizardAction::Cancel) => reload_folders(app_state, None).await,
        Some(FolderWizardAction::Save(new_folder)) => match app_state.client.create_folder(&new_folder).await {
            Ok(folder) => {
                tracing::debug!(folder_id = %folder.id, "Created folder");
                reload_folders(app_state, Some(&folder.id)).await;
            }
            Err(e) => state.error = Some(e.to_string()),
        },
        None => {}
    }

    Ok(false)
}

async fn handle_invoices_screen(app_state: &mut AppState) -> Result<bool> {
    let Some(state) = &mut app_state.invoices_state else {
        return Ok(false);
    };

    match handle_invoices_input(state)? {
        Some(InvoiceAction::Back) => {
            let folder_id = state.folder().id.clone();
            reload_folders(app_state, Some(&folder_id)).await;
        }
        Some(InvoiceAction::NewInvoice) => {
            let today = Local::now().date_naive();
            let defaults = app_state.client.quick_defaults();
            app_state.invoice_wizard_state =
                Some(InvoiceWizardState::new(state.folder(), &app_state.user.name, defaults, today));
            app_state.screen = AppScreen::InvoiceWizard;
        }
        Some(InvoiceAction::ToggleStatus { id, status }) => match app_state.client.update_status(&id, status).await {
            Ok(record) => {
                state.message = Some(format!("{} marked {}", record.id, record.status));
                state.replace(record);
            }
            Err(e) => state.message = Some(e.to_string()),
        },
        Some(InvoiceAction::DownloadPdf(id)) => {
            state.message = Some(match app_state.client.download_pdf(&id).await {
                Ok(bytes) => match write_pdf(&app_state.out_dir, &id, &bytes) {
                    Ok(path) => format!("Saved {}", path.display()),
                    Err(e) => format!("Could not write PDF: {}", e),
                },
                Err(e) => e.to_string(),
            });
        }
        Some(InvoiceAction::Stats) => {
            let folder = state.folder().clone();
            match app_state.client.stats(Some(&folder.id)).await {
                Ok(stats) => {
                    app_state.stats_state = Some(StatsState::new(folder.name, stats));
                    app_state.screen = AppScreen::Stats(StatsOrigin::Invoices);
                }
                Err(e) => state.message = Some(e.to_string()),
            }
        }
        None => {}
    }

    Ok(false)
}

async fn handle_invoice_wizard_screen(app_state: &mut AppState) -> Result<bool> {
    let Some(state) = &mut app_state.invoice_wizard_state else {
        return Ok(false);
    };

    match handle_invoice_wizard_input(state)? {
        Some(InvoiceWizardAction::Cancel) => {
            app_state.invoice_wizard_state = None;
            app_state.screen = AppScreen::Invoices;
        }
        Some(InvoiceWizardAction::Save(request)) => {
            match app_state.client.create_invoice(state.folder_id(), &request).await {
                Ok(created) => {
                    let id = created.invoice.id.clone();
                    tracing::debug!(invoice_id = %id, "Created invoice");
                    app_state.invoice_wizard_state = None;

                    if let Some(folder) = app_state.invoices_state.as_ref().map(|s| s.folder().clone()) {
                        if open_folder(app_state, folder, Some(&id)).await {
                            if let Some(invoices) = &mut app_state.invoices_state {
                                invoices.message = Some(format!("Created {}", id));
                            }
                        }
                    }
                }
                Err(e) => state.set_error(e.to_string()),
            }
        }
        None => {}
    }

    Ok(false)
}

fn handle_stats_screen(app_state: &mut AppState, origin: StatsOrigin) -> Result<bool> {
    if let Some(state) = &mut app_state.stats_state {
        if let Some(StatsAction::Back) = handle_stats_input(state)? {
            app_state.stats_state = None;
            app_state.screen = match origin {
                StatsOrigin::Folders => AppScreen::Folders,
                StatsOrigin::Invoices => AppScreen::Invoices,
            };
        }
    }

    Ok(false)
}

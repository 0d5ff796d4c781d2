use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use invoicer::client::ApiClient;
use invoicer::config::{CliConfig, ServerConfig};
use invoicer::format::format_money;
use invoicer::invoice_gen::write_pdf;
use invoicer::models::InvoiceStatus;
use invoicer::services::SearchQuery;
use invoicer::{api, db, observability, ui};

#[derive(Parser)]
#[command(name = "invoicer", version, about = "Invoices for folders of clients, over HTTP or in the terminal")]
struct Cli {
    /// Client config file (defaults to $INVOICER_CONFIG or ~/.invoicer.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// Manage API tokens (talks to the database directly)
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Interactive terminal interface
    Ui {
        /// Where downloaded PDFs are written
        #[arg(long, default_value = "invoices")]
        out_dir: PathBuf,
    },
    /// List folders
    Folders,
    /// List invoices
    Invoices {
        #[arg(long)]
        status: Option<InvoiceStatus>,
        /// Case-insensitive match on id, buyer or seller
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        folder: Option<String>,
    },
    /// Set an invoice's status
    Mark { id: String, status: InvoiceStatus },
    /// Download an invoice as PDF
    Pdf {
        id: String,
        #[arg(long, default_value = "invoices")]
        out_dir: PathBuf,
    },
    /// Revenue statistics
    Stats {
        #[arg(long)]
        folder: Option<String>,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Create the user if needed and print a new bearer token
    Issue {
        #[arg(long)]
        user: String,
        /// Display name, defaults to the user id
        #[arg(long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => {
            let config = ServerConfig::load()?;
            observability::init_tracing(&config.log_level);
            api::serve(&config).await
        }
        Command::Token { action } => {
            let config = ServerConfig::load()?;
            observability::init_tracing(&config.log_level);
            run_token(&config, action).await
        }
        Command::Ui { out_dir } => {
            // No subscriber here: log lines would corrupt the alternate screen
            let config = CliConfig::load(cli.config.as_deref())?;
            let client = ApiClient::new(&config)?;
            ui::run(client, out_dir).await
        }
        Command::Folders => {
            let client = connect(cli.config)?;
            list_folders(&client).await
        }
        Command::Invoices { status, query, folder } => {
            let client = connect(cli.config)?;
            let query = SearchQuery { folder, status, q: query };
            list_invoices(&client, &query).await
        }
        Command::Mark { id, status } => {
            let client = connect(cli.config)?;
            let record = client.update_status(&id, status).await?;
            println!("{} is now {}", record.id, record.status);
            Ok(())
        }
        Command::Pdf { id, out_dir } => {
            let client = connect(cli.config)?;
            let bytes = client.download_pdf(&id).await?;
            let path = write_pdf(&out_dir, &id, &bytes)?;
            println!("Saved {}", path.display());
            Ok(())
        }
        Command::Stats { folder } => {
            let client = connect(cli.config)?;
            print_stats(&client, folder.as_deref()).await
        }
    }
}

/// Client for the scripted commands; only warnings are logged
fn connect(config_path: Option<PathBuf>) -> Result<ApiClient> {
    observability::init_tracing("warn");
    let config = CliConfig::load(config_path.as_deref())?;
    Ok(ApiClient::new(&config)?)
}

async fn run_token(config: &ServerConfig, action: TokenAction) -> Result<()> {
    match action {
        TokenAction::Issue { user, name } => {
            let db = db::init(config).await?;
            let name = name.unwrap_or_else(|| user.clone());
            db.ensure_user(&user, &name).await?;
            let token = db.issue_token(&user).await?;
            tracing::info!(user_id = %user, "Issued API token");
            println!("{}", token);
        }
    }
    Ok(())
}

async fn list_folders(client: &ApiClient) -> Result<()> {
    for folder in client.list_folders().await? {
        println!("{}  {}", folder.id, folder.name);
    }
    Ok(())
}

async fn list_invoices(client: &ApiClient, query: &SearchQuery) -> Result<()> {
    let invoices = client.search_invoices(query).await?;
    if invoices.is_empty() {
        println!("No invoices found");
    }
    for invoice in invoices {
        println!(
            "{:<24} {:<24} {:>14} {:<5} due {}",
            invoice.id,
            invoice.buyer,
            format_money(invoice.total, &invoice.currency),
            invoice.status,
            invoice.due_date.format("%Y-%m-%d"),
        );
    }
    Ok(())
}

async fn print_stats(client: &ApiClient, folder: Option<&str>) -> Result<()> {
    let stats = client.stats(folder).await?;
    println!(
        "{} invoices: {} paid, {} due ({} overdue)",
        stats.invoice_count, stats.paid_count, stats.due_count, stats.overdue_count
    );
    for (currency, totals) in &stats.by_currency {
        println!(
            "{}: invoiced {}, paid {}, outstanding {}, overdue {}",
            currency,
            format_money(totals.invoiced, currency),
            format_money(totals.paid, currency),
            format_money(totals.outstanding, currency),
            format_money(totals.overdue, currency),
        );
    }
    Ok(())
}

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use shelf_app::modules::catalog::defaults::DDC_CATEGORIES;
use shelf_app::modules::catalog::models::{Book, NewRequestForm};
use shelf_app::modules::catalog::query::{CatalogQuery, DdcFilter, SortKey, SortOrder};
use shelf_app::modules::catalog::CatalogServices;
use shelf_kernel::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "shelf", version, about = "Community library catalog")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API until interrupted
    Serve,
    #[command(flatten)]
    Catalog(CatalogCommand),
}

/// One-shot operations against the local catalog.
#[derive(Debug, Subcommand)]
enum CatalogCommand {
    /// List books, optionally searched, filtered, and sorted
    Books {
        #[arg(long, default_value = "")]
        search: String,
        /// DDC group such as 600, or All
        #[arg(long, default_value = "All")]
        ddc: DdcFilter,
        #[arg(long, value_enum, default_value_t = SortField::Title)]
        sort_by: SortField,
        #[arg(long, value_enum, default_value_t = Direction::Asc)]
        order: Direction,
        /// Only featured books, in list order
        #[arg(long)]
        featured: bool,
    },
    /// Print the ten DDC groups
    Categories,
    /// Record a book request
    Request {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        requester: String,
    },
    /// Write a JSON backup of books and requests
    Export {
        /// Defaults to stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Restore the bundled book list; requests are kept
    Reset,
    /// Ask the remote library to refresh, then reload the catalog
    Sync,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortField {
    Title,
    Author,
    Ddc,
}

impl From<SortField> for SortKey {
    fn from(field: SortField) -> Self {
        match field {
            SortField::Title => SortKey::Title,
            SortField::Author => SortKey::Author,
            SortField::Ddc => SortKey::Ddc,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Direction {
    Asc,
    Desc,
}

impl From<Direction> for SortOrder {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Asc => SortOrder::Asc,
            Direction::Desc => SortOrder::Desc,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().with_context(|| "failed to load shelf settings")?;
    shelf_telemetry::init_with_writer(&settings.telemetry, std::io::stderr)?;

    tracing::debug!(env = ?settings.environment, command = ?cli.command, "shelf cli starting");

    match cli.command {
        Command::Serve => shelf_app::serve(settings).await,
        Command::Catalog(command) => {
            let services = CatalogServices::from_settings(&settings)?;
            services
                .load()
                .await
                .context("failed to load the catalog")?;
            run(command, &services).await
        }
    }
}

async fn run(command: CatalogCommand, services: &CatalogServices) -> anyhow::Result<()> {
    match command {
        CatalogCommand::Books {
            search,
            ddc,
            sort_by,
            order,
            featured,
        } => {
            let session = services.session.read().await;
            let books = if featured {
                session.featured()
            } else {
                session.list(&CatalogQuery {
                    search,
                    ddc,
                    sort_by: sort_by.into(),
                    order: order.into(),
                })
            };
            for book in books {
                println!("{}", book_line(book));
            }
        }
        CatalogCommand::Categories => {
            for category in &DDC_CATEGORIES {
                println!("{}\t{}", category.code, category.label);
            }
        }
        CatalogCommand::Request {
            title,
            author,
            requester,
        } => {
            let form = NewRequestForm {
                title,
                author,
                requester,
            };
            let missing = form.missing_fields();
            if !missing.is_empty() {
                bail!("required fields are blank: {}", missing.join(", "));
            }
            let request = services.session.write().await.add_request(form)?;
            println!("{}\t{}", request.id, request.date);
        }
        CatalogCommand::Export { output } => {
            let document = services.session.read().await.export();
            let json = serde_json::to_string_pretty(&document)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), "backup written");
                }
                None => println!("{json}"),
            }
        }
        CatalogCommand::Reset => {
            let mut session = services.session.write().await;
            session.reset_catalog()?;
            println!("{} books restored", session.books().len());
        }
        CatalogCommand::Sync => {
            services.resync().await?;
            let session = services.session.read().await;
            println!(
                "{} books, {} requests",
                session.books().len(),
                session.requests().len()
            );
        }
    }
    Ok(())
}

fn book_line(book: &Book) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        book.id, book.ddc, book.title, book.author, book.status
    )
}

//! Command-line host for the library core.
//!
//! # Responsibility
//! - Map each catalog/registry/circulation operation onto a subcommand.
//! - Print results as JSON on stdout and failures as JSON on stderr.
//! - Translate error kinds into stable process exit codes.
//!
//! # Invariants
//! - No business rule lives here; every decision is made by `library_core`.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use library_core::db::DbError;
use library_core::{
    flush_logging, init_logging, BookUpdate, BorrowRequest, BorrowerInput, CatalogService,
    CirculationService, ConfigError, ErrorKind, LibraryConfig, LoggingError, NewBook,
    RegistryService, RepoError, ServiceError, SqliteBookRepository, SqliteBorrowerRepository,
    SqliteCirculationRepository,
};
use log::warn;
use serde::Serialize;
use serde_json::{json, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "library")]
#[command(about = "Small-library catalog, borrower registry and circulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Store file; overrides LIBRARY_DB_PATH
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage catalog entries
    #[command(subcommand)]
    Book(BookCommand),

    /// Manage registered borrowers
    #[command(subcommand)]
    Borrower(BorrowerCommand),

    #[command(flatten)]
    Circulation(CirculationCommand),

    /// Check that the core is linked and the store opens
    Ping,
}

#[derive(Subcommand)]
enum CirculationCommand {
    /// Lend one copy of a book to a borrower
    Borrow {
        #[arg(long)]
        book: i64,

        #[arg(long)]
        borrower: i64,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
    },

    /// Close an open borrow record and restore the copy
    Return { record: i64 },

    /// List a borrower's open loans, newest first
    Active { borrower: i64 },

    /// List every borrow record of a book
    History { book: i64 },

    /// Show one borrow record
    Record { record: i64 },
}

#[derive(Subcommand)]
enum BookCommand {
    /// Add a book; all copies start available
    Add {
        #[arg(long)]
        title: String,

        #[arg(long)]
        author: String,

        #[arg(long)]
        isbn: Option<String>,

        #[arg(long)]
        quantity: Option<i64>,
    },
    Get {
        id: i64,
    },
    /// Replace title, author and quantity
    Update {
        id: i64,

        #[command(flatten)]
        fields: BookFields,
    },
    Delete {
        id: i64,
    },
    List,
}

#[derive(Args)]
struct BookFields {
    #[arg(long)]
    title: String,

    #[arg(long)]
    author: String,

    #[arg(long)]
    quantity: i64,
}

#[derive(Subcommand)]
enum BorrowerCommand {
    Add {
        #[command(flatten)]
        fields: BorrowerFields,
    },
    Get {
        id: i64,
    },
    /// Replace name, email and phone
    Update {
        id: i64,

        #[command(flatten)]
        fields: BorrowerFields,
    },
    Delete {
        id: i64,
    },
    List,
}

#[derive(Args)]
struct BorrowerFields {
    #[arg(long)]
    name: String,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    phone: Option<String>,
}

impl BorrowerFields {
    fn into_input(self) -> BorrowerInput {
        BorrowerInput {
            name: self.name,
            email: self.email,
            phone: self.phone,
        }
    }
}

#[derive(Debug)]
enum CliError {
    Config(ConfigError),
    Logging(LoggingError),
    Service(ServiceError),
    Output(serde_json::Error),
}

impl CliError {
    fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Service(err) => Some(err.kind()),
            _ => None,
        }
    }

    fn exit_code(&self) -> u8 {
        match self.kind() {
            Some(kind) => exit_code_for(kind),
            None => 1,
        }
    }
}

/// Stable per kind; 0 stays reserved for success.
fn exit_code_for(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Validation => 2,
        ErrorKind::Conflict => 3,
        ErrorKind::NotFound => 4,
        ErrorKind::Unavailable => 5,
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Service(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "cannot encode output: {err}"),
        }
    }
}

impl Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<ServiceError> for CliError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Service(value.into())
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::from(RepoError::from(value))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let outcome = run(cli);
    flush_logging();

    match outcome {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let kind = err.kind().map_or("internal", ErrorKind::as_str);
            eprintln!("{}", json!({ "error": kind, "message": err.to_string() }));
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<String, CliError> {
    let mut config = LibraryConfig::from_env()?;
    let overridden = cli.db.and_then(|path| config.db_path.replace(path));
    if let Some(log) = &config.log {
        init_logging(log)?;
    }
    if let (Some(env_path), Some(db_path)) = (&overridden, &config.db_path) {
        warn!(
            "event=db_override module=cli status=ok env_path={} db_path={}",
            env_path.display(),
            db_path.display()
        );
    }

    let conn = config.open_store()?;
    let value = match cli.command {
        Commands::Book(command) => {
            let catalog = CatalogService::new(SqliteBookRepository::try_new(&conn)?);
            run_book(&catalog, command)?
        }
        Commands::Borrower(command) => {
            let registry = RegistryService::new(SqliteBorrowerRepository::try_new(&conn)?);
            run_borrower(&registry, command)?
        }
        Commands::Circulation(command) => {
            let circulation =
                CirculationService::new(SqliteCirculationRepository::try_new(&conn)?);
            run_circulation(&circulation, command)?
        }
        Commands::Ping => json!({
            "ping": library_core::ping(),
            "version": library_core::core_version(),
        }),
    };

    Ok(serde_json::to_string_pretty(&value)?)
}

fn run_book(
    catalog: &CatalogService<SqliteBookRepository<'_>>,
    command: BookCommand,
) -> Result<Value, CliError> {
    match command {
        BookCommand::Add {
            title,
            author,
            isbn,
            quantity,
        } => {
            let book = NewBook {
                title,
                author,
                isbn,
                quantity,
            };
            to_json(catalog.add_book(book)?)
        }
        BookCommand::Get { id } => to_json(catalog.get_book(id)?),
        BookCommand::Update { id, fields } => {
            let update = BookUpdate::new(fields.title, fields.author, fields.quantity);
            to_json(catalog.update_book(id, update)?)
        }
        BookCommand::Delete { id } => {
            catalog.delete_book(id)?;
            Ok(json!({ "deleted": id }))
        }
        BookCommand::List => to_json(catalog.list_books()?),
    }
}

fn run_borrower(
    registry: &RegistryService<SqliteBorrowerRepository<'_>>,
    command: BorrowerCommand,
) -> Result<Value, CliError> {
    match command {
        BorrowerCommand::Add { fields } => to_json(registry.add_borrower(fields.into_input())?),
        BorrowerCommand::Get { id } => to_json(registry.get_borrower(id)?),
        BorrowerCommand::Update { id, fields } => {
            to_json(registry.update_borrower(id, fields.into_input())?)
        }
        BorrowerCommand::Delete { id } => {
            registry.delete_borrower(id)?;
            Ok(json!({ "deleted": id }))
        }
        BorrowerCommand::List => to_json(registry.list_borrowers()?),
    }
}

fn run_circulation(
    circulation: &CirculationService<SqliteCirculationRepository<'_>>,
    command: CirculationCommand,
) -> Result<Value, CliError> {
    match command {
        CirculationCommand::Borrow {
            book,
            borrower,
            due,
        } => {
            let mut request = BorrowRequest::new(book, borrower);
            if let Some(due) = due {
                request = request.due_on(due);
            }
            let record_id = circulation.borrow_book(request)?;
            Ok(json!({ "record_id": record_id }))
        }
        CirculationCommand::Return { record } => {
            circulation.return_book(record)?;
            Ok(json!({ "returned": record }))
        }
        CirculationCommand::Active { borrower } => {
            to_json(circulation.list_active_borrows(borrower)?)
        }
        CirculationCommand::History { book } => to_json(circulation.list_book_history(book)?),
        CirculationCommand::Record { record } => to_json(circulation.get_record(record)?),
    }
}

fn to_json(value: impl Serialize) -> Result<Value, CliError> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::{exit_code_for, Cli};
    use clap::CommandFactory;
    use library_core::ErrorKind;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn exit_codes_are_distinct_per_kind() {
        let kinds = [
            ErrorKind::Internal,
            ErrorKind::Validation,
            ErrorKind::Conflict,
            ErrorKind::NotFound,
            ErrorKind::Unavailable,
        ];
        let mut codes: Vec<u8> = kinds.into_iter().map(exit_code_for).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
        assert!(!codes.contains(&0));
    }
}

use chrono::Utc;
use clap::{Parser, Subcommand};
use lending_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "biblio")]
#[command(about = "Library lending ledger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a book to the catalog
    AddBook {
        id: String,
        title: String,
        author: String,
        #[arg(long, default_value = "unknown")]
        genre: String,
        #[arg(long, default_value_t = 0)]
        year: i32,
    },

    /// Remove a book from the catalog
    RemoveBook { id: String },

    /// Register a patron
    AddPatron {
        id: String,
        name: String,
        email: String,
        /// Membership level (regular, premium, vip)
        #[arg(long, default_value = "regular")]
        membership: String,
    },

    /// Remove a patron
    RemovePatron { id: String },

    /// Search books and patrons by substring
    Search { query: String },

    /// Loan a book to a patron
    Loan { book_id: String, patron_id: String },

    /// Return a loaned book
    Return { book_id: String },

    /// Reserve a book for a patron
    Reserve { book_id: String, patron_id: String },

    /// Extend an open loan, restarting its lending window
    Extend { book_id: String, patron_id: String },

    /// Show the full loan history
    History,

    /// List currently overdue loans
    Overdue,

    /// Send overdue notifications
    NotifyOverdue,

    /// Charge outstanding overdue fines to patron balances
    AccrueFines,

    /// Pay down a patron's fine balance
    PayFine { patron_id: String, amount: f64 },

    /// Show a summary report of library state
    Report,

    /// Export the loan history to a CSV file
    Export { path: PathBuf },
}

fn main() {
    lending_core::logging::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let snapshot_path = data_dir.join("library.json");
    tracing::debug!("Using snapshot at {:?}", snapshot_path);
    let policy = config.policy.to_policy();
    let now = Utc::now();

    match cli.command {
        Commands::AddBook {
            id,
            title,
            author,
            genre,
            year,
        } => {
            Library::update(&snapshot_path, |lib| {
                lib.catalog.add_book(Book {
                    id: id.clone(),
                    title: title.clone(),
                    author,
                    genre,
                    publication_year: year,
                });
                Ok(())
            })?;
            println!("Added book {id}: {title}");
            Ok(())
        }

        Commands::RemoveBook { id } => {
            Library::update(&snapshot_path, |lib| {
                match lib.catalog.remove_book(&id) {
                    Some(book) => {
                        println!("Removed book {}: {}", book.id, book.title);
                        Ok(())
                    }
                    None => Err(Error::BookNotFound(id.clone())),
                }
            })?;
            Ok(())
        }

        Commands::AddPatron {
            id,
            name,
            email,
            membership,
        } => {
            let membership = parse_membership(&membership)?;
            Library::update(&snapshot_path, |lib| {
                lib.catalog
                    .add_patron(Patron::new(id.clone(), name.clone(), email, membership));
                Ok(())
            })?;
            println!("Registered patron {id}: {name}");
            Ok(())
        }

        Commands::RemovePatron { id } => {
            Library::update(&snapshot_path, |lib| {
                match lib.catalog.remove_patron(&id) {
                    Some(patron) => {
                        println!("Removed patron {}: {}", patron.id, patron.name);
                        Ok(())
                    }
                    None => Err(Error::PatronNotFound(id.clone())),
                }
            })?;
            Ok(())
        }

        Commands::Search { query } => {
            let library = Library::load(&snapshot_path)?;
            let books = library.catalog.search_books(&query);
            let patrons = library.catalog.search_patrons(&query);

            if books.is_empty() && patrons.is_empty() {
                println!("No matches for \"{query}\"");
                return Ok(());
            }
            for book in books {
                let status = if library.ledger.is_loaned(&book.id) {
                    "on loan"
                } else {
                    "available"
                };
                println!(
                    "book {}: {} by {} ({}, {}) [{status}]",
                    book.id, book.title, book.author, book.genre, book.publication_year
                );
            }
            for patron in patrons {
                println!(
                    "patron {}: {} <{}> fines ${:.2}",
                    patron.id,
                    patron.name,
                    patron.email,
                    patron.fine_balance()
                );
            }
            Ok(())
        }

        Commands::Loan { book_id, patron_id } => {
            Library::update(&snapshot_path, |lib| {
                lib.ledger.set_policy(policy.clone());
                lib.ledger.loan_book(&lib.catalog, &book_id, &patron_id, now)?;
                Ok(())
            })?;
            println!("Loaned {book_id} to {patron_id}");
            Ok(())
        }

        Commands::Return { book_id } => {
            Library::update(&snapshot_path, |lib| {
                lib.ledger.set_policy(policy.clone());
                lib.ledger
                    .return_book(&lib.catalog, &LogNotifier, &book_id, now)?;
                Ok(())
            })?;
            println!("Returned {book_id}");
            Ok(())
        }

        Commands::Reserve { book_id, patron_id } => {
            Library::update(&snapshot_path, |lib| {
                lib.ledger
                    .reserve_book(&lib.catalog, &book_id, &patron_id, now)?;
                Ok(())
            })?;
            println!("Reserved {book_id} for {patron_id}");
            Ok(())
        }

        Commands::Extend { book_id, patron_id } => {
            Library::update(&snapshot_path, |lib| {
                lib.ledger.set_policy(policy.clone());
                lib.ledger.extend_loan(&book_id, &patron_id, now)?;
                Ok(())
            })?;
            println!("Extended loan of {book_id} for {patron_id}");
            Ok(())
        }

        Commands::History => {
            let library = Library::load(&snapshot_path)?;
            let history = library.ledger.loan_history();
            if history.is_empty() {
                println!("No loans recorded.");
                return Ok(());
            }
            for loan in history {
                let status = match loan.returned_at {
                    Some(at) => format!("returned {}", at.format("%Y-%m-%d")),
                    None => "open".to_string(),
                };
                println!(
                    "{} -> {} on {} [{status}]",
                    loan.book_id,
                    loan.patron_id,
                    loan.loaned_at.format("%Y-%m-%d")
                );
            }
            Ok(())
        }

        Commands::Overdue => {
            let mut library = Library::load(&snapshot_path)?;
            library.ledger.set_policy(policy.clone());
            print!("{}", render_overdue(&library.catalog, &library.ledger, now));
            Ok(())
        }

        Commands::NotifyOverdue => {
            let mut library = Library::load(&snapshot_path)?;
            library.ledger.set_policy(policy.clone());
            let sent = library
                .ledger
                .notify_overdue(&library.catalog, &LogNotifier, now);
            println!("Sent {sent} overdue notification(s)");
            Ok(())
        }

        Commands::AccrueFines => {
            Library::update(&snapshot_path, |lib| {
                lib.ledger.set_policy(policy.clone());
                let total = lib.ledger.accrue_fines(&mut lib.catalog, now);
                println!("Charged ${total:.2} in fines");
                Ok(())
            })?;
            Ok(())
        }

        Commands::PayFine { patron_id, amount } => {
            Library::update(&snapshot_path, |lib| {
                if lib.ledger.pay_fine(&mut lib.catalog, &patron_id, amount)? {
                    println!("Payment of ${amount:.2} applied for {patron_id}");
                } else {
                    println!("Payment exceeds balance; nothing charged");
                }
                Ok(())
            })?;
            Ok(())
        }

        Commands::Report => {
            let mut library = Library::load(&snapshot_path)?;
            library.ledger.set_policy(policy.clone());
            print!("{}", render_summary(&library.catalog, &library.ledger, now));
            Ok(())
        }

        Commands::Export { path } => {
            let library = Library::load(&snapshot_path)?;
            let count = export_loan_history_csv(&library.ledger, &path)?;
            println!("Exported {count} loan(s) to {}", path.display());
            Ok(())
        }
    }
}

fn parse_membership(value: &str) -> Result<MembershipLevel> {
    match value.to_lowercase().as_str() {
        "regular" => Ok(MembershipLevel::Regular),
        "premium" => Ok(MembershipLevel::Premium),
        "vip" => Ok(MembershipLevel::Vip),
        other => Err(Error::Other(format!(
            "unknown membership level: {other} (expected regular, premium, or vip)"
        ))),
    }
}

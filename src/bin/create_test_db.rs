use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use finance_tracker::{BlobStore, FileBlobStore, initialize_db};

/// A utility for creating a test database for the finance_tracker server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The directory to save the sample invoice documents to.
    #[arg(long, short, default_value = "storage")]
    storage_dir: PathBuf,
}

/// A small but valid PDF document.
const SAMPLE_PDF: &[u8] = b"%PDF-1.4
1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj
3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 200 100] >> endobj
trailer << /Root 1 0 R >>
%%EOF
";

/// Create and populate a database and document storage for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating incomes...");
    for (description, amount, date, category) in [
        ("Salary", 3200.0, "2025-01-31", Some("Work")),
        ("Salary", 3200.0, "2025-02-28", Some("Work")),
        ("Website project", 850.0, "2025-02-14", Some("Freelance")),
        ("Interest", 12.34, "2025-02-28", None),
    ] {
        conn.execute(
            "INSERT INTO income (description, amount, date, category) VALUES (?1, ?2, ?3, ?4)",
            (description, amount, date, category),
        )?;
    }

    println!("Creating expenses...");
    for (description, amount, date, category) in [
        ("Web hosting", 119.88, "2025-01-05", Some("Hosting")),
        ("Laptop repair", 240.0, "2025-02-03", Some("Hardware")),
        ("Groceries", 86.15, "2025-02-09", None),
    ] {
        conn.execute(
            "INSERT INTO expense (description, amount, date, category) VALUES (?1, ?2, ?3, ?4)",
            (description, amount, date, category),
        )?;
    }

    println!("Creating service accounts...");
    for (site_name, email, registered_on, expires_on, service_type) in [
        ("Outlook", "me@outlook.com", "2020-06-01", None, "outlook"),
        (
            "Hostinger",
            "me@example.com",
            "2024-01-05",
            Some("2026-01-05"),
            "hostinger",
        ),
    ] {
        conn.execute(
            "INSERT INTO account (site_name, email, password, registered_on, expires_on, service_type)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (site_name, email, "test", registered_on, expires_on, service_type),
        )?;
    }

    println!("Creating invoices in {:#?}...", args.storage_dir);
    let blob_store = FileBlobStore::new(&args.storage_dir)?;
    for (name, amount, issued_on, expense_id) in [
        ("Hostinger yearly plan", 119.88, "2025-01-05", Some(1)),
        ("Repair shop", 240.0, "2025-02-03", Some(2)),
        ("Domain renewal", 15.0, "2025-02-20", None),
    ] {
        let document_path = blob_store.put(SAMPLE_PDF, "pdf")?;

        conn.execute(
            "INSERT INTO invoice (name, amount, issued_on, document_type, expense_id, document_path)
            VALUES (?1, ?2, ?3, 'pdf', ?4, ?5)",
            (name, amount, issued_on, expense_id, document_path),
        )?;
    }

    println!("Success!");

    Ok(())
}

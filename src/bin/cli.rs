//! mtfstore CLI
//!
//! Command-line front end for a record file. Every lookup moves what it
//! finds to the front of the file.

use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use mtfstore::{Config, Engine, Record, Status};
use tracing_subscriber::{fmt, EnvFilter};

/// mtfstore CLI
#[derive(Parser, Debug)]
#[command(name = "mtfstore-cli")]
#[command(about = "Self-organizing flat-file record store")]
#[command(version)]
struct Args {
    /// Storage file
    #[arg(short, long, default_value = "./records.txt")]
    file: PathBuf,

    /// Create the storage file if it does not exist
    #[arg(long)]
    create: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Look up a record by id
    Get {
        /// 9-digit record id
        id: String,
    },

    /// Look up records carrying a tag
    Tag {
        /// The tag to match exactly
        tag: String,

        /// Maximum number of records to return
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Look up records with a status
    Status {
        /// ACTIVE, PENDING, COMPLETED or FAILED
        #[arg(value_parser = Status::from_str)]
        status: Status,

        /// Maximum number of records to return
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Append a record
    Append {
        /// 9-digit record id
        id: String,

        /// ACTIVE, PENDING, COMPLETED or FAILED
        #[arg(value_parser = Status::from_str)]
        status: Status,

        /// Free-form timestamp
        timestamp: String,

        /// Numeric value
        value: f64,

        /// Comma-separated tags
        tags: String,
    },

    /// Print every well-formed record in storage order
    Scan,

    /// Check every index entry against the file
    Verify,

    /// Print store statistics
    Stats,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,mtfstore=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .data_path(&args.file)
        .create_if_missing(args.create)
        .build();
    let default_limit = config.default_search_limit;

    let engine = match Engine::open(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&engine, args.command, default_limit) {
        tracing::error!("{}", e);
        process::exit(1);
    }

    if let Err(e) = engine.close() {
        tracing::error!("Failed to close store: {}", e);
        process::exit(1);
    }
}

fn run(engine: &Engine, command: Commands, default_limit: usize) -> mtfstore::Result<()> {
    match command {
        Commands::Get { id } => match engine.search_by_id(&id)? {
            Some(record) => print_record(&record),
            None => println!("(not found)"),
        },
        Commands::Tag { tag, limit } => {
            let found = engine.search_by_tag(&tag, limit.unwrap_or(default_limit))?;
            print_records(&found);
        }
        Commands::Status { status, limit } => {
            let found = engine.search_by_status(status, limit.unwrap_or(default_limit))?;
            print_records(&found);
        }
        Commands::Append {
            id,
            status,
            timestamp,
            value,
            tags,
        } => {
            let tags = tags.split(',').map(str::to_string).collect();
            let record = Record::new(id, status, timestamp, value, tags);
            let offset = engine.append(&record)?;
            println!("appended {} at offset {}", record.id, offset);
        }
        Commands::Scan => print_records(&engine.scan()?),
        Commands::Verify => {
            let report = engine.verify()?;
            println!(
                "ok: {} primary, {} tag, {} status entries match",
                report.primary_entries, report.tag_entries, report.status_entries
            );
        }
        Commands::Stats => {
            let stats = engine.stats();
            println!("file length:      {} bytes", stats.file_len);
            println!("indexed records:  {}", stats.indexed_records);
            println!("malformed lines:  {}", stats.malformed_lines);
            println!("duplicate ids:    {}", stats.build.duplicate_ids);
        }
    }
    Ok(())
}

fn print_records(records: &[Record]) {
    if records.is_empty() {
        println!("(no matches)");
        return;
    }
    for record in records {
        print_record(record);
    }
    println!("{} record(s)", records.len());
}

fn print_record(record: &Record) {
    print!("{}", String::from_utf8_lossy(&mtfstore::record::encode(record)));
}

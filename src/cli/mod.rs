//! Command-line interface.
//!
//! With no subcommand the binary runs the HTTP server. Every other command
//! drives a [`DocumentClient`] against either a running server or the local
//! JSON file.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use crate::client::DocumentClient;
use crate::codec;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{Document, DocumentPatch, NewDocument};
use crate::query::{SortDirection, SortField};
use crate::store::{HttpStore, JsonFileStore, RemoteStore};

#[derive(Parser, Debug)]
#[command(name = "doc-registry", version)]
#[command(about = "Registry of regulatory documents with CSV import/export", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Base URL of a running server (default: DOCREG_SERVER_URL, else the local data file)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Path of the local JSON data file (default: DOCREG_DATA_PATH)
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Address to bind (default: DOCREG_BIND_ADDR)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// List documents
    #[command(alias = "ls")]
    List {
        /// Case-insensitive filter on name, scope and code
        #[arg(short, long)]
        search: Option<String>,

        /// Sort by field; repeat the same field to sort descending
        #[arg(long = "sort", value_name = "FIELD")]
        sort: Vec<SortField>,
    },

    /// Show one document
    Show { id: String },

    /// Create a document
    Add(AddArgs),

    /// Change fields of a document
    Update {
        id: String,

        #[command(flatten)]
        fields: PatchArgs,
    },

    /// Delete a document
    #[command(alias = "rm")]
    Delete { id: String },

    /// Create documents from a CSV file
    Import {
        file: PathBuf,

        /// Only report how many rows would be imported
        #[arg(long)]
        dry_run: bool,
    },

    /// Write all documents to a CSV file
    Export {
        #[arg(default_value = codec::EXPORT_FILE_NAME)]
        file: PathBuf,

        /// Also print the export as a data: URI
        #[arg(long)]
        data_uri: bool,
    },

    /// Check that the store is reachable
    Check,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub scope: String,
    /// Display number (default: next in sequence)
    #[arg(long)]
    pub number: Option<String>,
    #[arg(long, default_value = "")]
    pub case_number: String,
    #[arg(long, default_value = "")]
    pub code: String,
    /// Approval date, DD.MM.YYYY
    #[arg(long, default_value = "")]
    pub date: String,
    #[arg(long, default_value = "")]
    pub link: String,
}

#[derive(Args, Debug, Default)]
pub struct PatchArgs {
    #[arg(long)]
    pub number: Option<String>,
    #[arg(long)]
    pub case_number: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub code: Option<String>,
    #[arg(long)]
    pub date: Option<String>,
    #[arg(long)]
    pub scope: Option<String>,
    #[arg(long)]
    pub link: Option<String>,
}

impl From<PatchArgs> for DocumentPatch {
    fn from(args: PatchArgs) -> Self {
        Self {
            number: args.number,
            case_number: args.case_number,
            name: args.name,
            code: args.code,
            date: args.date,
            scope: args.scope,
            link: args.link,
        }
    }
}

/// Execute the parsed command line.
pub async fn run(cli: Cli, mut config: Config) -> Result<(), AppError> {
    if let Some(server) = cli.server {
        config.server_url = Some(server);
    }
    if let Some(data) = cli.data {
        config.data_path = data;
    }

    match cli.command {
        None => crate::serve(config).await,
        Some(Command::Serve { bind }) => {
            if let Some(bind) = bind {
                config.bind_addr = bind.to_string();
            }
            crate::serve(config).await
        }
        Some(command) => run_client(command, &config).await,
    }
}

/// Run a client command against the configured store.
async fn run_client(command: Command, config: &Config) -> Result<(), AppError> {
    let mut client = DocumentClient::new(open_store(config)?);

    match command {
        Command::List { search, sort } => {
            client.load().await?;
            for field in sort {
                client.sort(field);
            }
            let query = search.unwrap_or_default();
            let found = client.search(&query);
            for doc in &found {
                print_row(doc);
            }
            println!("{} of {} documents", found.len(), client.documents().len());
            if let Some(field) = client.sort_state().field {
                let direction = match client.sort_state().direction {
                    SortDirection::Asc => "ascending",
                    SortDirection::Desc => "descending",
                };
                println!("sorted by {} ({})", field, direction);
            }
        }
        Command::Show { id } => {
            client.load().await?;
            let doc = client
                .find(&id)
                .ok_or_else(|| AppError::document_not_found(&id))?;
            print_details(doc);
        }
        Command::Add(args) => {
            client.load().await?;
            let data = NewDocument {
                number: args.number.unwrap_or_else(|| client.next_number()),
                case_number: args.case_number,
                name: args.name,
                code: args.code,
                date: args.date,
                scope: args.scope,
                link: args.link,
            };
            let doc = client.create(&data).await?;
            println!("Created {}", doc.id);
        }
        Command::Update { id, fields } => {
            let doc = client.update(&id, &fields.into()).await?;
            print_details(&doc);
        }
        Command::Delete { id } => {
            let doc = client.delete(&id).await?;
            println!("Deleted {} ({})", doc.id, doc.name);
        }
        Command::Import { file, dry_run } => {
            let text = tokio::fs::read_to_string(&file).await?;
            if dry_run {
                let rows = codec::decode(&text);
                if rows.is_empty() {
                    return Err(AppError::nothing_to_import());
                }
                println!("Found {} records in {}", rows.len(), file.display());
                return Ok(());
            }
            client.load().await?;
            let count = client.import_csv(&text).await?;
            println!("Imported {} documents", count);
        }
        Command::Export { file, data_uri } => {
            client.load().await?;
            tokio::fs::write(&file, client.export_csv()).await?;
            println!(
                "Exported {} documents to {}",
                client.documents().len(),
                file.display()
            );
            if data_uri {
                println!("{}", client.export_data_uri());
            }
        }
        Command::Check => {
            let location = client.store().describe();
            if !client.check_connection().await {
                return Err(AppError::Transport {
                    status: None,
                    message: format!("No connection to {}", location),
                });
            }
            println!("Connected to {}", location);
        }
        Command::Serve { .. } => crate::serve(config.clone()).await?,
    }

    Ok(())
}

/// Pick the remote server when one is configured, else the local file.
fn open_store(config: &Config) -> Result<Arc<dyn RemoteStore>, AppError> {
    match &config.server_url {
        Some(url) => Ok(Arc::new(HttpStore::new(url)?)),
        None => Ok(Arc::new(JsonFileStore::new(config.data_path.clone()))),
    }
}

fn print_row(doc: &Document) {
    println!(
        "{:>4}  {:<10}  {:<40}  {:<10}  {:<10}  {}  [{}]",
        doc.number,
        doc.case_number,
        one_line(&doc.name),
        doc.code,
        doc.date,
        one_line(&doc.scope),
        doc.id
    );
}

fn print_details(doc: &Document) {
    let link = if doc.has_url_link() {
        format!("{} (url)", doc.link)
    } else {
        doc.link.clone()
    };
    println!("id:          {}", doc.id);
    println!("number:      {}", doc.number);
    println!("case number: {}", doc.case_number);
    println!("name:        {}", doc.name);
    println!("code:        {}", doc.code);
    println!("date:        {}", doc.date);
    println!("scope:       {}", doc.scope);
    println!("link:        {}", link);
    println!("created:     {}", doc.created_at);
    println!("updated:     {}", doc.updated_at);
}

fn one_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

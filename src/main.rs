use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use print_inbox::clipboard::{self, Clipboard};
use print_inbox::storage::open_storage;
use print_inbox::{
    Config, FilterSpec, HttpRemote, Inbox, NewRequest, Priority, RemoteSync, Request, RequestChanges, RequestStore,
    SortKey, Status, SyncOutcome, export,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "print-inbox")]
#[command(about = "Print Inbox - collect, triage and sync 3D print requests")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the config file (default: <config dir>/print-inbox/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a new print request
    Add {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        description: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(short, long, default_value_t = Priority::Normal)]
        priority: Priority,
    },

    /// List requests
    List {
        /// Case-insensitive text matched against name and description
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long)]
        status: Option<Status>,
        #[arg(long)]
        priority: Option<Priority>,
        /// newest, oldest, due or priority
        #[arg(long, default_value_t = SortKey::Newest)]
        sort: SortKey,
    },

    /// Show one request in full
    Show { id: String },

    /// Change status, priority, notes or pin state
    Update {
        id: String,
        #[arg(long)]
        status: Option<Status>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, conflicts_with = "unpin")]
        pin: bool,
        #[arg(long)]
        unpin: bool,
    },

    /// Show overdue and due-today requests
    Triage,

    /// Export all requests as CSV
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Push one request to the remote again
    Retry { id: String },

    /// Replace local requests with the remote collection
    Refresh,

    /// Copy a text summary of a request to the clipboard
    Copy { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let mut inbox = open_inbox(&config)?;
    let result = run(cli.command, &mut inbox, &config).await;

    report_outcomes(&inbox.settle().await);
    inbox.close()?;
    result
}

fn open_inbox(config: &Config) -> Result<Inbox> {
    let storage = open_storage(config.storage, &config.data_dir()?)?;
    let store = RequestStore::open(storage);
    if !store.is_hydrated() {
        return Err(eyre!("Could not read saved requests; refusing to continue without them"));
    }

    let remote: Option<Arc<dyn RemoteSync>> = match config.endpoint() {
        Some(endpoint) => {
            let remote = HttpRemote::new(endpoint, config.token.clone(), config.timeout())?;
            Some(Arc::new(remote) as Arc<dyn RemoteSync>)
        }
        None => None,
    };

    Ok(Inbox::new(store, remote))
}

async fn run(command: Commands, inbox: &mut Inbox, config: &Config) -> Result<()> {
    match command {
        Commands::Add {
            name,
            description,
            due,
            priority,
        } => {
            let mut input = NewRequest::new(name, description).priority(priority);
            input.due_date = due;
            let request = inbox.create(input)?;
            println!("{} {}", "Added".green(), request.id);
        }
        Commands::List {
            search,
            status,
            priority,
            sort,
        } => {
            let filter = FilterSpec {
                search,
                status,
                priority,
            };
            let requests = inbox.query(&filter, sort);
            if requests.is_empty() {
                println!("{}", "No requests".dimmed());
            }
            for request in &requests {
                print_line(request);
            }
        }
        Commands::Show { id } => {
            let request = find(inbox, &id)?;
            print!("{}", clipboard::summary(request));
            println!("\nid: {}\ncreated: {}", request.id, request.created_at);
            if !request.synced {
                println!("{}", "not synced - run `print-inbox retry` to push again".yellow());
            }
        }
        Commands::Update {
            id,
            status,
            priority,
            notes,
            pin,
            unpin,
        } => {
            let changes = RequestChanges {
                status,
                priority,
                dev_notes: notes,
                pinned: if pin { Some(true) } else if unpin { Some(false) } else { None },
                synced: None,
            };
            if changes.is_empty() {
                return Err(eyre!("Nothing to update"));
            }
            let request = inbox.update(&id, changes)?;
            print_line(&request);
        }
        Commands::Triage => {
            let buckets = inbox.triage();
            println!("{}", format!("Overdue ({})", buckets.overdue.len()).red().bold());
            for request in &buckets.overdue {
                print_line(request);
            }
            println!("{}", format!("Due today ({})", buckets.due_today.len()).yellow().bold());
            for request in &buckets.due_today {
                print_line(request);
            }
        }
        Commands::Export { output } => {
            let requests = inbox.store().requests();
            match output {
                Some(path) => {
                    export::export_to_path(requests, &path)?;
                    println!("{} {} requests to {}", "Exported".green(), requests.len(), path.display());
                }
                None => print!("{}", export::to_csv(requests)?),
            }
        }
        Commands::Retry { id } => {
            if !inbox.sync_enabled() {
                println!("{}", "Sync is not configured".yellow());
                return Ok(());
            }
            inbox.retry(&id)?;
        }
        Commands::Refresh => match inbox.refresh().await {
            Ok(Some(count)) => println!("{} {} requests from remote", "Loaded".green(), count),
            Ok(None) => println!("{}", "Sync is not configured".yellow()),
            Err(e) => eprintln!("{} {}", "Refresh failed:".red(), e),
        },
        Commands::Copy { id } => {
            let request = find(inbox, &id)?;
            let clipboard = config.clipboard_command.as_ref().map(|c| c as &dyn Clipboard);
            match clipboard::copy_summary(clipboard, request) {
                Ok(_) => println!("{}", "Copied summary to clipboard".green()),
                Err(e) => eprintln!("{} {}", "Copy failed:".red(), e),
            }
        }
    }
    Ok(())
}

fn find<'a>(inbox: &'a Inbox, id: &str) -> Result<&'a Request> {
    inbox
        .store()
        .get(id)
        .ok_or_else(|| eyre!("No request with id {}", id))
}

fn print_line(request: &Request) {
    let pin = if request.pinned { "*".yellow().to_string() } else { " ".to_string() };
    let priority = match request.priority {
        Priority::Urgent => request.priority.to_string().red().bold(),
        Priority::High => request.priority.to_string().red(),
        Priority::Normal => request.priority.to_string().normal(),
        Priority::Low => request.priority.to_string().dimmed(),
    };
    let due = request
        .due_date
        .map(|d: NaiveDate| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    let sync = if request.synced { "" } else { " (unsynced)" };
    println!(
        "{} {} {:<12} {:<8} {:<11} {:<10} {}{}",
        pin,
        request.id.dimmed(),
        request.name,
        priority,
        request.status,
        due,
        request.description.lines().next().unwrap_or_default(),
        sync.yellow()
    );
}

fn report_outcomes(outcomes: &[SyncOutcome]) {
    for outcome in outcomes {
        match &outcome.result {
            Ok(()) => println!("{} {}", "Synced".green(), outcome.id),
            Err(e) => eprintln!("{} {}", "Sync failed:".red(), e),
        }
    }
}

mod commands;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use ticketflow::config::Config;
use ticketflow::db::SqliteMedium;
use ticketflow::models::{Priority, TicketFilter, TicketPatch, TicketStatus};
use ticketflow::{AppContext, StoreError};

use commands::init::{DATA_DIR, STORE_FILE};

#[derive(Parser)]
#[command(name = "ticketflow")]
#[command(about = "Support ticket tracking from the terminal")]
#[command(version)]
struct Cli {
    /// Data directory (defaults to the nearest .ticketflow above the cwd)
    #[arg(long, global = true, env = "TICKETFLOW_DIR")]
    data_dir: Option<PathBuf>,

    /// Skip the simulated latency of store operations
    #[arg(long, global = true, env = "TICKETFLOW_INSTANT")]
    instant: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize ticketflow in the current directory
    Init {
        /// Rewrite the default config even if already initialized
        #[arg(short, long)]
        force: bool,
    },

    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that run against an opened ticket store.
#[derive(Subcommand)]
enum StoreCommand {
    /// Register a new account and log in
    Signup {
        email: String,
        #[arg(short, long)]
        password: String,
        /// Password confirmation
        #[arg(short, long)]
        confirm: String,
    },

    /// Log in with an existing account
    Login {
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// End the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Create a new ticket
    Create {
        /// Ticket title
        title: String,
        /// Ticket description
        #[arg(short, long)]
        description: Option<String>,
        /// Status (open, in_progress, closed)
        #[arg(short, long, default_value = "open")]
        status: TicketStatus,
        /// Priority (high, medium, low)
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
        /// Assignee name
        #[arg(short, long)]
        assignee: Option<String>,
    },

    /// List tickets
    List {
        /// Filter (all, open, in_progress, closed, high, medium, low)
        #[arg(short, long, default_value = "all")]
        filter: TicketFilter,
        /// Case-insensitive search over title and description
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show ticket details
    Show {
        /// Ticket ID
        id: String,
    },

    /// Update a ticket
    Update {
        /// Ticket ID
        id: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New status
        #[arg(short, long)]
        status: Option<TicketStatus>,
        /// New priority
        #[arg(short, long)]
        priority: Option<Priority>,
        /// New assignee
        #[arg(short, long)]
        assignee: Option<String>,
    },

    /// Move a ticket to in progress
    Start {
        /// Ticket ID
        id: String,
    },

    /// Close a ticket
    Close {
        /// Ticket ID
        id: String,
    },

    /// Reopen a closed ticket
    Reopen {
        /// Ticket ID
        id: String,
    },

    /// Delete a ticket
    Delete {
        /// Ticket ID
        id: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Stats, filter counts and recent activity
    Dashboard,

    /// Export tickets and activity
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Markdown,
}

fn find_data_dir() -> Result<PathBuf> {
    let mut current = env::current_dir()?;

    loop {
        let candidate = current.join(DATA_DIR);
        if candidate.exists() && candidate.is_dir() {
            return Ok(candidate);
        }

        if !current.pop() {
            bail!("Not a ticketflow directory (or any parent). Run 'ticketflow init' first.");
        }
    }
}

fn open_context(data_dir: &Path, instant: bool) -> Result<AppContext> {
    let mut config = Config::load(data_dir)?;
    if instant {
        config = config.instant();
    }
    let medium = SqliteMedium::open(&data_dir.join(STORE_FILE)).context("Failed to open ticket store")?;
    Ok(AppContext::open(Arc::new(medium), config))
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

async fn dispatch(ctx: &AppContext, command: StoreCommand) -> Result<()> {
    match command {
        StoreCommand::Signup {
            email,
            password,
            confirm,
        } => commands::auth::signup(ctx, &email, &password, &confirm).await,

        StoreCommand::Login { email, password } => commands::auth::login(ctx, &email, &password).await,

        StoreCommand::Logout => commands::auth::logout(ctx),

        StoreCommand::Whoami => commands::auth::whoami(ctx),

        StoreCommand::Create {
            title,
            description,
            status,
            priority,
            assignee,
        } => {
            commands::create::run(
                ctx,
                &title,
                description.as_deref(),
                status,
                priority,
                assignee.as_deref(),
            )
            .await
        }

        StoreCommand::List { filter, search } => commands::list::run(ctx, filter, search.as_deref()),

        StoreCommand::Show { id } => commands::show::run(ctx, &id),

        StoreCommand::Update {
            id,
            title,
            description,
            status,
            priority,
            assignee,
        } => {
            let patch = TicketPatch {
                title,
                description,
                status,
                priority,
                assignee,
            };
            commands::update::run(ctx, &id, patch).await
        }

        StoreCommand::Start { id } => commands::status::start(ctx, &id).await,

        StoreCommand::Close { id } => commands::status::close(ctx, &id).await,

        StoreCommand::Reopen { id } => commands::status::reopen(ctx, &id).await,

        StoreCommand::Delete { id, force } => commands::delete::run(ctx, &id, force).await,

        StoreCommand::Dashboard => commands::dashboard::run(ctx),

        StoreCommand::Export { output, format } => match format {
            ExportFormat::Json => commands::export::run_json(ctx, output.as_deref()),
            ExportFormat::Markdown => commands::export::run_markdown(ctx, output.as_deref()),
        },
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let command = match cli.command {
        Commands::Init { force } => {
            let data_dir = match cli.data_dir {
                Some(dir) => dir,
                None => match env::current_dir() {
                    Ok(cwd) => cwd.join(DATA_DIR),
                    Err(e) => return report(e.into()),
                },
            };
            return match commands::init::run(&data_dir, force) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => report(e),
            };
        }
        Commands::Store(command) => command,
    };

    let ctx = match cli.data_dir.map(Ok).unwrap_or_else(find_data_dir) {
        Ok(dir) => match open_context(&dir, cli.instant) {
            Ok(ctx) => ctx,
            Err(e) => return report(e),
        },
        Err(e) => return report(e),
    };

    let result = dispatch(&ctx, command).await;

    for notification in ctx.notifier.drain() {
        eprintln!("{}", notification);
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        // Store failures were already shown as notifications.
        Err(e) if e.downcast_ref::<StoreError>().is_some() => ExitCode::FAILURE,
        Err(e) => report(e),
    }
}

fn report(err: anyhow::Error) -> ExitCode {
    eprintln!("Error: {:#}", err);
    ExitCode::FAILURE
}

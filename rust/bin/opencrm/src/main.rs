//! `opencrm`: the command-line client for opencrmd.
//!
//! Manages contexts and login, and drives the customer, work log and
//! holiday APIs, including spreadsheet import and export.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use opencrm_client::{CustomerQuery, ImportMode};

#[derive(Parser, Debug)]
#[command(name = "opencrm", about = "opencrm CLI client")]
struct Cli {
    /// Path to client config file (default: ~/.opencrm/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<String>,

    /// Output format.
    #[arg(long = "output", short = 'o', global = true, value_enum, default_value_t = Output::Table)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage contexts (server connections).
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// Switch the current context.
    Use {
        #[command(subcommand)]
        what: UseWhat,
    },

    /// Log in to the current context's server.
    Login {
        #[arg(long)]
        user: Option<String>,
        /// Password (prompted when omitted).
        #[arg(long)]
        password: Option<String>,
    },

    /// Clear the token from the current context.
    Logout,

    /// Customer records.
    Customers {
        #[command(subcommand)]
        action: CustomerAction,
    },

    /// Personal daily work log.
    Worklog {
        #[command(subcommand)]
        action: WorkLogAction,
    },

    /// Public holidays of a year.
    Holidays { year: u16 },

    /// Show version.
    Version,
}

#[derive(Subcommand, Debug)]
enum ContextAction {
    /// Create a context: server config, data dir and admin password.
    Create {
        name: String,
        /// Server config directory.
        #[arg(long, default_value = "/etc/opencrm")]
        config_dir: String,
        /// Data directory (default: /var/lib/opencrm/<name>).
        #[arg(long)]
        data_dir: Option<String>,
        /// Server URL the client connects to.
        #[arg(long)]
        server: Option<String>,
        /// Admin account name.
        #[arg(long, default_value = "admin")]
        admin: String,
        /// Admin password (non-interactive). Prompted when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// List all contexts.
    List,
    /// Set properties on a context.
    Set {
        name: String,
        #[arg(long)]
        server: Option<String>,
    },
    /// Delete a context.
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum UseWhat {
    /// Switch to a context.
    Context { name: String },
}

#[derive(clap::Args, Debug)]
struct QueryArgs {
    /// Search text (name, company, affiliation, mobile).
    #[arg(long)]
    q: Option<String>,
    /// Field to sort by (default: serialNo).
    #[arg(long)]
    sort: Option<String>,
    /// asc or desc.
    #[arg(long)]
    order: Option<String>,
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long)]
    offset: Option<usize>,
}

impl From<QueryArgs> for CustomerQuery {
    fn from(a: QueryArgs) -> Self {
        CustomerQuery {
            q: a.q,
            sort: a.sort,
            order: a.order,
            limit: a.limit,
            offset: a.offset,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ImportArg {
    /// Delete every customer, then insert the rows numbered from 1.
    Replace,
    /// Keep existing customers and number new rows after the current maximum.
    Append,
}

#[derive(Subcommand, Debug)]
enum CustomerAction {
    List {
        #[command(flatten)]
        query: QueryArgs,
    },
    Get {
        id: String,
    },
    Create {
        /// JSON body.
        #[arg(long = "json")]
        json_body: Option<String>,
        /// Read JSON from file.
        #[arg(short = 'f', long = "file")]
        file: Option<String>,
    },
    /// Merge-patch a customer; `null` clears a field.
    Update {
        id: String,
        #[arg(long = "json")]
        json_body: Option<String>,
        #[arg(short = 'f', long = "file")]
        file: Option<String>,
    },
    Delete {
        id: String,
        /// Skip confirmation.
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },
    /// Upload a .xlsx, .xls or .csv file.
    Import {
        file: PathBuf,
        #[arg(long, value_enum)]
        mode: ImportArg,
        /// Skip confirmation for replace.
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },
    /// Download customers into a .xlsx file.
    Export {
        file: PathBuf,
        #[command(flatten)]
        query: QueryArgs,
    },
}

#[derive(Subcommand, Debug)]
enum WorkLogAction {
    List,
    /// Show the entry for a date (YYYY-MM-DD).
    Get { date: String },
    /// Create or overwrite the entry for a date.
    Save {
        date: String,
        #[arg(long)]
        log: Option<String>,
        #[arg(short = 'f', long = "file")]
        file: Option<String>,
    },
    /// Change an existing entry.
    Update {
        date: String,
        #[arg(long)]
        log: Option<String>,
        #[arg(short = 'f', long = "file")]
        file: Option<String>,
    },
    Delete { date: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.output == Output::Json;
    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(config::default_path);

    match cli.command {
        Commands::Context { action } => match action {
            ContextAction::Create {
                name,
                config_dir,
                data_dir,
                server,
                admin,
                password,
            } => {
                let data_dir = data_dir.unwrap_or_else(|| format!("/var/lib/opencrm/{}", name));
                let password = match password {
                    Some(p) => p,
                    None => {
                        let pw = rpassword::prompt_password("Enter admin password: ")?;
                        let confirm = rpassword::prompt_password("Confirm admin password: ")?;
                        if pw != confirm {
                            anyhow::bail!("Passwords do not match.");
                        }
                        pw
                    }
                };
                if password.is_empty() {
                    anyhow::bail!("Password cannot be empty.");
                }
                let opts = commands::context::CreateOptions {
                    name: &name,
                    config_dir: &config_dir,
                    data_dir: &data_dir,
                    server: server.as_deref(),
                    admin: &admin,
                    password: &password,
                };
                commands::context::create(&opts, &config_path)?;
            }
            ContextAction::List => commands::context::list(&config_path)?,
            ContextAction::Set { name, server } => {
                commands::context::set(&name, server.as_deref(), &config_path)?;
            }
            ContextAction::Delete { name } => commands::context::delete(&name, &config_path)?,
        },

        Commands::Use { what } => match what {
            UseWhat::Context { name } => commands::context::use_context(&name, &config_path)?,
        },

        Commands::Login { user, password } => {
            let username = match user {
                Some(u) => u,
                None => {
                    eprint!("Username: ");
                    let mut s = String::new();
                    std::io::stdin().read_line(&mut s)?;
                    s.trim().to_string()
                }
            };
            let password = match password {
                Some(p) => p,
                None => rpassword::prompt_password("Password: ")?,
            };
            commands::login::login(&username, &password, &config_path).await?;
        }

        Commands::Logout => commands::login::logout(&config_path)?,

        Commands::Customers { action } => match action {
            CustomerAction::List { query } => {
                commands::customers::list(&query.into(), json, &config_path).await?;
            }
            CustomerAction::Get { id } => commands::customers::get(&id, &config_path).await?,
            CustomerAction::Create { json_body, file } => {
                let body = commands::json_input(json_body, file)?;
                commands::customers::create(&body, &config_path).await?;
            }
            CustomerAction::Update { id, json_body, file } => {
                let patch = commands::json_input(json_body, file)?;
                commands::customers::update(&id, &patch, &config_path).await?;
            }
            CustomerAction::Delete { id, yes } => {
                if !yes && !commands::confirm("Delete this customer?")? {
                    println!("Cancelled.");
                    return Ok(());
                }
                commands::customers::delete(&id, &config_path).await?;
            }
            CustomerAction::Import { file, mode, yes } => {
                let mode = match mode {
                    ImportArg::Replace => ImportMode::Replace,
                    ImportArg::Append => ImportMode::Append,
                };
                if mode == ImportMode::Replace
                    && !yes
                    && !commands::confirm("Replace deletes every existing customer. Continue?")?
                {
                    println!("Cancelled.");
                    return Ok(());
                }
                commands::customers::import(&file, mode, &config_path).await?;
            }
            CustomerAction::Export { file, query } => {
                commands::customers::export(&file, &query.into(), &config_path).await?;
            }
        },

        Commands::Worklog { action } => match action {
            WorkLogAction::List => commands::worklog::list(json, &config_path).await?,
            WorkLogAction::Get { date } => commands::worklog::get(&date, &config_path).await?,
            WorkLogAction::Save { date, log, file } => {
                let log = commands::worklog::log_input(log, file)?;
                commands::worklog::save(&date, &log, &config_path).await?;
            }
            WorkLogAction::Update { date, log, file } => {
                let log = commands::worklog::log_input(log, file)?;
                commands::worklog::update(&date, &log, &config_path).await?;
            }
            WorkLogAction::Delete { date } => commands::worklog::delete(&date, &config_path).await?,
        },

        Commands::Holidays { year } => commands::holidays::list(year, json, &config_path).await?,

        Commands::Version => println!("opencrm cli v{}", env!("CARGO_PKG_VERSION")),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_import_command() {
        let cli = Cli::parse_from(["opencrm", "customers", "import", "list.xlsx", "--mode", "append", "-y"]);
        match cli.command {
            Commands::Customers {
                action: CustomerAction::Import { file, mode, yes },
            } => {
                assert_eq!(file, PathBuf::from("list.xlsx"));
                assert!(matches!(mode, ImportArg::Append));
                assert!(yes);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn list_query_flags_map_to_client_query() {
        let cli = Cli::parse_from(["opencrm", "-o", "json", "customers", "list", "--q", "kim", "--sort", "name", "--order", "desc"]);
        assert_eq!(cli.output, Output::Json);
        let Commands::Customers { action: CustomerAction::List { query } } = cli.command else {
            panic!("expected customers list");
        };
        let query: CustomerQuery = query.into();
        assert_eq!(query.q.as_deref(), Some("kim"));
        assert_eq!(query.sort.as_deref(), Some("name"));
        assert_eq!(query.order.as_deref(), Some("desc"));
        assert!(query.limit.is_none());
    }
}

use clap::{Parser, Subcommand};
use finance_monitor::api::client::{FinanceApi, HttpApi};
use finance_monitor::api::schema::LoginOutcome;
use finance_monitor::commands;
use finance_monitor::config::Config;
use finance_monitor::models::session::Session;
use finance_monitor::operations::filter::TransactionFilter;
use finance_monitor::operations::{aggregate, import, report};
use finance_monitor::{AppError, Result};
use std::io;
use std::path::{Path, PathBuf};
use tracing::error;

#[derive(Parser)]
#[command(name = "finmon")]
#[command(about = "Personal finance monitor: transaction analytics and dashboard")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Aggregate a local .json or .csv transaction file and print the summary
    Analyze {
        file: PathBuf,
        /// Emit the full analytics result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Open the terminal dashboard for a local transaction file
    Report { file: PathBuf },
    /// Interactive session against the finance backend
    Shell,
}

pub enum UserCommands {
    Login,
    Register,
    Logout,
    List,
    Add,
    Delete,
    Summary,
    Dashboard,
    DeleteUser,
    Overview,
    Help,
    Exit,
    Unknown,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&cli.config.log_level))
        .with_writer(io::stderr)
        .init();

    let outcome = match cli.command {
        Command::Analyze { file, json } => run_analyze(&file, json),
        Command::Report { file } => run_file_report(&file),
        Command::Shell => HttpApi::new(&cli.config).and_then(|api| run_shell(&api)),
    };

    if let Err(e) = outcome {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }
}

fn run_analyze(file: &Path, json: bool) -> Result<()> {
    let analysis = aggregate::analyze(import::load_records(file)?);
    commands::log_rejections(&analysis.rejected);

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print!("{}", report::render_summary(&analysis));
    }
    Ok(())
}

fn run_file_report(file: &Path) -> Result<()> {
    let analysis = aggregate::analyze(import::load_records(file)?);
    commands::log_rejections(&analysis.rejected);
    report::run_report(&report::report_title(&analysis.result), &analysis.result)
}

fn run_shell(api: &dyn FinanceApi) -> Result<()> {
    println!("Welcome to the personal finance monitor!");
    let mut session: Option<Session> = None;

    loop {
        let prompt = match &session {
            Some(s) => format!("[{}]", s.username),
            None => "[logged out]".to_string(),
        };
        println!("{} Please enter a command (login, register, logout, list, add, delete, summary, dashboard, overview, delete-user, help, exit):", prompt);

        let input = match read_user_input() {
            Ok(cmd) => cmd,
            Err(AppError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                println!("Exiting the application.");
                break;
            }
            Err(e) => {
                println!("Error reading input: {}", e);
                continue;
            }
        };
        let parts: Vec<&str> = input.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        let result = match check_for_command(parts[0]) {
            UserCommands::Login => handle_login(api, &mut session),
            UserCommands::Register => handle_register(api),
            UserCommands::Logout => {
                match session.take() {
                    Some(s) => println!("Logged out {}.", s.username),
                    None => println!("You are not logged in."),
                }
                Ok(())
            }
            UserCommands::List => handle_list(api, session.as_ref(), parts.get(1).copied(), parts.get(2).copied()),
            UserCommands::Add => {
                println!("Enter transaction details in the format:\ncategory(income/expense), type, amount[, note]");
                read_user_input().and_then(|details| {
                    commands::add_transaction(api, session.as_ref(), &details).map(|msg| println!("{}", msg))
                })
            }
            UserCommands::Delete => {
                println!("Provide the transaction ID to delete:");
                read_user_input().and_then(|id| {
                    commands::delete_transaction(api, session.as_ref(), &id).map(|msg| println!("{}", msg))
                })
            }
            UserCommands::Summary => commands::analytics(api, session.as_ref())
                .map(|analysis| print!("{}", report::render_summary(&analysis))),
            UserCommands::Dashboard => commands::analytics(api, session.as_ref())
                .and_then(|analysis| report::run_report(&report::report_title(&analysis.result), &analysis.result)),
            UserCommands::DeleteUser => {
                println!("Provide the user ID to delete:");
                read_user_input().and_then(|id| {
                    commands::delete_user(api, session.as_ref(), &id).map(|msg| println!("{}", msg))
                })
            }
            UserCommands::Overview => commands::admin_overview(api, session.as_ref())
                .map(|overview| print!("{}", report::render_overview(&overview))),
            UserCommands::Help => {
                print_help();
                Ok(())
            }
            UserCommands::Exit => {
                println!("Exiting the application.");
                break;
            }
            UserCommands::Unknown => {
                println!("No valid command found. Type 'help' for the list of commands.");
                Ok(())
            }
        };

        if let Err(e) = result {
            match e {
                AppError::Validation(_) | AppError::Unauthorized(_) | AppError::Api(_) => println!("Error: {}", e),
                other => {
                    error!("{}", other);
                    println!("Error: {}", other);
                }
            }
        }
    }

    Ok(())
}

fn handle_login(api: &dyn FinanceApi, session: &mut Option<Session>) -> Result<()> {
    println!("Username:");
    let username = read_user_input()?;
    println!("Password:");
    let password = read_user_input()?;

    match commands::login(api, &username, &password)? {
        LoginOutcome::User(s) => {
            println!("Logged in as {} (user id {}).", s.username, s.user_id.unwrap_or_default());
            *session = Some(s);
        }
        LoginOutcome::Admin(s) => {
            println!("Admin {} logged in.", s.username);
            *session = Some(s);
        }
        LoginOutcome::Denied(reason) => println!("Login failed: {}", reason),
    }
    Ok(())
}

fn handle_register(api: &dyn FinanceApi) -> Result<()> {
    println!("Username:");
    let username = read_user_input()?;
    println!("Password (more than 4 characters, at least one number and one uppercase letter):");
    let password = read_user_input()?;
    println!("Confirm password:");
    let confirm = read_user_input()?;

    commands::register(api, &username, &password, &confirm)?;
    println!("Account created successfully for {}! Please log in.", username.trim());
    Ok(())
}

fn handle_list(
    api: &dyn FinanceApi,
    session: Option<&Session>,
    category: Option<&str>,
    kind: Option<&str>,
) -> Result<()> {
    let filter = TransactionFilter::from_args(category, kind).map_err(AppError::Validation)?;
    let listing = commands::list_transactions(api, session, &filter)?;

    if !listing.type_choices.is_empty() {
        println!("Types: {}", listing.type_choices.join(", "));
    }
    if listing.transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    println!("{:>6}  {:19}  {:8}  {:12}  {:>12}  Note", "ID", "Timestamp", "Category", "Type", "Amount");
    for tx in &listing.transactions {
        println!(
            "{:>6}  {:19}  {:8}  {:12}  {:>12.2}  {}",
            tx.id.map(|id| id.to_string()).unwrap_or_default(),
            tx.timestamp.format("%Y-%m-%d %H:%M:%S"),
            tx.category.as_str(),
            tx.kind,
            tx.amount,
            tx.note.as_deref().unwrap_or("")
        );
    }
    if !listing.rejected.is_empty() {
        println!("({} record(s) could not be read and were skipped)", listing.rejected.len());
    }
    Ok(())
}

fn print_help() {
    println!("login                 log in with username and password");
    println!("register              create a new account");
    println!("logout                end the current session");
    println!("list [category] [type] list transactions, optionally filtered (use 'all' for any)");
    println!("add                   record a new transaction");
    println!("delete                delete a transaction by id");
    println!("summary               print income, expense and type breakdowns");
    println!("dashboard             open the terminal dashboard");
    println!("overview              (admin) show the transactions and users tables");
    println!("delete-user           (admin) delete a user by id");
    println!("exit                  quit");
}

fn read_user_input() -> Result<String> {
    let mut input = String::new();
    let read = io::stdin().read_line(&mut input)?;
    if read == 0 {
        return Err(AppError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "standard input closed",
        )));
    }
    Ok(input.trim().to_string())
}

fn check_for_command(input: &str) -> UserCommands {
    match input.to_lowercase().as_str() {
        "login" => UserCommands::Login,
        "register" => UserCommands::Register,
        "logout" => UserCommands::Logout,
        "list" => UserCommands::List,
        "add" => UserCommands::Add,
        "delete" | "remove" => UserCommands::Delete,
        "summary" => UserCommands::Summary,
        "dashboard" => UserCommands::Dashboard,
        "delete-user" => UserCommands::DeleteUser,
        "overview" => UserCommands::Overview,
        "help" => UserCommands::Help,
        "exit" | "quit" => UserCommands::Exit,
        _ => UserCommands::Unknown,
    }
}

use std::{error::Error, io::Write};

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Actor, Currency, Engine, Money, NewProfileCmd, Role, TransactionListFilter};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "bursar_admin")]
#[command(about = "Admin utilities for Bursar (bootstrap profiles, users and wallets)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./bursar.db?mode=rwc"
    )]
    database_url: String,

    /// Deployment currency, must match the server's `app.currency`.
    #[arg(long, env = "BURSAR__APP__CURRENCY", default_value = "OMR", value_parser = parse_currency)]
    currency: Currency,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Profile(Profile),
    User(User),
    Wallet(Wallet),
    Export(Export),
}

#[derive(Args, Debug)]
struct Profile {
    #[command(subcommand)]
    command: ProfileCommand,
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    Create(ProfileCreateArgs),
}

#[derive(Args, Debug)]
struct ProfileCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long, value_parser = parse_role)]
    role: Role,
    /// Name in the second script (e.g. Arabic).
    #[arg(long)]
    localized: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    profile_id: Uuid,
}

#[derive(Args, Debug)]
struct Wallet {
    #[command(subcommand)]
    command: WalletCommand,
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    TopUp(TopUpArgs),
}

#[derive(Args, Debug)]
struct TopUpArgs {
    #[arg(long)]
    profile_id: Uuid,
    /// Amount in major units, e.g. `12.500`.
    #[arg(long)]
    amount: String,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args, Debug)]
struct Export {
    #[command(subcommand)]
    command: ExportCommand,
}

#[derive(Subcommand, Debug)]
enum ExportCommand {
    Csv(CsvArgs),
}

#[derive(Args, Debug)]
struct CsvArgs {
    /// Inclusive RFC3339 lower bound on `occurred_at`.
    #[arg(long)]
    from: Option<DateTime<Utc>>,
    /// Exclusive RFC3339 upper bound on `occurred_at`.
    #[arg(long)]
    to: Option<DateTime<Utc>>,
    #[arg(long)]
    category: Option<String>,
    /// Write to this file instead of stdout.
    #[arg(long)]
    output: Option<std::path::PathBuf>,
}

fn parse_currency(raw: &str) -> Result<Currency, String> {
    Currency::try_from(raw).map_err(|err| err.to_string())
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::try_from(raw.to_ascii_lowercase().as_str()).map_err(|err| err.to_string())
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder()
        .database(db)
        .currency(cli.currency)
        .build()
        .await?;
    let admin = Actor::system();

    match cli.command {
        Command::Profile(Profile {
            command: ProfileCommand::Create(args),
        }) => {
            let mut cmd = NewProfileCmd::new(args.name, args.role);
            cmd.full_name_localized = args.localized;
            cmd.email = args.email;
            cmd.phone = args.phone;
            let profile = engine.create_profile(&admin, cmd).await?;
            println!("created profile: {} ({})", profile.full_name, profile.id);
        }
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = prompt_password_twice()?;
            engine
                .create_user(&admin, &args.username, &password, args.profile_id)
                .await?;
            println!("created user: {}", args.username);
        }
        Command::Wallet(Wallet {
            command: WalletCommand::TopUp(args),
        }) => {
            let amount = Money::parse(&args.amount, engine.currency())?;
            let entry = engine
                .top_up_wallet(
                    &admin,
                    args.profile_id,
                    amount.amount_minor(),
                    args.description.as_deref(),
                )
                .await?;
            println!(
                "new balance: {}",
                Money::new(entry.balance_after_minor, entry.currency)
            );
        }
        Command::Export(Export {
            command: ExportCommand::Csv(args),
        }) => {
            let filter = TransactionListFilter {
                from: args.from,
                to: args.to,
                category: args.category,
                ..Default::default()
            };
            let csv = engine.export_transactions_csv(&admin, &filter).await?;
            match args.output {
                Some(path) => {
                    std::fs::write(&path, csv)?;
                    eprintln!("wrote {}", path.display());
                }
                None => std::io::stdout().write_all(csv.as_bytes())?,
            }
        }
    }

    Ok(())
}

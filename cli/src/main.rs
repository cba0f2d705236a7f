use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use racenight::api::commentary::{DEFAULT_MAX_POLLS, PollPolicy};
use racenight::api::races::RaceAction;
use racenight::api::{admin, auth, bets, commentary, credits, events, horses, races};
use racenight::config::{ConfigError, DEFAULT_API_URL, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, GatewayTimeouts};
use racenight::storage::FileStore;
use racenight::types::NewBet;
use racenight::{Gateway, GatewayConfig, GatewayError};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to render output: {0}")]
    Render(#[from] serde_json::Error),
    #[error("not logged in")]
    NotLoggedIn,
}

#[derive(Parser, Debug)]
#[command(name = "racenight-cli", about = "Race Night host and operator CLI")]
struct Cli {
    #[arg(long, env = "RACENIGHT_API_URL", default_value = DEFAULT_API_URL)]
    base_url: String,

    #[arg(long, env = "RACENIGHT_SESSION_FILE", default_value = ".racenight-session.json")]
    session_file: PathBuf,

    #[arg(long, env = "RACENIGHT_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout_secs: u64,

    #[arg(long, env = "RACENIGHT_CONNECT_TIMEOUT_SECS", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    connect_timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "RACENIGHT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "RACENIGHT_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        name: String,
    },
    Logout,
    Whoami,
    Events(EventsCommand),
    Races(RacesCommand),
    Horses(HorsesCommand),
    Bets(BetsCommand),
    Credits(CreditsCommand),
    Commentary(CommentaryCommand),
    Admin(AdminCommand),
}

#[derive(Args, Debug)]
struct EventsCommand {
    #[command(subcommand)]
    command: EventsSubcommand,
}

#[derive(Subcommand, Debug)]
enum EventsSubcommand {
    List,
    Get { event_id: String },
    Publish { event_id: String },
    Summary { event_id: String },
    GenerateRaces { event_id: String },
    Duplicate { event_id: String },
}

#[derive(Args, Debug)]
struct RacesCommand {
    #[command(subcommand)]
    command: RacesSubcommand,
}

#[derive(Subcommand, Debug)]
enum RacesSubcommand {
    List { event_id: String },
    OpenBetting { race_id: String },
    CloseBetting { race_id: String },
    Start { race_id: String },
    Complete { race_id: String },
}

#[derive(Args, Debug)]
struct HorsesCommand {
    #[command(subcommand)]
    command: HorsesSubcommand,
}

#[derive(Subcommand, Debug)]
enum HorsesSubcommand {
    List {
        event_id: String,
    },
    Approve {
        horse_id: String,
    },
    Reject {
        horse_id: String,
        #[arg(long)]
        reason: Option<String>,
    },
}

#[derive(Args, Debug)]
struct BetsCommand {
    #[command(subcommand)]
    command: BetsSubcommand,
}

#[derive(Subcommand, Debug)]
enum BetsSubcommand {
    Place {
        #[arg(long)]
        race_id: String,
        #[arg(long)]
        horse_id: String,
        #[arg(long)]
        amount: i64,
    },
}

#[derive(Args, Debug)]
struct CreditsCommand {
    #[command(subcommand)]
    command: CreditsSubcommand,
}

#[derive(Subcommand, Debug)]
enum CreditsSubcommand {
    Balance { event_id: String },
    Leaderboard { event_id: String },
    Ledger { event_id: String },
}

#[derive(Args, Debug)]
struct CommentaryCommand {
    #[command(subcommand)]
    command: CommentarySubcommand,
}

#[derive(Subcommand, Debug)]
enum CommentarySubcommand {
    Generate {
        race_id: String,
        #[arg(long, default_value_t = false)]
        wait: bool,
        #[arg(long, default_value_t = 2)]
        interval_secs: u64,
        #[arg(long, default_value_t = DEFAULT_MAX_POLLS)]
        max_polls: u32,
    },
}

#[derive(Args, Debug)]
struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    Reset,
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            if let Some(hint) = hint_for(&e) {
                eprintln!("hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = gateway_config(&cli)?;
    let store = Arc::new(FileStore::new(cli.session_file));
    let gateway = Gateway::from_config(config, store)?;

    match cli.command {
        Command::Login { email, password } => print_json(&auth::login(&gateway, &email, &password).await?),
        Command::Register { email, password, name } => {
            print_json(&auth::register(&gateway, &email, &password, &name).await?)
        }
        Command::Logout => {
            auth::logout(&gateway).await?;
            println!("logged out");
            Ok(())
        }
        Command::Whoami => {
            if !gateway.session().is_authenticated().map_err(GatewayError::from)? {
                return Err(CliError::NotLoggedIn);
            }
            print_json(&auth::me(&gateway).await?)
        }
        Command::Events(cmd) => run_events(&gateway, cmd).await,
        Command::Races(cmd) => run_races(&gateway, cmd).await,
        Command::Horses(cmd) => run_horses(&gateway, cmd).await,
        Command::Bets(cmd) => run_bets(&gateway, cmd).await,
        Command::Credits(cmd) => run_credits(&gateway, cmd).await,
        Command::Commentary(cmd) => run_commentary(&gateway, cmd).await,
        Command::Admin(cmd) => run_admin(&gateway, cmd).await,
    }
}

fn gateway_config(cli: &Cli) -> Result<GatewayConfig, ConfigError> {
    let timeouts = GatewayTimeouts { request_secs: cli.request_timeout_secs, connect_secs: cli.connect_timeout_secs };
    GatewayConfig::new(cli.base_url.as_str()).with_timeouts(timeouts).validated()
}

async fn run_events(gateway: &Gateway, cmd: EventsCommand) -> Result<(), CliError> {
    match cmd.command {
        EventsSubcommand::List => print_json(&events::list(gateway).await?),
        EventsSubcommand::Get { event_id } => print_json(&events::get(gateway, &event_id).await?),
        EventsSubcommand::Publish { event_id } => print_json(&events::publish(gateway, &event_id).await?),
        EventsSubcommand::Summary { event_id } => print_json(&events::summary(gateway, &event_id).await?),
        EventsSubcommand::GenerateRaces { event_id } => print_json(&events::generate_races(gateway, &event_id).await?),
        EventsSubcommand::Duplicate { event_id } => print_json(&events::duplicate(gateway, &event_id).await?),
    }
}

async fn run_races(gateway: &Gateway, cmd: RacesCommand) -> Result<(), CliError> {
    let (race_id, action) = match cmd.command {
        RacesSubcommand::List { event_id } => return print_json(&races::list_for_event(gateway, &event_id).await?),
        RacesSubcommand::OpenBetting { race_id } => (race_id, RaceAction::OpenBetting),
        RacesSubcommand::CloseBetting { race_id } => (race_id, RaceAction::CloseBetting),
        RacesSubcommand::Start { race_id } => (race_id, RaceAction::Start),
        RacesSubcommand::Complete { race_id } => (race_id, RaceAction::Complete),
    };
    let race = races::transition(gateway, &race_id, action).await?;
    tracing::info!(race_id = %race.id, status = race.status.label(), "race updated");
    print_json(&race)
}

async fn run_horses(gateway: &Gateway, cmd: HorsesCommand) -> Result<(), CliError> {
    match cmd.command {
        HorsesSubcommand::List { event_id } => print_json(&horses::list_for_event(gateway, &event_id).await?),
        HorsesSubcommand::Approve { horse_id } => print_json(&horses::approve(gateway, &horse_id).await?),
        HorsesSubcommand::Reject { horse_id, reason } => {
            print_json(&horses::reject(gateway, &horse_id, reason.as_deref()).await?)
        }
    }
}

async fn run_bets(gateway: &Gateway, cmd: BetsCommand) -> Result<(), CliError> {
    match cmd.command {
        BetsSubcommand::Place { race_id, horse_id, amount } => {
            let bet = NewBet { race_id, horse_id, amount };
            print_json(&bets::place(gateway, &bet).await?)
        }
    }
}

async fn run_credits(gateway: &Gateway, cmd: CreditsCommand) -> Result<(), CliError> {
    match cmd.command {
        CreditsSubcommand::Balance { event_id } => print_json(&credits::balance(gateway, &event_id).await?),
        CreditsSubcommand::Leaderboard { event_id } => print_json(&credits::leaderboard(gateway, &event_id).await?),
        CreditsSubcommand::Ledger { event_id } => print_json(&credits::ledger(gateway, &event_id).await?),
    }
}

async fn run_commentary(gateway: &Gateway, cmd: CommentaryCommand) -> Result<(), CliError> {
    match cmd.command {
        CommentarySubcommand::Generate { race_id, wait, interval_secs, max_polls } => {
            let started = commentary::generate(gateway, &race_id).await?;
            if !wait || started.is_terminal() {
                return print_json(&started);
            }
            let policy = PollPolicy { interval: Duration::from_secs(interval_secs), max_polls };
            print_json(&commentary::wait_for_completion(gateway, &race_id, policy).await?)
        }
    }
}

async fn run_admin(gateway: &Gateway, cmd: AdminCommand) -> Result<(), CliError> {
    match cmd.command {
        AdminSubcommand::Reset => print_json(&admin::reset_test_data(gateway).await?),
        AdminSubcommand::Status => print_json(&admin::test_status(gateway).await?),
    }
}

fn hint_for(error: &CliError) -> Option<&'static str> {
    match error {
        CliError::Gateway(GatewayError::AuthenticationExpired) | CliError::NotLoggedIn => {
            Some("session expired or missing; run `racenight-cli login` again")
        }
        CliError::Gateway(GatewayError::Network(_) | GatewayError::Timeout) => {
            Some("check --base-url / RACENIGHT_API_URL and that the backend is running")
        }
        _ => None,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

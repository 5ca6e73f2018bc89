use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use goldtool::export::export_to_csv;
use goldtool::{
    compute_rewards, ClientConfig, ExportError, FailureKind, PipelineRequest, Progress, Realm,
    RewardError, SeasonCatalog, WorkerBusy, WotClient, WotError, Worker,
};

const DEV_CENTER_URL: &str = "https://developers.wargaming.net/";

#[derive(Parser)]
#[command(name = "goldtool", version)]
#[command(about = "Split clan-war gold by tier 8 and tier 10 Global Map battles")]
struct Cli {
    /// Wargaming application id
    #[arg(long, env = "WARGAMING_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// API realm: eu, na or asia
    #[arg(long, default_value = "eu", global = true)]
    realm: Realm,

    /// Pause between two per-member lookups, in milliseconds
    #[arg(long, default_value_t = 500, global = true)]
    throttle_ms: u64,

    /// Attempts per request before giving up on transient failures
    #[arg(long, default_value_t = 3, global = true)]
    max_attempts: u32,

    /// Log debug output
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the Global Map seasons and their ids
    Seasons,
    /// Look up the id of a clan by its exact tag
    Clan { tag: String },
    /// Fetch the clan's battles for a season and split the gold
    Run {
        /// Exact clan tag
        #[arg(long)]
        clan_tag: String,
        /// Season name or id, see `goldtool seasons`
        #[arg(long)]
        season: String,
        /// Gold to distribute
        #[arg(long)]
        gold: u64,
        /// Directory the CSV file is written to
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(thiserror::Error, Debug)]
enum Failure {
    #[error(transparent)]
    Wot(#[from] WotError),
    #[error(transparent)]
    Busy(#[from] WorkerBusy),
    #[error(transparent)]
    Reward(#[from] RewardError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("failed to encode json: {0}")]
    Json(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(api_key) = cli.api_key.clone().filter(|k| !k.trim().is_empty()) else {
        eprintln!(
            "Missing API key. Pass --api-key or set WARGAMING_API_KEY.\n\
             You can create an application id at {DEV_CENTER_URL}"
        );
        return ExitCode::from(2);
    };

    let config = ClientConfig::for_realm(cli.realm)
        .with_throttle(Duration::from_millis(cli.throttle_ms))
        .with_max_attempts(cli.max_attempts);
    let result = match WotClient::with_config(config) {
        Ok(client) => dispatch(cli.command, client, api_key).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            match &failure {
                Failure::Wot(err) => error!(kind = %err.kind(), error = %failure, "stopped"),
                _ => error!(error = %failure, "stopped"),
            }
            eprintln!("{}", user_message(&failure));
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(command: Command, client: WotClient, api_key: String) -> Result<(), Failure> {
    match command {
        Command::Seasons => list_seasons(&client, &api_key).await,
        Command::Clan { tag } => show_clan(&client, &api_key, &tag).await,
        Command::Run {
            clan_tag,
            season,
            gold,
            output_dir,
            format,
        } => {
            let request = PipelineRequest {
                api_key,
                clan_tag,
                season,
            };
            run(client, request, gold, output_dir, format).await
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "goldtool=debug" } else { "goldtool=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn list_seasons(client: &WotClient, api_key: &str) -> Result<(), Failure> {
    let catalog = SeasonCatalog::from(client.fetch_seasons(api_key).await?);
    if catalog.is_empty() {
        println!("No Global Map seasons found.");
        return Ok(());
    }
    info!(count = catalog.len(), "fetched seasons");
    for season in catalog.iter() {
        println!("{}\t{}", season.id, season.name);
    }
    Ok(())
}

async fn show_clan(client: &WotClient, api_key: &str, tag: &str) -> Result<(), Failure> {
    let clan_id = client.resolve_clan_id(api_key, tag).await?;
    let members = client.fetch_clan_members(api_key, clan_id).await?;
    println!("{tag}\t{clan_id}\t{} members", members.len());
    Ok(())
}

async fn run(
    client: WotClient,
    request: PipelineRequest,
    gold: u64,
    output_dir: PathBuf,
    format: OutputFormat,
) -> Result<(), Failure> {
    let worker = Worker::new(client);
    let mut handle = worker.start(request)?;

    let cancel = handle.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("cancelling after the current lookup");
            cancel.cancel();
        }
    });

    info!("started analysis, this can take up to two minutes");
    while let Some(progress) = handle.next_progress().await {
        match progress {
            Progress::Stage(stage) => info!(%stage, "stage reached"),
            Progress::Member { done, total, name } => info!(done, total, %name, "member done"),
        }
    }
    let outcome = handle.wait().await?;

    let sheet = compute_rewards(&outcome.roster, gold)?;
    match format {
        OutputFormat::Csv => {
            let path = export_to_csv(&sheet, &output_dir, &outcome.clan_tag, &outcome.season.name)?;
            println!("Exported results to {}", path.display());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&sheet)?),
    }
    Ok(())
}

fn user_message(failure: &Failure) -> String {
    let Failure::Wot(err) = failure else {
        return failure.to_string();
    };
    match err.kind() {
        FailureKind::InvalidCredentials => {
            format!("Your API key is invalid. Please correct it.\nYou can manage keys at {DEV_CENTER_URL}")
        }
        FailureKind::NotFound => format!("{err}. Please correct your input."),
        FailureKind::ApiError | FailureKind::TransportError => {
            format!("Unexpected error, stopped the process: {err}")
        }
        FailureKind::Unexpected => format!("Unexpected error, the run crashed: {err}"),
        FailureKind::Cancelled => "Process cancelled.".to_owned(),
    }
}

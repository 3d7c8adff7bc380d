use std::sync::Arc;

use canvas::camera::Point;
use canvas::doc::{EntityBinding, MapId, PlacementId, PlacementPatch};
use canvas::engine::{Notice, NoticeLevel};
use canvas::error::LoadError;
use clap::{Parser, Subcommand};
use marina::api::{ApiError, HttpApi, MarinaApi};
use marina::config::{Config, ConfigError};
use marina::session::Session;
use serde_json::{Value, json};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("api request failed: {0}")]
    Api(#[from] ApiError),
    #[error("could not load map: {0}")]
    Load(#[from] LoadError),
    #[error("position {0} is not on this map")]
    UnknownPosition(i64),
    #[error("{0}")]
    Rejected(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "marina", about = "Marina map position editor")]
struct Cli {
    /// Overrides `MARINA_API_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// Overrides `MARINA_API_TOKEN`.
    #[arg(long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List maps.
    Maps {
        /// Include inactive maps.
        #[arg(long)]
        all: bool,
    },
    /// Print the rendered scene of a map.
    Show { map_id: MapId },
    /// Add a placement centred on an image point.
    Add {
        map_id: MapId,
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
    },
    /// Move a placement's top-left corner.
    Move {
        map_id: MapId,
        position_id: i64,
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
    },
    /// Select a placement and replay editor keys (w/a/s/d, [, ], +, -).
    Nudge {
        map_id: MapId,
        position_id: i64,
        #[arg(required = true)]
        keys: Vec<String>,
    },
    Remove {
        map_id: MapId,
        position_id: i64,
    },
    /// Bind a boat to a placement.
    Assign {
        map_id: MapId,
        position_id: i64,
        boat_id: i64,
    },
    Unassign {
        map_id: MapId,
        position_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: ignoring .env: {e}");
        }
    }
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.api_base_url = base_url.trim_end_matches('/').to_owned();
    }
    if cli.token.is_some() {
        config.api_token = cli.token;
    }
    config.validate()?;

    let api = Arc::new(HttpApi::new(&config)?);
    let session = Session::from_config(api, &config);

    match cli.command {
        Command::Maps { all } => run_maps(&session, all).await,
        Command::Show { map_id } => run_show(&session, map_id).await,
        Command::Add { map_id, x, y } => run_add(&session, map_id, Point::new(x, y)).await,
        Command::Move { map_id, position_id, x, y } => {
            run_edit(&session, map_id, position_id, |e, id| e.update(id, &PlacementPatch::position(x, y))).await
        }
        Command::Nudge { map_id, position_id, keys } => run_nudge(&session, map_id, position_id, &keys).await,
        Command::Remove { map_id, position_id } => run_remove(&session, map_id, position_id).await,
        Command::Assign { map_id, position_id, boat_id } => {
            let boat = session.api().get_boat(boat_id).await?;
            let binding = EntityBinding::from(&boat);
            run_edit(&session, map_id, position_id, move |e, id| e.assign(binding, id)).await
        }
        Command::Unassign { map_id, position_id } => {
            run_edit(&session, map_id, position_id, |e, id| e.unassign(id)).await
        }
    }
}

type HttpSession = Session<HttpApi>;

async fn run_maps(session: &HttpSession, all: bool) -> Result<(), CliError> {
    let maps = session.api().list_maps(!all).await?;
    print_json(&serde_json::to_value(maps)?)
}

async fn run_show(session: &HttpSession, map_id: MapId) -> Result<(), CliError> {
    session.load(map_id).await?;
    print_json(&serde_json::to_value(session.scene().await)?)
}

async fn run_add(session: &HttpSession, map_id: MapId, center: Point) -> Result<(), CliError> {
    session.load(map_id).await?;
    let notices = session.handle(|e| e.add_at(center)).await;
    report(&notices)?;
    // The new placement is last in draw order.
    let sprite = session.scene().await.sprites.pop();
    print_json(&serde_json::to_value(sprite)?)
}

async fn run_edit(
    session: &HttpSession,
    map_id: MapId,
    position_id: i64,
    edit: impl FnOnce(&mut canvas::engine::EngineCore, PlacementId) -> Vec<canvas::engine::Action>,
) -> Result<(), CliError> {
    let id = open(session, map_id, position_id).await?;
    let notices = session.handle(|e| edit(e, id)).await;
    report(&notices)?;
    print_placement(session, id).await
}

async fn run_nudge(session: &HttpSession, map_id: MapId, position_id: i64, keys: &[String]) -> Result<(), CliError> {
    let id = open(session, map_id, position_id).await?;
    session
        .with_engine(|e| e.interaction.select(id, &e.store))
        .await
        .map_err(|e| CliError::Rejected(e.to_string()))?;
    for key in keys {
        let notices = session.handle(|e| e.on_key_down(key, false)).await;
        report(&notices)?;
    }
    print_placement(session, id).await
}

async fn run_remove(session: &HttpSession, map_id: MapId, position_id: i64) -> Result<(), CliError> {
    let id = open(session, map_id, position_id).await?;
    let notices = session.handle(|e| e.remove(id)).await;
    report(&notices)?;
    print_json(&json!({ "removed": position_id }))
}

/// Load `map_id` and check that `position_id` is on it.
async fn open(session: &HttpSession, map_id: MapId, position_id: i64) -> Result<PlacementId, CliError> {
    session.load(map_id).await?;
    let id = PlacementId::Server(position_id);
    if session.with_engine(|e| e.store.contains(id)).await {
        Ok(id)
    } else {
        Err(CliError::UnknownPosition(position_id))
    }
}

/// Print notices on stderr; the first error aborts the command.
fn report(notices: &[Notice]) -> Result<(), CliError> {
    for notice in notices {
        let code = notice.code.unwrap_or("-");
        match notice.level {
            NoticeLevel::Error => return Err(CliError::Rejected(format!("{} ({code})", notice.message))),
            NoticeLevel::Warning => eprintln!("warning: {} ({code})", notice.message),
            NoticeLevel::Info => eprintln!("{}", notice.message),
        }
    }
    Ok(())
}

async fn print_placement(session: &HttpSession, id: PlacementId) -> Result<(), CliError> {
    let entry = session.with_engine(|e| e.placement(id).cloned()).await;
    let value = match entry {
        Some(entry) => {
            let g = entry.placement.geometry;
            json!({
                "id": position_id_json(id),
                "label": entry.label(),
                "x": g.x,
                "y": g.y,
                "width": g.width,
                "height": g.height,
                "rotation": g.rotation,
                "boat_id": entry.binding.map(|b| b.id),
            })
        }
        None => Value::Null,
    };
    print_json(&value)
}

fn position_id_json(id: PlacementId) -> Value {
    match id.server() {
        Some(n) => json!(n),
        None => json!(id.to_string()),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

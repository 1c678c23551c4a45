//! Line-oriented terminal front end.
//!
//! Stdin lines become UI events or simulated collaborator input (position
//! fixes, sensor failures, other participants). After every event the
//! view-model is rendered as text when it changed.

use std::fmt::Write as _;

use adapters::{
    AdapterError, LatLng, MemoryConnection, PositionFeed, RealtimeStore, ScriptedConfirm,
    SensorErrorCode, UserId, UserUpdate,
};
use nethelp::auth::LOGOUT_PROMPT;
use nethelp::ui::Screen;
use nethelp::{App, Flow, UiEvent};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

const HELP: &str = "\
commands:
  login <name>                 join the board
  logout                       leave the board (asks for confirmation)
  online | offline             connectivity signal
  fix <lat> <lng>              position fix from the device
  deny | unavailable | timeout | error
                               position sensor failure
  peer <id> <name> <lat> <lng> another participant moves
  drop <id>                    another participant leaves
  center                       recenter the map on yourself
  status                       print the current view
  quit                         exit";

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command `{0}`, try `help`")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Coordinates(#[from] AdapterError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ui(UiEvent),
    Logout,
    Fix(LatLng),
    SensorFailure(SensorErrorCode),
    Peer {
        id: UserId,
        name: String,
        position: LatLng,
    },
    Drop(UserId),
    Status,
    Help,
}

fn coordinates(lat: &str, lng: &str, usage: &'static str) -> Result<LatLng, CommandError> {
    let lat = lat.parse().map_err(|_| CommandError::Usage(usage))?;
    let lng = lng.parse().map_err(|_| CommandError::Usage(usage))?;
    Ok(LatLng::new(lat, lng)?)
}

impl Command {
    /// Parses one input line; blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match word {
            "" => return Ok(None),
            "login" => Self::Ui(UiEvent::Login(rest.to_owned())),
            "logout" => Self::Logout,
            "online" => Self::Ui(UiEvent::Online),
            "offline" => Self::Ui(UiEvent::Offline),
            "center" => Self::Ui(UiEvent::Recenter),
            "quit" | "exit" => Self::Ui(UiEvent::Shutdown),
            "fix" => match args.as_slice() {
                [lat, lng] => Self::Fix(coordinates(lat, lng, "fix <lat> <lng>")?),
                _ => return Err(CommandError::Usage("fix <lat> <lng>")),
            },
            "deny" => Self::SensorFailure(SensorErrorCode::PermissionDenied),
            "unavailable" => Self::SensorFailure(SensorErrorCode::PositionUnavailable),
            "timeout" => Self::SensorFailure(SensorErrorCode::Timeout),
            "error" => Self::SensorFailure(SensorErrorCode::Unknown),
            "peer" => match args.as_slice() {
                [id, name, lat, lng] => Self::Peer {
                    id: UserId::from(*id),
                    name: (*name).to_owned(),
                    position: coordinates(lat, lng, "peer <id> <name> <lat> <lng>")?,
                },
                _ => return Err(CommandError::Usage("peer <id> <name> <lat> <lng>")),
            },
            "drop" => match args.as_slice() {
                [id] => Self::Drop(UserId::from(*id)),
                _ => return Err(CommandError::Usage("drop <id>")),
            },
            "status" => Self::Status,
            "help" => Self::Help,
            other => return Err(CommandError::Unknown(other.to_owned())),
        };
        Ok(Some(command))
    }
}

/// Simulated collaborators driven from the terminal.
pub struct Simulation {
    pub feed: PositionFeed,
    pub peers: MemoryConnection,
    pub confirm: ScriptedConfirm,
}

pub fn render(app: &App) -> String {
    let ui = app.ui();
    let mut out = String::new();
    match ui.screen() {
        Screen::Login => out.push_str("[login] type `login <name>` to join"),
        Screen::Map => {
            let members: Vec<String> = ui
                .roster
                .members()
                .iter()
                .map(|tag| {
                    if tag.is_current_user {
                        format!("*{}", tag.name)
                    } else {
                        tag.name.clone()
                    }
                })
                .collect();
            let _ = write!(
                out,
                "[map] {} | members {}: {} | markers {}",
                ui.current_user_name().unwrap_or_default(),
                ui.roster.count(),
                members.join(", "),
                app.map().marker_count()
            );
            if let Some(position) = app.tracker().last_known() {
                let _ = write!(out, " | at {position}");
            }
        }
    }
    if let Some(banner) = ui.banner() {
        let _ = write!(out, "\n  # {banner}");
    }
    if let Some(notice) = ui.notice() {
        let _ = write!(out, "\n  ! {notice}");
    }
    out
}

type InputLines = Lines<BufReader<Stdin>>;

async fn execute(
    app: &mut App,
    sim: &Simulation,
    lines: &mut InputLines,
    command: Command,
) -> anyhow::Result<Flow> {
    match command {
        Command::Ui(event) => return Ok(app.handle_ui(event).await),
        Command::Logout => {
            if app.session().is_some() {
                println!("{LOGOUT_PROMPT} [y/N]");
                let answer = lines.next_line().await?.unwrap_or_default();
                sim.confirm
                    .push_answer(matches!(answer.trim(), "y" | "Y" | "yes"));
            }
            app.handle_ui(UiEvent::Logout).await;
        }
        Command::Fix(position) => {
            if sim.feed.push_fix(position) == 0 {
                println!("(no active position watch)");
            }
        }
        Command::SensorFailure(code) => {
            if sim.feed.push_error(code) == 0 {
                println!("(no active position watch)");
            }
        }
        Command::Peer { id, name, position } => {
            if let Err(err) = sim.peers.update_user(&id, UserUpdate::new(name, position)).await {
                println!("! {err}");
            }
        }
        Command::Drop(id) => {
            if let Err(err) = sim.peers.remove_user(&id).await {
                println!("! {err}");
            }
        }
        Command::Status => println!("{}", render(app)),
        Command::Help => println!("{HELP}"),
    }
    Ok(Flow::Continue)
}

pub async fn run(mut app: App, sim: Simulation) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_frame = String::new();
    println!("{HELP}");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    app.handle_ui(UiEvent::Shutdown).await;
                    break;
                };
                match Command::parse(&line) {
                    Ok(Some(command)) => {
                        if execute(&mut app, &sim, &mut lines, command).await? == Flow::Exit {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => println!("? {err}"),
                }
            }
            incoming = app.next_incoming() => app.handle_incoming(incoming).await,
        }

        let frame = render(&app);
        if frame != last_frame {
            println!("{frame}");
            last_frame = frame;
        }
    }
    tracing::info!("terminal session closed");
    Ok(())
}

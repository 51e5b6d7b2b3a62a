//! Session driver – runs a [`GeocacheService`] against a terminal.
//!
//! ## Inputs
//!
//! Everything that can change the world arrives on one `mpsc` queue and is
//! applied by a single event loop, so moves, transfers and saves never
//! interleave:
//!
//! | Source              | Task                   | Produces                      |
//! |---------------------|------------------------|-------------------------------|
//! | stdin lines         | `spawn_stdin_reader`   | any [`Input`]                 |
//! | geolocation track   | `spawn_track_replay`   | `Command::MoveTo` per fix     |
//! | autosave timer      | event loop             | save                          |
//! | Ctrl-C              | event loop             | save + shutdown               |
//!
//! ## Text commands
//!
//! | Line                    | Effect                                  |
//! |-------------------------|-----------------------------------------|
//! | `n` `s` `e` `w`         | step north / south / east / west        |
//! | `goto <lat> <lng>`      | jump to a position                      |
//! | `collect <i:j> <coin>`  | take a coin from the cache at `i:j`     |
//! | `deposit <i:j>`         | give a coin to the cache at `i:j`       |
//! | `look`                  | list visible caches                     |
//! | `inv`                   | list inventory                          |
//! | `stats`                 | world statistics                        |
//! | `track stop`            | stop the geolocation replay             |
//! | `save` / `reset` / `quit` |                                       |

use crate::cache::CoinId;
use crate::config::WorldConfig;
use crate::persistence::{encode_state, StateStore};
use crate::protocol::{CacheView, Command, CommandOutcome};
use crate::service::{GeocacheService, MoveReport};
use crate::types::{CellCoord, Direction, LatLng};
use anyhow::{Context, Result};
use std::io::BufRead;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const QUEUE_DEPTH: usize = 64;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Command(Command),
    Look,
    Inventory,
    Stats,
    Save,
    StopTracking,
    Help,
    Quit,
    /// A line that did not parse; reported back to the user.
    Invalid(String),
}

/// Parse one line of user input. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<Input> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let (&verb, args) = words.split_first()?;

    let input = match (verb.to_ascii_lowercase().as_str(), args) {
        ("look" | "l", []) => Input::Look,
        ("inv" | "inventory" | "i", []) => Input::Inventory,
        ("stats", []) => Input::Stats,
        ("save", []) => Input::Save,
        ("reset", []) => Input::Command(Command::Reset),
        ("help" | "?", []) => Input::Help,
        ("quit" | "exit" | "q", []) => Input::Quit,
        ("track", ["stop"]) | ("stop", []) => Input::StopTracking,
        ("goto", [lat, lng]) => match (lat.parse(), lng.parse()) {
            (Ok(lat), Ok(lng)) => Input::Command(Command::MoveTo {
                position: LatLng::new(lat, lng),
            }),
            _ => Input::Invalid(format!("bad position '{} {}'", lat, lng)),
        },
        ("collect", [cell, coin]) => match (parse_cell(cell), coin.parse::<CoinId>()) {
            (Some(cell), Ok(coin)) => Input::Command(Command::Collect { cell, coin }),
            _ => Input::Invalid(format!("usage: collect <i:j> <i:j#serial>, got '{}'", line)),
        },
        ("deposit", [cell]) => match parse_cell(cell) {
            Some(cell) => Input::Command(Command::Deposit { cell }),
            None => Input::Invalid(format!("bad cell '{}'", cell)),
        },
        (other, []) => match other.parse::<Direction>() {
            Ok(direction) => Input::Command(Command::Move { direction }),
            Err(e) => Input::Invalid(e),
        },
        _ => Input::Invalid(format!("unrecognised command '{}'", line.trim())),
    };
    Some(input)
}

fn parse_cell(s: &str) -> Option<CellCoord> {
    let (i, j) = s.split_once(':')?;
    Some(CellCoord::new(i.parse().ok()?, j.parse().ok()?))
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Period of the background save.
    pub autosave_interval: Duration,
    /// Delay between replayed geolocation fixes.
    pub track_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            autosave_interval: Duration::from_secs(30),
            track_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

// ---------------------------------------------------------------------------
// SessionDriver
// ---------------------------------------------------------------------------

/// Owns the service and its state store for the duration of a session.
pub struct SessionDriver<S: StateStore> {
    config: DriverConfig,
    service: GeocacheService,
    store: S,
    tracker: Option<JoinHandle<()>>,
}

impl<S: StateStore> SessionDriver<S> {
    /// Build the service and restore whatever `store` holds.
    ///
    /// An unreadable or corrupt blob is logged and replaced by a fresh
    /// session.
    pub fn start(world: WorldConfig, store: S, config: DriverConfig) -> Result<Self> {
        let mut service = GeocacheService::new(world).context("Invalid world configuration")?;

        let blob = match store.load() {
            Ok(blob) => blob,
            Err(e) => {
                warn!("Failed to read saved state: {}", e);
                None
            }
        };
        let report = service.restore_or_fresh(blob.as_deref());
        info!(
            "Session ready at {} (cell {}, {} caches visible)",
            report.position,
            report.cell,
            service.visible_caches().len()
        );

        Ok(Self {
            config,
            service,
            store,
            tracker: None,
        })
    }

    pub fn service(&self) -> &GeocacheService {
        &self.service
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run until stdin closes, `quit`, or Ctrl-C. Saves on the way out.
    pub async fn run(mut self, track: Option<Vec<LatLng>>) -> Result<S> {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);

        spawn_stdin_reader(tx.clone());
        if let Some(track) = track {
            info!("Replaying {} geolocation fixes", track.len());
            self.tracker = Some(spawn_track_replay(track, self.config.track_interval, tx));
        } else {
            drop(tx);
        }

        self.event_loop(rx).await;
        Ok(self.store)
    }

    /// Apply queued inputs until the queue closes, a `Quit` arrives or the
    /// process is interrupted.
    pub async fn event_loop(&mut self, mut rx: mpsc::Receiver<Input>) {
        let mut autosave = tokio::time::interval(self.config.autosave_interval);
        // The first tick completes immediately.
        autosave.tick().await;

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                input = rx.recv() => {
                    let Some(input) = input else { break };
                    let (flow, lines) = self.handle_input(input);
                    for line in lines {
                        println!("{}", line);
                    }
                    if flow == Flow::Stop {
                        break;
                    }
                }
                _ = autosave.tick() => self.save(),
                _ = &mut shutdown => {
                    info!("Shutting down (SIGINT)");
                    break;
                }
            }
        }

        self.stop_tracking();
        self.save();
    }

    /// Apply one input and describe the result for the user.
    pub fn handle_input(&mut self, input: Input) -> (Flow, Vec<String>) {
        let lines = match input {
            Input::Command(command) => match self.service.apply(command) {
                Ok(outcome) => {
                    self.save();
                    describe_outcome(&outcome)
                }
                Err(e) => vec![format!("error: {}", e)],
            },
            Input::Look => {
                let caches = self.service.visible_caches();
                if caches.is_empty() {
                    vec!["No caches in sight.".into()]
                } else {
                    caches.iter().map(describe_cache).collect()
                }
            }
            Input::Inventory => {
                let inv = self.service.inventory();
                if inv.is_empty() {
                    vec!["Inventory is empty.".into()]
                } else {
                    inv.iter()
                        .map(|(coin, n)| format!("{} x{}", coin, n))
                        .collect()
                }
            }
            Input::Stats => match serde_json::to_string_pretty(&self.service.stats()) {
                Ok(json) => vec![json],
                Err(e) => vec![format!("error: {}", e)],
            },
            Input::Save => {
                self.save();
                vec!["Saved.".into()]
            }
            Input::StopTracking => {
                if self.stop_tracking() {
                    vec!["Geolocation tracking stopped.".into()]
                } else {
                    vec!["Geolocation tracking is not running.".into()]
                }
            }
            Input::Help => vec![HELP.trim().to_string()],
            Input::Quit => return (Flow::Stop, vec!["Bye.".into()]),
            Input::Invalid(msg) => vec![format!("error: {}", msg)],
        };
        (Flow::Continue, lines)
    }

    /// Abort the replay task. Returns `false` if none was running.
    pub fn stop_tracking(&mut self) -> bool {
        match self.tracker.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    fn save(&mut self) {
        let result = encode_state(&self.service.snapshot()).and_then(|blob| self.store.save(&blob));
        if let Err(e) = result {
            warn!("Failed to save state: {}", e);
        }
    }
}

// ---------------------------------------------------------------------------
// Input tasks
// ---------------------------------------------------------------------------

/// Blocking stdin reads run on their own OS thread, outside the runtime.
fn spawn_stdin_reader(tx: mpsc::Sender<Input>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if let Some(input) = parse_line(&line) {
                        if tx.blocking_send(input).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    warn!("stdin read failed: {}", e);
                    break;
                }
            }
        }
        let _ = tx.blocking_send(Input::Quit);
    });
}

fn spawn_track_replay(
    track: Vec<LatLng>,
    interval: Duration,
    tx: mpsc::Sender<Input>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        for position in track {
            timer.tick().await;
            if tx
                .send(Input::Command(Command::MoveTo { position }))
                .await
                .is_err()
            {
                return;
            }
        }
        info!("Geolocation track finished");
    })
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

const HELP: &str = r#"
n/s/e/w               step one cell
goto <lat> <lng>      jump to a position
collect <i:j> <coin>  take a coin from a cache
deposit <i:j>         leave a coin in a cache
look | inv | stats    show caches, inventory, statistics
track stop            stop geolocation replay
save | reset | quit
"#;

fn describe_outcome(outcome: &CommandOutcome) -> Vec<String> {
    match outcome {
        CommandOutcome::Moved(report) => describe_move(report),
        CommandOutcome::Collected(c) if c.collected => {
            vec![format!("Collected {} (now holding {}).", c.coin, c.held)]
        }
        CommandOutcome::Collected(c) => vec![format!("{} is not in that cache.", c.coin)],
        CommandOutcome::Deposited { coin: Some(coin) } => vec![format!("Deposited {}.", coin)],
        CommandOutcome::Deposited { coin: None } => vec!["Nothing to deposit.".into()],
    }
}

fn describe_move(report: &MoveReport) -> Vec<String> {
    let mut lines = vec![format!("At {} (cell {}).", report.position, report.cell)];
    if !report.shown.is_empty() {
        lines.push(format!("{} cache(s) came into view.", report.shown.len()));
    }
    if !report.hidden.is_empty() {
        lines.push(format!("{} cache(s) out of view.", report.hidden.len()));
    }
    lines
}

fn describe_cache(view: &CacheView) -> String {
    let coins: Vec<String> = view.coins.iter().map(ToString::to_string).collect();
    format!(
        "cache {} at {}: [{}]",
        view.cell,
        view.position,
        coins.join(", ")
    )
}

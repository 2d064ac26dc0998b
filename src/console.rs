//! Interactive dashboard session over stdin/stdout.
//!
//! DESIGN
//! ======
//! `parse_command` turns one input line into a `Command`; `Console::execute`
//! runs it against the shell and returns text to print. Every remote call
//! (generation, history refresh, insight report) is spawned so the prompt
//! stays usable while it is in flight. Content-panel outcomes reach the
//! operator through a watcher task that prints every published view state
//! and history snapshot; insight reports are printed by their own task.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::api::ApiError;
use crate::coordinator::SubmitError;
use crate::history::{HistoryFetchError, HistoryRow, HistorySnapshot};
use crate::model::{GenerationRequest, Platform, UnknownPlatform};
use crate::panels::{ContentPanel, PanelError};
use crate::shell::{DashboardShell, MountedPanel, Tab, UnknownTab};
use crate::view_state::ViewState;

pub const HELP: &str = "\
commands:
  tab <content|sentiment|metrics|ab>       switch panel
  generate <platform> <topic> | <product>  submit a generation (content tab)
  refresh                                  refetch the current panel
  history                                  list past generations
  inspect [id]                             open a history entry, or pin the latest result
  state                                    show the generation state
  help                                     this text
  quit                                     leave";

// =============================================================================
// COMMANDS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tab(Tab),
    Generate(GenerationRequest),
    Refresh,
    History,
    Inspect(Option<Uuid>),
    State,
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error(transparent)]
    Tab(#[from] UnknownTab),
    #[error(transparent)]
    Platform(#[from] UnknownPlatform),
    #[error("invalid id: {0}")]
    InvalidId(String),
}

/// Parse one input line. Blank lines yield `None`.
///
/// # Errors
///
/// Unknown verbs, missing arguments, unknown tabs or platforms, and
/// malformed ids.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match verb.to_ascii_lowercase().as_str() {
        "tab" => {
            if rest.is_empty() {
                return Err(CommandError::Usage("tab <content|sentiment|metrics|ab>"));
            }
            Command::Tab(rest.parse()?)
        }
        "generate" | "gen" => Command::Generate(parse_generate(rest)?),
        "refresh" => Command::Refresh,
        "history" => Command::History,
        "inspect" => {
            if rest.is_empty() {
                Command::Inspect(None)
            } else {
                let id = Uuid::parse_str(rest).map_err(|_| CommandError::InvalidId(rest.to_owned()))?;
                Command::Inspect(Some(id))
            }
        }
        "state" => Command::State,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_owned())),
    };
    Ok(Some(command))
}

/// `<platform> <topic> | <product info>`. Emptiness is left to request
/// validation so the operator sees the same error the panel would give.
fn parse_generate(rest: &str) -> Result<GenerationRequest, CommandError> {
    const USAGE: &str = "generate <platform> <topic> | <product info>";
    let (platform, tail) = rest.split_once(char::is_whitespace).ok_or(CommandError::Usage(USAGE))?;
    let platform: Platform = platform.parse()?;
    let (topic, product_info) = tail.split_once('|').ok_or(CommandError::Usage(USAGE))?;
    Ok(GenerationRequest::new(topic.trim(), platform, product_info.trim()))
}

// =============================================================================
// RENDERING
// =============================================================================

#[must_use]
pub fn render_view(state: &ViewState) -> String {
    match state {
        ViewState::Idle => "idle".to_owned(),
        ViewState::Submitting(request) => {
            format!("generating {} post about \"{}\"...", request.platform(), request.topic())
        }
        ViewState::Success(result) => {
            let mut out = format!("status: {}", result.status);
            if let Some(score) = result.quality_score {
                let _ = write!(out, "\nquality score: {score:.1}/10");
            }
            if let Some(content) = &result.final_content {
                let _ = write!(out, "\n\n{content}");
            }
            if let Some(notes) = &result.critique_notes {
                let _ = write!(out, "\n\ncritique: {notes}");
            }
            out
        }
        ViewState::Failed(message) => format!("error: {message}"),
    }
}

#[must_use]
pub fn render_history(snapshot: &HistorySnapshot) -> String {
    let rows = snapshot.rows();
    let mut out = String::new();
    if rows.is_empty() {
        out.push_str("no history yet");
    }
    for row in rows {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = match row {
            HistoryRow::Pending(p) => write!(
                out,
                "[pending] {:<9} {} ({})",
                p.platform,
                p.topic,
                p.quality_score.map_or_else(|| "-".to_owned(), |s| format!("{s:.1}")),
            ),
            HistoryRow::Confirmed(e) => write!(
                out,
                "{} {:<9} {} ({:.1}) {}",
                e.id,
                e.platform,
                e.topic,
                e.quality_score,
                e.created_at.format(&Rfc3339).unwrap_or_else(|_| e.created_at.to_string()),
            ),
        };
    }
    if snapshot.loading {
        out.push_str("\n(refreshing...)");
    }
    if let Some(err) = &snapshot.error {
        let _ = write!(out, "\nnotice: {err}");
    }
    out
}

fn render_json(value: &impl Serialize) -> Result<String, ConsoleError> {
    Ok(serde_json::to_string_pretty(value)?)
}

// =============================================================================
// CONSOLE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("{0} is only available on the content tab")]
    NotOnContentTab(&'static str),
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error(transparent)]
    Panel(#[from] PanelError),
    #[error(transparent)]
    History(#[from] HistoryFetchError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("render failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("input failed: {0}")]
    Io(#[from] std::io::Error),
}

pub struct Console {
    shell: DashboardShell,
    watcher: Option<JoinHandle<()>>,
    pending: Vec<JoinHandle<()>>,
}

impl Console {
    #[must_use]
    pub fn new(shell: DashboardShell) -> Self {
        let watcher = match shell.current() {
            MountedPanel::Content(panel) => Some(watch_content(&panel)),
            _ => None,
        };
        Self { shell, watcher, pending: Vec::new() }
    }

    #[must_use]
    pub fn shell(&self) -> &DashboardShell {
        &self.shell
    }

    /// Read commands from stdin until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Only stdin read failures end the session early.
    pub async fn run(mut self) -> Result<(), ConsoleError> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("TrendForgeAI dashboard ({})\n{HELP}", self.shell.active());
        while let Some(line) = lines.next_line().await? {
            match parse_command(&line) {
                Ok(None) => {}
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => match self.execute(command) {
                    Ok(Some(text)) => println!("{text}"),
                    Ok(None) => {}
                    Err(e) => println!("error: {e}"),
                },
                Err(e) => println!("{e}"),
            }
        }
        self.close();
        Ok(())
    }

    /// Run one command and return the text to show, if any. Never waits
    /// on the network.
    ///
    /// # Errors
    ///
    /// Command failures the operator should see; none of them end the
    /// session.
    pub fn execute(&mut self, command: Command) -> Result<Option<String>, ConsoleError> {
        match command {
            Command::Tab(tab) => Ok(Some(self.switch(tab))),
            Command::Generate(request) => {
                let panel = self.content("generate")?;
                request.validate().map_err(SubmitError::from)?;
                if panel.coordinator().is_in_flight() {
                    return Err(SubmitError::ConcurrentSubmission.into());
                }
                self.track(tokio::spawn(async move {
                    match panel.submit(request).await {
                        Ok(_) | Err(SubmitError::Api(_) | SubmitError::Discarded) => {}
                        Err(e) => println!("error: {e}"),
                    }
                }));
                Ok(None)
            }
            Command::Refresh => {
                let panel = self.shell.current();
                self.spawn_load(panel);
                Ok(None)
            }
            Command::History => {
                let panel = self.content("history")?;
                Ok(Some(render_history(&panel.history().snapshot())))
            }
            Command::Inspect(None) => {
                let panel = self.content("inspect")?;
                let entry = panel.inspect_latest()?;
                Ok(Some(format!("pinned \"{}\" to the top of history", entry.topic)))
            }
            Command::Inspect(Some(id)) => {
                let panel = self.content("inspect")?;
                panel.inspect_entry(id)?;
                Ok(None)
            }
            Command::State => {
                let panel = self.content("state")?;
                Ok(Some(render_view(&panel.coordinator().view())))
            }
            Command::Help => Ok(Some(HELP.to_owned())),
            Command::Quit => Ok(None),
        }
    }

    /// Wait for every spawned generation, refresh and report load.
    pub async fn settle(&mut self) {
        for handle in self.pending.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "console task ended abnormally");
            }
        }
    }

    /// Unmount the current panel and stop printing updates.
    pub fn close(&mut self) {
        self.stop_watcher();
        self.shell.close();
    }

    fn switch(&mut self, tab: Tab) -> String {
        let was = self.shell.active();
        let panel = self.shell.select(tab);
        if was == tab {
            return format!("already on {tab}");
        }
        self.stop_watcher();
        match &panel {
            MountedPanel::Content(content) => self.watcher = Some(watch_content(content)),
            _ => self.spawn_load(panel),
        }
        format!("== {tab} ==")
    }

    /// Refresh the content panel (the watcher prints the result) or fetch
    /// and print an insight report.
    fn spawn_load(&mut self, panel: MountedPanel) {
        let handle = tokio::spawn(async move {
            match load(&panel).await {
                Ok(Some(report)) => println!("{report}"),
                Ok(None) => {}
                Err(e) => println!("error: {e}"),
            }
        });
        self.track(handle);
    }

    fn track(&mut self, handle: JoinHandle<()>) {
        self.pending.retain(|h| !h.is_finished());
        self.pending.push(handle);
    }

    fn content(&self, what: &'static str) -> Result<Arc<ContentPanel>, ConsoleError> {
        match self.shell.current() {
            MountedPanel::Content(panel) => Ok(panel),
            _ => Err(ConsoleError::NotOnContentTab(what)),
        }
    }

    fn stop_watcher(&mut self) {
        if let Some(handle) = self.watcher.take() {
            handle.abort();
        }
    }
}

/// Insight panels render their report. A content refresh renders nothing
/// here: the watcher prints the published snapshot, failure included.
async fn load(panel: &MountedPanel) -> Result<Option<String>, ConsoleError> {
    let report = match panel {
        MountedPanel::Sentiment(p) => render_json(&p.load().await?)?,
        MountedPanel::Performance(p) => render_json(&p.load().await?)?,
        MountedPanel::AbTesting(p) => render_json(&p.load().await?)?,
        MountedPanel::Content(p) => {
            if let Err(e) = p.refresh().await {
                tracing::debug!(error = %e, "manual history refresh failed");
            }
            return Ok(None);
        }
    };
    Ok(Some(report))
}

fn watch_content(panel: &ContentPanel) -> JoinHandle<()> {
    let mut view = panel.coordinator().subscribe();
    let mut history = panel.history().subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = view.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let text = render_view(&view.borrow_and_update());
                    println!("{text}");
                }
                changed = history.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = history.borrow_and_update().clone();
                    if !snapshot.loading {
                        println!("{}", render_history(&snapshot));
                    }
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "console_test.rs"]
mod tests;

// Line-oriented capture front-end
//
// Reads one input per line:
//   date YYYY-MM-DD | responsible NAME | entry YYYY-MM-DD | days N | preset N | phase 1|2
// An empty line confirms, `cancel` cancels, end of input cancels.

use async_trait::async_trait;
use chrono::NaiveDate;
use statig::prelude::*;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::capture::{CaptureEvent, CaptureSession, Collected, SideDataCollector};
use crate::config::CaptureConfig;
use crate::errors::Result;
use crate::models::InstalledPhase;
use crate::pipeline::SideDataRequirement;

pub struct PromptCollector<R, W> {
    input: Mutex<R>,
    output: Mutex<W>,
    capture: CaptureConfig,
    prefilled: Vec<CaptureEvent>,
    auto_confirm: bool,
    today: NaiveDate,
}

impl<R, W> PromptCollector<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, output: W, capture: CaptureConfig) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
            capture,
            prefilled: Vec::new(),
            auto_confirm: false,
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Events applied before any line is read (values given on the command line)
    pub fn with_prefilled(mut self, events: Vec<CaptureEvent>) -> Self {
        self.prefilled = events;
        self
    }

    /// Confirm right after the pre-filled events; falls back to prompting when they
    /// are incomplete.
    pub fn with_auto_confirm(mut self, auto_confirm: bool) -> Self {
        self.auto_confirm = auto_confirm;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    async fn say(&self, text: &str) -> Result<()> {
        let mut output = self.output.lock().await;
        output.write_all(text.as_bytes()).await?;
        output.flush().await?;
        Ok(())
    }
}

/// Parse one input line into a capture event
pub fn parse_line(line: &str) -> std::result::Result<CaptureEvent, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(CaptureEvent::Confirm);
    }

    let (keyword, value) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let value = value.trim();
    let date = |value: &str| {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|_| format!("'{value}' is not a date (YYYY-MM-DD)"))
    };
    let number = |value: &str| {
        value
            .parse::<u32>()
            .map_err(|_| format!("'{value}' is not a whole number"))
    };

    match keyword.to_lowercase().as_str() {
        "cancel" | "q" => Ok(CaptureEvent::Cancel),
        "ok" | "confirm" => Ok(CaptureEvent::Confirm),
        "date" => date(value).map(CaptureEvent::SetDate),
        "entry" => date(value).map(CaptureEvent::SetEntryDate),
        "responsible" if !value.is_empty() => Ok(CaptureEvent::SetResponsible(value.to_string())),
        "days" => number(value).map(CaptureEvent::SetDays),
        "preset" => match number(value)? {
            0 => Err("presets are numbered from 1".to_string()),
            n => Ok(CaptureEvent::SelectPreset(n as usize - 1)),
        },
        "phase" => value
            .parse::<InstalledPhase>()
            .map(CaptureEvent::ChoosePhase)
            .map_err(|e| e.to_string()),
        _ => Err(format!("unrecognized input '{line}'")),
    }
}

fn instructions(session: &CaptureSession) -> String {
    match session.requirement() {
        SideDataRequirement::VisitScheduling | SideDataRequirement::InstallationScheduling => {
            format!(
                "📝 {}: enter 'date YYYY-MM-DD' and 'responsible NAME', empty line to confirm, 'cancel' to abort\n",
                session.requirement()
            )
        }
        SideDataRequirement::InstalledPhaseSelection => {
            "📝 Installed phase: enter 'phase 1' or 'phase 2', empty line to confirm, 'cancel' to abort\n"
                .to_string()
        }
        SideDataRequirement::ProductionDateRange => {
            let presets = session
                .presets()
                .iter()
                .enumerate()
                .map(|(i, days)| format!("{}={}d", i + 1, days))
                .collect::<Vec<_>>()
                .join(" ");
            format!(
                "📝 Production dates: entry {} + {} days = due {}\n   'entry YYYY-MM-DD', 'days N' or 'preset N' ({}), empty line to confirm, 'cancel' to abort\n",
                session.entry_date(),
                session.days(),
                session
                    .due_date()
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                presets
            )
        }
        SideDataRequirement::None => String::new(),
    }
}

#[async_trait]
impl<R, W> SideDataCollector for PromptCollector<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn collect(&self, requirement: SideDataRequirement) -> Result<Collected> {
        let mut sm = CaptureSession::new(requirement, &self.capture, self.today)?.state_machine();

        for event in &self.prefilled {
            sm.handle(event);
        }
        if self.auto_confirm {
            sm.handle(&CaptureEvent::Confirm);
        }

        let mut input = self.input.lock().await;
        loop {
            if let Some(collected) = sm.outcome() {
                return Ok(collected.clone());
            }

            if let Some(problem) = sm.problem() {
                self.say(&format!("⚠️  {problem}\n")).await?;
            }
            self.say(&instructions(&sm)).await?;

            let mut line = String::new();
            if input.read_line(&mut line).await? == 0 {
                tracing::debug!(%requirement, "Input closed during capture");
                sm.handle(&CaptureEvent::Cancel);
                continue;
            }

            match parse_line(&line) {
                Ok(event) => sm.handle(&event),
                Err(message) => self.say(&format!("⚠️  {message}\n")).await?,
            }
        }
    }
}

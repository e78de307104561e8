// Side-data capture session
//
// One session per collection. Input events edit the fields while awaiting input;
// Confirm validates and finishes, Cancel finishes without a payload. Events after a
// terminal state are ignored.

use chrono::{Days, NaiveDate};
use statig::prelude::*;

use crate::capture::Collected;
use crate::config::CaptureConfig;
use crate::errors::{BoardError, Result};
use crate::models::{InstalledPhase, SideData};
use crate::pipeline::SideDataRequirement;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    SetDate(NaiveDate),
    SetResponsible(String),
    SetEntryDate(NaiveDate),
    SetDays(u32),
    /// Index into the configured due-date presets
    SelectPreset(usize),
    ChoosePhase(InstalledPhase),
    Confirm,
    Cancel,
}

#[derive(Debug)]
pub struct CaptureSession {
    requirement: SideDataRequirement,
    presets: Vec<u32>,
    date: Option<NaiveDate>,
    responsible: String,
    entry_date: NaiveDate,
    days: u32,
    due_date: Option<NaiveDate>,
    phase: Option<InstalledPhase>,
    problem: Option<String>,
    outcome: Option<Collected>,
}

/// Due date for a production run of `days` starting on `entry_date`
pub fn due_date_for(entry_date: NaiveDate, days: u32) -> Option<NaiveDate> {
    entry_date.checked_add_days(Days::new(u64::from(days)))
}

impl CaptureSession {
    /// `today` seeds the production entry date.
    pub fn new(
        requirement: SideDataRequirement,
        capture: &CaptureConfig,
        today: NaiveDate,
    ) -> Result<Self> {
        if requirement.is_none() {
            return Err(BoardError::InvalidSideData(
                "nothing to capture for a transition without requirement".to_string(),
            ));
        }
        if capture.default_production_days == 0 {
            return Err(BoardError::Config(
                "capture.default_production_days must be positive".to_string(),
            ));
        }

        let days = capture.default_production_days;
        Ok(Self {
            requirement,
            presets: capture.due_date_presets.clone(),
            date: None,
            responsible: String::new(),
            entry_date: today,
            days,
            due_date: due_date_for(today, days),
            phase: None,
            problem: None,
            outcome: None,
        })
    }

    pub fn requirement(&self) -> SideDataRequirement {
        self.requirement
    }

    pub fn presets(&self) -> &[u32] {
        &self.presets
    }

    pub fn entry_date(&self) -> NaiveDate {
        self.entry_date
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    /// Last validation message, cleared by the next accepted input
    pub fn problem(&self) -> Option<&str> {
        self.problem.as_deref()
    }

    pub fn outcome(&self) -> Option<&Collected> {
        self.outcome.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    fn apply(&mut self, event: &CaptureEvent) {
        self.problem = None;
        match event {
            CaptureEvent::SetDate(date) => self.date = Some(*date),
            CaptureEvent::SetResponsible(name) => self.responsible = name.trim().to_string(),
            CaptureEvent::SetEntryDate(date) => {
                self.entry_date = *date;
                self.recompute_due_date();
            }
            CaptureEvent::SetDays(days) => self.set_days(*days),
            CaptureEvent::SelectPreset(index) => match self.presets.get(*index).copied() {
                Some(days) => self.set_days(days),
                None => {
                    self.problem = Some(format!(
                        "preset {} does not exist ({} available)",
                        index + 1,
                        self.presets.len()
                    ))
                }
            },
            CaptureEvent::ChoosePhase(phase) => self.phase = Some(*phase),
            CaptureEvent::Confirm | CaptureEvent::Cancel => {}
        }
    }

    fn set_days(&mut self, days: u32) {
        if days == 0 {
            self.problem = Some("production duration must be a positive number of days".into());
            return;
        }
        self.days = days;
        self.recompute_due_date();
    }

    fn recompute_due_date(&mut self) {
        self.due_date = due_date_for(self.entry_date, self.days);
        if self.due_date.is_none() {
            self.problem = Some("due date is out of range".to_string());
        }
    }

    fn payload(&self) -> std::result::Result<SideData, String> {
        match self.requirement {
            SideDataRequirement::VisitScheduling => {
                let (date, responsible) = self.date_and_responsible("visit")?;
                Ok(SideData::Visit { date, responsible })
            }
            SideDataRequirement::InstallationScheduling => {
                let (date, responsible) = self.date_and_responsible("installation")?;
                Ok(SideData::Installation { date, responsible })
            }
            SideDataRequirement::InstalledPhaseSelection => self
                .phase
                .map(|phase| SideData::InstalledPhase { phase })
                .ok_or_else(|| "choose Phase 1 or Phase 2".to_string()),
            SideDataRequirement::ProductionDateRange => self
                .due_date
                .map(|due_date| SideData::ProductionRange {
                    entry_date: self.entry_date,
                    due_date,
                })
                .ok_or_else(|| "due date is out of range".to_string()),
            SideDataRequirement::None => Err("nothing to capture".to_string()),
        }
    }

    fn date_and_responsible(&self, what: &str) -> std::result::Result<(NaiveDate, String), String> {
        let date = self.date.ok_or_else(|| format!("{what} date is required"))?;
        if self.responsible.is_empty() {
            return Err(format!("{what} responsible is required"));
        }
        Ok((date, self.responsible.clone()))
    }
}

#[state_machine(initial = "State::awaiting_input()")]
impl CaptureSession {
    #[state]
    fn awaiting_input(&mut self, event: &CaptureEvent) -> Outcome<State> {
        match event {
            CaptureEvent::Confirm => match self.payload() {
                Ok(payload) => {
                    tracing::debug!(requirement = %self.requirement, "Side-data confirmed");
                    self.problem = None;
                    self.outcome = Some(Collected::Payload(payload));
                    Transition(State::confirmed())
                }
                Err(problem) => {
                    tracing::debug!(%problem, "Side-data incomplete");
                    self.problem = Some(problem);
                    Handled
                }
            },
            CaptureEvent::Cancel => {
                tracing::debug!(requirement = %self.requirement, "Side-data capture cancelled");
                self.outcome = Some(Collected::Cancelled);
                Transition(State::cancelled())
            }
            input => {
                self.apply(input);
                Handled
            }
        }
    }

    #[state]
    fn confirmed(&mut self, event: &CaptureEvent) -> Outcome<State> {
        tracing::trace!(?event, "Ignoring input after confirmation");
        Handled
    }

    #[state]
    fn cancelled(&mut self, event: &CaptureEvent) -> Outcome<State> {
        tracing::trace!(?event, "Ignoring input after cancellation");
        Handled
    }
}

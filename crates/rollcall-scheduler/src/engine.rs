//! Trigger engine: decides which triggers are due and records each fire.
//! The loop ticks on a tokio interval and forwards fires to the bot's event
//! channel; it holds no poll state of its own.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rollcall_core::config::ScheduleConfig;
use rollcall_core::traits::{Clock, Schedule};
use rollcall_core::Result;
use tokio::sync::mpsc::UnboundedSender;

use crate::cron::{CompositeSchedule, CronSchedule};
use crate::ledger::FireLedger;

/// What a trigger asks the bot to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    OpenPoll,
    Report,
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerKind::OpenPoll => write!(f, "open_poll"),
            TriggerKind::Report => write!(f, "reminder"),
        }
    }
}

/// A single fire, delivered to the bot.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired {
    pub name: String,
    pub kind: TriggerKind,
    pub scheduled_for: DateTime<Utc>,
    pub fired_at: DateTime<Utc>,
}

/// A named schedule plus its next due instant.
pub struct Trigger {
    pub name: String,
    pub kind: TriggerKind,
    schedule: Arc<dyn Schedule>,
    pub next_run: Option<DateTime<Utc>>,
}

impl Trigger {
    pub fn describe(&self) -> String {
        self.schedule.describe()
    }
}

pub struct TriggerEngine {
    triggers: Vec<Trigger>,
    ledger: FireLedger,
    misfire_grace: Duration,
}

impl TriggerEngine {
    pub fn new(ledger: FireLedger, misfire_grace: Duration) -> Self {
        Self {
            triggers: Vec::new(),
            ledger,
            misfire_grace,
        }
    }

    /// Build the open/report triggers from config.
    pub fn from_config(config: &ScheduleConfig, ledger: FireLedger, now: DateTime<Utc>) -> Result<Self> {
        let grace = Duration::seconds(config.misfire_grace_secs as i64);
        let zone = config.zone()?;
        let mut engine = Self::new(ledger, grace);
        for (i, expr) in config.open_poll.iter().enumerate() {
            let schedule = CronSchedule::parse(expr, zone)?;
            engine.add(&format!("open_poll#{i}"), TriggerKind::OpenPoll, Arc::new(schedule), now);
        }
        for (i, expr) in config.reminder.iter().enumerate() {
            let schedule = CronSchedule::parse(expr, zone)?;
            engine.add(&format!("reminder#{i}"), TriggerKind::Report, Arc::new(schedule), now);
        }
        Ok(engine)
    }

    /// Earliest upcoming report across all report triggers.
    pub fn report_schedule(config: &ScheduleConfig) -> Result<CompositeSchedule> {
        let mut parts: Vec<Arc<dyn Schedule>> = Vec::new();
        let zone = config.zone()?;
        for expr in &config.reminder {
            parts.push(Arc::new(CronSchedule::parse(expr, zone)?));
        }
        Ok(CompositeSchedule::new(parts))
    }

    /// Register a trigger, resuming from the ledger.
    pub fn add(&mut self, name: &str, kind: TriggerKind, schedule: Arc<dyn Schedule>, now: DateTime<Utc>) {
        let next_run = match self.ledger.last_fired(name) {
            None => schedule.next_fire(now),
            Some(last) => self.resume_point(schedule.as_ref(), last, now),
        };
        tracing::info!(
            "📅 Trigger '{name}' ({kind}) {} → next {next_run:?}",
            schedule.describe()
        );
        self.triggers.push(Trigger {
            name: name.to_string(),
            kind,
            schedule,
            next_run,
        });
    }

    /// Next run after a restart: the latest missed instant if still within
    /// the grace window, otherwise the first instant after `now`.
    fn resume_point(&self, schedule: &dyn Schedule, last: DateTime<Utc>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut candidate = schedule.next_fire(last)?;
        if candidate > now {
            return Some(candidate);
        }
        for _ in 0..10_000 {
            match schedule.next_fire(candidate) {
                Some(next) if next <= now => candidate = next,
                _ => break,
            }
        }
        if now - candidate <= self.misfire_grace {
            tracing::info!("⏰ Missed fire at {candidate} will run late");
            Some(candidate)
        } else {
            tracing::info!("⏭️ Skipping missed fire at {candidate} (past grace)");
            schedule.next_fire(now)
        }
    }

    /// Fire every due trigger once. Results are ordered by scheduled instant.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Fired> {
        let mut fired = Vec::new();

        for trigger in self.triggers.iter_mut() {
            let Some(due) = trigger.next_run else {
                continue;
            };
            if due > now {
                continue;
            }
            trigger.next_run = trigger.schedule.next_fire(now);

            if now - due > self.misfire_grace {
                tracing::warn!("⏭️ Trigger '{}' skipped: {due} is past grace", trigger.name);
                continue;
            }

            if let Err(e) = self.ledger.record(&trigger.name, due) {
                tracing::warn!("⚠️ Failed to record fire of '{}': {e}", trigger.name);
            }
            tracing::info!("🔔 Trigger fired: '{}' ({})", trigger.name, trigger.kind);
            fired.push(Fired {
                name: trigger.name.clone(),
                kind: trigger.kind,
                scheduled_for: due,
                fired_at: now,
            });
        }

        fired.sort_by_key(|f| f.scheduled_for);
        fired
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    /// Soonest pending run across all triggers.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.triggers.iter().filter_map(|t| t.next_run).min()
    }
}

/// Spawn-ready trigger loop. Stops when the receiving side is dropped.
pub async fn spawn_trigger_loop<T>(
    mut engine: TriggerEngine,
    clock: Arc<dyn Clock>,
    check_interval_secs: u64,
    tx: UnboundedSender<T>,
) where
    T: From<Fired> + Send + 'static,
{
    tracing::info!(
        "⏰ Scheduler started (check every {}s, {} trigger(s))",
        check_interval_secs,
        engine.triggers().len()
    );

    let mut interval =
        tokio::time::interval(std::time::Duration::from_secs(check_interval_secs.max(1)));

    loop {
        interval.tick().await;

        for fired in engine.tick(clock.now()) {
            if tx.send(T::from(fired)).is_err() {
                tracing::info!("Scheduler stopped (receiver dropped)");
                return;
            }
        }
    }
}

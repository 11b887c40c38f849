//! SQLite-backed archive of closed rounds.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rollcall_core::{ParticipantId, PollId, PollOption, Result, RollcallError};

use crate::lifecycle::ClosedRound;
use crate::reminder::ReminderSummary;

/// How a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Closed by the reminder trigger and reported to the chat.
    Reported,
    /// Force-closed because a new round was due.
    Superseded,
    /// Discarded by `/clear`.
    Cleared,
}

impl RoundOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundOutcome::Reported => "reported",
            RoundOutcome::Superseded => "superseded",
            RoundOutcome::Cleared => "cleared",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "reported" => Some(RoundOutcome::Reported),
            "superseded" => Some(RoundOutcome::Superseded),
            "cleared" => Some(RoundOutcome::Cleared),
            _ => None,
        }
    }
}

/// One archived round.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivedRound {
    pub poll_id: PollId,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub outcome: RoundOutcome,
    pub answers: BTreeMap<ParticipantId, PollOption>,
    pub recipients: Vec<ParticipantId>,
    pub summary: ReminderSummary,
    pub delivered: bool,
}

pub struct RoundArchive {
    conn: rusqlite::Connection,
}

impl RoundArchive {
    /// Open or create the archive database.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = rusqlite::Connection::open(path)?;
        let archive = Self { conn };
        archive.migrate()?;
        Ok(archive)
    }

    pub fn open_in_memory() -> Result<Self> {
        let archive = Self {
            conn: rusqlite::Connection::open_in_memory()?,
        };
        archive.migrate()?;
        Ok(archive)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS rounds (
                poll_id INTEGER PRIMARY KEY,
                opened_at TEXT NOT NULL,
                closed_at TEXT,
                outcome TEXT NOT NULL,           -- 'reported', 'superseded', 'cleared'
                answers TEXT NOT NULL,           -- JSON: {participant_id: option}
                recipients TEXT NOT NULL,        -- JSON array of participant ids
                confirmed_count INTEGER NOT NULL DEFAULT 0,
                unanswered_count INTEGER NOT NULL DEFAULT 0,
                declined_count INTEGER NOT NULL DEFAULT 0,
                delivered INTEGER NOT NULL DEFAULT 0
            );
            ",
        )?;
        Ok(())
    }

    /// Store a closed round. Recording the same poll id twice is an error.
    pub fn record(&self, round: &ClosedRound, outcome: RoundOutcome, delivered: bool) -> Result<()> {
        let recipients: Vec<ParticipantId> =
            round.payload.recipients.iter().map(|p| p.id).collect();
        let summary = &round.payload.summary;
        self.conn.execute(
            "INSERT INTO rounds
             (poll_id, opened_at, closed_at, outcome, answers, recipients,
              confirmed_count, unanswered_count, declined_count, delivered)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                round.poll.id.0 as i64,
                round.poll.opened_at.to_rfc3339(),
                round.poll.closed_at.map(|t| t.to_rfc3339()),
                outcome.as_str(),
                serde_json::to_string(round.poll.answers())?,
                serde_json::to_string(&recipients)?,
                summary.confirmed_count as i64,
                summary.unanswered_count as i64,
                summary.declined_count as i64,
                delivered as i32,
            ],
        )?;
        tracing::debug!("🗄️ Archived poll #{} as {}", round.poll.id, outcome.as_str());
        Ok(())
    }

    /// Flag a round's reminder as delivered.
    pub fn mark_delivered(&self, poll_id: PollId) -> Result<bool> {
        let n = self.conn.execute(
            "UPDATE rounds SET delivered = 1 WHERE poll_id = ?1",
            [poll_id.0 as i64],
        )?;
        Ok(n > 0)
    }

    /// Most recent rounds first.
    pub fn recent(&self, limit: usize) -> Result<Vec<ArchivedRound>> {
        let mut stmt = self.conn.prepare(
            "SELECT poll_id, opened_at, closed_at, outcome, answers, recipients,
                    confirmed_count, unanswered_count, declined_count, delivered
             FROM rounds ORDER BY poll_id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, i64>(7)?,
                row.get::<_, i64>(8)?,
                row.get::<_, i32>(9)? != 0,
            ))
        })?;

        let mut rounds = Vec::new();
        for row in rows {
            let (id, opened, closed, outcome, answers, recipients, confirmed, unanswered, declined, delivered) = row?;
            rounds.push(ArchivedRound {
                poll_id: PollId(id as u64),
                opened_at: parse_time(&opened)?,
                closed_at: closed.as_deref().map(parse_time).transpose()?,
                outcome: RoundOutcome::parse(&outcome)
                    .ok_or_else(|| RollcallError::Store(format!("Unknown outcome '{outcome}'")))?,
                answers: serde_json::from_str(&answers)?,
                recipients: serde_json::from_str(&recipients)?,
                summary: ReminderSummary {
                    confirmed_count: confirmed as usize,
                    unanswered_count: unanswered as usize,
                    declined_count: declined as usize,
                },
                delivered,
            });
        }
        Ok(rounds)
    }

    /// Highest archived poll id, 0 when empty.
    pub fn max_poll_id(&self) -> Result<u64> {
        let n: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(poll_id), 0) FROM rounds",
            [],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM rounds", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RollcallError::Store(format!("Bad timestamp '{s}': {e}")))
}

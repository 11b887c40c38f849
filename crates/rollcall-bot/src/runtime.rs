//! Bot runtime: owns the coordinator and applies every event in order.

use std::sync::Arc;

use chrono_tz::Tz;
use rollcall_channels::mention::escape_html;
use rollcall_core::traits::{Clock, Transport};
use rollcall_core::{IncomingEvent, Participant, PollId, PollOption, Result, RollcallConfig, RollcallError};
use rollcall_poll::{
    ClosedRound, Coordinator, CoordinatorEvent, DataDirLock, ParticipantDirectory, RoundArchive,
    RoundOutcome, Snapshot, SnapshotStore,
};
use rollcall_scheduler::{Fired, TriggerEngine, TriggerKind, local_date};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::commands::Command;
use crate::events::BotEvent;
use crate::render;

pub struct Bot {
    config: RollcallConfig,
    clock: Arc<dyn Clock>,
    transport: Arc<dyn Transport>,
    coordinator: Coordinator,
    directory: ParticipantDirectory,
    store: SnapshotStore,
    archive: Option<RoundArchive>,
    zone: Tz,
    _lock: DataDirLock,
}

impl Bot {
    /// Build the bot, resuming whatever round the snapshot holds.
    ///
    /// Takes the data directory lock, so only one bot per directory can
    /// exist. Poll ids continue past both the snapshot and the archive.
    pub fn new(
        config: RollcallConfig,
        clock: Arc<dyn Clock>,
        transport: Arc<dyn Transport>,
        store: SnapshotStore,
        archive: Option<RoundArchive>,
    ) -> Result<Self> {
        let lock = DataDirLock::acquire(store.dir())?;
        let zone = config.schedule.zone()?;
        let report_schedule = TriggerEngine::report_schedule(&config.schedule)?;
        let snapshot = store.load();

        let archived = match &archive {
            Some(archive) => archive.max_poll_id()?,
            None => 0,
        };
        if archived > snapshot.last_id {
            tracing::warn!(
                "⚠️ Snapshot last id {} is behind the archive ({archived}); continuing from the archive",
                snapshot.last_id
            );
        }
        let last_id = snapshot.last_id.max(archived);

        let coordinator = Coordinator::restore(clock.clone(), last_id, snapshot.poll)
            .with_report_schedule(Arc::new(report_schedule));

        Ok(Self {
            config,
            clock,
            transport,
            coordinator,
            directory: snapshot.directory,
            store,
            archive,
            zone,
            _lock: lock,
        })
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn directory(&self) -> &ParticipantDirectory {
        &self.directory
    }

    /// Consume events until every sender is dropped.
    pub async fn run(mut self, mut rx: UnboundedReceiver<BotEvent>) {
        tracing::info!("🤖 Bot event loop started (transport: {})", self.transport.name());
        while let Some(event) = rx.recv().await {
            self.handle(event).await;
        }
        tracing::info!("🛑 Bot event loop stopped");
    }

    /// Apply a single event.
    pub async fn handle(&mut self, event: BotEvent) {
        match event {
            BotEvent::Incoming(IncomingEvent::Answer {
                poll_ref,
                participant,
                option_ids,
            }) => self.on_answer(&poll_ref, &participant, &option_ids),
            BotEvent::Incoming(IncomingEvent::Command {
                chat_id, sender, name, ..
            }) => self.on_command(&chat_id, &sender, &name).await,
            BotEvent::Trigger(fired) => self.on_trigger(&fired).await,
        }
    }

    async fn on_trigger(&mut self, fired: &Fired) {
        let result = match fired.kind {
            TriggerKind::OpenPoll => self.open_round(false).await.map(|_| ()),
            TriggerKind::Report => self.report().await.map(|_| ()),
        };
        match result {
            Ok(()) => {}
            Err(e) if e.is_lifecycle() => {
                tracing::warn!("⚠️ Trigger '{}': {e}", fired.name);
            }
            Err(e) => {
                tracing::error!("❌ Trigger '{}' failed: {e}", fired.name);
            }
        }
    }

    /// Open a new round and post it.
    ///
    /// Without `force`, a round opened earlier on the same local day is kept
    /// and nothing happens (`Ok(None)`). Any other open round is superseded.
    pub async fn open_round(&mut self, force: bool) -> Result<Option<PollId>> {
        let now = self.clock.now();
        let open = self.coordinator.current().map(|p| (p.id, p.opened_at));

        if let Some((id, opened_at)) = open {
            if !force && local_date(opened_at, self.zone) == local_date(now, self.zone) {
                tracing::info!("⏭️ Poll #{id} already opened today, skipping");
                return Ok(None);
            }
            let stale = self.coordinator.close_and_report(&[])?;
            tracing::warn!("♻️ Poll #{id} superseded before its report was sent");
            self.archive_round(&stale, RoundOutcome::Superseded, false);
        }

        let id = self.coordinator.open_poll()?;
        self.persist();

        for event in self.coordinator.drain_events() {
            match event {
                CoordinatorEvent::Announce(poll_id) => self.announce(poll_id).await?,
            }
        }
        Ok(Some(id))
    }

    /// Post the poll and the follow-up nudge. If the poll cannot be posted
    /// the round is withdrawn so a later trigger can open it again.
    async fn announce(&mut self, id: PollId) -> Result<()> {
        let transport = self.transport.clone();
        let poll = self.config.poll.clone();

        let posted = match transport
            .send_poll(&poll.question, [poll.affirmative.as_str(), poll.negative.as_str()])
            .await
        {
            Ok(posted) => posted,
            Err(e) => {
                tracing::error!("❌ Failed to post poll #{id}: {e}");
                self.coordinator.close_and_report(&[])?;
                self.persist();
                return Err(e);
            }
        };

        self.coordinator.attach_external_ref(&posted.poll_ref)?;
        self.persist();
        tracing::info!("📨 Poll #{id} posted as {} (message {})", posted.poll_ref, posted.message_id);

        if !poll.announce.trim().is_empty()
            && let Err(e) = transport
                .send_text(&self.config.telegram.chat_id, &escape_html(&poll.announce))
                .await
        {
            tracing::warn!("⚠️ Failed to send poll nudge: {e}");
        }
        Ok(())
    }

    /// Close the open round and send its reminder.
    pub async fn report(&mut self) -> Result<PollId> {
        if self.coordinator.current().is_none() {
            return Err(RollcallError::NoOpenPoll);
        }

        let members = gather_members(self.transport.clone(), self.config.reminder.include_admins).await;
        let roster = self.directory.roster_with(&members);
        let round = self.coordinator.close_and_report(&roster)?;
        let id = round.poll.id;
        self.persist();
        self.archive_round(&round, RoundOutcome::Reported, false);

        if round.payload.is_empty() {
            tracing::info!("📭 Nobody to remind for poll #{id}");
            return Ok(id);
        }

        let text = render::reminder(&round.payload, &self.config.reminder);
        let transport = self.transport.clone();
        transport.send_text(&self.config.telegram.chat_id, &text).await?;
        tracing::info!(
            "📣 Reminder for poll #{id} sent to {} participant(s)",
            round.payload.recipients.len()
        );

        if let Some(archive) = &self.archive
            && let Err(e) = archive.mark_delivered(id)
        {
            tracing::warn!("⚠️ Failed to mark poll #{id} delivered: {e}");
        }
        Ok(id)
    }

    /// Discard the open round without a reminder.
    pub fn clear(&mut self) -> Result<PollId> {
        let round = self.coordinator.close_and_report(&[])?;
        self.persist();
        self.archive_round(&round, RoundOutcome::Cleared, false);
        tracing::info!("🧹 Poll #{} cleared", round.poll.id);
        Ok(round.poll.id)
    }

    fn on_answer(&mut self, poll_ref: &str, participant: &Participant, option_ids: &[u32]) {
        if !self.coordinator.matches_external_ref(poll_ref) {
            tracing::debug!("Ignoring answer for poll '{poll_ref}' (not the open round)");
            return;
        }
        self.directory.observe(participant);

        let result = match option_ids.first() {
            None => self.coordinator.retract_answer(participant.id),
            Some(&index) => self
                .coordinator
                .record_answer(participant.id, PollOption::from_index(index)),
        };
        if let Err(e) = result {
            tracing::warn!("⚠️ Answer from {} not recorded: {e}", participant.id);
        }
        self.persist();
    }

    async fn on_command(&mut self, chat_id: &str, sender: &Participant, name: &str) {
        let Some(command) = Command::parse(name) else {
            tracing::debug!("Ignoring unknown command /{name}");
            return;
        };
        let home = chat_id == self.config.telegram.chat_id;
        if command.home_chat_only() && !home {
            tracing::debug!("Ignoring /{name} from chat {chat_id}");
            return;
        }
        if home && self.directory.observe(sender) {
            self.persist();
        }
        tracing::info!("💬 /{name} from {}", sender.display_name());

        let reply = match command {
            Command::Start => {
                "👋 Hi! I post the weekly attendance poll and remind everyone before the meeting."
                    .to_string()
            }
            Command::Status => render::status(self.coordinator.current()),
            Command::Answers => render::answers(
                self.coordinator.current(),
                &self.directory,
                &self.config.poll.affirmative,
                &self.config.poll.negative,
            ),
            Command::SendPoll => match self.open_round(true).await {
                Ok(Some(id)) => format!("✅ Poll #{id} opened."),
                Ok(None) => "📊 A poll is already open.".to_string(),
                Err(e) => format!("⚠️ Could not open a poll: {}", escape_html(&e.to_string())),
            },
            Command::Clear => match self.clear() {
                Ok(id) => format!("🧹 Poll #{id} cleared."),
                Err(RollcallError::NoOpenPoll) => "📭 No open poll.".to_string(),
                Err(e) => {
                    tracing::error!("❌ /clear failed: {e}");
                    format!("⚠️ Could not clear the poll: {}", escape_html(&e.to_string()))
                }
            },
            Command::Id => format!("🆔 Chat id: <code>{}</code>", escape_html(chat_id)),
            Command::Debug => {
                if home {
                    "✅ This is the configured chat.".to_string()
                } else {
                    "❌ This chat is not the configured one.".to_string()
                }
            }
        };

        let transport = self.transport.clone();
        if let Err(e) = transport.send_text(chat_id, &reply).await {
            tracing::warn!("⚠️ Failed to reply to /{name}: {e}");
        }
    }

    fn persist(&self) {
        let snapshot = Snapshot {
            last_id: self.coordinator.last_id(),
            poll: self.coordinator.current().cloned(),
            directory: self.directory.clone(),
        };
        if let Err(e) = self.store.save(&snapshot) {
            tracing::warn!("⚠️ Failed to save snapshot: {e}");
        }
    }

    fn archive_round(&self, round: &ClosedRound, outcome: RoundOutcome, delivered: bool) {
        if let Some(archive) = &self.archive
            && let Err(e) = archive.record(round, outcome, delivered)
        {
            tracing::warn!("⚠️ Failed to archive poll #{}: {e}", round.poll.id);
        }
    }
}

/// Chat administrators for the roster. A failed lookup falls back to the
/// tracked participants alone.
async fn gather_members(transport: Arc<dyn Transport>, include_admins: bool) -> Vec<Participant> {
    if !include_admins {
        return Vec::new();
    }
    match transport.members().await {
        Ok(members) => members,
        Err(e) => {
            tracing::warn!("⚠️ Could not fetch chat members, using tracked participants only: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rollcall_core::traits::PostedPoll;
    use rollcall_core::ParticipantId;
    use rollcall_scheduler::ManualClock;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    const CHAT: &str = "-100500";

    #[derive(Default)]
    struct FakeTransport {
        polls: Mutex<Vec<String>>,
        texts: Mutex<Vec<(String, String)>>,
        members: Vec<Participant>,
        fail_poll: AtomicBool,
        fail_members: bool,
    }

    impl FakeTransport {
        fn texts(&self) -> Vec<(String, String)> {
            self.texts.lock().unwrap().clone()
        }
        fn poll_count(&self) -> usize {
            self.polls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        fn name(&self) -> &str {
            "fake"
        }

        async fn send_poll(&self, question: &str, _options: [&str; 2]) -> Result<PostedPoll> {
            if self.fail_poll.load(Ordering::SeqCst) {
                return Err(RollcallError::Channel("sendPoll refused".into()));
            }
            let mut polls = self.polls.lock().unwrap();
            polls.push(question.to_string());
            Ok(PostedPoll {
                poll_ref: format!("tg-{}", polls.len()),
                message_id: polls.len() as i64,
            })
        }

        async fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
            self.texts.lock().unwrap().push((chat_id.to_string(), text.to_string()));
            Ok(())
        }

        async fn members(&self) -> Result<Vec<Participant>> {
            if self.fail_members {
                return Err(RollcallError::Channel("getChatAdministrators refused".into()));
            }
            Ok(self.members.clone())
        }
    }

    struct Harness {
        bot: Bot,
        clock: Arc<ManualClock>,
        transport: Arc<FakeTransport>,
        dir: TempDir,
    }

    /// Saturday 18:00 in Chisinau (UTC+2 in February).
    fn saturday_evening() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 21, 16, 0, 0).unwrap()
    }

    fn config() -> RollcallConfig {
        let mut config = RollcallConfig::default();
        config.telegram.chat_id = CHAT.into();
        config
    }

    fn harness_with(transport: FakeTransport) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(saturday_evening()));
        let transport = Arc::new(transport);
        let bot = Bot::new(
            config(),
            clock.clone(),
            transport.clone(),
            SnapshotStore::new(dir.path()),
            Some(RoundArchive::open_in_memory().unwrap()),
        )
        .unwrap();
        Harness { bot, clock, transport, dir }
    }

    fn harness() -> Harness {
        harness_with(FakeTransport::default())
    }

    fn fired(kind: TriggerKind, at: DateTime<Utc>) -> BotEvent {
        BotEvent::Trigger(Fired {
            name: format!("{kind}#0"),
            kind,
            scheduled_for: at,
            fired_at: at,
        })
    }

    fn answer(poll_ref: &str, participant: Participant, option_ids: Vec<u32>) -> BotEvent {
        BotEvent::Incoming(IncomingEvent::Answer {
            poll_ref: poll_ref.into(),
            participant,
            option_ids,
        })
    }

    fn command(chat_id: &str, name: &str) -> BotEvent {
        BotEvent::Incoming(IncomingEvent::Command {
            chat_id: chat_id.into(),
            sender: Participant::new(99).with_name("Admin"),
            name: name.into(),
            args: String::new(),
        })
    }

    fn anna() -> Participant {
        Participant::new(1).with_handle("anna")
    }

    fn boris() -> Participant {
        Participant::new(2).with_name("Boris")
    }

    #[tokio::test]
    async fn test_open_trigger_posts_poll_and_nudge() {
        let mut h = harness();
        h.bot.handle(fired(TriggerKind::OpenPoll, saturday_evening())).await;

        assert_eq!(h.transport.poll_count(), 1);
        assert!(h.bot.coordinator().matches_external_ref("tg-1"));
        let texts = h.transport.texts();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].0, CHAT);

        let snapshot = SnapshotStore::new(h.dir.path()).load();
        assert_eq!(snapshot.last_id, 1);
        assert_eq!(snapshot.poll.unwrap().external_ref.as_deref(), Some("tg-1"));
    }

    #[tokio::test]
    async fn test_answers_follow_the_open_round() {
        let mut h = harness();
        h.bot.handle(fired(TriggerKind::OpenPoll, saturday_evening())).await;

        h.bot.handle(answer("tg-1", anna(), vec![0])).await;
        h.bot.handle(answer("tg-1", boris(), vec![1])).await;
        h.bot.handle(answer("old-poll", Participant::new(3), vec![0])).await;

        let poll = h.bot.coordinator().current().unwrap();
        assert_eq!(poll.answer_count(), 2);
        assert_eq!(poll.answer_of(ParticipantId(1)), Some(PollOption::Affirmative));
        assert_eq!(poll.answer_of(ParticipantId(2)), Some(PollOption::Negative));
        assert!(h.bot.directory().get(ParticipantId(3)).is_none());

        // Switch to yes, then retract entirely.
        h.bot.handle(answer("tg-1", boris(), vec![0])).await;
        assert_eq!(h.bot.coordinator().current().unwrap().affirmative_count(), 2);
        h.bot.handle(answer("tg-1", boris(), vec![])).await;
        let poll = h.bot.coordinator().current().unwrap();
        assert_eq!(poll.answer_of(ParticipantId(2)), None);
        assert_eq!(h.bot.directory().len(), 2);
    }

    #[tokio::test]
    async fn test_report_mentions_confirmed_and_silent_members() {
        let mut h = harness_with(FakeTransport {
            members: vec![Participant::new(7).with_handle("carol"), anna()],
            ..Default::default()
        });
        h.bot.handle(fired(TriggerKind::OpenPoll, saturday_evening())).await;
        h.bot.handle(answer("tg-1", anna(), vec![0])).await;
        h.bot.handle(answer("tg-1", boris(), vec![1])).await;

        h.clock.advance(Duration::hours(14));
        h.bot.handle(fired(TriggerKind::Report, h.clock.now())).await;

        let texts = h.transport.texts();
        let reminder = &texts.last().unwrap().1;
        assert!(reminder.contains("@anna"));
        assert!(reminder.contains("@carol"));
        assert!(!reminder.contains("Boris"));
        assert!(h.bot.coordinator().current().is_none());

        let rounds = h.bot.archive.as_ref().unwrap().recent(10).unwrap();
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].outcome, RoundOutcome::Reported);
        assert!(rounds[0].delivered);
        assert_eq!(rounds[0].summary.confirmed_count, 1);
    }

    #[tokio::test]
    async fn test_report_escalates_when_nobody_confirmed() {
        let mut h = harness_with(FakeTransport {
            members: vec![anna(), boris()],
            ..Default::default()
        });
        h.bot.handle(fired(TriggerKind::OpenPoll, saturday_evening())).await;
        h.bot.handle(answer("tg-1", boris(), vec![1])).await;
        h.bot.report().await.unwrap();

        let reminder = h.transport.texts().last().unwrap().1.clone();
        assert!(reminder.contains(&config().reminder.escalation_label));
        assert!(reminder.contains("@anna"));
        assert!(reminder.contains("Boris"));
    }

    #[tokio::test]
    async fn test_report_without_open_poll() {
        let mut h = harness();
        assert!(matches!(h.bot.report().await, Err(RollcallError::NoOpenPoll)));
        h.bot.handle(fired(TriggerKind::Report, saturday_evening())).await;
        assert!(h.transport.texts().is_empty());
    }

    #[tokio::test]
    async fn test_member_lookup_failure_uses_directory() {
        let mut h = harness_with(FakeTransport {
            fail_members: true,
            ..Default::default()
        });
        h.bot.handle(fired(TriggerKind::OpenPoll, saturday_evening())).await;
        h.bot.handle(answer("tg-1", anna(), vec![1])).await;
        h.bot.report().await.unwrap();

        let reminder = h.transport.texts().last().unwrap().1.clone();
        assert!(reminder.contains("@anna"));
    }

    #[tokio::test]
    async fn test_safety_net_trigger_same_day_is_skipped() {
        let mut h = harness();
        h.bot.handle(fired(TriggerKind::OpenPoll, saturday_evening())).await;
        h.bot.handle(answer("tg-1", anna(), vec![0])).await;

        h.clock.advance(Duration::minutes(359));
        assert_eq!(h.bot.open_round(false).await.unwrap(), None);
        assert_eq!(h.transport.poll_count(), 1);
        assert_eq!(h.bot.coordinator().current().unwrap().answer_count(), 1);
    }

    #[tokio::test]
    async fn test_stale_round_is_superseded() {
        let mut h = harness();
        h.bot.handle(fired(TriggerKind::OpenPoll, saturday_evening())).await;

        h.clock.advance(Duration::days(7));
        let id = h.bot.open_round(false).await.unwrap();
        assert_eq!(id, Some(PollId(2)));
        assert!(h.bot.coordinator().matches_external_ref("tg-2"));

        let rounds = h.bot.archive.as_ref().unwrap().recent(10).unwrap();
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].poll_id, PollId(1));
        assert_eq!(rounds[0].outcome, RoundOutcome::Superseded);
        assert!(!rounds[0].delivered);
    }

    #[tokio::test]
    async fn test_failed_announce_withdraws_round() {
        let transport = FakeTransport::default();
        transport.fail_poll.store(true, Ordering::SeqCst);
        let mut h = harness_with(transport);

        assert!(h.bot.open_round(false).await.is_err());
        assert!(h.bot.coordinator().current().is_none());

        h.transport.fail_poll.store(false, Ordering::SeqCst);
        assert_eq!(h.bot.open_round(false).await.unwrap(), Some(PollId(2)));
    }

    #[tokio::test]
    async fn test_restart_resumes_open_round() {
        let mut h = harness();
        h.bot.handle(fired(TriggerKind::OpenPoll, saturday_evening())).await;
        h.bot.handle(answer("tg-1", anna(), vec![0])).await;
        let Harness { bot, clock, transport, dir } = h;
        drop(bot);

        let mut restarted = Bot::new(
            config(),
            clock,
            transport,
            SnapshotStore::new(dir.path()),
            None,
        )
        .unwrap();
        assert!(restarted.coordinator().matches_external_ref("tg-1"));
        assert_eq!(restarted.directory().len(), 1);

        restarted.handle(answer("tg-1", boris(), vec![0])).await;
        assert_eq!(restarted.coordinator().current().unwrap().affirmative_count(), 2);
        assert_eq!(restarted.open_round(true).await.unwrap(), Some(PollId(2)));
    }

    #[tokio::test]
    async fn test_second_bot_on_same_directory_is_refused() {
        let mut h = harness();
        h.bot.handle(fired(TriggerKind::OpenPoll, saturday_evening())).await;

        let second = Bot::new(
            config(),
            h.clock.clone(),
            h.transport.clone(),
            SnapshotStore::new(h.dir.path()),
            None,
        );
        assert!(matches!(second, Err(RollcallError::Busy(_))));

        // The running bot still owns the round and keeps accepting answers.
        h.bot.handle(answer("tg-1", anna(), vec![0])).await;
        assert_eq!(h.bot.coordinator().current().unwrap().answer_count(), 1);
        let snapshot = SnapshotStore::new(h.dir.path()).load();
        assert_eq!(snapshot.poll.unwrap().external_ref.as_deref(), Some("tg-1"));
        assert_eq!(h.transport.poll_count(), 1);
    }

    #[tokio::test]
    async fn test_ids_continue_after_lost_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("rollcall.db");
        let clock = Arc::new(ManualClock::new(saturday_evening()));
        let transport = Arc::new(FakeTransport::default());
        let build = || {
            Bot::new(
                config(),
                clock.clone(),
                transport.clone(),
                SnapshotStore::new(dir.path()),
                Some(RoundArchive::open(&db).unwrap()),
            )
            .unwrap()
        };

        let mut bot = build();
        bot.open_round(false).await.unwrap();
        bot.handle(answer("tg-1", anna(), vec![0])).await;
        assert_eq!(bot.report().await.unwrap(), PollId(1));
        drop(bot);

        std::fs::write(dir.path().join("state.json"), "{ not json").unwrap();

        let mut bot = build();
        assert_eq!(bot.coordinator().last_id(), 1);
        assert_eq!(bot.open_round(true).await.unwrap(), Some(PollId(2)));
        bot.clear().unwrap();

        let archive = RoundArchive::open(&db).unwrap();
        let mut rounds: Vec<(PollId, RoundOutcome)> = archive
            .recent(10)
            .unwrap()
            .into_iter()
            .map(|r| (r.poll_id, r.outcome))
            .collect();
        rounds.sort_by_key(|(id, _)| *id);
        assert_eq!(
            rounds,
            vec![(PollId(1), RoundOutcome::Reported), (PollId(2), RoundOutcome::Cleared)]
        );
    }

    #[tokio::test]
    async fn test_commands_respect_home_chat() {
        let mut h = harness();
        h.bot.handle(command("-1", "sendpoll")).await;
        assert_eq!(h.transport.poll_count(), 0);
        assert!(h.transport.texts().is_empty());

        h.bot.handle(command("-1", "id")).await;
        let texts = h.transport.texts();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].0, "-1");
        assert!(texts[0].1.contains("-1"));

        h.bot.handle(command("-1", "debug")).await;
        assert!(h.transport.texts()[1].1.contains("not the configured"));
    }

    #[tokio::test]
    async fn test_sendpoll_and_clear_commands() {
        let mut h = harness();
        h.bot.handle(command(CHAT, "sendpoll")).await;
        h.bot.handle(command(CHAT, "sendpoll")).await;
        assert_eq!(h.transport.poll_count(), 2);
        assert_eq!(h.bot.coordinator().current().unwrap().id, PollId(2));
        assert!(h.bot.directory().get(ParticipantId(99)).is_some());

        h.bot.handle(answer("tg-2", anna(), vec![0])).await;
        h.bot.handle(command(CHAT, "status")).await;
        assert!(h.transport.texts().last().unwrap().1.contains("1 answer(s), 1 yes"));

        h.bot.handle(command(CHAT, "clear")).await;
        assert!(h.bot.coordinator().current().is_none());
        let outcomes: Vec<RoundOutcome> = h
            .bot
            .archive
            .as_ref()
            .unwrap()
            .recent(10)
            .unwrap()
            .into_iter()
            .map(|r| r.outcome)
            .collect();
        assert!(outcomes.contains(&RoundOutcome::Superseded));
        assert!(outcomes.contains(&RoundOutcome::Cleared));

        h.bot.handle(command(CHAT, "clear")).await;
        assert_eq!(h.transport.texts().last().unwrap().1, "📭 No open poll.");
    }
}

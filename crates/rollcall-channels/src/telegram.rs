//! Telegram Bot channel: long polling, webhook registration, polls and messages via Bot API.

use async_trait::async_trait;
use futures::stream::Stream;
use rollcall_core::traits::{PostedPoll, Transport};
use rollcall_core::{IncomingEvent, Participant, Result, RollcallError};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Stateless Bot API client bound to one group chat.
#[derive(Clone)]
pub struct TelegramClient {
    bot_token: String,
    chat_id: String,
    client: reqwest::Client,
}

impl TelegramClient {
    pub fn new(bot_token: &str, chat_id: &str) -> Self {
        Self {
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.bot_token, method)
    }

    /// POST a Bot API method and unwrap the `{ok, result}` envelope.
    async fn call<T>(&self, method: &str, body: serde_json::Value) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(self.api_url(method))
            .json(&body)
            .timeout(std::time::Duration::from_secs(60))
            .send()
            .await
            .map_err(|e| RollcallError::Channel(format!("Telegram {method} failed: {e}")))?;

        let envelope: TelegramApiResponse<T> = response
            .json()
            .await
            .map_err(|e| RollcallError::Channel(format!("Invalid Telegram {method} response: {e}")))?;

        if !envelope.ok {
            return Err(RollcallError::Channel(format!(
                "Telegram {method} error: {}",
                envelope.description.unwrap_or_default()
            )));
        }
        envelope
            .result
            .ok_or_else(|| RollcallError::Channel(format!("Telegram {method}: empty result")))
    }

    /// Fetch updates after `offset` using long polling.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<TelegramUpdate>> {
        self.call(
            "getUpdates",
            serde_json::json!({
                "offset": offset,
                "timeout": 30,
                "allowed_updates": ["message", "poll_answer"],
            }),
        )
        .await
    }

    /// Send an HTML message.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<TelegramMessage> {
        self.call(
            "sendMessage",
            serde_json::json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
            }),
        )
        .await
    }

    /// Post a non-anonymous single-choice poll to the group chat.
    pub async fn send_poll(&self, question: &str, options: &[&str]) -> Result<TelegramMessage> {
        self.call(
            "sendPoll",
            serde_json::json!({
                "chat_id": self.chat_id,
                "question": question,
                "options": options,
                "is_anonymous": false,
                "allows_multiple_answers": false,
            }),
        )
        .await
    }

    /// Administrators of the group chat.
    pub async fn get_chat_administrators(&self) -> Result<Vec<TelegramChatMember>> {
        self.call(
            "getChatAdministrators",
            serde_json::json!({ "chat_id": self.chat_id }),
        )
        .await
    }

    /// Get bot info.
    pub async fn get_me(&self) -> Result<TelegramUser> {
        self.call("getMe", serde_json::json!({})).await
    }

    /// Register a webhook. Telegram echoes `secret` in every delivery.
    pub async fn set_webhook(&self, url: &str, secret: &str) -> Result<()> {
        let mut body = serde_json::json!({
            "url": url,
            "allowed_updates": ["message", "poll_answer"],
        });
        if !secret.is_empty() {
            body["secret_token"] = serde_json::Value::String(secret.to_string());
        }
        let _: bool = self.call("setWebhook", body).await?;
        tracing::info!("Telegram webhook set to {url}");
        Ok(())
    }

    /// Remove any webhook so getUpdates works.
    pub async fn delete_webhook(&self) -> Result<()> {
        let _: bool = self.call("deleteWebhook", serde_json::json!({})).await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for TelegramClient {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_poll(&self, question: &str, options: [&str; 2]) -> Result<PostedPoll> {
        let message = TelegramClient::send_poll(self, question, &options).await?;
        let poll = message
            .poll
            .ok_or_else(|| RollcallError::Channel("sendPoll returned no poll".into()))?;
        Ok(PostedPoll {
            poll_ref: poll.id,
            message_id: message.message_id,
        })
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
        self.send_message(chat_id, text).await.map(|_| ())
    }

    async fn members(&self) -> Result<Vec<Participant>> {
        let admins = self.get_chat_administrators().await?;
        Ok(admins
            .into_iter()
            .filter(|m| !m.user.is_bot)
            .map(|m| m.user.to_participant())
            .collect())
    }
}

/// Long-polling loop state.
pub struct TelegramPoller {
    client: TelegramClient,
    last_update_id: i64,
    poll_interval: u64,
}

impl TelegramPoller {
    pub fn new(client: TelegramClient, poll_interval: u64) -> Self {
        Self {
            client,
            last_update_id: 0,
            poll_interval,
        }
    }

    /// Fetch the next batch and advance the offset.
    pub async fn next_batch(&mut self) -> Result<Vec<TelegramUpdate>> {
        let updates = self.client.get_updates(self.last_update_id + 1).await?;
        if let Some(last) = updates.last() {
            self.last_update_id = last.update_id;
        }
        Ok(updates)
    }

    /// Start the polling loop. Returns a stream of decoded events.
    pub fn start_polling(self) -> TelegramPollingStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut poller = self;
            if let Err(e) = poller.client.delete_webhook().await {
                tracing::warn!("Telegram deleteWebhook failed: {e}");
            }
            tracing::info!("Telegram polling loop started");

            loop {
                match poller.next_batch().await {
                    Ok(updates) => {
                        for update in updates {
                            if let Some(event) = update.to_incoming()
                                && tx.send(event).is_err()
                            {
                                tracing::info!("Telegram polling stopped (receiver dropped)");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Telegram polling error: {e}");
                        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
                    }
                }

                tokio::time::sleep(tokio::time::Duration::from_secs(poller.poll_interval)).await;
            }
        });

        TelegramPollingStream { rx }
    }
}

/// Stream of incoming events from polling.
pub struct TelegramPollingStream {
    rx: tokio::sync::mpsc::UnboundedReceiver<IncomingEvent>,
}

impl Stream for TelegramPollingStream {
    type Item = IncomingEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

// --- Telegram API Types ---

#[derive(Debug, Deserialize)]
pub struct TelegramApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
    #[serde(default)]
    pub poll_answer: Option<TelegramPollAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    pub text: Option<String>,
    pub date: i64,
    #[serde(default)]
    pub poll: Option<TelegramPoll>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl TelegramUser {
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {last}", self.first_name),
            _ => self.first_name.clone(),
        }
    }

    pub fn to_participant(&self) -> Participant {
        Participant {
            id: rollcall_core::ParticipantId(self.id),
            handle: self.username.clone(),
            full_name: Some(self.full_name()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramPoll {
    pub id: String,
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramPollAnswer {
    pub poll_id: String,
    #[serde(default)]
    pub user: Option<TelegramUser>,
    #[serde(default)]
    pub option_ids: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChatMember {
    pub status: String,
    pub user: TelegramUser,
}

impl TelegramUpdate {
    /// Decode into a Rollcall event. Bots, plain chatter and anonymous votes yield `None`.
    pub fn to_incoming(&self) -> Option<IncomingEvent> {
        if let Some(answer) = &self.poll_answer {
            let user = answer.user.as_ref()?;
            if user.is_bot {
                return None;
            }
            return Some(IncomingEvent::Answer {
                poll_ref: answer.poll_id.clone(),
                participant: user.to_participant(),
                option_ids: answer.option_ids.clone(),
            });
        }

        let msg = self.message.as_ref()?;
        let text = msg.text.as_ref()?;
        let from = msg.from.as_ref()?;

        // Skip bot messages
        if from.is_bot {
            return None;
        }

        let (name, args) = parse_command(text)?;
        Some(IncomingEvent::Command {
            chat_id: msg.chat.id.to_string(),
            sender: from.to_participant(),
            name,
            args,
        })
    }
}

/// Split "/cmd@bot rest" into ("cmd", "rest").
fn parse_command(text: &str) -> Option<(String, String)> {
    let text = text.trim();
    let body = text.strip_prefix('/')?;
    let (head, args) = match body.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (body, ""),
    };
    let name = head.split('@').next().unwrap_or(head).to_lowercase();
    if name.is_empty() {
        return None;
    }
    Some((name, args.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(json: serde_json::Value) -> TelegramUpdate {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_poll_answer_update() {
        let u = update(serde_json::json!({
            "update_id": 10,
            "poll_answer": {
                "poll_id": "5432",
                "user": {"id": 77, "is_bot": false, "first_name": "Ion", "last_name": "Popescu", "username": "ionp"},
                "option_ids": [0]
            }
        }));
        match u.to_incoming() {
            Some(IncomingEvent::Answer { poll_ref, participant, option_ids }) => {
                assert_eq!(poll_ref, "5432");
                assert_eq!(participant.id.0, 77);
                assert_eq!(participant.handle.as_deref(), Some("ionp"));
                assert_eq!(participant.full_name.as_deref(), Some("Ion Popescu"));
                assert_eq!(option_ids, vec![0]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_retracted_vote_has_no_options() {
        let u = update(serde_json::json!({
            "update_id": 11,
            "poll_answer": {
                "poll_id": "5432",
                "user": {"id": 77, "is_bot": false, "first_name": "Ion"},
                "option_ids": []
            }
        }));
        match u.to_incoming() {
            Some(IncomingEvent::Answer { option_ids, .. }) => assert!(option_ids.is_empty()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_command_with_bot_suffix() {
        let u = update(serde_json::json!({
            "update_id": 12,
            "message": {
                "message_id": 1,
                "date": 0,
                "chat": {"id": -100123, "type": "supergroup", "title": "Team"},
                "from": {"id": 5, "is_bot": false, "first_name": "Ana"},
                "text": "/Status@rollcall_bot now"
            }
        }));
        match u.to_incoming() {
            Some(IncomingEvent::Command { chat_id, name, args, sender }) => {
                assert_eq!(chat_id, "-100123");
                assert_eq!(name, "status");
                assert_eq!(args, "now");
                assert_eq!(sender.id.0, 5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_ignored_updates() {
        let chatter = update(serde_json::json!({
            "update_id": 13,
            "message": {
                "message_id": 2, "date": 0,
                "chat": {"id": 1, "type": "private"},
                "from": {"id": 5, "is_bot": false, "first_name": "Ana"},
                "text": "hello"
            }
        }));
        assert!(chatter.to_incoming().is_none());

        let bot_vote = update(serde_json::json!({
            "update_id": 14,
            "poll_answer": {
                "poll_id": "1",
                "user": {"id": 9, "is_bot": true, "first_name": "Bot"},
                "option_ids": [0]
            }
        }));
        assert!(bot_vote.to_incoming().is_none());
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/sendpoll"), Some(("sendpoll".into(), String::new())));
        assert_eq!(parse_command("  /id  "), Some(("id".into(), String::new())));
        assert_eq!(parse_command("/"), None);
        assert_eq!(parse_command("status"), None);
    }

    #[test]
    fn test_sent_poll_message_decodes() {
        let msg: TelegramMessage = serde_json::from_value(serde_json::json!({
            "message_id": 99,
            "date": 0,
            "chat": {"id": -1, "type": "group"},
            "poll": {"id": "6001", "question": "Coming?"}
        }))
        .unwrap();
        assert_eq!(msg.poll.unwrap().id, "6001");
    }
}

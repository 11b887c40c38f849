//! # Rollcall Channels
//! Telegram Bot API transport: long polling, webhook updates, polls and mentions.

pub mod mention;
pub mod telegram;

pub use telegram::{TelegramClient, TelegramPoller, TelegramPollingStream, TelegramUpdate};

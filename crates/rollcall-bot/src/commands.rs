//! Chat commands understood by the bot.

/// A recognised slash command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Status,
    Answers,
    SendPoll,
    Clear,
    Id,
    Debug,
}

impl Command {
    /// Parse a command name (already lowercased, without `/` or `@bot`).
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "start" | "help" => Some(Command::Start),
            "status" => Some(Command::Status),
            "answers" => Some(Command::Answers),
            "sendpoll" => Some(Command::SendPoll),
            "clear" => Some(Command::Clear),
            "id" => Some(Command::Id),
            "debug" => Some(Command::Debug),
            _ => None,
        }
    }

    /// Commands that only work in the configured group chat.
    pub fn home_chat_only(&self) -> bool {
        !matches!(self, Command::Start | Command::Id | Command::Debug)
    }
}

use teloxide::types::BotCommand;

/// Slash commands the bot answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// Make this chat the oversight group.
    QgGroup,
    /// Register this chat as the request half of a link.
    RequestSource,
    /// Register this chat as the collect half of a link.
    RequestChannel,
    /// Remove the link keyed by this chat.
    DeleteLink,
}

impl Command {
    const ALL: [Self; 6] = [
        Self::Start,
        Self::Help,
        Self::QgGroup,
        Self::RequestSource,
        Self::RequestChannel,
        Self::DeleteLink,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::QgGroup => "qg_group",
            Self::RequestSource => "request_source",
            Self::RequestChannel => "request_channel",
            Self::DeleteLink => "delete_link",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Start => "Introduce the bot",
            Self::Help => "Show available commands",
            Self::QgGroup => "Make this chat the oversight group",
            Self::RequestSource => "Collect tagged requests from this chat",
            Self::RequestChannel => "Deliver collected requests to this chat",
            Self::DeleteLink => "Remove the link for this chat",
        }
    }

    /// Commands that change links, and so require an administrator.
    #[must_use]
    pub fn is_privileged(self) -> bool {
        !matches!(self, Self::Start | Self::Help)
    }
}

/// Parse `/name` or `/name@bot` from the first word of `text`.
///
/// A command addressed to a different bot is not ours.
pub fn parse_command(text: &str, bot_username: Option<&str>) -> Option<Command> {
    let word = text.split_whitespace().next()?.strip_prefix('/')?;
    let (name, target) = match word.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (word, None),
    };
    if let (Some(target), Some(ours)) = (target, bot_username)
        && !target.eq_ignore_ascii_case(ours)
    {
        return None;
    }
    Command::ALL
        .into_iter()
        .find(|c| c.name().eq_ignore_ascii_case(name))
}

/// The command list registered with `setMyCommands`.
pub fn bot_commands() -> Vec<BotCommand> {
    Command::ALL
        .into_iter()
        .map(|c| BotCommand::new(c.name(), c.description()))
        .collect()
}

/// Body of the `/help` reply.
pub fn help_text() -> String {
    let mut text = String::from("Available commands:\n");
    for command in Command::ALL {
        text.push_str(&format!("/{} - {}\n", command.name(), command.description()));
    }
    text.push_str(
        "\nTo link two chats, run /request_source in the chat to watch, then \
         /request_channel in the chat that should receive requests. In a \
         channel, post !request_channel instead.",
    );
    text
}

use ticketsmith_core::TicketCategory;

/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Quit the application.
    Quit,
    /// Switch the ticket category.
    SetCategory(TicketCategory),
    /// Re-send the last failed request.
    Retry,
    /// Ask the model to open the conversation.
    Greet,
    /// Add a business keyword and its meaning.
    AddContext { keyword: String, meaning: String },
    /// Remove a business keyword.
    RemoveContext(String),
    /// Print every turn so far.
    ShowHistory,
    /// Not a command - treat as a ticket request.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let input = input.trim();
    if !input.starts_with('/') {
        return CommandResult::NotACommand;
    }

    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,
        "/feature" => CommandResult::SetCategory(TicketCategory::Feature),
        "/bug" => CommandResult::SetCategory(TicketCategory::Bug),
        "/retry" => CommandResult::Retry,
        "/greet" => CommandResult::Greet,
        "/history" => CommandResult::ShowHistory,
        "/context" => match arg.split_once('=') {
            Some((keyword, meaning)) => CommandResult::AddContext {
                keyword: keyword.trim().to_string(),
                meaning: meaning.trim().to_string(),
            },
            None => CommandResult::Message("Usage: /context <keyword> = <meaning>".into()),
        },
        "/forget" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /forget <keyword>".into())
            } else {
                CommandResult::RemoveContext(arg.to_string())
            }
        }
        other => CommandResult::Message(format!(
            "Unknown command: {other}. Type /help for available commands."
        )),
    }
}

fn show_help() -> CommandResult {
    CommandResult::Message(
        "Ticketsmith Commands:\n\
        \n\
        /feature                     Draft feature tickets\n\
        /bug                         Draft bug tickets\n\
        /retry                       Re-send the last request after a network failure\n\
        /greet                       Let the model open the conversation\n\
        /context <keyword> = <text>  Explain a business term to the model\n\
        /forget <keyword>            Drop a business term\n\
        /history                     Show the conversation so far\n\
        /help, /h                    Show this help\n\
        /quit, /exit, /q             Quit\n\
        \n\
        Anything else is sent as a ticket request."
            .into(),
    )
}

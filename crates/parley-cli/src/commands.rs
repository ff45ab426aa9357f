//! Slash commands understood by the conversation loop

/// One line of user input, interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Clear,
    History,
    Models,
    /// Switch model, or show the current one when no name is given
    Model(Option<String>),
    /// Set the system prompt; `None` clears it
    System(Option<String>),
    ToggleThinking,
    Help,
    Unknown(String),
    /// Anything that is not a command is a chat message
    Chat(String),
}

pub const HELP: &[(&str, &str)] = &[
    ("/clear", "Clear the conversation"),
    ("/history", "Show the conversation so far"),
    ("/models", "List models offered by the backend"),
    ("/model [name]", "Show or switch the model"),
    ("/system [text]", "Set the system prompt (no text clears it)"),
    ("/thinking", "Expand or collapse thinking steps"),
    ("/help", "Show this help"),
    ("quit, exit", "Leave"),
];

/// Interpret a line of input; blank lines yield `None`
pub fn parse_input(input: &str) -> Option<Command> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if matches!(input.to_lowercase().as_str(), "quit" | "exit") {
        return Some(Command::Quit);
    }

    if !input.starts_with('/') {
        return Some(Command::Chat(input.to_string()));
    }

    let (name, rest) = match input.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (input, ""),
    };
    let argument = (!rest.is_empty()).then(|| rest.to_string());

    let command = match name.to_lowercase().as_str() {
        "/quit" | "/exit" => Command::Quit,
        "/clear" => Command::Clear,
        "/history" => Command::History,
        "/models" => Command::Models,
        "/model" => Command::Model(argument),
        "/system" => Command::System(argument),
        "/thinking" => Command::ToggleThinking,
        "/help" => Command::Help,
        _ => Command::Unknown(name.to_string()),
    };
    Some(command)
}

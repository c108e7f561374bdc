use chatrelay_core::GenerationConfigUpdate;

/// Result of processing a slash command.
#[derive(Debug, Clone)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Quit the application.
    Quit,
    /// Start a fresh conversation.
    NewConversation,
    /// List conversations.
    ListConversations,
    /// Make another conversation active (id or list position).
    SwitchConversation(String),
    /// Retitle the active conversation.
    Rename(String),
    /// Delete a conversation; the active one when no id is given.
    Delete(Option<String>),
    /// Drop every conversation and all request history.
    ClearAll,
    /// Queue a file for the next message.
    Attach(String),
    /// Drop queued files.
    Detach,
    /// Change the model.
    ModelChanged(String),
    /// Show the current model.
    ShowModel,
    /// List the model catalogue.
    ListModels,
    /// Merge a generation setting.
    SetConfig(GenerationConfigUpdate),
    /// Show generation settings.
    ShowConfig,
    /// Not a command - treat as regular input.
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

        // Conversation commands
        "/new" => CommandResult::NewConversation,
        "/list" | "/conversations" => CommandResult::ListConversations,
        "/switch" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /switch <conversation-id or number>".into())
            } else {
                CommandResult::SwitchConversation(arg.to_string())
            }
        }
        "/rename" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /rename <title>".into())
            } else {
                CommandResult::Rename(arg.to_string())
            }
        }
        "/delete" => CommandResult::Delete(Some(arg.to_string()).filter(|a| !a.is_empty())),
        "/clear" => CommandResult::ClearAll,

        // Attachments
        "/attach" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /attach <path>".into())
            } else {
                CommandResult::Attach(arg.to_string())
            }
        }
        "/detach" => CommandResult::Detach,

        // Model and generation settings
        "/model" => {
            if arg.is_empty() {
                CommandResult::ShowModel
            } else {
                CommandResult::ModelChanged(arg.to_string())
            }
        }
        "/models" => CommandResult::ListModels,
        "/set" => {
            if arg.is_empty() {
                CommandResult::Message(
                    "Usage: /set <key>=<value>\nKeys: max_tokens, temperature, top_p, top_k, \
                     repetition_penalty, stop_sequences, system, window"
                        .into(),
                )
            } else {
                match GenerationConfigUpdate::parse_assignment(arg) {
                    Ok(update) => CommandResult::SetConfig(update),
                    Err(e) => CommandResult::Message(e.to_string()),
                }
            }
        }
        "/config" => CommandResult::ShowConfig,

        _ => CommandResult::Message(format!("Unknown command: {cmd}. Type /help for help.")),
    }
}

fn show_help() -> CommandResult {
    CommandResult::Message(
        "chatrelay Commands:\n\
         \n\
         Conversations:\n\
         \x20 /new              Start a new conversation\n\
         \x20 /list             List conversations (newest first)\n\
         \x20 /switch <id|n>    Switch to a conversation\n\
         \x20 /rename <title>   Rename the active conversation\n\
         \x20 /delete [id]      Delete a conversation (default: active)\n\
         \x20 /clear            Delete all conversations\n\
         \n\
         Attachments:\n\
         \x20 /attach <path>    Attach a file to the next message\n\
         \x20 /detach           Drop pending attachments\n\
         \n\
         Model:\n\
         \x20 /model [id]       Show or change the model\n\
         \x20 /models           List available models\n\
         \x20 /set key=value    Change a generation setting\n\
         \x20 /config           Show generation settings\n\
         \n\
         \x20 /help             Show this help\n\
         \x20 /quit             Exit"
            .into(),
    )
}

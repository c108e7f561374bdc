use anyhow::{Context, Result};
use chatrelay_core::{ChatSession, FileAttachment, FileIntake, Settings};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{handle_command, CommandResult};

// ── Shared setup ────────────────────────────────────────────────────────

fn build_session(settings: &Settings, model: Option<&str>) -> Result<ChatSession> {
    let client = settings.build_client()?;
    let mut session = ChatSession::new(Arc::new(client), settings);
    if let Some(model) = model {
        session.set_model(model)?;
    }
    Ok(session)
}

async fn load_files(intake: &FileIntake, paths: &[PathBuf]) -> Result<Vec<FileAttachment>> {
    let mut attachments = Vec::with_capacity(paths.len());
    for path in paths {
        let attachment = intake
            .load(path)
            .await
            .with_context(|| format!("Cannot attach {}", path.display()))?;
        attachments.push(attachment);
    }
    Ok(attachments)
}

// ── Single prompt ───────────────────────────────────────────────────────

pub async fn run_single_prompt(
    settings: &Settings,
    model: Option<&str>,
    prompt: &str,
    files: &[PathBuf],
) -> Result<()> {
    let mut session = build_session(settings, model)?;
    let intake = FileIntake::from_settings(settings);
    let attachments = load_files(&intake, files).await?;

    let reply = session.send(prompt, attachments).await?;
    println!("{}", reply.content);
    Ok(())
}

// ── Interactive REPL ────────────────────────────────────────────────────

fn prompt_marker(session: &ChatSession, pending: usize) {
    let title = session
        .active()
        .map(|c| c.title.as_str())
        .unwrap_or("no conversation");
    if pending > 0 {
        print!("[{title} +{pending} file(s)] > ");
    } else {
        print!("[{title}] > ");
    }
    let _ = std::io::stdout().flush();
}

fn list_conversations(session: &ChatSession) -> String {
    let conversations = session.store().list();
    if conversations.is_empty() {
        return "No conversations yet.".to_string();
    }
    let active = session.active().map(|c| c.id.as_str());
    conversations
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let marker = if Some(c.id.as_str()) == active { "*" } else { " " };
            format!(
                "{marker} {:>2}. {} [{}] {} message(s), created {}",
                i + 1,
                c.title,
                c.id,
                c.messages.len(),
                c.created_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolve `/switch` input: a 1-based list position or a conversation id.
fn resolve_conversation(session: &ChatSession, arg: &str) -> Option<String> {
    let list = session.store().list();
    if let Ok(n) = arg.parse::<usize>() {
        if n >= 1 && n <= list.len() {
            return Some(list[n - 1].id.clone());
        }
    }
    list.iter().find(|c| c.id == arg).map(|c| c.id.clone())
}

pub async fn run_repl(settings: Settings, model: Option<&str>, files: &[PathBuf]) -> Result<()> {
    let mut session = build_session(&settings, model)?;
    let intake = FileIntake::from_settings(&settings);
    let mut pending = load_files(&intake, files).await?;

    println!(
        "chatrelay (model {}). Type /help for commands.",
        session.model()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt_marker(&session, pending.len());
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match handle_command(line) {
            CommandResult::NotACommand => {
                match session.send_queued(line, &mut pending).await {
                    Ok(reply) => println!("\n{}\n", reply.content),
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            CommandResult::Message(msg) => println!("{msg}"),
            CommandResult::Quit => break,
            CommandResult::NewConversation => {
                session.new_conversation();
                if let Some(c) = session.active() {
                    println!("Started {}", c.title);
                }
            }
            CommandResult::ListConversations => println!("{}", list_conversations(&session)),
            CommandResult::SwitchConversation(arg) => {
                match resolve_conversation(&session, &arg) {
                    Some(id) => {
                        session.select(&id)?;
                        if let Some(c) = session.active() {
                            println!("Switched to {}", c.title);
                        }
                    }
                    None => eprintln!("No conversation matches '{arg}'"),
                }
            }
            CommandResult::Rename(title) => match session.active().map(|c| c.id.clone()) {
                Some(id) => {
                    session.rename(&id, title);
                }
                None => eprintln!("No active conversation"),
            },
            CommandResult::Delete(target) => {
                let id = target.or_else(|| session.active().map(|c| c.id.clone()));
                match id {
                    Some(id) if session.delete(&id) => println!("Deleted {id}"),
                    Some(id) => eprintln!("No conversation with id {id}"),
                    None => eprintln!("No active conversation"),
                }
            }
            CommandResult::ClearAll => {
                session.clear_all();
                println!("All conversations cleared.");
            }
            CommandResult::Attach(path) => match intake.load(&path).await {
                Ok(attachment) => {
                    println!("Attached {}", attachment.name);
                    pending.push(attachment);
                }
                Err(e) => eprintln!("Cannot attach {path}: {e}"),
            },
            CommandResult::Detach => {
                pending.clear();
                println!("Pending attachments dropped.");
            }
            CommandResult::ModelChanged(id) => match session.set_model(&id) {
                Ok(()) => println!("Model: {id}"),
                Err(e) => eprintln!("{e}"),
            },
            CommandResult::ShowModel => println!("Model: {}", session.model()),
            CommandResult::ListModels => {
                for m in session.models() {
                    let marker = if m.id == session.model() { "*" } else { " " };
                    println!("{marker} {} ({}) {}: {}", m.id, m.name, m.price, m.description);
                }
            }
            CommandResult::SetConfig(update) => {
                session.update_config(update);
                println!("Updated.");
            }
            CommandResult::ShowConfig => {
                let config = session.service().config();
                println!(
                    "max_tokens={} temperature={} top_p={} top_k={} repetition_penalty={:?} \
                     stop_sequences={:?} window={}\nsystem: {}",
                    config.max_tokens,
                    config.temperature,
                    config.top_p,
                    config.top_k,
                    config.repetition_penalty,
                    config.stop_sequences,
                    config.window_size,
                    config.system_prompt
                );
            }
        }
    }

    Ok(())
}

//! One-shot question command.

use std::io::Write;

use anyhow::Result;
use console::style;
use futures_util::StreamExt;

use librarian_types::chat::{ChatRequest, ChatStreamEvent};

use crate::state::AppState;

/// Send one message as `user` and print the librarian's answer.
pub async fn ask(state: &AppState, user: &str, message: String, stream: bool, json: bool) -> Result<()> {
    let request = ChatRequest::new(message);

    if !stream {
        let reply = state.orchestrator.chat(user, &request).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&reply)?);
            return Ok(());
        }
        println!();
        println!("  {}", reply.answer);
        if let Some(title) = &reply.title {
            println!();
            println!("  {} {}", style("Book:").dim(), style(title).cyan().bold());
        }
        println!();
        return Ok(());
    }

    let chat = state.orchestrator.chat_stream(user, &request).await?;
    let mut events = chat.events;
    let mut failure = None;

    if !json {
        println!();
        print!("  ");
        let _ = std::io::stdout().flush();
    }
    while let Some(event) = events.next().await {
        if json {
            println!("{}", serde_json::to_string(&event)?);
        }
        match event {
            ChatStreamEvent::Delta { text } => {
                if !json {
                    print!("{text}");
                    let _ = std::io::stdout().flush();
                }
            }
            ChatStreamEvent::Error { message } => failure = Some(message),
            ChatStreamEvent::End => break,
        }
    }
    if !json {
        println!();
        println!();
    }

    match failure {
        Some(message) => anyhow::bail!("generation failed: {message}"),
        None => {
            tracing::debug!(conversation_id = %chat.conversation_id, "stream finished");
            Ok(())
        }
    }
}

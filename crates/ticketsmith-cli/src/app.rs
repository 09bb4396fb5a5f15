use anyhow::Result;
use std::io::Write;
use crate::commands::{handle_command, CommandResult};
use ticketsmith_core::{
    ControllerEvent, ControllerState, ConversationController, FailureKind, TicketCategory,
    TicketError, TurnRole,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy)]
enum Action {
    Generate,
    Greet,
    Retry,
}

// ── Single-request mode ─────────────────────────────────────────────────

pub async fn run_single_request(
    controller: ConversationController,
    category: TicketCategory,
    request: &str,
    greet: bool,
) -> Result<()> {
    if greet {
        if let Err(e) = run_exchange(&controller, Action::Greet).await {
            report_error(&e);
        }
    }

    controller.set_category(category);
    controller.set_input(request);
    // Already reported; main only needs a failing exit status.
    if let Err(e) = run_exchange(&controller, Action::Generate).await {
        report_error(&e);
        anyhow::bail!("no ticket was generated");
    }
    Ok(())
}

// ── Interactive mode ────────────────────────────────────────────────────

pub async fn run_interactive(
    controller: ConversationController,
    category: TicketCategory,
    greet: bool,
) -> Result<()> {
    controller.set_category(category);
    println!("Let's get your ticket description ready. Type /help for commands.");

    if greet {
        if let Err(e) = run_exchange(&controller, Action::Greet).await {
            report_error(&e);
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("[{}] > ", controller.category());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let action = match handle_command(line) {
            CommandResult::Quit => break,
            CommandResult::Message(msg) => {
                println!("{msg}");
                continue;
            }
            CommandResult::SetCategory(category) => {
                controller.set_category(category);
                println!("Drafting {category} tickets.");
                continue;
            }
            CommandResult::AddContext { keyword, meaning } => {
                match controller.add_context(&keyword, meaning) {
                    Ok(()) => println!("Noted '{keyword}'."),
                    Err(e) => report_error(&e),
                }
                continue;
            }
            CommandResult::RemoveContext(keyword) => {
                match controller.remove_context(&keyword) {
                    Some(_) => println!("Forgot '{keyword}'."),
                    None => println!("'{keyword}' was not in the context."),
                }
                continue;
            }
            CommandResult::ShowHistory => {
                print_history(&controller);
                continue;
            }
            CommandResult::Retry => Action::Retry,
            CommandResult::Greet => Action::Greet,
            CommandResult::NotACommand => {
                controller.set_input(line);
                Action::Generate
            }
        };

        if let Err(e) = run_exchange(&controller, action).await {
            report_error(&e);
        }
    }

    Ok(())
}

/// Run one exchange while printing its events as they arrive.
async fn run_exchange(
    controller: &ConversationController,
    action: Action,
) -> Result<String, TicketError> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ControllerEvent>();

    let work = async move {
        match action {
            Action::Generate => controller.generate_with_events(event_tx).await,
            Action::Greet => controller.greet_with_events(event_tx).await,
            Action::Retry => controller.retry_with_events(event_tx).await,
        }
    };

    let render = async {
        while let Some(event) = event_rx.recv().await {
            match event {
                ControllerEvent::StateChanged(ControllerState::AwaitingReply) => {
                    eprintln!("Generating...");
                }
                ControllerEvent::TurnAppended(turn) if turn.role() == TurnRole::Model => {
                    println!("\n{}\n", turn.text());
                }
                _ => {}
            }
        }
    };

    let (result, ()) = tokio::join!(work, render);
    result
}

fn report_error(error: &TicketError) {
    match error {
        TicketError::InvalidInput(_) => {
            eprintln!("Please describe what is needed first.");
        }
        TicketError::GenerationFailed {
            kind: FailureKind::Transient,
            reason,
        } => {
            eprintln!("Request failed: {reason}. Type /retry to send it again.");
        }
        TicketError::GenerationFailed {
            kind: FailureKind::Rejected,
            reason,
        } => {
            eprintln!("The model declined this request: {reason}. Rephrase it before sending again.");
        }
        other => eprintln!("Error: {other}"),
    }
}

fn print_history(controller: &ConversationController) {
    let transcript = controller.transcript();
    if transcript.is_empty() {
        println!("No messages yet.");
        return;
    }
    for turn in transcript.all() {
        let who = match turn.role() {
            TurnRole::User => "you",
            TurnRole::Model => "model",
        };
        println!(
            "[{} {}] {}",
            turn.created_at().format("%H:%M:%S"),
            who,
            turn.text()
        );
    }
}

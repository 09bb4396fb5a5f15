use ticketsmith_cli::commands::{handle_command, CommandResult};
use ticketsmith_core::TicketCategory;

// ========================================================================
// Command Parsing Tests (commands.rs)
// ========================================================================

#[test]
fn test_help_command() {
    let result = handle_command("/help");

    if let CommandResult::Message(msg) = result {
        assert!(msg.contains("Ticketsmith Commands"));
        assert!(msg.contains("/retry"));
    } else {
        panic!("expected help message");
    }
}

#[test]
fn test_quit_aliases() {
    for cmd in ["/quit", "/exit", "/q"] {
        assert_eq!(handle_command(cmd), CommandResult::Quit);
    }
}

#[test]
fn test_category_commands() {
    assert_eq!(
        handle_command("/bug"),
        CommandResult::SetCategory(TicketCategory::Bug)
    );
    assert_eq!(
        handle_command("/feature"),
        CommandResult::SetCategory(TicketCategory::Feature)
    );
}

#[test]
fn test_retry_greet_and_history() {
    assert_eq!(handle_command("/retry"), CommandResult::Retry);
    assert_eq!(handle_command("/greet"), CommandResult::Greet);
    assert_eq!(handle_command("/history"), CommandResult::ShowHistory);
}

#[test]
fn test_context_command_splits_on_equals() {
    assert_eq!(
        handle_command("/context SKU = stock keeping unit"),
        CommandResult::AddContext {
            keyword: "SKU".to_string(),
            meaning: "stock keeping unit".to_string(),
        }
    );
}

#[test]
fn test_context_command_without_equals_shows_usage() {
    assert!(matches!(
        handle_command("/context SKU"),
        CommandResult::Message(msg) if msg.contains("Usage")
    ));
}

#[test]
fn test_forget_command() {
    assert_eq!(
        handle_command("/forget SKU"),
        CommandResult::RemoveContext("SKU".to_string())
    );
    assert!(matches!(handle_command("/forget"), CommandResult::Message(_)));
}

#[test]
fn test_plain_text_is_not_a_command() {
    assert_eq!(
        handle_command("login crashes on submit"),
        CommandResult::NotACommand
    );
}

#[test]
fn test_unknown_command() {
    assert!(matches!(
        handle_command("/frobnicate"),
        CommandResult::Message(msg) if msg.contains("Unknown command")
    ));
}

use std::io::{self, Write};

use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use askline_chat::ChatSession;
use askline_models::{Message, Role};
use askline_store::StorageBackend;

const SUGGESTED_QUESTIONS: [&str; 4] = [
    "What can you help me with?",
    "What services do you offer?",
    "Who are your clients?",
    "How do I get started?",
];

/// Ask one question, print the reply, exit.
pub async fn ask_once<B: StorageBackend>(
    session: &mut ChatSession<B>,
    question: &str,
    stream: bool,
) -> Result<()> {
    exchange(session, question, stream).await;
    Ok(())
}

/// Run interactive REPL mode
pub async fn run_repl<B: StorageBackend>(mut session: ChatSession<B>, stream: bool) -> Result<()> {
    println!("{}", "Askline".bright_cyan().bold());
    println!(
        "{}",
        "Type 'exit' or 'quit' to leave, '/clear' to reset the conversation\n".bright_black()
    );

    if session.has_history() {
        println!("{}", "Restored previous conversation:".bright_black());
        for message in session.messages() {
            print_turn(message);
        }
        println!();
    } else {
        print_turn(&session.messages()[0]);
        println!();
    }

    if session.show_suggestions() {
        println!("{}", "Some things to ask:".bright_black());
        for question in SUGGESTED_QUESTIONS {
            println!("  {} {}", "•".bright_black(), question.bright_black());
        }
        println!();
    }

    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline(&"you> ".bright_green().to_string()) {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }
                if line == "/clear" {
                    session.clear_history();
                    println!("{}\n", "Conversation cleared.".yellow());
                    print_turn(&session.messages()[0]);
                    println!();
                    continue;
                }

                let _ = rl.add_history_entry(&line);
                exchange(&mut session, &line, stream).await;
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    println!("{}", "Bye!".bright_black());
    Ok(())
}

/// One request/response round trip, rendered to the terminal.
async fn exchange<B: StorageBackend>(session: &mut ChatSession<B>, input: &str, stream: bool) {
    if input.trim().is_empty() {
        return;
    }

    if stream {
        print!("{} ", "assistant>".bright_cyan());
        let _ = io::stdout().flush();

        let mut shown = String::new();
        session
            .send_message_streaming(input, |fragment| {
                shown.push_str(fragment);
                print!("{}", fragment);
                let _ = io::stdout().flush();
            })
            .await;

        let recorded = session
            .messages()
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        if shown.is_empty() {
            // Nothing streamed; the turn holds an error or fallback text.
            println!("{}", recorded);
        } else if recorded != shown {
            // The stream broke off; show how the turn was recorded.
            println!();
            println!("{} {}", "assistant>".bright_cyan(), recorded);
        } else {
            println!();
        }
    } else {
        session.send_message(input).await;
        if let Some(reply) = session.messages().last() {
            print_turn(reply);
        }
    }
}

fn print_turn(message: &Message) {
    match message.role {
        Role::User => println!("{} {}", "you>".bright_green(), message.content),
        Role::Assistant => println!("{} {}", "assistant>".bright_cyan(), message.content),
    }
}

//! `chorus chat` -- talk to the skill engine.
//!
//! With `--message`, runs one turn and prints the reply. Otherwise reads
//! utterances from stdin, one per line, and keeps the conversation (and
//! any pending question) across lines.
//!
//! # Examples
//!
//! ```text
//! chorus chat -m "what time is it"
//!
//! chorus chat
//! > call John
//! I found 2 contacts, who should I call?
//! > the first one
//! Calling John
//! > /exit
//! ```

use std::sync::Arc;

use clap::Args;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use chorus_core::{Conversation, SkillContext, TurnKind, TurnOutcome};
use chorus_platform::NativePlatform;

use super::{build_engine, load_config};

/// Arguments for the `chorus chat` subcommand.
#[derive(Args)]
pub struct ChatArgs {
    /// Send a single utterance and exit (non-interactive mode).
    #[arg(short, long)]
    pub message: Option<String>,

    /// Print each turn's structured presentation as JSON.
    #[arg(long)]
    pub json: bool,

    /// Config file path (overrides auto-discovery).
    #[arg(short, long)]
    pub config: Option<String>,
}

/// Run the chat command.
pub async fn run(args: ChatArgs) -> anyhow::Result<()> {
    let platform = NativePlatform::new();
    let config = load_config(&platform, args.config.as_deref()).await?;
    let engine = build_engine(&config)?;

    let conversation = Arc::new(Conversation::new(
        Arc::clone(&engine.dispatcher),
        engine.ctx.clone(),
    ));

    if let Some(message) = args.message {
        let outcome = conversation.process(&message).await;
        print_outcome(&outcome, conversation.context(), args.json);
        return Ok(());
    }

    run_interactive(conversation, args.json).await
}

/// Read utterances from stdin until EOF or `/exit`.
///
/// Turns run on the conversation loop in a background task; Ctrl-C
/// cancels the turn in flight and ends the session.
async fn run_interactive(conversation: Arc<Conversation>, json: bool) -> anyhow::Result<()> {
    println!("chorus chat -- interactive mode (type /help for commands)");
    println!("Locale: {}", conversation.context().locale());
    println!();

    let (utterance_tx, utterance_rx) = mpsc::channel::<String>(8);
    let (outcome_tx, mut outcome_rx) = mpsc::channel::<TurnOutcome>(8);
    let shutdown = CancellationToken::new();

    let loop_handle = tokio::spawn(Arc::clone(&conversation).run(
        utterance_rx,
        outcome_tx,
        shutdown.clone(),
    ));

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted");
            ctrl_c.cancel();
        }
    });

    let stdin = tokio::io::stdin();
    let mut reader = tokio::io::BufReader::new(stdin).lines();

    loop {
        eprint!("> ");
        // Flush stderr so the prompt appears before blocking on read.
        use std::io::Write;
        std::io::stderr().flush().ok();

        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = reader.next_line() => match line? {
                Some(l) => l,
                None => break,
            },
        };
        let input = line.trim();

        if input.is_empty() {
            continue;
        }

        match input {
            "/exit" | "/quit" => break,
            "/help" => {
                print_help();
                continue;
            }
            "/pending" => {
                let snapshot = conversation.pending_snapshot();
                if snapshot.is_empty() {
                    println!("[no pending question]");
                } else {
                    println!("[pending: {}]", snapshot.skill_ids.join(", "));
                }
                continue;
            }
            "/clear" => {
                conversation.clear_pending().await;
                println!("[pending question cleared]");
                continue;
            }
            _ => {}
        }

        if utterance_tx.send(input.to_owned()).await.is_err() {
            eprintln!("error: conversation loop closed unexpectedly");
            break;
        }
        match outcome_rx.recv().await {
            Some(outcome) => print_outcome(&outcome, conversation.context(), json),
            None => {
                eprintln!("error: conversation loop closed unexpectedly");
                break;
            }
        }
    }

    shutdown.cancel();
    drop(utterance_tx);
    let _ = loop_handle.await;

    println!("Goodbye.");
    Ok(())
}

fn print_outcome(outcome: &TurnOutcome, ctx: &SkillContext, json: bool) {
    if json {
        match serde_json::to_string_pretty(&outcome.output.presentation(ctx)) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => eprintln!("error: failed to render presentation: {e}"),
        }
    } else {
        println!("{}", outcome.speech(ctx));
    }
    eprintln!("  [{}]", describe(&outcome.kind));
    println!();
}

/// Short diagnostic shown under each reply.
fn describe(kind: &TurnKind) -> String {
    match kind {
        TurnKind::Matched {
            skill_id,
            score,
            via_continuation,
        } => format!(
            "{skill_id} {score:.2}{}",
            if *via_continuation { " (continuation)" } else { "" }
        ),
        TurnKind::Unrecognized { .. } => "unrecognized".into(),
        TurnKind::Failed { skill_id, .. } => format!("{skill_id} failed"),
        TurnKind::Cancelled { skill_id } => format!("{skill_id} cancelled"),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /pending  Show which skills can answer the pending question");
    println!("  /clear    Drop the pending question");
    println!("  /help     Show this help");
    println!("  /exit     End the session");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_args_defaults() {
        let args = ChatArgs {
            message: None,
            json: false,
            config: None,
        };
        assert!(args.message.is_none());
        assert!(!args.json);
    }

    #[test]
    fn describe_turns() {
        let matched = TurnKind::Matched {
            skill_id: "telephone".into(),
            score: 1.0,
            via_continuation: false,
        };
        assert_eq!(describe(&matched), "telephone 1.00");

        let continued = TurnKind::Matched {
            skill_id: "contact_chooser_index".into(),
            score: 0.5,
            via_continuation: true,
        };
        assert_eq!(describe(&continued), "contact_chooser_index 0.50 (continuation)");
        assert_eq!(describe(&TurnKind::Unrecognized { fallback: None }), "unrecognized");
    }
}

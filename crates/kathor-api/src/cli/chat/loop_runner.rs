//! Main chat loop orchestration.
//!
//! Creates a soul on the in-process engine, then reads lines, dispatches
//! them as perceptions and renders the turn's events while it runs.

use std::time::{Duration, Instant};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast;

use kathor_core::chat::transcript::PLACEHOLDER;
use kathor_core::chat::{Transcript, TranscriptUpdate};
use kathor_types::event::{MessageAction, SoulEvent};
use kathor_types::perception::Perception;
use kathor_types::soul::SoulId;

use crate::state::AppState;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::ChatRenderer;

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message(PLACEHOLDER);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Renders one turn's updates: a spinner stands in for any message that
/// has no text yet.
struct TurnView<'a> {
    renderer: &'a ChatRenderer,
    spinner: Option<ProgressBar>,
    open: Option<MessageAction>,
}

impl<'a> TurnView<'a> {
    fn new(renderer: &'a ChatRenderer) -> Self {
        Self {
            renderer,
            spinner: None,
            open: None,
        }
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn apply(&mut self, update: &TranscriptUpdate) {
        match update {
            TranscriptUpdate::ProcessStarted => {
                self.spinner = Some(spinner());
            }
            TranscriptUpdate::MessageStarted { action } => {
                self.stop_spinner();
                if self.open.take().is_some() {
                    println!();
                }
                self.open = Some(*action);
                self.spinner = Some(spinner());
            }
            TranscriptUpdate::Delta { action, text } => {
                if self.spinner.is_some() {
                    self.stop_spinner();
                    self.renderer.print_label(*action);
                }
                self.renderer.print_fragment(*action, text);
            }
            TranscriptUpdate::Completed { action, content } => {
                if self.spinner.is_some() {
                    // Nothing streamed for this message
                    self.stop_spinner();
                    self.renderer.print_label(*action);
                    self.renderer.print_fragment(*action, content);
                }
                println!();
                self.open = None;
            }
            TranscriptUpdate::TurnFailed { error } => {
                self.stop_spinner();
                eprintln!("\n  {} {error}", style("!").red().bold());
                eprintln!("  {}", style("Type a message to retry, /exit to quit.").dim());
            }
            TranscriptUpdate::TurnFinished => self.stop_spinner(),
            TranscriptUpdate::Ignored | TranscriptUpdate::Cleared => {}
        }
    }
}

/// Dispatch one perception and render its events until the turn ends.
async fn run_turn(
    state: &AppState,
    soul_id: SoulId,
    perception: Perception,
    transcript: &mut Transcript,
    events: &mut broadcast::Receiver<SoulEvent>,
    renderer: &ChatRenderer,
) {
    let previous = state
        .engine
        .current_process(soul_id)
        .await
        .unwrap_or_default();
    let start = Instant::now();
    let mut view = TurnView::new(renderer);

    let dispatch = state.engine.dispatch(soul_id, perception);
    tokio::pin!(dispatch);

    let result = loop {
        tokio::select! {
            result = &mut dispatch => break result,
            event = events.recv() => match event {
                Ok(event) => view.apply(&transcript.apply(&event)),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "chat view lagged behind soul events");
                }
                Err(broadcast::error::RecvError::Closed) => {}
            },
        }
    };

    // Events published just before the turn returned
    while let Ok(event) = events.try_recv() {
        view.apply(&transcript.apply(&event));
    }
    view.stop_spinner();

    if let Ok(outcome) = result {
        renderer.print_turn_footer(
            previous,
            outcome.next_process,
            start.elapsed().as_millis() as u64,
        );
    }
    println!();
}

/// Run the interactive chat loop.
pub async fn run_chat_loop(state: &AppState, user_name: &str) -> anyhow::Result<()> {
    let engine = &state.engine;
    let soul_id = engine.create_soul();
    let mut events = engine.subscribe();
    let mut transcript = Transcript::new(soul_id);
    let renderer = ChatRenderer::new(engine.runtime().soul_name());

    print_welcome_banner(
        engine.runtime().soul_name(),
        &engine.runtime().llm().model,
        &soul_id.to_string(),
    );

    let prompt = format!("  {} ", style(format!("{user_name} >")).green().bold());
    let (mut chat_input, _writer) = ChatInput::new(prompt)
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        let text = match chat_input.read_line().await {
            InputEvent::Eof => break,
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                continue;
            }
            InputEvent::Message(text) => text,
        };

        let perception = match commands::parse(&text) {
            None => Perception::said(user_name, text),
            Some(ChatCommand::Honk) => {
                // Terminal bell stands in for the honk sound
                print!("\x07");
                println!("\n  {}", style("HONK!").yellow().bold());
                Perception::honked(user_name)
            }
            Some(ChatCommand::Help) => {
                commands::print_help();
                continue;
            }
            Some(ChatCommand::Clear) => {
                chat_input.clear();
                continue;
            }
            Some(ChatCommand::Exit) => break,
            Some(ChatCommand::Reset) => {
                engine.reset(soul_id).await?;
                while let Ok(event) = events.try_recv() {
                    transcript.apply(&event);
                }
                println!("\n  {} Starting over.\n", style("*").cyan().bold());
                continue;
            }
            Some(ChatCommand::Notes) => {
                let notes = engine.notes(soul_id).await?;
                println!("\n  {}", style("Conversation notes").bold());
                println!("{}", renderer.render_markdown(&notes.conversation));
                println!("  {}", style("Notes about you").bold());
                let user_notes = if notes.user.is_empty() {
                    PLACEHOLDER
                } else {
                    notes.user.as_str()
                };
                println!("{}", renderer.render_markdown(user_notes));
                continue;
            }
            Some(ChatCommand::Unknown(name)) => {
                println!(
                    "\n  {} Unknown command: {}. Type /help for available commands.\n",
                    style("?").yellow().bold(),
                    style(name).dim()
                );
                continue;
            }
        };

        transcript.push_user(perception.content.clone());
        run_turn(state, soul_id, perception, &mut transcript, &mut events, &renderer).await;
        tracing::debug!(entries = transcript.entries().len(), "transcript updated");
    }

    chat_input.flush();
    println!("\n  {}", style("Session ended.").dim());
    engine.remove(soul_id);
    Ok(())
}

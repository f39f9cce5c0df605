//! A terminal chat client that streams replies as they arrive.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use stream_chat::core::{ExchangePhase, SessionHostBuilder, Transcript};
use stream_chat::http::HttpEndpoint;
use stream_chat::{LineReader, ReplyProgress, Settings, TranscriptPrinter};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

enum SessionEvent {
    Idle,
    Updated {
        transcript: Transcript,
        open_bot_turn: Option<usize>,
        phase: ExchangePhase,
    },
    Rejected(String),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_env();
    let endpoint = HttpEndpoint::new(settings.endpoint);
    println!("Chatting with {}", endpoint.config().url().dimmed());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let host = SessionHostBuilder::with_endpoint(endpoint)
        .with_decode_mode(settings.decode_mode)
        .on_update({
            let event_tx = event_tx.clone();
            move |session| {
                event_tx
                    .send(SessionEvent::Updated {
                        transcript: session.transcript().clone(),
                        open_bot_turn: session.open_bot_turn(),
                        phase: session.phase(),
                    })
                    .ok();
            }
        })
        .on_idle({
            let event_tx = event_tx.clone();
            move || {
                event_tx.send(SessionEvent::Idle).ok();
            }
        })
        .on_rejected(move |input| {
            event_tx.send(SessionEvent::Rejected(input.to_owned())).ok();
        })
        .build();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .map(|style| style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let mut printer = TranscriptPrinter::new(true);
    let mut stdout = std::io::stdout();
    let mut input = LineReader::new(tokio::io::stdin());

    'outer: loop {
        print!("> ");
        stdout.flush().ok();

        let Some(line) = input.next_line().await else {
            break;
        };
        if host.submit_text(line).is_err() {
            break;
        }

        // The spinner is only shown until the first fragment arrives.
        let mut progress_bar: Option<ProgressBar> = None;
        let mut progress = ReplyProgress::new();

        loop {
            if progress.is_waiting() {
                progress_bar
                    .get_or_insert_with(|| {
                        let progress_bar = ProgressBar::new_spinner();
                        progress_bar.set_style(progress_style.clone());
                        progress_bar.set_message("🤔 Waiting for reply...");
                        progress_bar
                    })
                    .inc(1);
            }

            let sleep = sleep(Duration::from_millis(100));
            let event = select! {
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        break 'outer;
                    };
                    event
                },
                _ = sleep => {
                    continue;
                }
            };

            match event {
                SessionEvent::Updated {
                    transcript,
                    open_bot_turn,
                    phase,
                } => {
                    if !progress.observe(phase) {
                        if let Some(progress_bar) = progress_bar.take() {
                            progress_bar.finish_and_clear();
                        }
                    }
                    if let Err(err) =
                        printer.print(&transcript, open_bot_turn, &mut stdout)
                    {
                        error!("error printing the transcript: {err}");
                        break 'outer;
                    }
                }
                SessionEvent::Rejected(input) => {
                    warn!("input rejected while a reply is streaming: {input}");
                }
                SessionEvent::Idle => {
                    if let Some(progress_bar) = progress_bar.take() {
                        progress_bar.finish_and_clear();
                    }
                    break;
                }
            }
        }
    }

    host.shutdown();
}

//! Golem controller binary - composition root.
//!
//! Ties together the Golem crates into a single executable:
//! 1. Load configuration from TOML and apply CLI overrides
//! 2. Build the motion backend, decision engine and speech sink
//! 3. Wire the controller (intake -> context -> engine -> dispatch)
//! 4. Feed recognized-speech events from stdin into the controller loop
//!
//! On the real robot the speech events arrive over the embedded transport's
//! ASR topic; this binary reads the same JSON shape from stdin (or bare text
//! lines) so the whole pipeline can be driven from a terminal or a replay
//! file. Ctrl-C shuts the loop down and cancels whatever is still running.

mod cli;

use std::sync::Arc;

use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tokio::sync::{broadcast, mpsc};

use golem_core::config::GolemConfig;
use golem_core::events::EventLog;
use golem_dialog::{Controller, LogSpeech, NullSpeech, RuleEngine, SpeechEvent, SpeechSink};
use golem_motion::{Motion, SimulatedMotion};

use cli::CliArgs;

const EVENT_LOG_CAPACITY: usize = 256;
const SPEECH_QUEUE_DEPTH: usize = 32;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config, with CLI overrides applied before anything reads it.
    let config_file = args.resolve_config_path();
    let mut config = GolemConfig::load_or_default(&config_file);
    config.general.network_interface = args.resolve_interface(&config.general.network_interface);
    if let Some(ref language) = args.language {
        config.general.language = language.clone();
    }
    config.general.log_level = args.resolve_log_level(&config.general.log_level);

    // Tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(config.general.log_level.clone())
            }),
        )
        .init();

    tracing::info!("Starting Golem v{}", env!("CARGO_PKG_VERSION"));
    if config_file.exists() {
        tracing::info!(path = %config_file.display(), "Configuration loaded");
    } else {
        tracing::info!(path = %config_file.display(), "No config file, using defaults");
    }

    // Wiring.
    let motion: Arc<dyn Motion> = Arc::new(SimulatedMotion::new(config.motion.clone()));
    let engine = Arc::new(RuleEngine::new());
    let speech: Arc<dyn SpeechSink> = if config.speech.enabled {
        Arc::new(LogSpeech)
    } else {
        Arc::new(NullSpeech)
    };
    let asr_topic = config.speech.asr_topic.clone();
    let controller = Arc::new(Controller::new(config, motion, engine, speech));

    if args.list_actions {
        let catalog = controller.executor().catalog();
        let available = controller.available_actions()?;
        for class in available.keys() {
            println!("{}:", class);
            for entry in catalog.entries(class)? {
                println!("  {:<14} {}", entry.name, entry.description);
            }
        }
        return Ok(());
    }

    // Every controller event goes into a bounded log for the exit summary
    // and is echoed at debug level as it happens.
    let event_log = Arc::new(EventLog::new(EVENT_LOG_CAPACITY));
    let mut events = controller.subscribe();
    let observer_log = Arc::clone(&event_log);
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    tracing::debug!(event = event.event_name(), "Controller event");
                    observer_log.record(event);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    controller.start();
    tracing::info!(topic = %asr_topic, "Reading speech events from stdin");

    // Stdin feeds the controller loop through a channel. JSON lines carry
    // full recognizer events; bare text lines become full-confidence
    // utterances so the pipeline can be driven by hand.
    let (tx, rx) = mpsc::channel(SPEECH_QUEUE_DEPTH);
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    tracing::info!("Input closed");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read stdin");
                    break;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let event = if line.starts_with('{') {
                match SpeechEvent::parse(line) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::debug!(error = %e, "Skipping malformed speech event");
                        continue;
                    }
                }
            } else {
                SpeechEvent {
                    text: line.to_string(),
                    confidence: Some(1.0),
                    angle: None,
                }
            };
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });

    let interrupt = Arc::clone(&controller);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received");
            interrupt.shutdown();
        }
    });

    controller.run(rx).await;

    let cancelled = controller.stop()?;
    let history = controller.executor().store().history()?;
    let succeeded = history.iter().filter(|r| r.success).count();
    tracing::info!(
        actions = history.len(),
        succeeded,
        cancelled,
        events = event_log.len(),
        "Session summary"
    );
    let recent = event_log.recent(8);
    let names: Vec<&str> = recent.iter().map(|e| e.event_name()).collect();
    tracing::debug!(events = ?names, "Recent controller events");
    Ok(())
}

//! Intake filter for recognized-speech events.
//!
//! Every utterance from the ASR passes four gates, in order: empty text,
//! confidence, character set, debounce. Only an utterance that clears all
//! four reaches the decision engine. The filter exists because the ASR
//! stream is noisy: it emits low-confidence fragments, garbled
//! misrecognitions of background speech, and near-duplicate bursts.

use std::sync::LazyLock;
use std::time::{Duration, Instant};

use golem_core::config::IntakeConfig;
use golem_core::types::RejectReason;
use regex::Regex;
use tracing::debug;

/// Letters, digits and basic punctuation. Misrecognized background speech
/// tends to surface as CJK or Cyrillic text, which this class excludes.
static VALID_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\s.,!?'-]+$").unwrap());

fn is_valid_text(text: &str) -> bool {
    VALID_TEXT_RE.is_match(text)
}

/// Outcome of running one utterance through the gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeDecision {
    /// The utterance cleared every gate and advanced the throttle.
    Accepted,
    /// The utterance was dropped at the named gate.
    Rejected(RejectReason),
}

/// Gatekeeper between the ASR stream and the decision engine.
///
/// Holds the throttle timestamp, so one filter instance guards one intake
/// stream. Callers invoking it from several producers must serialize calls;
/// the read-then-write on the throttle is a critical section.
pub struct IntakeFilter {
    config: IntakeConfig,
    last_accepted: Option<Instant>,
}

impl IntakeFilter {
    pub fn new(config: IntakeConfig) -> Self {
        Self {
            config,
            last_accepted: None,
        }
    }

    fn debounce(&self) -> Duration {
        Duration::from_secs_f64(self.config.debounce_secs.max(0.0))
    }

    /// Run one utterance through the gates.
    ///
    /// Gate order is fixed and the first failure wins. The throttle only
    /// advances on acceptance, with one exception: an utterance that fails
    /// the confidence gate AND the character-set check still advances it,
    /// so a burst of garbled fragments cannot line up an immediate
    /// acceptance for the next fragment. A garbled utterance with healthy
    /// confidence does not advance the throttle. This asymmetry is a
    /// deliberate policy, not an accident of gate order.
    pub fn admit(&mut self, text: &str, confidence: f64) -> IntakeDecision {
        if text.trim().is_empty() {
            return IntakeDecision::Rejected(RejectReason::Empty);
        }

        let garbled = !is_valid_text(text);

        if confidence < self.config.min_confidence {
            if garbled {
                self.last_accepted = Some(Instant::now());
            }
            debug!("Ignoring low-confidence utterance ({:.2}): {}", confidence, text);
            return IntakeDecision::Rejected(RejectReason::LowConfidence);
        }

        if garbled {
            debug!("Ignoring garbled utterance: {}", text);
            return IntakeDecision::Rejected(RejectReason::Garbled);
        }

        let now = Instant::now();
        if let Some(last) = self.last_accepted {
            if now.duration_since(last) < self.debounce() {
                debug!("Ignoring utterance inside debounce window: {}", text);
                return IntakeDecision::Rejected(RejectReason::Debounced);
            }
        }

        self.last_accepted = Some(now);
        IntakeDecision::Accepted
    }
}

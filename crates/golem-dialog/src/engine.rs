//! Decision engine boundary and the built-in rule engine.
//!
//! The real deployment points [`DecisionEngine`] at a remote inference
//! backend that turns (utterance, prompt) into a decision object. The
//! bundled [`RuleEngine`] covers headless runs and tests with keyword
//! rules over the same decision-object shape.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};

use crate::error::DialogError;

/// Produces a decision object for an accepted utterance.
///
/// The prompt is the conversation context as built by
/// [`ConversationContext::build_prompt`](crate::ConversationContext::build_prompt);
/// backends are free to ignore it.
#[async_trait]
pub trait DecisionEngine: Send + Sync {
    async fn decide(&self, text: &str, prompt: &Value) -> Result<Value, DialogError>;
}

struct RulePatterns {
    emergency: Regex,
    stop: Regex,
    greeting: Regex,
    farewell: Regex,
    come: Regex,
    back: Regex,
    turn_left: Regex,
    turn_right: Regex,
    sit: Regex,
    stand: Regex,
    agree: Regex,
    disagree: Regex,
    thanks: Regex,
    distance: Regex,
}

static RULE_PATTERNS: LazyLock<RulePatterns> = LazyLock::new(|| {
    let mk = |pattern: &str| Regex::new(pattern).expect("Invalid rule regex");
    RulePatterns {
        emergency: mk(r"(?i)\b(emergency|freeze|abort)\b"),
        stop: mk(r"(?i)\bstop\b"),
        greeting: mk(r"(?i)\b(hello|hi|hey|good\s+(morning|afternoon|evening))\b"),
        farewell: mk(r"(?i)\b(bye|goodbye|see\s+you)\b"),
        come: mk(r"(?i)\b(come\s+(here|over|closer)|walk\s+forward|move\s+forward|forward)\b"),
        back: mk(r"(?i)\b(back\s+(up|off|away)|backward|move\s+back)\b"),
        turn_left: mk(r"(?i)\bturn\s+left\b"),
        turn_right: mk(r"(?i)\bturn\s+right\b"),
        sit: mk(r"(?i)\bsit\b"),
        stand: mk(r"(?i)\b(stand|get\s+up)\b"),
        agree: mk(r"(?i)\b(yes|agree|nod|correct)\b"),
        disagree: mk(r"(?i)\b(no|wrong|disagree)\b"),
        thanks: mk(r"(?i)\b(thank|thanks)\b"),
        distance: mk(r"(?i)\b(\d+(?:\.\d+)?)\s*(?:m|meter|meters)\b"),
    }
});

/// Keyword-driven decision engine.
///
/// Rules are checked in a fixed priority order with the safety commands
/// first, so "emergency stop" never falls through to a chat reply.
#[derive(Debug, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    fn extract_distance(text: &str) -> Option<f64> {
        RULE_PATTERNS
            .distance
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

#[async_trait]
impl DecisionEngine for RuleEngine {
    async fn decide(&self, text: &str, _prompt: &Value) -> Result<Value, DialogError> {
        let rules = &*RULE_PATTERNS;

        if rules.emergency.is_match(text) {
            return Ok(json!({
                "text": "Stopping everything now.",
                "action": "emergency_stop",
                "action_type": "system",
                "status": "success",
            }));
        }
        if rules.stop.is_match(text) {
            return Ok(json!({
                "text": "Stopping.",
                "action": "stop",
                "action_type": "movement",
                "status": "success",
            }));
        }
        if rules.come.is_match(text) {
            let mut decision = json!({
                "text": "On my way.",
                "action": "forward",
                "action_type": "movement",
                "status": "success",
            });
            if let Some(distance) = Self::extract_distance(text) {
                decision["distance"] = json!(distance);
            }
            return Ok(decision);
        }
        if rules.back.is_match(text) {
            return Ok(json!({
                "text": "Backing up.",
                "action": "backward",
                "action_type": "movement",
                "status": "success",
            }));
        }
        if rules.turn_left.is_match(text) {
            return Ok(json!({
                "text": "Turning left.",
                "action": "turn_left",
                "action_type": "movement",
                "status": "success",
            }));
        }
        if rules.turn_right.is_match(text) {
            return Ok(json!({
                "text": "Turning right.",
                "action": "turn_right",
                "action_type": "movement",
                "status": "success",
            }));
        }
        if rules.sit.is_match(text) {
            return Ok(json!({
                "text": "Sitting down.",
                "action": "sit_down",
                "action_type": "system",
                "status": "success",
            }));
        }
        if rules.stand.is_match(text) {
            return Ok(json!({
                "text": "Standing up.",
                "action": "stand_up",
                "action_type": "system",
                "status": "success",
            }));
        }
        if rules.greeting.is_match(text) {
            return Ok(json!({
                "text": "Hello there!",
                "action": "wave",
                "action_type": "gesture",
                "status": "success",
            }));
        }
        if rules.farewell.is_match(text) {
            return Ok(json!({
                "text": "Goodbye!",
                "action": "wave",
                "action_type": "gesture",
                "status": "success",
            }));
        }
        if rules.thanks.is_match(text) {
            return Ok(json!({
                "text": "You're welcome.",
                "action": "bow",
                "action_type": "gesture",
                "status": "success",
            }));
        }
        if rules.agree.is_match(text) {
            return Ok(json!({
                "text": "Got it.",
                "action": "nod",
                "action_type": "gesture",
                "status": "success",
            }));
        }
        if rules.disagree.is_match(text) {
            return Ok(json!({
                "text": "Understood.",
                "action": "shake_head",
                "action_type": "gesture",
                "status": "success",
            }));
        }

        Ok(json!({
            "text": format!("I heard: {}", text),
            "status": "success",
        }))
    }
}

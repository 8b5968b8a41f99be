use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{RejectReason, Timestamp};

/// All domain events that can occur in the Golem controller.
///
/// Events are emitted by the intake filter, the dispatcher and the action
/// executor after state changes and consumed by:
/// - The broadcast channel (for observers such as the console UI)
/// - Tests that pin observable behavior
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ControllerEvent {
    // =========================================================================
    // Intake Events
    // =========================================================================
    /// A recognized utterance passed every intake gate.
    SpeechAccepted {
        text_length: usize,
        confidence: f64,
        timestamp: Timestamp,
    },

    /// A recognized utterance was dropped at intake.
    SpeechRejected {
        reason: RejectReason,
        confidence: f64,
        timestamp: Timestamp,
    },

    // =========================================================================
    // Decision Events
    // =========================================================================
    /// The decision engine produced a reply for an accepted utterance.
    DecisionReady {
        reply_length: usize,
        has_action: bool,
        timestamp: Timestamp,
    },

    /// The decision engine failed; the fallback reply was used instead.
    DecisionFailed {
        reason: String,
        timestamp: Timestamp,
    },

    // =========================================================================
    // Action Events
    // =========================================================================
    /// An action was handed to the executor and got its identifier.
    ActionSubmitted {
        action_id: Uuid,
        class: String,
        name: String,
        timestamp: Timestamp,
    },

    /// A running action finished and was recorded in history.
    ActionCompleted {
        action_id: Uuid,
        class: String,
        name: String,
        success: bool,
        timestamp: Timestamp,
    },

    /// Cancellation was requested for a single running action.
    ActionCancelRequested {
        action_id: Uuid,
        timestamp: Timestamp,
    },

    /// Every running action was signalled to stop.
    AllActionsCancelled {
        count: usize,
        timestamp: Timestamp,
    },

    /// The hardware stop fired and the cancellation sweep ran.
    EmergencyStopTriggered { timestamp: Timestamp },

    // =========================================================================
    // Speech Events
    // =========================================================================
    /// A reply was handed to the speech synthesizer.
    UtteranceSpoken {
        text_length: usize,
        speaker_id: u32,
        timestamp: Timestamp,
    },

    // =========================================================================
    // Lifecycle Events
    // =========================================================================
    /// The controller finished initialization and is receiving speech.
    ControllerStarted {
        network_interface: String,
        timestamp: Timestamp,
    },

    /// The controller shut down cleanly.
    ControllerStopped { timestamp: Timestamp },
}

impl ControllerEvent {
    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            ControllerEvent::SpeechAccepted { timestamp, .. }
            | ControllerEvent::SpeechRejected { timestamp, .. }
            | ControllerEvent::DecisionReady { timestamp, .. }
            | ControllerEvent::DecisionFailed { timestamp, .. }
            | ControllerEvent::ActionSubmitted { timestamp, .. }
            | ControllerEvent::ActionCompleted { timestamp, .. }
            | ControllerEvent::ActionCancelRequested { timestamp, .. }
            | ControllerEvent::AllActionsCancelled { timestamp, .. }
            | ControllerEvent::EmergencyStopTriggered { timestamp }
            | ControllerEvent::UtteranceSpoken { timestamp, .. }
            | ControllerEvent::ControllerStarted { timestamp, .. }
            | ControllerEvent::ControllerStopped { timestamp } => *timestamp,
        }
    }

    /// Returns a human-readable event name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            ControllerEvent::SpeechAccepted { .. } => "speech_accepted",
            ControllerEvent::SpeechRejected { .. } => "speech_rejected",
            ControllerEvent::DecisionReady { .. } => "decision_ready",
            ControllerEvent::DecisionFailed { .. } => "decision_failed",
            ControllerEvent::ActionSubmitted { .. } => "action_submitted",
            ControllerEvent::ActionCompleted { .. } => "action_completed",
            ControllerEvent::ActionCancelRequested { .. } => "action_cancel_requested",
            ControllerEvent::AllActionsCancelled { .. } => "all_actions_cancelled",
            ControllerEvent::EmergencyStopTriggered { .. } => "emergency_stop_triggered",
            ControllerEvent::UtteranceSpoken { .. } => "utterance_spoken",
            ControllerEvent::ControllerStarted { .. } => "controller_started",
            ControllerEvent::ControllerStopped { .. } => "controller_stopped",
        }
    }
}

/// Bounded in-memory event ring.
///
/// Observers that want a tail of recent events rather than a live stream
/// (status pages, shutdown summaries) record broadcast events here. Oldest
/// entries are dropped once the cap is reached.
pub struct EventLog {
    inner: Mutex<VecDeque<ControllerEvent>>,
    cap: usize,
}

impl EventLog {
    pub fn new(cap: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(cap)),
            cap,
        }
    }

    /// Append an event, evicting the oldest entry when full.
    pub fn record(&self, event: ControllerEvent) {
        if let Ok(mut inner) = self.inner.lock() {
            if inner.len() == self.cap {
                inner.pop_front();
            }
            inner.push_back(event);
        }
    }

    /// The most recent `n` events, oldest first.
    pub fn recent(&self, n: usize) -> Vec<ControllerEvent> {
        match self.inner.lock() {
            Ok(inner) => inner.iter().rev().take(n).rev().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

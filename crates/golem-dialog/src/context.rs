//! Conversation context for the decision engine.
//!
//! Keeps a rolling window of recent messages plus two free-form slots the
//! vision and motion sides can fill in: the current scene description and
//! the robot's physical state. The decision engine receives all three as
//! one prompt object; none of it is ever spoken back to the user.

use serde_json::{json, Value};

use crate::types::Turn;

/// Rolling conversation state handed to the decision engine.
pub struct ConversationContext {
    /// Maximum number of recent messages to keep.
    max_messages: usize,
    history: Vec<Turn>,
    scene: Value,
    robot_state: Value,
}

impl ConversationContext {
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages,
            history: Vec::new(),
            scene: json!({}),
            robot_state: json!({}),
        }
    }

    /// Record what the user said.
    pub fn add_user(&mut self, text: &str) {
        self.history.push(Turn {
            role: "user".to_string(),
            content: text.to_string(),
        });
        self.trim();
    }

    /// Record what the robot replied.
    pub fn add_robot(&mut self, text: &str) {
        self.history.push(Turn {
            role: "assistant".to_string(),
            content: text.to_string(),
        });
        self.trim();
    }

    /// Replace the scene description from the vision side.
    pub fn set_scene(&mut self, scene: Value) {
        self.scene = scene;
    }

    /// Replace the robot-state snapshot from the motion side.
    pub fn set_robot_state(&mut self, state: Value) {
        self.robot_state = state;
    }

    fn trim(&mut self) {
        while self.history.len() > self.max_messages {
            self.history.remove(0);
        }
    }

    /// Build the prompt object for the decision engine.
    pub fn build_prompt(&self) -> Value {
        json!({
            "history": self.history,
            "scene": self.scene,
            "robot_state": self.robot_state,
        })
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

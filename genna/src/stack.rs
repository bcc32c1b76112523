//! The per-conversation dialog stack.
//!
//! Each conversation owns one [`DialogStack`]: the activation records of
//! the dialogs it has entered. At most one frame is active (top of the
//! stack); suspended parent frames sit beneath it in entry order.

use crate::prompt::PromptSpec;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A prompt issued on a previous turn, waiting for the user's reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingPrompt {
    /// The prompt text, re-sent verbatim on a re-prompt.
    pub text: String,
    /// The validator applied to the reply.
    pub spec: PromptSpec,
}

/// One activation record of a dialog on the conversation's stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Id of the dialog this frame belongs to.
    pub dialog_id: String,
    /// Index of the next step to run.
    pub step_index: usize,
    /// Values accumulated by this dialog's steps. Discarded when the
    /// frame is popped or replaced.
    #[serde(default)]
    pub values: serde_json::Map<String, Value>,
    /// The prompt awaiting a reply, if the last step issued one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingPrompt>,
}

impl Frame {
    /// Create a fresh frame for the given dialog, positioned at step 0.
    #[must_use]
    pub fn new(dialog_id: impl Into<String>) -> Self {
        Self {
            dialog_id: dialog_id.into(),
            step_index: 0,
            values: serde_json::Map::new(),
            pending: None,
        }
    }

    /// Store a value under the given field name.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Read a stored value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Read a stored string value.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }
}

/// The ordered stack of frames for one conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialogStack {
    frames: Vec<Frame>,
}

impl DialogStack {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no dialog is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of frames on the stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The active frame, if any.
    #[must_use]
    pub fn active(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Mutable access to the active frame.
    #[must_use]
    pub fn active_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// Enter a dialog: push a fresh frame, suspending the current one.
    pub fn push(&mut self, dialog_id: impl Into<String>) {
        self.frames.push(Frame::new(dialog_id));
    }

    /// Replace the active dialog in place.
    ///
    /// This is not call/return: the outgoing frame and all of its values
    /// are discarded, mirroring "start over" semantics.
    pub fn replace(&mut self, dialog_id: impl Into<String>) {
        self.frames.pop();
        self.frames.push(Frame::new(dialog_id));
    }

    /// End the active dialog, resuming the parent beneath it if present.
    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Remove every frame.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// The frames from bottom (oldest) to top (active).
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_preserves_parent_order() {
        let mut stack = DialogStack::new();
        stack.push("top_menu");
        stack.push("profile_menu");
        stack.push("phone");

        let ids: Vec<_> = stack.frames().iter().map(|f| f.dialog_id.as_str()).collect();
        assert_eq!(ids, ["top_menu", "profile_menu", "phone"]);
        assert_eq!(stack.active().unwrap().dialog_id, "phone");

        stack.pop();
        assert_eq!(stack.active().unwrap().dialog_id, "profile_menu");
        assert_eq!(stack.frames()[0].dialog_id, "top_menu");
    }

    #[test]
    fn test_replace_discards_values() {
        let mut stack = DialogStack::new();
        stack.push("email");
        stack.active_mut().unwrap().set("email", "a.b@c.com");
        assert_eq!(stack.active().unwrap().get_str("email"), Some("a.b@c.com"));

        stack.replace("top_menu");
        assert_eq!(stack.depth(), 1);
        let active = stack.active().unwrap();
        assert_eq!(active.dialog_id, "top_menu");
        assert_eq!(active.step_index, 0);
        assert!(active.values.is_empty());
    }

    #[test]
    fn test_single_active_frame() {
        let mut stack = DialogStack::new();
        assert!(stack.active().is_none());

        stack.push("top_menu");
        stack.push("faq");
        // Only the top frame is reachable through active().
        assert_eq!(stack.active().unwrap().dialog_id, "faq");
    }

    #[test]
    fn test_frame_values_roundtrip() {
        let mut frame = Frame::new("phone");
        frame.set("phone_type", "Mobile");
        frame.set("attempts", 2);

        assert_eq!(frame.get_str("phone_type"), Some("Mobile"));
        assert_eq!(frame.get("attempts").and_then(Value::as_u64), Some(2));
        assert!(frame.get("missing").is_none());
    }
}

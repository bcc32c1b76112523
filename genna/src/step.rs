//! Step execution contract: the context a step runs in and the directive
//! it returns.

use crate::prompt::{PromptSpec, PromptValue};
use crate::stack::Frame;
use crate::state::UserProfile;

/// The control decision a step returns.
///
/// Exactly one directive is produced per executed step; the turn runner
/// applies it to the conversation's stack.
#[derive(Debug, Clone)]
pub enum Directive {
    /// Ask the user for input and suspend until the reply arrives.
    Prompt {
        /// The prompt text sent to the user.
        text: String,
        /// The input spec validated against the reply.
        spec: PromptSpec,
    },
    /// Enter a child dialog, suspending this one beneath it.
    BeginDialog(String),
    /// Discard this dialog's frame and start the named dialog fresh.
    ReplaceDialog(String),
    /// Pop this dialog's frame; the parent (if any) resumes.
    EndDialog,
    /// Fall through to the following step without awaiting input.
    Next,
}

impl Directive {
    /// Convenience constructor for a prompt directive.
    #[must_use]
    pub fn prompt(text: impl Into<String>, spec: PromptSpec) -> Self {
        Self::Prompt {
            text: text.into(),
            spec,
        }
    }

    /// Convenience constructor for a replace directive.
    #[must_use]
    pub fn replace(dialog_id: impl Into<String>) -> Self {
        Self::ReplaceDialog(dialog_id.into())
    }

    /// Convenience constructor for a begin directive.
    #[must_use]
    pub fn begin(dialog_id: impl Into<String>) -> Self {
        Self::BeginDialog(dialog_id.into())
    }
}

/// Everything a step may read or write while it runs.
///
/// A step sees only the active frame's values and the current user's
/// profile; outbound text goes through [`StepContext::say`] so the
/// runner controls ordering and persistence.
#[derive(Debug)]
pub struct StepContext<'a> {
    /// Id of the conversation this turn belongs to.
    pub conversation_id: &'a str,
    /// The active frame.
    pub frame: &'a mut Frame,
    /// The current user's profile.
    pub profile: &'a mut UserProfile,
    /// The validated result of the prompt issued by the previous step,
    /// if this step was reached by consuming user input.
    pub input: Option<PromptValue>,
    outbound: &'a mut Vec<String>,
}

impl<'a> StepContext<'a> {
    /// Create a context for one step execution.
    #[must_use]
    pub fn new(
        conversation_id: &'a str,
        frame: &'a mut Frame,
        profile: &'a mut UserProfile,
        input: Option<PromptValue>,
        outbound: &'a mut Vec<String>,
    ) -> Self {
        Self {
            conversation_id,
            frame,
            profile,
            input,
            outbound,
        }
    }

    /// Queue an outbound message for the user.
    pub fn say(&mut self, text: impl Into<String>) {
        self.outbound.push(text.into());
    }

    /// The prior prompt result as text, when present.
    #[must_use]
    pub fn input_text(&self) -> Option<&str> {
        self.input.as_ref().and_then(PromptValue::as_text)
    }

    /// The prior prompt result as a confirmation, when present.
    #[must_use]
    pub fn input_confirmed(&self) -> Option<bool> {
        self.input.as_ref().and_then(PromptValue::as_confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::Frame;

    #[test]
    fn test_say_buffers_in_order() {
        let mut frame = Frame::new("test");
        let mut profile = UserProfile::new("u1");
        let mut outbound = Vec::new();
        let mut ctx = StepContext::new("cli:direct", &mut frame, &mut profile, None, &mut outbound);

        ctx.say("Thank You");
        ctx.say("I will submit the changes now.");
        assert_eq!(outbound, ["Thank You", "I will submit the changes now."]);
    }

    #[test]
    fn test_input_accessors() {
        let mut frame = Frame::new("test");
        let mut profile = UserProfile::new("u1");
        let mut outbound = Vec::new();

        let ctx = StepContext::new(
            "cli:direct",
            &mut frame,
            &mut profile,
            Some(PromptValue::Confirmed(true)),
            &mut outbound,
        );
        assert_eq!(ctx.input_confirmed(), Some(true));
        assert!(ctx.input_text().is_none());
    }
}

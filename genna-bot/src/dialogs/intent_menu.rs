//! The free-text intent router.
//!
//! Instead of a fixed menu, asks the user to describe what they need and
//! routes on the recognizer's top intent. Falls back to the top menu
//! when nothing is recognized, and restarts with an apology when the
//! recognizer itself fails.

use super::{CLAIM_STATUS, DialogDeps, FAQ, INTENT_MENU, PROFILE_MENU, TOP_MENU};
use async_trait::async_trait;
use genna::dialog::Dialog;
use genna::error::{EngineError, EngineResult};
use genna::prompt::PromptSpec;
use genna::step::{Directive, StepContext};
use std::sync::Arc;
use tracing::{info, warn};

const OPEN_PROMPT: &str = "What can I help you with today? Describe it in your own words.";
const RECOGNIZER_FAILED_TEXT: &str =
    "I'm sorry, something went wrong while I was thinking about that. Let's try again.";
const NOT_UNDERSTOOD_TEXT: &str =
    "I'm sorry, I did not understand that. Let me show you what I can do.";

/// Intents the recognizer may route on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KnownIntent {
    ClaimStatus,
    UpdateProfile,
    AskQuestion,
}

impl KnownIntent {
    fn parse(intent: &str) -> Option<Self> {
        match intent {
            "ClaimStatus" => Some(Self::ClaimStatus),
            "UpdateProfile" => Some(Self::UpdateProfile),
            "AskQuestion" => Some(Self::AskQuestion),
            _ => None,
        }
    }

    const fn target(self) -> &'static str {
        match self {
            Self::ClaimStatus => CLAIM_STATUS,
            Self::UpdateProfile => PROFILE_MENU,
            Self::AskQuestion => FAQ,
        }
    }
}

/// Routes free-form utterances to the matching flow.
#[derive(Debug)]
pub struct IntentMenuDialog {
    deps: Arc<DialogDeps>,
}

impl IntentMenuDialog {
    /// Create the dialog over the given collaborators.
    #[must_use]
    pub fn new(deps: Arc<DialogDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Dialog for IntentMenuDialog {
    fn id(&self) -> &str {
        INTENT_MENU
    }

    fn step_count(&self) -> usize {
        2
    }

    async fn run_step(&self, index: usize, ctx: &mut StepContext<'_>) -> EngineResult<Directive> {
        match index {
            0 => Ok(Directive::prompt(OPEN_PROMPT, PromptSpec::text())),
            1 => {
                let Some(recognizer) = &self.deps.recognizer else {
                    // No recognizer configured: hand over to the menu.
                    return Ok(Directive::replace(TOP_MENU));
                };

                let utterance = ctx.input_text().unwrap_or_default();
                match recognizer.recognize(utterance).await {
                    Ok(recognition) => {
                        info!(
                            intent = %recognition.top_intent,
                            score = recognition.score,
                            "routing on recognized intent"
                        );
                        match KnownIntent::parse(&recognition.top_intent) {
                            Some(intent) => Ok(Directive::replace(intent.target())),
                            None => {
                                ctx.say(NOT_UNDERSTOOD_TEXT);
                                Ok(Directive::replace(TOP_MENU))
                            }
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "intent recognition failed");
                        ctx.say(RECOGNIZER_FAILED_TEXT);
                        Ok(Directive::replace(INTENT_MENU))
                    }
                }
            }
            _ => Err(EngineError::StepOutOfRange {
                dialog: INTENT_MENU.to_string(),
                index,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_parse() {
        assert_eq!(KnownIntent::parse("ClaimStatus"), Some(KnownIntent::ClaimStatus));
        assert_eq!(KnownIntent::parse("Weather"), None);
    }

    #[test]
    fn test_intent_targets() {
        assert_eq!(KnownIntent::UpdateProfile.target(), PROFILE_MENU);
        assert_eq!(KnownIntent::AskQuestion.target(), FAQ);
    }
}

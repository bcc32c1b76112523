//! The claim status flow.
//!
//! Looks up the user's claim, offers to relay new information to the
//! backend, then closes through the short menu. The flow threads its
//! position through a frame `mode` value because both branches of the
//! status lookup converge on the same step indexes.

use super::{CLAIM_STATUS, DialogDeps, SUBMIT_FAILED_TEXT, route_closing};
use crate::backend::ClaimStatusUpdate;
use async_trait::async_trait;
use genna::dialog::Dialog;
use genna::error::{EngineError, EngineResult};
use genna::prompt::PromptSpec;
use genna::step::{Directive, StepContext};
use std::sync::Arc;
use tracing::info;

const NO_CLAIM_TEXT: &str =
    "I'm sorry, but I could not find any claim information for you at this time.";
const STATUS_INTRO: &str = "Here is the latest information I have on your claim:";
const NEW_INFO_PROMPT: &str = "Do you have any new information to add to your claim?";
const RELAY_PROMPT: &str = "Please enter the information you would like to add to your claim.";
const CLOSING_PROMPT: &str = "What would you like to do next?";

const MODE_CLOSE: &str = "close";
const MODE_CONFIRM: &str = "confirm";
const MODE_RELAY: &str = "relay";

/// Reports claim status and relays claimant updates to the backend.
#[derive(Debug)]
pub struct ClaimStatusDialog {
    deps: Arc<DialogDeps>,
}

impl ClaimStatusDialog {
    /// Create the dialog over the given collaborators.
    #[must_use]
    pub fn new(deps: Arc<DialogDeps>) -> Self {
        Self { deps }
    }

    fn closing_prompt() -> Directive {
        Directive::prompt(CLOSING_PROMPT, PromptSpec::choice(["Main Menu", "Say Goodbye"]))
    }
}

#[async_trait]
impl Dialog for ClaimStatusDialog {
    fn id(&self) -> &str {
        CLAIM_STATUS
    }

    fn step_count(&self) -> usize {
        4
    }

    async fn run_step(&self, index: usize, ctx: &mut StepContext<'_>) -> EngineResult<Directive> {
        match index {
            0 => {
                let status = self
                    .deps
                    .claims
                    .claim_status(&ctx.profile.user_id)
                    .await
                    .map_err(EngineError::collaborator)?;

                match status {
                    Some(status) => {
                        ctx.say(STATUS_INTRO);
                        ctx.say(status);
                        ctx.frame.set("mode", MODE_CONFIRM);
                        Ok(Directive::prompt(NEW_INFO_PROMPT, PromptSpec::Confirm))
                    }
                    None => {
                        ctx.say(NO_CLAIM_TEXT);
                        ctx.frame.set("mode", MODE_CLOSE);
                        Ok(Self::closing_prompt())
                    }
                }
            }
            1 | 2 | 3 => {
                let mode = ctx.frame.get_str("mode").unwrap_or(MODE_CLOSE).to_string();
                match mode.as_str() {
                    MODE_CONFIRM => {
                        if ctx.input_confirmed() == Some(true) {
                            ctx.frame.set("mode", MODE_RELAY);
                            Ok(Directive::prompt(RELAY_PROMPT, PromptSpec::text()))
                        } else {
                            ctx.frame.set("mode", MODE_CLOSE);
                            Ok(Self::closing_prompt())
                        }
                    }
                    MODE_RELAY => {
                        let update = ClaimStatusUpdate {
                            user_id: ctx.profile.user_id.clone(),
                            data: ctx.input_text().unwrap_or_default().to_string(),
                        };

                        let outcome = self
                            .deps
                            .claims
                            .post_claim_update(&update)
                            .await
                            .map_err(EngineError::collaborator)?;

                        if outcome.is_accepted() {
                            info!(user = %update.user_id, "claim update accepted");
                            ctx.say("Thank you. I have added your information to the claim.");
                            ctx.frame.set("mode", MODE_CLOSE);
                            Ok(Self::closing_prompt())
                        } else {
                            ctx.say(SUBMIT_FAILED_TEXT);
                            Ok(Directive::replace(CLAIM_STATUS))
                        }
                    }
                    _ => Ok(route_closing(ctx)),
                }
            }
            _ => Err(EngineError::StepOutOfRange {
                dialog: CLAIM_STATUS.to_string(),
                index,
            }),
        }
    }
}

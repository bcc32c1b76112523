//! The phone number update flow.
//!
//! Type choice, action choice, validated number entry, confirmation,
//! then the backend submission. An invalid number restarts the dialog
//! with the corrective message first; a rejected submission also
//! restarts it.

use super::{DialogDeps, PHONE, SUBMIT_FAILED_TEXT, route_closing};
use crate::backend::PhoneUpdate;
use async_trait::async_trait;
use genna::dialog::{Dialog, OnInvalid};
use genna::error::{EngineError, EngineResult};
use genna::prompt::{PromptSpec, TextValidator};
use genna::step::{Directive, StepContext};
use genna::util::digits_only;
use std::sync::Arc;
use tracing::info;

const TYPE_PROMPT: &str = "Which phone number would you like to change?";

/// Updates a phone number on the user's profile.
#[derive(Debug)]
pub struct PhoneDialog {
    deps: Arc<DialogDeps>,
}

impl PhoneDialog {
    /// Create the dialog over the given collaborators.
    #[must_use]
    pub fn new(deps: Arc<DialogDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Dialog for PhoneDialog {
    fn id(&self) -> &str {
        PHONE
    }

    fn step_count(&self) -> usize {
        6
    }

    fn on_invalid(&self) -> OnInvalid {
        OnInvalid::Restart
    }

    async fn run_step(&self, index: usize, ctx: &mut StepContext<'_>) -> EngineResult<Directive> {
        match index {
            0 => Ok(Directive::prompt(
                TYPE_PROMPT,
                PromptSpec::choice(["Home", "Mobile"]),
            )),
            1 => {
                let phone_type = ctx.input_text().unwrap_or("Home").to_string();
                ctx.frame.set("phone_type", phone_type.clone());
                Ok(Directive::prompt(
                    format!(
                        "Would you like to add, update, or delete the {phone_type} number?"
                    ),
                    PromptSpec::choice(["Add", "Update", "Delete"]),
                ))
            }
            2 => {
                let action = ctx.input_text().unwrap_or("Update").to_string();
                let phone_type = ctx.frame.get_str("phone_type").unwrap_or("Home").to_string();
                ctx.frame.set("action", action.clone());
                Ok(Directive::prompt(
                    format!(
                        "Please enter the {} number you would like to {}, in the format \
                         XXX-XXX-XXXX.",
                        phone_type,
                        action.to_lowercase()
                    ),
                    PromptSpec::validated(TextValidator::phone()),
                ))
            }
            3 => {
                let number = ctx.input_text().unwrap_or_default().to_string();
                let phone_type = ctx.frame.get_str("phone_type").unwrap_or("Home").to_string();
                let action = ctx.frame.get_str("action").unwrap_or("Update").to_string();
                ctx.frame.set("number", number.clone());
                Ok(Directive::prompt(
                    format!(
                        "You would like to {} the {phone_type} number {number}. Is that correct?",
                        action.to_lowercase()
                    ),
                    PromptSpec::Confirm,
                ))
            }
            4 => {
                if ctx.input_confirmed() != Some(true) {
                    // Start over rather than guessing which field was wrong.
                    return Ok(Directive::replace(PHONE));
                }

                let update = PhoneUpdate {
                    user_id: ctx.profile.user_id.clone(),
                    phone_type: ctx.frame.get_str("phone_type").unwrap_or("Home").to_string(),
                    number: digits_only(ctx.frame.get_str("number").unwrap_or_default()),
                };

                let outcome = self
                    .deps
                    .claims
                    .post_phone(&update)
                    .await
                    .map_err(EngineError::collaborator)?;

                if outcome.is_accepted() {
                    info!(user = %update.user_id, "phone update accepted");
                    ctx.say("Thank You. I have submitted your changes.");
                    Ok(Directive::prompt(
                        "What would you like to do next?",
                        PromptSpec::choice(["Main Menu", "User Profile", "Say Goodbye"]),
                    ))
                } else {
                    ctx.say(SUBMIT_FAILED_TEXT);
                    Ok(Directive::replace(PHONE))
                }
            }
            5 => Ok(route_closing(ctx)),
            _ => Err(EngineError::StepOutOfRange {
                dialog: PHONE.to_string(),
                index,
            }),
        }
    }
}

//! The email address update flow.

use super::{DialogDeps, EMAIL, SUBMIT_FAILED_TEXT, route_closing};
use crate::backend::EmailUpdate;
use async_trait::async_trait;
use genna::dialog::{Dialog, OnInvalid};
use genna::error::{EngineError, EngineResult};
use genna::prompt::{PromptSpec, TextValidator};
use genna::step::{Directive, StepContext};
use std::sync::Arc;
use tracing::info;

const EMAIL_PROMPT: &str =
    "Please enter the new email address, in the format xxx.xxx@xxx.xxx.";

/// Updates the email address on the user's profile.
#[derive(Debug)]
pub struct EmailDialog {
    deps: Arc<DialogDeps>,
}

impl EmailDialog {
    /// Create the dialog over the given collaborators.
    #[must_use]
    pub fn new(deps: Arc<DialogDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Dialog for EmailDialog {
    fn id(&self) -> &str {
        EMAIL
    }

    fn step_count(&self) -> usize {
        4
    }

    fn on_invalid(&self) -> OnInvalid {
        OnInvalid::Restart
    }

    async fn run_step(&self, index: usize, ctx: &mut StepContext<'_>) -> EngineResult<Directive> {
        match index {
            0 => Ok(Directive::prompt(
                EMAIL_PROMPT,
                PromptSpec::validated(TextValidator::email()),
            )),
            1 => {
                let email = ctx.input_text().unwrap_or_default().to_string();
                ctx.frame.set("email", email.clone());
                Ok(Directive::prompt(
                    format!("You would like your new email address to be {email}. Is that correct?"),
                    PromptSpec::Confirm,
                ))
            }
            2 => {
                if ctx.input_confirmed() != Some(true) {
                    return Ok(Directive::replace(EMAIL));
                }

                let update = EmailUpdate {
                    user_id: ctx.profile.user_id.clone(),
                    email: ctx.frame.get_str("email").unwrap_or_default().to_string(),
                };

                let outcome = self
                    .deps
                    .claims
                    .post_email(&update)
                    .await
                    .map_err(EngineError::collaborator)?;

                if outcome.is_accepted() {
                    info!(user = %update.user_id, "email update accepted");
                    ctx.say("Thank You. I have submitted your changes.");
                    Ok(Directive::prompt(
                        "What would you like to do next?",
                        PromptSpec::choice(["Main Menu", "User Profile", "Say Goodbye"]),
                    ))
                } else {
                    ctx.say(SUBMIT_FAILED_TEXT);
                    Ok(Directive::replace(EMAIL))
                }
            }
            3 => Ok(route_closing(ctx)),
            _ => Err(EngineError::StepOutOfRange {
                dialog: EMAIL.to_string(),
                index,
            }),
        }
    }
}

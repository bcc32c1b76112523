//! The mailing address update flow.
//!
//! Street on its own line, then city/state/zip in one comma-separated
//! reply, confirmation, and the backend submission.

use super::{ADDRESS, DialogDeps, SUBMIT_FAILED_TEXT, route_closing};
use crate::backend::AddressUpdate;
use async_trait::async_trait;
use genna::dialog::{Dialog, OnInvalid};
use genna::error::{EngineError, EngineResult};
use genna::prompt::{PromptSpec, TextValidator};
use genna::step::{Directive, StepContext};
use genna::util::split_city_state_zip;
use std::sync::Arc;
use tracing::info;

const STREET_PROMPT: &str = "Please enter the street address.";
const CSZ_PROMPT: &str =
    "Please enter the city, state and zip code, separated by commas (for example: \
     Springfield, IL, 62704).";
const CSZ_RETRY: &str = "I'm sorry, but I did not receive the city, state and zip code \
     separated by commas.";

/// Updates the mailing address on the user's profile.
#[derive(Debug)]
pub struct AddressDialog {
    deps: Arc<DialogDeps>,
}

impl AddressDialog {
    /// Create the dialog over the given collaborators.
    #[must_use]
    pub fn new(deps: Arc<DialogDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Dialog for AddressDialog {
    fn id(&self) -> &str {
        ADDRESS
    }

    fn step_count(&self) -> usize {
        5
    }

    fn on_invalid(&self) -> OnInvalid {
        OnInvalid::Restart
    }

    async fn run_step(&self, index: usize, ctx: &mut StepContext<'_>) -> EngineResult<Directive> {
        match index {
            0 => {
                ctx.say("Let's update your mailing address.");
                Ok(Directive::prompt(STREET_PROMPT, PromptSpec::text()))
            }
            1 => {
                let street = ctx.input_text().unwrap_or_default().to_string();
                ctx.frame.set("street", street);
                let validator = TextValidator::new(r"^[^,]+,[^,]+,[^,]+$", CSZ_RETRY)?;
                Ok(Directive::prompt(CSZ_PROMPT, PromptSpec::validated(validator)))
            }
            2 => {
                let raw = ctx.input_text().unwrap_or_default();
                // The validator guarantees the comma shape; blank segments
                // still fall out here and restart the dialog.
                let Some(csz) = split_city_state_zip(raw) else {
                    ctx.say(CSZ_RETRY);
                    return Ok(Directive::replace(ADDRESS));
                };
                let street = ctx.frame.get_str("street").unwrap_or_default().to_string();
                ctx.frame.set("city", csz.city.clone());
                ctx.frame.set("state", csz.state.clone());
                ctx.frame.set("zip", csz.zip.clone());
                Ok(Directive::prompt(
                    format!(
                        "You would like your new address to be {street}, {}, {} {}. Is that \
                         correct?",
                        csz.city, csz.state, csz.zip
                    ),
                    PromptSpec::Confirm,
                ))
            }
            3 => {
                if ctx.input_confirmed() != Some(true) {
                    return Ok(Directive::replace(ADDRESS));
                }

                let update = AddressUpdate {
                    user_id: ctx.profile.user_id.clone(),
                    street: ctx.frame.get_str("street").unwrap_or_default().to_string(),
                    city: ctx.frame.get_str("city").unwrap_or_default().to_string(),
                    state: ctx.frame.get_str("state").unwrap_or_default().to_string(),
                    zip: ctx.frame.get_str("zip").unwrap_or_default().to_string(),
                };

                let outcome = self
                    .deps
                    .claims
                    .post_address(&update)
                    .await
                    .map_err(EngineError::collaborator)?;

                if outcome.is_accepted() {
                    info!(user = %update.user_id, "address update accepted");
                    ctx.say("Thank You. I have submitted your changes.");
                    Ok(Directive::prompt(
                        "What would you like to do next?",
                        PromptSpec::choice(["Main Menu", "User Profile", "Say Goodbye"]),
                    ))
                } else {
                    ctx.say(SUBMIT_FAILED_TEXT);
                    Ok(Directive::replace(ADDRESS))
                }
            }
            4 => Ok(route_closing(ctx)),
            _ => Err(EngineError::StepOutOfRange {
                dialog: ADDRESS.to_string(),
                index,
            }),
        }
    }
}

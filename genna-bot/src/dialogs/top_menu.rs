//! The top-level menu, the conversation's root dialog.
//!
//! The menu is role-gated: claimants can manage their profile and claim,
//! customers only get the question-answering flow.

use super::{CLAIM_STATUS, FAQ, PROFILE_MENU, TERMINATE_TEXT, TOP_MENU};
use async_trait::async_trait;
use genna::dialog::Dialog;
use genna::error::{EngineError, EngineResult};
use genna::prompt::PromptSpec;
use genna::state::UserRole;
use genna::step::{Directive, StepContext};

const GREETING: &str = "Hello! I am Genna, your virtual assistant.";
const MENU_PROMPT: &str = "How can I help you today?";

/// A top-menu selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TopChoice {
    UserProfile,
    AskGenna,
    ClaimStatus,
}

impl TopChoice {
    fn parse(label: &str) -> Option<Self> {
        match label {
            "User Profile" => Some(Self::UserProfile),
            "Ask Genna" => Some(Self::AskGenna),
            "Claim Status" => Some(Self::ClaimStatus),
            _ => None,
        }
    }
}

/// The root menu dialog.
#[derive(Debug, Clone, Copy)]
pub struct TopMenuDialog;

impl TopMenuDialog {
    fn labels_for(role: UserRole) -> Vec<&'static str> {
        match role {
            UserRole::Claimant => vec!["User Profile", "Ask Genna", "Claim Status"],
            UserRole::Customer => vec!["Ask Genna"],
        }
    }
}

#[async_trait]
impl Dialog for TopMenuDialog {
    fn id(&self) -> &str {
        TOP_MENU
    }

    fn step_count(&self) -> usize {
        2
    }

    async fn run_step(&self, index: usize, ctx: &mut StepContext<'_>) -> EngineResult<Directive> {
        match index {
            0 => {
                ctx.say(GREETING);
                let labels = Self::labels_for(ctx.profile.role);
                Ok(Directive::prompt(MENU_PROMPT, PromptSpec::choice(labels)))
            }
            1 => match ctx.input_text().and_then(TopChoice::parse) {
                Some(TopChoice::UserProfile) => Ok(Directive::replace(PROFILE_MENU)),
                Some(TopChoice::AskGenna) => Ok(Directive::replace(FAQ)),
                Some(TopChoice::ClaimStatus) => Ok(Directive::replace(CLAIM_STATUS)),
                None => {
                    ctx.say(TERMINATE_TEXT);
                    Ok(Directive::EndDialog)
                }
            },
            _ => Err(EngineError::StepOutOfRange {
                dialog: TOP_MENU.to_string(),
                index,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_gated_by_role() {
        assert_eq!(
            TopMenuDialog::labels_for(UserRole::Claimant),
            ["User Profile", "Ask Genna", "Claim Status"]
        );
        assert_eq!(TopMenuDialog::labels_for(UserRole::Customer), ["Ask Genna"]);
    }

    #[test]
    fn test_choice_parse_is_exact() {
        assert_eq!(TopChoice::parse("Claim Status"), Some(TopChoice::ClaimStatus));
        assert_eq!(TopChoice::parse("claim status"), None);
    }
}

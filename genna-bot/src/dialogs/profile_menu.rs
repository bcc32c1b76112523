//! The user-profile update menu.

use super::{ADDRESS, EMAIL, PHONE, PROFILE_MENU, TERMINATE_TEXT};
use async_trait::async_trait;
use genna::dialog::Dialog;
use genna::error::{EngineError, EngineResult};
use genna::prompt::PromptSpec;
use genna::step::{Directive, StepContext};

const MENU_PROMPT: &str = "Which part of your profile would you like to update?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProfileChoice {
    Address,
    Phone,
    Email,
}

impl ProfileChoice {
    fn parse(label: &str) -> Option<Self> {
        match label {
            "Address" => Some(Self::Address),
            "Phone" => Some(Self::Phone),
            "Email" => Some(Self::Email),
            _ => None,
        }
    }
}

/// Routes into the address, phone, or email flow.
#[derive(Debug, Clone, Copy)]
pub struct ProfileMenuDialog;

#[async_trait]
impl Dialog for ProfileMenuDialog {
    fn id(&self) -> &str {
        PROFILE_MENU
    }

    fn step_count(&self) -> usize {
        2
    }

    async fn run_step(&self, index: usize, ctx: &mut StepContext<'_>) -> EngineResult<Directive> {
        match index {
            0 => Ok(Directive::prompt(
                MENU_PROMPT,
                PromptSpec::choice(["Address", "Phone", "Email"]),
            )),
            1 => match ctx.input_text().and_then(ProfileChoice::parse) {
                Some(ProfileChoice::Address) => Ok(Directive::replace(ADDRESS)),
                Some(ProfileChoice::Phone) => Ok(Directive::replace(PHONE)),
                Some(ProfileChoice::Email) => Ok(Directive::replace(EMAIL)),
                None => {
                    ctx.say(TERMINATE_TEXT);
                    Ok(Directive::EndDialog)
                }
            },
            _ => Err(EngineError::StepOutOfRange {
                dialog: PROFILE_MENU.to_string(),
                index,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(ProfileChoice::parse("Phone"), Some(ProfileChoice::Phone));
        assert_eq!(ProfileChoice::parse("Fax"), None);
    }
}

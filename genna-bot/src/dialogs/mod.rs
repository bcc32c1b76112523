//! The bot's dialog set.
//!
//! Every dialog lives in one registry and names its siblings by id, so
//! flows route through [`Directive::ReplaceDialog`] without holding
//! references to each other. Menu branching goes through closed choice
//! enums with exhaustive matches; a stored label that matches no branch
//! falls into the terminating default arm.

use crate::backend::ClaimApi;
use genna::collab::{IntentRecognizer, KnowledgeBase, TranscriptStore};
use genna::dialog::DialogRegistry;
use genna::step::{Directive, StepContext};
use std::sync::Arc;

pub mod address;
pub mod claim_status;
pub mod email;
pub mod faq;
pub mod intent_menu;
pub mod phone;
pub mod profile_menu;
pub mod top_menu;

pub use address::AddressDialog;
pub use claim_status::ClaimStatusDialog;
pub use email::EmailDialog;
pub use faq::FaqDialog;
pub use intent_menu::IntentMenuDialog;
pub use phone::PhoneDialog;
pub use profile_menu::ProfileMenuDialog;
pub use top_menu::TopMenuDialog;

/// Dialog id of the top-level menu (the default root dialog).
pub const TOP_MENU: &str = "top_menu";
/// Dialog id of the profile update menu.
pub const PROFILE_MENU: &str = "profile_menu";
/// Dialog id of the phone number flow.
pub const PHONE: &str = "phone";
/// Dialog id of the email address flow.
pub const EMAIL: &str = "email";
/// Dialog id of the mailing address flow.
pub const ADDRESS: &str = "address";
/// Dialog id of the claim status flow.
pub const CLAIM_STATUS: &str = "claim_status";
/// Dialog id of the question-answering flow.
pub const FAQ: &str = "faq";
/// Dialog id of the free-text intent router.
pub const INTENT_MENU: &str = "intent_menu";

/// Sent when a stored choice matches no branch; the dialog ends.
pub const TERMINATE_TEXT: &str = "Unfortunately, I did not receive a valid response, so I am \
     terminating this chat session. \n Please try again.";

/// Sent when the user chooses to leave.
pub const GOODBYE_TEXT: &str = "Thank you for chatting with me today. Goodbye!";

/// Sent when the backend did not accept a submitted change.
pub const SUBMIT_FAILED_TEXT: &str = "I'm sorry, but something went wrong while I was submitting \
     your changes. \n Let's try again.";

/// What the transcript store is allowed to record.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditFlags {
    /// Whether per-turn and lookup auditing is on at all.
    pub enabled: bool,
    /// Record the user's name with audited events.
    pub log_user_name: bool,
    /// Record the user's original message text.
    pub log_original_message: bool,
}

/// Everything the dialogs call out to.
pub struct DialogDeps {
    /// The claims backend.
    pub claims: Arc<dyn ClaimApi>,
    /// The knowledge base behind "Ask Genna".
    pub knowledge_base: Arc<dyn KnowledgeBase>,
    /// The intent recognizer, when configured.
    pub recognizer: Option<Arc<dyn IntentRecognizer>>,
    /// Transcript store for audit events.
    pub transcript: Arc<dyn TranscriptStore>,
    /// Audit gating.
    pub audit: AuditFlags,
}

impl std::fmt::Debug for DialogDeps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogDeps")
            .field("audit", &self.audit)
            .field("recognizer", &self.recognizer.is_some())
            .finish_non_exhaustive()
    }
}

/// Build the full dialog registry over the given collaborators.
#[must_use]
pub fn build_registry(deps: Arc<DialogDeps>) -> DialogRegistry {
    let mut registry = DialogRegistry::new();
    registry.register(TopMenuDialog);
    registry.register(ProfileMenuDialog);
    registry.register(PhoneDialog::new(Arc::clone(&deps)));
    registry.register(EmailDialog::new(Arc::clone(&deps)));
    registry.register(AddressDialog::new(Arc::clone(&deps)));
    registry.register(ClaimStatusDialog::new(Arc::clone(&deps)));
    registry.register(FaqDialog::new(Arc::clone(&deps)));
    registry.register(IntentMenuDialog::new(deps));
    registry
}

/// A closing-menu selection offered at the end of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosingChoice {
    /// Back to the top-level menu.
    MainMenu,
    /// Back to the profile menu.
    UserProfile,
    /// Back to the question-answering flow.
    AskGenna,
    /// End the conversation.
    SayGoodbye,
}

impl ClosingChoice {
    /// Parse a stored choice label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "Main Menu" => Some(Self::MainMenu),
            "User Profile" => Some(Self::UserProfile),
            "Ask Genna" => Some(Self::AskGenna),
            "Say Goodbye" => Some(Self::SayGoodbye),
            _ => None,
        }
    }

    /// The directive this selection resolves to.
    #[must_use]
    pub fn directive(self) -> Directive {
        match self {
            Self::MainMenu => Directive::replace(TOP_MENU),
            Self::UserProfile => Directive::replace(PROFILE_MENU),
            Self::AskGenna => Directive::replace(FAQ),
            Self::SayGoodbye => Directive::EndDialog,
        }
    }
}

/// Resolve a closing-menu reply: route it, or terminate on an
/// unroutable label.
pub fn route_closing(ctx: &mut StepContext<'_>) -> Directive {
    match ctx.input_text().and_then(ClosingChoice::parse) {
        Some(ClosingChoice::SayGoodbye) => {
            ctx.say(GOODBYE_TEXT);
            Directive::EndDialog
        }
        Some(choice) => choice.directive(),
        None => {
            ctx.say(TERMINATE_TEXT);
            Directive::EndDialog
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closing_choice_parse() {
        assert_eq!(ClosingChoice::parse("Main Menu"), Some(ClosingChoice::MainMenu));
        assert_eq!(ClosingChoice::parse("Say Goodbye"), Some(ClosingChoice::SayGoodbye));
        assert_eq!(ClosingChoice::parse("main menu"), None);
    }
}

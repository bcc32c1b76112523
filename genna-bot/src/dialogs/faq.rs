//! The "Ask Genna" question-answering flow.
//!
//! One free-text question, one answer from the knowledge base, then the
//! closing menu. Every lookup goes through the audited wrapper when
//! auditing is enabled.

use super::{DialogDeps, FAQ, route_closing};
use crate::qna::AuditedKnowledgeBase;
use async_trait::async_trait;
use genna::collab::KnowledgeBase;
use genna::dialog::Dialog;
use genna::error::{EngineError, EngineResult};
use genna::prompt::PromptSpec;
use genna::step::{Directive, StepContext};
use std::sync::Arc;
use tracing::debug;

const QUESTION_PROMPT: &str =
    "What would you like to know? Ask me a question and I will try to find the answer.";
const NO_ANSWER_TEXT: &str = "I'm sorry, I do not know the answer to that question.";
const CLOSING_PROMPT: &str = "Is there anything else I can help you with?";

/// Answers questions from the knowledge base.
#[derive(Debug)]
pub struct FaqDialog {
    deps: Arc<DialogDeps>,
}

impl FaqDialog {
    /// Create the dialog over the given collaborators.
    #[must_use]
    pub fn new(deps: Arc<DialogDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Dialog for FaqDialog {
    fn id(&self) -> &str {
        FAQ
    }

    fn step_count(&self) -> usize {
        3
    }

    async fn run_step(&self, index: usize, ctx: &mut StepContext<'_>) -> EngineResult<Directive> {
        match index {
            0 => Ok(Directive::prompt(QUESTION_PROMPT, PromptSpec::text())),
            1 => {
                let question = ctx.input_text().unwrap_or_default().to_string();

                let matches = if self.deps.audit.enabled {
                    let mut kb = AuditedKnowledgeBase::new(
                        Arc::clone(&self.deps.knowledge_base),
                        Arc::clone(&self.deps.transcript),
                        ctx.conversation_id,
                    )
                    .with_audit_flags(
                        self.deps.audit.log_user_name,
                        self.deps.audit.log_original_message,
                    );
                    if let Some(name) = &ctx.profile.display_name {
                        kb = kb.with_username(name.clone());
                    }
                    kb.query(&question).await
                } else {
                    self.deps.knowledge_base.query(&question).await
                }
                .map_err(EngineError::collaborator)?;

                match matches.first() {
                    Some(top) => {
                        debug!(score = top.score, "knowledge base answered");
                        ctx.say(top.answer.clone());
                    }
                    None => ctx.say(NO_ANSWER_TEXT),
                }

                Ok(Directive::prompt(
                    CLOSING_PROMPT,
                    PromptSpec::choice(["Main Menu", "Ask Genna", "Say Goodbye"]),
                ))
            }
            2 => Ok(route_closing(ctx)),
            _ => Err(EngineError::StepOutOfRange {
                dialog: FAQ.to_string(),
                index,
            }),
        }
    }
}

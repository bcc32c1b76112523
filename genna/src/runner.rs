//! The turn runner: drives one conversation turn through the dialog
//! stack.
//!
//! A turn is the unit of work: take one inbound message, resolve it
//! against the conversation's pending prompt (if any), run steps until a
//! dialog asks for input again or the stack empties, then persist. Turns
//! for the same conversation are serialized through a per-conversation
//! lock; turns for different conversations run concurrently.

use crate::dialog::{DialogRegistry, OnInvalid};
use crate::error::{EngineError, EngineResult, ValidationError};
use crate::prompt::PromptValue;
use crate::stack::PendingPrompt;
use crate::state::{ConversationData, StateStore, UserProfile, UserRole};
use crate::step::{Directive, StepContext};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Upper bound on stack transitions within a single turn. A dialog set
/// that routes in a cycle without ever prompting would otherwise spin
/// until the turn deadline.
const MAX_TRANSITIONS: usize = 64;

/// Retry text sent when a reply matches none of the offered choices.
const CHOICE_RETRY_TEXT: &str =
    "I'm sorry, I did not understand that. Please select one of the listed options.";

/// Configuration for a [`TurnRunner`].
#[derive(Debug, Clone)]
pub struct TurnRunnerConfig {
    /// Dialog started when a conversation has no active dialog.
    pub root_dialog: String,
    /// Deadline for one full turn, steps and persistence included.
    pub turn_timeout: Duration,
    /// Role assigned to users seen for the first time.
    pub default_role: UserRole,
    /// Locale assigned to users seen for the first time.
    pub default_locale: String,
}

impl TurnRunnerConfig {
    /// Configuration with the given root dialog and defaults for the
    /// rest (30 second turn deadline, claimant role, English locale).
    #[must_use]
    pub fn new(root_dialog: impl Into<String>) -> Self {
        Self {
            root_dialog: root_dialog.into(),
            turn_timeout: Duration::from_secs(30),
            default_role: UserRole::default(),
            default_locale: "en".to_string(),
        }
    }

    /// Set the turn deadline.
    #[must_use]
    pub const fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = timeout;
        self
    }

    /// Set the role given to new users.
    #[must_use]
    pub const fn with_default_role(mut self, role: UserRole) -> Self {
        self.default_role = role;
        self
    }

    /// Set the locale given to new users.
    #[must_use]
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }
}

/// Drives conversation turns against a registry of dialogs and a state
/// store.
pub struct TurnRunner {
    registry: Arc<DialogRegistry>,
    store: Arc<dyn StateStore>,
    config: TurnRunnerConfig,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for TurnRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnRunner")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TurnRunner {
    /// Create a runner.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownDialog`] if the configured root
    /// dialog is not registered.
    pub fn new(
        registry: Arc<DialogRegistry>,
        store: Arc<dyn StateStore>,
        config: TurnRunnerConfig,
    ) -> EngineResult<Self> {
        if !registry.contains(&config.root_dialog) {
            return Err(EngineError::UnknownDialog(config.root_dialog.clone()));
        }
        Ok(Self {
            registry,
            store,
            config,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// The state store this runner persists to.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// The dialog registry this runner resolves ids through.
    #[must_use]
    pub fn registry(&self) -> &Arc<DialogRegistry> {
        &self.registry
    }

    /// Process one inbound message for a conversation and return the
    /// outbound messages it produced, in send order.
    ///
    /// Concurrent calls for the same conversation are serialized; the
    /// second caller observes the state left by the first. On error the
    /// pre-turn state is preserved (nothing is persisted).
    ///
    /// # Errors
    ///
    /// Returns an error when a step or the store fails, or when the turn
    /// exceeds the configured deadline.
    pub async fn handle_turn(
        &self,
        conversation_id: &str,
        user_id: &str,
        inbound: &str,
    ) -> EngineResult<Vec<String>> {
        let lock = self.conversation_lock(conversation_id).await;
        let _guard = lock.lock().await;

        tokio::time::timeout(
            self.config.turn_timeout,
            self.run_turn(conversation_id, user_id, inbound),
        )
        .await
        .map_err(|_| EngineError::TurnTimeout(self.config.turn_timeout))?
    }

    /// Drop a conversation's dialog stack so the next turn starts the
    /// root dialog fresh. The user's profile is untouched.
    ///
    /// # Errors
    ///
    /// Returns an error when the store fails.
    pub async fn reset_conversation(&self, conversation_id: &str) -> EngineResult<()> {
        let lock = self.conversation_lock(conversation_id).await;
        let _guard = lock.lock().await;

        if let Some(mut data) = self.store.load_conversation(conversation_id).await? {
            data.stack.clear();
            data.touch();
            self.store.save_conversation(&data).await?;
            info!(conversation = %conversation_id, "conversation reset");
        }
        Ok(())
    }

    async fn conversation_lock(&self, conversation_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(
            locks
                .entry(conversation_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    async fn run_turn(
        &self,
        conversation_id: &str,
        user_id: &str,
        inbound: &str,
    ) -> EngineResult<Vec<String>> {
        let mut data = match self.store.load_conversation(conversation_id).await? {
            Some(data) => data,
            None => ConversationData::new(conversation_id),
        };
        let mut profile = match self.store.load_profile(user_id).await? {
            Some(profile) => profile,
            None => UserProfile::new(user_id)
                .with_role(self.config.default_role)
                .with_locale(self.config.default_locale.as_str()),
        };

        let mut outbound = Vec::new();

        if data.stack.is_empty() {
            // Fresh conversation (or one whose previous dialog ended):
            // the inbound text only triggers the root dialog.
            debug!(conversation = %conversation_id, root = %self.config.root_dialog, "starting root dialog");
            data.stack.push(self.config.root_dialog.clone());
            self.drive(&mut data, &mut profile, None, &mut outbound)
                .await?;
        } else {
            let pending = data
                .stack
                .active_mut()
                .and_then(|frame| frame.pending.take());
            match pending {
                Some(pending) => {
                    self.resolve_pending(&mut data, &mut profile, pending, inbound, &mut outbound)
                        .await?;
                }
                None => {
                    // Active frame without a pending prompt (e.g. state
                    // written by an older build). Resume the waterfall.
                    self.drive(&mut data, &mut profile, None, &mut outbound)
                        .await?;
                }
            }
        }

        data.touch();
        self.store.save_conversation(&data).await?;
        self.store.save_profile(&profile).await?;
        Ok(outbound)
    }

    /// Validate the reply to a pending prompt and either continue the
    /// waterfall or apply the dialog's invalid-input policy.
    async fn resolve_pending(
        &self,
        data: &mut ConversationData,
        profile: &mut UserProfile,
        pending: PendingPrompt,
        inbound: &str,
        outbound: &mut Vec<String>,
    ) -> EngineResult<()> {
        match pending.spec.validate(inbound) {
            Ok(value) => {
                self.drive(data, profile, Some(value), outbound).await?;
            }
            Err(err) => {
                let dialog_id = data
                    .stack
                    .active()
                    .map(|frame| frame.dialog_id.clone())
                    .ok_or_else(|| EngineError::internal("pending prompt without a frame"))?;
                let dialog = self
                    .registry
                    .get(&dialog_id)
                    .ok_or_else(|| EngineError::UnknownDialog(dialog_id.clone()))?;

                warn!(
                    conversation = %data.key,
                    dialog = %dialog_id,
                    policy = ?dialog.on_invalid(),
                    "prompt validation failed"
                );
                outbound.push(corrective_text(&err));

                match dialog.on_invalid() {
                    OnInvalid::Reprompt => {
                        outbound.push(pending.spec.render(&pending.text));
                        if let Some(frame) = data.stack.active_mut() {
                            frame.pending = Some(pending);
                        }
                    }
                    OnInvalid::Restart => {
                        if let Some(frame) = data.stack.active_mut() {
                            frame.step_index = 0;
                            frame.values.clear();
                            frame.pending = None;
                        }
                        self.drive(data, profile, None, outbound).await?;
                    }
                    OnInvalid::End => {
                        data.stack.pop();
                        self.drive(data, profile, None, outbound).await?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Run steps until a dialog prompts or the stack empties.
    async fn drive(
        &self,
        data: &mut ConversationData,
        profile: &mut UserProfile,
        mut input: Option<PromptValue>,
        outbound: &mut Vec<String>,
    ) -> EngineResult<()> {
        let conversation_id = data.key.clone();
        let mut transitions = 0usize;

        loop {
            transitions += 1;
            if transitions > MAX_TRANSITIONS {
                return Err(EngineError::internal(format!(
                    "conversation '{conversation_id}' exceeded {MAX_TRANSITIONS} dialog \
                     transitions in one turn"
                )));
            }

            let Some(frame) = data.stack.active() else {
                // Stack drained: the next inbound message restarts the
                // root dialog.
                break;
            };
            let dialog_id = frame.dialog_id.clone();
            let step_index = frame.step_index;
            let dialog = self
                .registry
                .get(&dialog_id)
                .ok_or_else(|| EngineError::UnknownDialog(dialog_id.clone()))?;

            if step_index >= dialog.step_count() {
                // Waterfall ran off the end, same as an explicit end.
                debug!(dialog = %dialog_id, "waterfall complete");
                data.stack.pop();
                input = None;
                continue;
            }

            let directive = {
                let frame = data
                    .stack
                    .active_mut()
                    .ok_or_else(|| EngineError::internal("active frame vanished"))?;
                let mut ctx =
                    StepContext::new(&conversation_id, frame, profile, input.take(), outbound);
                dialog.run_step(step_index, &mut ctx).await?
            };

            match directive {
                Directive::Prompt { text, spec } => {
                    outbound.push(spec.render(&text));
                    if let Some(frame) = data.stack.active_mut() {
                        frame.step_index += 1;
                        frame.pending = Some(PendingPrompt { text, spec });
                    }
                    break;
                }
                Directive::Next => {
                    if let Some(frame) = data.stack.active_mut() {
                        frame.step_index += 1;
                    }
                }
                Directive::BeginDialog(id) => {
                    if !self.registry.contains(&id) {
                        return Err(EngineError::UnknownDialog(id));
                    }
                    // Advance the parent first so it resumes past the
                    // step that launched the child.
                    if let Some(frame) = data.stack.active_mut() {
                        frame.step_index += 1;
                    }
                    debug!(parent = %dialog_id, child = %id, "begin dialog");
                    data.stack.push(id);
                }
                Directive::ReplaceDialog(id) => {
                    if !self.registry.contains(&id) {
                        return Err(EngineError::UnknownDialog(id));
                    }
                    debug!(from = %dialog_id, to = %id, "replace dialog");
                    data.stack.replace(id);
                }
                Directive::EndDialog => {
                    debug!(dialog = %dialog_id, "end dialog");
                    data.stack.pop();
                }
            }
        }
        Ok(())
    }
}

fn corrective_text(err: &ValidationError) -> String {
    match err {
        ValidationError::Format { message } => message.clone(),
        ValidationError::NotAChoice { .. } => CHOICE_RETRY_TEXT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::Dialog;
    use crate::prompt::{PromptSpec, TextValidator};
    use crate::state::MemoryStateStore;
    use async_trait::async_trait;

    const CONV: &str = "cli:direct";
    const USER: &str = "user-1";

    /// Two-step waterfall: ask for a name, then greet and end.
    struct Greeter;

    #[async_trait]
    impl Dialog for Greeter {
        fn id(&self) -> &str {
            "greeter"
        }

        fn step_count(&self) -> usize {
            2
        }

        async fn run_step(
            &self,
            index: usize,
            ctx: &mut StepContext<'_>,
        ) -> EngineResult<Directive> {
            match index {
                0 => Ok(Directive::prompt("What is your name?", PromptSpec::text())),
                1 => {
                    let name = ctx.input_text().unwrap_or("stranger").to_string();
                    ctx.say(format!("Hello, {name}!"));
                    Ok(Directive::EndDialog)
                }
                _ => Err(EngineError::StepOutOfRange {
                    dialog: self.id().to_string(),
                    index,
                }),
            }
        }
    }

    /// Menu that routes to the greeter or ends.
    struct Menu;

    #[async_trait]
    impl Dialog for Menu {
        fn id(&self) -> &str {
            "menu"
        }

        fn step_count(&self) -> usize {
            3
        }

        async fn run_step(
            &self,
            index: usize,
            ctx: &mut StepContext<'_>,
        ) -> EngineResult<Directive> {
            match index {
                0 => Ok(Directive::prompt(
                    "What would you like to do?",
                    PromptSpec::choice(["Greet", "Done"]),
                )),
                1 => match ctx.input_text() {
                    Some("Greet") => Ok(Directive::begin("greeter")),
                    _ => Ok(Directive::EndDialog),
                },
                2 => {
                    ctx.say("Back at the menu.");
                    Ok(Directive::EndDialog)
                }
                _ => Err(EngineError::StepOutOfRange {
                    dialog: self.id().to_string(),
                    index,
                }),
            }
        }
    }

    /// One prompt with a phone validator, restart-on-invalid policy.
    struct PhoneAsk;

    #[async_trait]
    impl Dialog for PhoneAsk {
        fn id(&self) -> &str {
            "phone_ask"
        }

        fn step_count(&self) -> usize {
            2
        }

        fn on_invalid(&self) -> OnInvalid {
            OnInvalid::Restart
        }

        async fn run_step(
            &self,
            index: usize,
            ctx: &mut StepContext<'_>,
        ) -> EngineResult<Directive> {
            match index {
                0 => {
                    ctx.say("Let's update your phone number.");
                    Ok(Directive::prompt(
                        "Please enter the number.",
                        PromptSpec::validated(TextValidator::phone()),
                    ))
                }
                1 => {
                    ctx.say("Thank You");
                    Ok(Directive::EndDialog)
                }
                _ => Err(EngineError::StepOutOfRange {
                    dialog: self.id().to_string(),
                    index,
                }),
            }
        }
    }

    fn runner(root: &str) -> TurnRunner {
        let mut registry = DialogRegistry::new();
        registry.register(Greeter);
        registry.register(Menu);
        registry.register(PhoneAsk);
        TurnRunner::new(
            Arc::new(registry),
            Arc::new(MemoryStateStore::new()),
            TurnRunnerConfig::new(root),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_first_turn_starts_root() {
        let runner = runner("greeter");
        let out = runner.handle_turn(CONV, USER, "hi").await.unwrap();
        assert_eq!(out, ["What is your name?"]);
    }

    #[tokio::test]
    async fn test_reply_resumes_waterfall() {
        let runner = runner("greeter");
        runner.handle_turn(CONV, USER, "hi").await.unwrap();
        let out = runner.handle_turn(CONV, USER, "Ada").await.unwrap();
        assert_eq!(out, ["Hello, Ada!"]);

        // Stack drained, so the next message restarts the root dialog.
        let out = runner.handle_turn(CONV, USER, "hi again").await.unwrap();
        assert_eq!(out, ["What is your name?"]);
    }

    #[tokio::test]
    async fn test_child_dialog_and_parent_resume() {
        let runner = runner("menu");
        let out = runner.handle_turn(CONV, USER, "hi").await.unwrap();
        assert!(out[0].contains("1. Greet"));

        // Choosing Greet enters the child, which prompts immediately.
        let out = runner.handle_turn(CONV, USER, "Greet").await.unwrap();
        assert_eq!(out, ["What is your name?"]);

        // Child ends; the parent resumes at its next step.
        let out = runner.handle_turn(CONV, USER, "Ada").await.unwrap();
        assert_eq!(out, ["Hello, Ada!", "Back at the menu."]);
    }

    #[tokio::test]
    async fn test_invalid_choice_reprompts() {
        let runner = runner("menu");
        runner.handle_turn(CONV, USER, "hi").await.unwrap();

        let out = runner.handle_turn(CONV, USER, "Dance").await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], CHOICE_RETRY_TEXT);
        assert!(out[1].contains("What would you like to do?"));

        // A valid reply after the re-prompt still routes normally.
        let out = runner.handle_turn(CONV, USER, "Greet").await.unwrap();
        assert_eq!(out, ["What is your name?"]);
    }

    #[tokio::test]
    async fn test_invalid_format_restarts_dialog() {
        let runner = runner("phone_ask");
        let out = runner.handle_turn(CONV, USER, "hi").await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], "Let's update your phone number.");

        // Restart policy: corrective message, then the dialog runs again
        // from step 0.
        let out = runner.handle_turn(CONV, USER, "5551234").await.unwrap();
        assert_eq!(out.len(), 3);
        assert!(out[0].contains("correct format XXX-XXX-XXXX"));
        assert_eq!(out[1], "Let's update your phone number.");

        let out = runner.handle_turn(CONV, USER, "555-123-4567").await.unwrap();
        assert_eq!(out, ["Thank You"]);
    }

    #[tokio::test]
    async fn test_new_profile_gets_configured_locale() {
        let mut registry = DialogRegistry::new();
        registry.register(Greeter);
        let store = Arc::new(MemoryStateStore::new());
        let runner = TurnRunner::new(
            Arc::new(registry),
            Arc::clone(&store) as Arc<dyn StateStore>,
            TurnRunnerConfig::new("greeter").with_default_locale("fr"),
        )
        .unwrap();

        runner.handle_turn(CONV, USER, "bonjour").await.unwrap();
        let profile = store.load_profile(USER).await.unwrap().unwrap();
        assert_eq!(profile.locale, "fr");
    }

    #[tokio::test]
    async fn test_unknown_root_rejected() {
        let registry = Arc::new(DialogRegistry::new());
        let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());
        let result = TurnRunner::new(registry, store, TurnRunnerConfig::new("missing"));
        assert!(matches!(result, Err(EngineError::UnknownDialog(_))));
    }

    #[tokio::test]
    async fn test_reset_conversation_clears_stack() {
        let runner = runner("greeter");
        runner.handle_turn(CONV, USER, "hi").await.unwrap();
        runner.reset_conversation(CONV).await.unwrap();

        // After a reset the next message starts over instead of being
        // treated as the name reply.
        let out = runner.handle_turn(CONV, USER, "anything").await.unwrap();
        assert_eq!(out, ["What is your name?"]);
    }

    #[tokio::test]
    async fn test_failed_turn_leaves_state_untouched() {
        struct Broken;

        #[async_trait]
        impl Dialog for Broken {
            fn id(&self) -> &str {
                "broken"
            }

            fn step_count(&self) -> usize {
                1
            }

            async fn run_step(
                &self,
                _index: usize,
                _ctx: &mut StepContext<'_>,
            ) -> EngineResult<Directive> {
                Err(EngineError::internal("boom"))
            }
        }

        let mut registry = DialogRegistry::new();
        registry.register(Broken);
        let store = Arc::new(MemoryStateStore::new());
        let runner = TurnRunner::new(
            Arc::new(registry),
            Arc::clone(&store) as Arc<dyn StateStore>,
            TurnRunnerConfig::new("broken"),
        )
        .unwrap();

        assert!(runner.handle_turn(CONV, USER, "hi").await.is_err());
        assert!(store.load_conversation(CONV).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_turn_timeout() {
        struct Sleepy;

        #[async_trait]
        impl Dialog for Sleepy {
            fn id(&self) -> &str {
                "sleepy"
            }

            fn step_count(&self) -> usize {
                1
            }

            async fn run_step(
                &self,
                _index: usize,
                _ctx: &mut StepContext<'_>,
            ) -> EngineResult<Directive> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Directive::EndDialog)
            }
        }

        let mut registry = DialogRegistry::new();
        registry.register(Sleepy);
        let runner = TurnRunner::new(
            Arc::new(registry),
            Arc::new(MemoryStateStore::new()),
            TurnRunnerConfig::new("sleepy").with_turn_timeout(Duration::from_millis(50)),
        )
        .unwrap();

        let result = runner.handle_turn(CONV, USER, "hi").await;
        assert!(matches!(result, Err(EngineError::TurnTimeout(_))));
    }
}

//! Conversation and user-profile state, with pluggable storage backends.
//!
//! Conversation state (the dialog stack) and user profiles have
//! independent lifecycles: a profile persists across conversations for
//! the same user. Neither store evicts entries; growth is bounded only
//! by the number of conversations/users seen (see
//! [`FileStateStore::prune_older_than`] for an opt-in cleanup).

use crate::error::StoreResult;
use crate::stack::DialogStack;
use crate::util::timestamp_ms;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::debug;

/// The role a user holds, gating which menus they see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// A claimant: full menu (profile, questions, claim status).
    #[default]
    Claimant,
    /// A customer: questions only.
    Customer,
}

/// Per-user profile, persisted across conversations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// The user's id within their channel.
    pub user_id: String,
    /// Display name, when the channel provides one.
    pub display_name: Option<String>,
    /// The user's role.
    pub role: UserRole,
    /// BCP-47 language code.
    pub locale: String,
}

impl UserProfile {
    /// Create a profile with default role and locale.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            role: UserRole::default(),
            locale: "en".to_string(),
        }
    }

    /// Set the role.
    #[must_use]
    pub const fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    /// Set the locale.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }
}

/// Stored conversation state: the dialog stack plus bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationData {
    /// Conversation key (e.g. `cli:direct`).
    pub key: String,
    /// The dialog stack for this conversation.
    pub stack: DialogStack,
    /// Creation timestamp (Unix milliseconds).
    pub created_at: u64,
    /// Last activity timestamp.
    pub updated_at: u64,
}

impl ConversationData {
    /// Create empty conversation state.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        let now = timestamp_ms();
        Self {
            key: key.into(),
            stack: DialogStack::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh the activity timestamp.
    pub fn touch(&mut self) {
        self.updated_at = timestamp_ms();
    }
}

/// Trait for conversation/profile storage backends.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load conversation state by key.
    async fn load_conversation(&self, key: &str) -> StoreResult<Option<ConversationData>>;

    /// Save conversation state.
    async fn save_conversation(&self, data: &ConversationData) -> StoreResult<()>;

    /// Delete conversation state.
    async fn delete_conversation(&self, key: &str) -> StoreResult<()>;

    /// Load a user profile.
    async fn load_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>>;

    /// Save a user profile.
    async fn save_profile(&self, profile: &UserProfile) -> StoreResult<()>;

    /// List all conversation keys.
    async fn list_conversations(&self) -> StoreResult<Vec<String>>;
}

/// In-memory state store.
///
/// Fast but not persistent across restarts; entries are never evicted.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    conversations: RwLock<HashMap<String, ConversationData>>,
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl MemoryStateStore {
    /// Create a new memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load_conversation(&self, key: &str) -> StoreResult<Option<ConversationData>> {
        Ok(self.conversations.read().await.get(key).cloned())
    }

    async fn save_conversation(&self, data: &ConversationData) -> StoreResult<()> {
        self.conversations
            .write()
            .await
            .insert(data.key.clone(), data.clone());
        Ok(())
    }

    async fn delete_conversation(&self, key: &str) -> StoreResult<()> {
        self.conversations.write().await.remove(key);
        Ok(())
    }

    async fn load_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn save_profile(&self, profile: &UserProfile) -> StoreResult<()> {
        self.profiles
            .write()
            .await
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn list_conversations(&self) -> StoreResult<Vec<String>> {
        Ok(self.conversations.read().await.keys().cloned().collect())
    }
}

/// File-based state store.
///
/// Persists conversations and profiles as JSON files under a base
/// directory, one file per entry.
#[derive(Debug)]
pub struct FileStateStore {
    base_path: PathBuf,
}

impl FileStateStore {
    /// Create a file store rooted at the given directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn conversation_path(&self, key: &str) -> PathBuf {
        let safe = key.replace([':', '/', '\\'], "_");
        self.base_path.join("conversations").join(format!("{safe}.json"))
    }

    fn profile_path(&self, user_id: &str) -> PathBuf {
        let safe = user_id.replace([':', '/', '\\'], "_");
        self.base_path.join("profiles").join(format!("{safe}.json"))
    }

    async fn ensure_dirs(&self) -> StoreResult<()> {
        tokio::fs::create_dir_all(self.base_path.join("conversations")).await?;
        tokio::fs::create_dir_all(self.base_path.join("profiles")).await?;
        Ok(())
    }

    /// Delete conversations idle for longer than `max_idle_ms`.
    ///
    /// Not wired into the runner by default; the source system never
    /// evicted state, so cleanup stays an explicit operator action.
    pub async fn prune_older_than(&self, max_idle_ms: u64) -> StoreResult<usize> {
        let now = timestamp_ms();
        let mut removed = 0;
        for key in self.list_conversations().await? {
            if let Some(data) = self.load_conversation(&key).await?
                && now.saturating_sub(data.updated_at) > max_idle_ms
            {
                self.delete_conversation(&key).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load_conversation(&self, key: &str) -> StoreResult<Option<ConversationData>> {
        let path = self.conversation_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&path).await?;
        let data: ConversationData = serde_json::from_str(&content)?;
        debug!(key = %key, "loaded conversation from file");
        Ok(Some(data))
    }

    async fn save_conversation(&self, data: &ConversationData) -> StoreResult<()> {
        self.ensure_dirs().await?;
        let path = self.conversation_path(&data.key);
        let content = serde_json::to_string_pretty(data)?;
        tokio::fs::write(&path, content).await?;
        debug!(key = %data.key, "saved conversation to file");
        Ok(())
    }

    async fn delete_conversation(&self, key: &str) -> StoreResult<()> {
        let path = self.conversation_path(key);
        if path.exists() {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn load_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        let path = self.profile_path(user_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn save_profile(&self, profile: &UserProfile) -> StoreResult<()> {
        self.ensure_dirs().await?;
        let path = self.profile_path(&profile.user_id);
        let content = serde_json::to_string_pretty(profile)?;
        tokio::fs::write(&path, content).await?;
        Ok(())
    }

    async fn list_conversations(&self) -> StoreResult<Vec<String>> {
        self.ensure_dirs().await?;
        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(self.base_path.join("conversations")).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                // Filenames are sanitized, so the key comes from the
                // record itself.
                let content = tokio::fs::read_to_string(&path).await?;
                let data: ConversationData = serde_json::from_str(&content)?;
                keys.push(data.key);
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStateStore::new();

        let mut data = ConversationData::new("cli:direct");
        data.stack.push("top_menu");
        store.save_conversation(&data).await.unwrap();

        let loaded = store.load_conversation("cli:direct").await.unwrap().unwrap();
        assert_eq!(loaded.stack.depth(), 1);

        store.delete_conversation("cli:direct").await.unwrap();
        assert!(store.load_conversation("cli:direct").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_profile_independent_of_conversation() {
        let store = MemoryStateStore::new();
        let profile = UserProfile::new("user-1").with_role(UserRole::Customer);
        store.save_profile(&profile).await.unwrap();

        // Deleting the conversation does not touch the profile.
        store.delete_conversation("cli:direct").await.unwrap();
        let loaded = store.load_profile("user-1").await.unwrap().unwrap();
        assert_eq!(loaded.role, UserRole::Customer);
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path());

        let mut data = ConversationData::new("cli:direct");
        data.stack.push("faq");
        data.stack.active_mut().unwrap().set("question", "hours?");
        store.save_conversation(&data).await.unwrap();

        let loaded = store.load_conversation("cli:direct").await.unwrap().unwrap();
        assert_eq!(loaded.stack.active().unwrap().get_str("question"), Some("hours?"));

        let keys = store.list_conversations().await.unwrap();
        assert_eq!(keys.len(), 1);

        let profile = UserProfile::new("user-1");
        store.save_profile(&profile).await.unwrap();
        assert!(store.load_profile("user-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_preserves_key_punctuation() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path());

        // Underscores in the key must survive the filename sanitizing.
        store
            .save_conversation(&ConversationData::new("cli:session_1"))
            .await
            .unwrap();

        let keys = store.list_conversations().await.unwrap();
        assert_eq!(keys, ["cli:session_1"]);
    }
}

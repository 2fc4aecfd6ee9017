//! Token persistence between requests.
//!
//! The exchange and the API invoker never own session storage; they go
//! through a [`TokenStore`]. A web front-end keys one store per session,
//! the CLI uses a single [`FileTokenStore`].
//!
//! Request and access tokens live in separate slots: an exchange that is
//! started and abandoned leaves an earlier access token untouched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::token::{Token, TokenStage};

/// Access token file name within the mwoauth data directory.
pub const TOKEN_FILE: &str = "access-token.json";

/// Pending request token file name within the mwoauth data directory.
pub const REQUEST_TOKEN_FILE: &str = "request-token.json";

// ============================================================================
// TokenStore Trait
// ============================================================================

/// Session collaborator holding the current tokens, one per stage.
///
/// Implementations must serialize writes for one session so that a finalize
/// cannot interleave with another writer.
#[async_trait]
pub trait TokenStore: Send + Sync + std::fmt::Debug {
    /// Load the current token for `stage`, if any.
    async fn load_token(&self, stage: TokenStage) -> Result<Option<Token>>;

    /// Replace the token for `stage`. Other stages are left alone.
    async fn save_token(&self, stage: TokenStage, token: &Token) -> Result<()>;
}

/// Shared token store for use across async contexts.
pub type SharedTokenStore = Arc<dyn TokenStore>;

#[derive(Debug, Default)]
struct Slots {
    request: Option<Token>,
    access: Option<Token>,
}

impl Slots {
    fn get(&self, stage: TokenStage) -> &Option<Token> {
        match stage {
            TokenStage::Request => &self.request,
            TokenStage::Access => &self.access,
        }
    }

    fn get_mut(&mut self, stage: TokenStage) -> &mut Option<Token> {
        match stage {
            TokenStage::Request => &mut self.request,
            TokenStage::Access => &mut self.access,
        }
    }
}

// ============================================================================
// FileTokenStore
// ============================================================================

/// JSON-file token store: `access-token.json` and `request-token.json`
/// inside one data directory.
#[derive(Debug)]
pub struct FileTokenStore {
    data_dir: PathBuf,
    cached: RwLock<Slots>,
}

impl FileTokenStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            cached: RwLock::new(Slots::default()),
        }
    }

    pub fn token_path(&self, stage: TokenStage) -> PathBuf {
        match stage {
            TokenStage::Request => self.data_dir.join(REQUEST_TOKEN_FILE),
            TokenStage::Access => self.data_dir.join(TOKEN_FILE),
        }
    }

    /// Check if a token file exists for `stage`.
    pub fn has_token(&self, stage: TokenStage) -> bool {
        self.token_path(stage).exists()
    }

    /// Remove both token files and forget the cached tokens.
    pub async fn clear(&self) -> Result<()> {
        let mut cache = self.cached.write().await;
        for stage in [TokenStage::Request, TokenStage::Access] {
            let path = self.token_path(stage);
            if path.exists() {
                std::fs::remove_file(&path)
                    .map_err(|e| Error::Storage(format!("Failed to delete token file: {}", e)))?;
            }
        }
        *cache = Slots::default();
        tracing::info!("Tokens removed from {}", self.data_dir.display());
        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load_token(&self, stage: TokenStage) -> Result<Option<Token>> {
        {
            let cache = self.cached.read().await;
            if cache.get(stage).is_some() {
                return Ok(cache.get(stage).clone());
            }
        }

        let path = self.token_path(stage);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Storage(format!("Failed to read token file: {}", e)))?;

        let token: Token = serde_json::from_str(&content)
            .map_err(|e| Error::Storage(format!("Failed to parse token file: {}", e)))?;

        let mut cache = self.cached.write().await;
        *cache.get_mut(stage) = Some(token.clone());

        Ok(Some(token))
    }

    async fn save_token(&self, stage: TokenStage, token: &Token) -> Result<()> {
        // Held across the write so concurrent savers are serialized.
        let mut cache = self.cached.write().await;

        std::fs::create_dir_all(&self.data_dir)
            .map_err(|e| Error::Storage(format!("Failed to create token directory: {}", e)))?;

        let json = serde_json::to_string_pretty(token)
            .map_err(|e| Error::Storage(format!("Failed to serialize token: {}", e)))?;

        let path = self.token_path(stage);
        std::fs::write(&path, json)
            .map_err(|e| Error::Storage(format!("Failed to write token file: {}", e)))?;

        *cache.get_mut(stage) = Some(token.clone());

        tracing::info!(%stage, "Token saved to {}", path.display());
        Ok(())
    }
}

// ============================================================================
// InMemoryTokenStore
// ============================================================================

/// In-memory token store, one per session.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    slots: RwLock<Slots>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already holding an access token.
    pub fn with_token(token: Token) -> Self {
        Self {
            slots: RwLock::new(Slots {
                request: None,
                access: Some(token),
            }),
        }
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn load_token(&self, stage: TokenStage) -> Result<Option<Token>> {
        let slots = self.slots.read().await;
        Ok(slots.get(stage).clone())
    }

    async fn save_token(&self, stage: TokenStage, token: &Token) -> Result<()> {
        let mut slots = self.slots.write().await;
        *slots.get_mut(stage) = Some(token.clone());
        Ok(())
    }
}

/// Create a shared file-based token store.
pub fn create_token_store(data_dir: &Path) -> SharedTokenStore {
    Arc::new(FileTokenStore::new(data_dir))
}

/// Create a shared in-memory token store.
pub fn create_memory_token_store() -> SharedTokenStore {
    Arc::new(InMemoryTokenStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    use TokenStage::{Access, Request};

    #[tokio::test]
    async fn test_file_store_new() {
        let temp = tempdir().unwrap();
        let store = FileTokenStore::new(temp.path());
        assert!(!store.has_token(Access));
        assert!(store.load_token(Access).await.unwrap().is_none());
        assert!(store.load_token(Request).await.unwrap().is_none());
        assert_eq!(store.token_path(Access), temp.path().join(TOKEN_FILE));
        assert_eq!(
            store.token_path(Request),
            temp.path().join(REQUEST_TOKEN_FILE)
        );
    }

    #[tokio::test]
    async fn test_file_save_and_load() {
        let temp = tempdir().unwrap();
        let store = FileTokenStore::new(temp.path());

        store
            .save_token(Access, &Token::new("key1", "secret1"))
            .await
            .unwrap();
        assert!(store.has_token(Access));

        // A fresh store reads what the first one wrote.
        let reopened = FileTokenStore::new(temp.path());
        let loaded = reopened.load_token(Access).await.unwrap().unwrap();
        assert_eq!(loaded, Token::new("key1", "secret1"));
    }

    #[tokio::test]
    async fn test_file_stages_are_separate() {
        let temp = tempdir().unwrap();
        let store = FileTokenStore::new(temp.path());

        store
            .save_token(Access, &Token::new("access", "as"))
            .await
            .unwrap();
        store
            .save_token(Request, &Token::new("request", "rs"))
            .await
            .unwrap();

        let reopened = FileTokenStore::new(temp.path());
        assert_eq!(
            reopened.load_token(Access).await.unwrap().unwrap().key,
            "access"
        );
        assert_eq!(
            reopened.load_token(Request).await.unwrap().unwrap().key,
            "request"
        );
    }

    #[tokio::test]
    async fn test_file_save_replaces_token() {
        let temp = tempdir().unwrap();
        let store = FileTokenStore::new(temp.path());

        store.save_token(Access, &Token::new("old", "os")).await.unwrap();
        store.save_token(Access, &Token::new("new", "ns")).await.unwrap();

        let loaded = store.load_token(Access).await.unwrap().unwrap();
        assert_eq!(loaded.key, "new");
    }

    #[tokio::test]
    async fn test_file_store_creates_data_dir() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("nested").join("dir");
        let store = FileTokenStore::new(&dir);

        store.save_token(Access, &Token::new("k", "s")).await.unwrap();
        assert!(dir.join(TOKEN_FILE).exists());
    }

    #[tokio::test]
    async fn test_file_clear() {
        let temp = tempdir().unwrap();
        let store = FileTokenStore::new(temp.path());

        store.save_token(Access, &Token::new("k", "s")).await.unwrap();
        store.save_token(Request, &Token::new("r", "s")).await.unwrap();
        store.clear().await.unwrap();

        assert!(!store.has_token(Access));
        assert!(!store.has_token(Request));
        assert!(store.load_token(Access).await.unwrap().is_none());
        assert!(store.load_token(Request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_corrupt_token_is_storage_error() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(TOKEN_FILE), "{not json").unwrap();

        let store = FileTokenStore::new(temp.path());
        let result = store.load_token(Access).await;
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryTokenStore::new();
        assert!(store.load_token(Access).await.unwrap().is_none());

        store.save_token(Request, &Token::new("r", "s")).await.unwrap();
        assert!(store.load_token(Access).await.unwrap().is_none());
        assert_eq!(
            store.load_token(Request).await.unwrap(),
            Some(Token::new("r", "s"))
        );

        let seeded = InMemoryTokenStore::with_token(Token::new("a", "b"));
        assert_eq!(seeded.load_token(Access).await.unwrap().unwrap().key, "a");
        assert!(seeded.load_token(Request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_shared_store_constructors() {
        let temp = tempdir().unwrap();
        let file_store = create_token_store(temp.path());
        file_store
            .save_token(Access, &Token::new("k", "s"))
            .await
            .unwrap();
        assert!(temp.path().join(TOKEN_FILE).exists());

        let memory_store = create_memory_token_store();
        assert!(memory_store.load_token(Access).await.unwrap().is_none());
    }
}

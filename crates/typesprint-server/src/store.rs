//! Document store for users, sessions, texts, and results.
//!
//! Each collection is held in memory behind a lock and, when the store is
//! opened on a directory, written to `<collection>.json` after every change.
//! Collections are loaded from those files on startup.

use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use typesprint_core::models::{ResultRecord, Text, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

// ============================================================================
// Stored documents
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl StoredUser {
    /// The user as exposed over the API (no password hash).
    pub fn to_public(&self) -> User {
        User {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Default)]
struct Collections {
    users: Vec<StoredUser>,
    sessions: Vec<SessionRecord>,
    texts: Vec<Text>,
    results: Vec<ResultRecord>,
}

const USERS: &str = "users";
const SESSIONS: &str = "sessions";
const TEXTS: &str = "texts";
const RESULTS: &str = "results";

pub struct Store {
    dir: Option<PathBuf>,
    inner: RwLock<Collections>,
}

impl Store {
    /// Open (or create) a store persisted under `dir`.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let collections = Collections {
            users: load_collection(dir, USERS)?,
            sessions: load_collection(dir, SESSIONS)?,
            texts: load_collection(dir, TEXTS)?,
            results: load_collection(dir, RESULTS)?,
        };
        info!(
            dir = %dir.display(),
            users = collections.users.len(),
            texts = collections.texts.len(),
            results = collections.results.len(),
            "Document store opened"
        );
        Ok(Self {
            dir: Some(dir.to_path_buf()),
            inner: RwLock::new(collections),
        })
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            inner: RwLock::new(Collections::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>, StoreError> {
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>, StoreError> {
        self.inner.write().map_err(|_| StoreError::LockPoisoned)
    }

    fn persist<T: Serialize>(&self, name: &str, docs: &[T]) -> Result<(), StoreError> {
        if let Some(ref dir) = self.dir {
            let contents = serde_json::to_string_pretty(docs)?;
            std::fs::write(collection_path(dir, name), contents)?;
            debug!(collection = name, count = docs.len(), "Collection persisted");
        }
        Ok(())
    }

    /// Write `next` to disk, then make it the live collection. A failed
    /// write leaves the live collection untouched.
    fn commit<T: Serialize>(&self, name: &str, live: &mut Vec<T>, next: Vec<T>) -> Result<(), StoreError> {
        self.persist(name, &next)?;
        *live = next;
        Ok(())
    }

    // ===== Users =====

    pub fn insert_user(&self, user: StoredUser) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner
            .users
            .iter()
            .any(|u| u.username.eq_ignore_ascii_case(&user.username))
        {
            return Err(StoreError::Conflict("Username already taken".to_string()));
        }
        if inner.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StoreError::Conflict("Email already registered".to_string()));
        }
        let mut next = inner.users.clone();
        next.push(user);
        self.commit(USERS, &mut inner.users, next)
    }

    pub fn get_user(&self, id: &str) -> Result<Option<StoredUser>, StoreError> {
        Ok(self.read()?.users.iter().find(|u| u.id == id).cloned())
    }

    /// Look a user up by username or email, case-insensitively.
    pub fn find_user_by_login(&self, login: &str) -> Result<Option<StoredUser>, StoreError> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(login) || u.email.eq_ignore_ascii_case(login))
            .cloned())
    }

    // ===== Sessions =====

    pub fn put_session(&self, session: SessionRecord) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let mut next = inner.sessions.clone();
        next.push(session);
        self.commit(SESSIONS, &mut inner.sessions, next)
    }

    pub fn get_session(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.read()?.sessions.iter().find(|s| s.token == token).cloned())
    }

    /// Returns whether a session was removed.
    pub fn delete_session(&self, token: &str) -> Result<bool, StoreError> {
        let mut inner = self.write()?;
        let next: Vec<SessionRecord> = inner
            .sessions
            .iter()
            .filter(|s| s.token != token)
            .cloned()
            .collect();
        let removed = next.len() != inner.sessions.len();
        if removed {
            self.commit(SESSIONS, &mut inner.sessions, next)?;
        }
        Ok(removed)
    }

    /// Drop every session expired at `now`. Returns how many were removed.
    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut inner = self.write()?;
        let next: Vec<SessionRecord> = inner
            .sessions
            .iter()
            .filter(|s| !s.is_expired(now))
            .cloned()
            .collect();
        let removed = inner.sessions.len() - next.len();
        if removed > 0 {
            self.commit(SESSIONS, &mut inner.sessions, next)?;
        }
        Ok(removed)
    }

    // ===== Texts =====

    pub fn list_texts(&self) -> Result<Vec<Text>, StoreError> {
        Ok(self.read()?.texts.clone())
    }

    pub fn get_text(&self, id: &str) -> Result<Option<Text>, StoreError> {
        Ok(self.read()?.texts.iter().find(|t| t.id == id).cloned())
    }

    pub fn random_text(&self) -> Result<Option<Text>, StoreError> {
        Ok(self.read()?.texts.choose(&mut rand::thread_rng()).cloned())
    }

    /// Insert `texts` only when the collection is empty. Returns how many were added.
    pub fn seed_texts(&self, texts: Vec<Text>) -> Result<usize, StoreError> {
        let mut inner = self.write()?;
        if !inner.texts.is_empty() {
            return Ok(0);
        }
        let count = texts.len();
        self.commit(TEXTS, &mut inner.texts, texts)?;
        Ok(count)
    }

    // ===== Results =====

    pub fn insert_result(&self, record: ResultRecord) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let mut next = inner.results.clone();
        next.push(record);
        self.commit(RESULTS, &mut inner.results, next)
    }

    /// A user's results, newest first.
    pub fn results_for_user(&self, user_id: &str) -> Result<Vec<ResultRecord>, StoreError> {
        let mut results: Vec<ResultRecord> = self
            .read()?
            .results
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }
}

fn collection_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.json", name))
}

fn load_collection<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Vec<T>, StoreError> {
    let path = collection_path(dir, name);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = std::fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn stored_user(id: &str, username: &str, email: &str) -> StoredUser {
        StoredUser {
            id: id.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        }
    }

    fn result(id: &str, user_id: &str, age_minutes: i64) -> ResultRecord {
        ResultRecord {
            id: id.to_string(),
            user_id: user_id.to_string(),
            text_ref: "t1".to_string(),
            wpm: 50.0,
            accuracy: 95.0,
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[test]
    fn test_duplicate_username_and_email_conflict() {
        let store = Store::in_memory();
        store.insert_user(stored_user("1", "ada", "ada@example.com")).unwrap();

        let err = store
            .insert_user(stored_user("2", "ADA", "other@example.com"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let err = store
            .insert_user(stored_user("3", "grace", "Ada@Example.com"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn test_find_user_by_username_or_email() {
        let store = Store::in_memory();
        store.insert_user(stored_user("1", "ada", "ada@example.com")).unwrap();
        assert_eq!(store.find_user_by_login("Ada").unwrap().unwrap().id, "1");
        assert_eq!(store.find_user_by_login("ada@example.com").unwrap().unwrap().id, "1");
        assert!(store.find_user_by_login("nobody").unwrap().is_none());
    }

    #[test]
    fn test_session_lifecycle_and_purge() {
        let store = Store::in_memory();
        let now = Utc::now();
        store
            .put_session(SessionRecord {
                token: "live".into(),
                user_id: "1".into(),
                created_at: now,
                expires_at: now + Duration::hours(1),
            })
            .unwrap();
        store
            .put_session(SessionRecord {
                token: "dead".into(),
                user_id: "1".into(),
                created_at: now - Duration::hours(2),
                expires_at: now - Duration::hours(1),
            })
            .unwrap();

        assert_eq!(store.purge_expired_sessions(now).unwrap(), 1);
        assert!(store.get_session("dead").unwrap().is_none());
        assert!(store.delete_session("live").unwrap());
        assert!(!store.delete_session("live").unwrap());
    }

    #[test]
    fn test_results_newest_first_and_scoped_to_user() {
        let store = Store::in_memory();
        store.insert_result(result("old", "1", 30)).unwrap();
        store.insert_result(result("new", "1", 1)).unwrap();
        store.insert_result(result("other", "2", 0)).unwrap();

        let ids: Vec<String> = store
            .results_for_user("1")
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn test_persisted_store_reloads() {
        let dir = TempDir::new().unwrap();
        {
            let store = Store::open(dir.path()).unwrap();
            store.insert_user(stored_user("1", "ada", "ada@example.com")).unwrap();
            store.insert_result(result("r1", "1", 0)).unwrap();
        }
        let reopened = Store::open(dir.path()).unwrap();
        assert!(reopened.get_user("1").unwrap().is_some());
        assert_eq!(reopened.results_for_user("1").unwrap().len(), 1);
    }

    /// Replace a collection file with a directory so writes to it fail.
    fn block_collection(dir: &TempDir, name: &str) {
        std::fs::create_dir(collection_path(dir.path(), name)).unwrap();
    }

    #[test]
    fn test_failed_result_write_is_not_kept() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        block_collection(&dir, RESULTS);

        assert!(store.insert_result(result("r1", "1", 0)).is_err());
        assert!(store.insert_result(result("r1", "1", 0)).is_err());
        assert!(store.results_for_user("1").unwrap().is_empty());

        // Once the disk recovers only the new record is written
        std::fs::remove_dir(collection_path(dir.path(), RESULTS)).unwrap();
        store.insert_result(result("r2", "1", 0)).unwrap();
        let reopened = Store::open(dir.path()).unwrap();
        let ids: Vec<String> = reopened
            .results_for_user("1")
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["r2"]);
    }

    #[test]
    fn test_failed_user_and_session_writes_are_not_kept() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        block_collection(&dir, USERS);
        block_collection(&dir, SESSIONS);

        assert!(store.insert_user(stored_user("1", "ada", "ada@example.com")).is_err());
        assert!(store.get_user("1").unwrap().is_none());
        // The failed insert does not hold the username
        std::fs::remove_dir(collection_path(dir.path(), USERS)).unwrap();
        store.insert_user(stored_user("2", "ada", "ada@example.com")).unwrap();

        let now = Utc::now();
        let session = SessionRecord {
            token: "tok".into(),
            user_id: "2".into(),
            created_at: now,
            expires_at: now + Duration::hours(1),
        };
        assert!(store.put_session(session).is_err());
        assert!(store.get_session("tok").unwrap().is_none());
    }

    #[test]
    fn test_seed_only_when_empty() {
        let store = Store::in_memory();
        let text = Text {
            id: "t1".into(),
            title: "One".into(),
            content: "one".into(),
            created_at: Utc::now(),
        };
        assert_eq!(store.seed_texts(vec![text.clone()]).unwrap(), 1);
        assert_eq!(store.seed_texts(vec![text]).unwrap(), 0);
        assert!(store.random_text().unwrap().is_some());
    }
}

//! File-backed move log.
//!
//! Each room is one JSON document, `room_{id}.json`, rewritten through a
//! temp file and an atomic rename on every change.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use battle_core::{CombatantId, MoveRecord, RecordId};

use super::{MoveLogStore, RepositoryError, Result, RoomLog};

pub struct FileMoveLog {
    base_dir: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileMoveLog {
    /// Create a move log rooted at `base_dir`, creating the directory if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Platform data directory for move logs.
    ///
    /// - Linux: `~/.local/share/battle/move_logs`
    /// - macOS: `~/Library/Application Support/battle/move_logs`
    /// - Fallback: `./save_data/move_logs`
    pub fn default_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "battle")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("./save_data"))
            .join("move_logs")
    }

    fn room_path(&self, room: &str) -> PathBuf {
        let safe: String = room
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_dir.join(format!("room_{safe}.json"))
    }

    fn load(&self, room: &str) -> Result<RoomLog> {
        let path = self.room_path(room);
        if !path.exists() {
            return Ok(RoomLog::default());
        }
        let bytes = fs::read(&path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save(&self, room: &str, log: &RoomLog) -> Result<()> {
        let path = self.room_path(room);
        let temp_path = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(log)?;
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Saved move log for room {} to {}", room, path.display());
        Ok(())
    }

    fn modify<T>(&self, room: &str, f: impl FnOnce(&mut RoomLog) -> Result<T>) -> Result<T> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let mut log = self.load(room)?;
        let value = f(&mut log)?;
        self.save(room, &log)?;
        Ok(value)
    }
}

#[async_trait]
impl MoveLogStore for FileMoveLog {
    async fn append(&self, room: &str, record: MoveRecord) -> Result<RecordId> {
        self.modify(room, |log| Ok(log.append(room, record)))
    }

    async fn query_unprocessed(
        &self,
        room: &str,
        exclude_actor: &CombatantId,
        self_id: &str,
    ) -> Result<Vec<MoveRecord>> {
        Ok(self.load(room)?.unprocessed(exclude_actor, self_id))
    }

    async fn mark_processed(&self, room: &str, record: &RecordId, self_id: &str) -> Result<()> {
        self.modify(room, |log| log.mark(room, record, self_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_survive_reopening() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bob = CombatantId::new("bob");

        {
            let log = FileMoveLog::new(dir.path()).expect("open");
            let id = log
                .append(
                    "room/1",
                    MoveRecord {
                        actor_id: CombatantId::new("alice"),
                        log_lines: vec!["[Turn 1] Alice uses Strike!".into()],
                        ..MoveRecord::default()
                    },
                )
                .await
                .expect("append");
            assert!(id.as_str().starts_with("room/1:"));
        }

        let log = FileMoveLog::new(dir.path()).expect("reopen");
        let pending = log.query_unprocessed("room/1", &bob, "bob").await.expect("query");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].room_id, "room/1");

        log.mark_processed("room/1", &pending[0].id, "bob")
            .await
            .expect("mark");
        assert!(
            log.query_unprocessed("room/1", &bob, "bob")
                .await
                .expect("query")
                .is_empty()
        );
        assert!(dir.path().join("room_room_1.json").exists());
        assert!(!dir.path().join("room_room_1.json.tmp").exists());
    }
}

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::errors::{AppError, AppResult};
use super::types::{NewNotification, NotificationRecord};
use super::NotificationStore;

/// In-process notification store
///
/// Records are owned by a user; operations on another user's record behave
/// as if the record did not exist.
#[derive(Debug, Default)]
pub struct MemoryNotificationStore {
    records: RwLock<Vec<NotificationRecord>>,
    next_id: AtomicU64,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, new: NewNotification) -> NotificationRecord {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let record = NotificationRecord {
            id: id.to_string(),
            user_id: new.user_id,
            kind: new.kind,
            title: new.title,
            message: new.message,
            related_entity: new.related_entity,
            is_read: false,
            created_at: Utc::now(),
        };
        self.records.write().await.push(record.clone());
        record
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<NotificationRecord>> {
        let mut records: Vec<NotificationRecord> = self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        // Insertion order breaks ties between identical timestamps
        records.reverse();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn mark_read(&self, user_id: &str, id: &str) -> AppResult<NotificationRecord> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id && r.user_id == user_id)
            .ok_or_else(|| AppError::NotificationNotFound { id: id.to_string() })?;
        record.is_read = true;
        Ok(record.clone())
    }

    async fn mark_all_read(&self, user_id: &str) -> AppResult<usize> {
        let mut records = self.records.write().await;
        let mut changed = 0;
        for record in records.iter_mut().filter(|r| r.user_id == user_id && !r.is_read) {
            record.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| !(r.id == id && r.user_id == user_id));
        if records.len() == before {
            return Err(AppError::NotificationNotFound { id: id.to_string() });
        }
        Ok(())
    }

    async fn unread_count(&self, user_id: &str) -> AppResult<usize> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.user_id == user_id && !r.is_read)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::types::NotificationKind;

    async fn seeded() -> MemoryNotificationStore {
        let store = MemoryNotificationStore::new();
        store
            .insert(NewNotification::new("alice", NotificationKind::Appointment, "Booked", "Mon 9am"))
            .await;
        store
            .insert(NewNotification::new("alice", NotificationKind::Payment, "Paid", "Receipt #12"))
            .await;
        store
            .insert(NewNotification::new("bob", NotificationKind::System, "Welcome", "Hello"))
            .await;
        store
    }

    #[tokio::test]
    async fn test_list_is_per_user_newest_first() {
        let store = seeded().await;
        let alice = store.list_for_user("alice").await.unwrap();

        assert_eq!(alice.len(), 2);
        assert_eq!(alice[0].title, "Paid");
        assert_eq!(alice[1].title, "Booked");
        assert!(store.list_for_user("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_read_and_counts() {
        let store = seeded().await;
        assert_eq!(store.unread_count("alice").await.unwrap(), 2);

        let first = store.list_for_user("alice").await.unwrap().remove(0);
        let updated = store.mark_read("alice", &first.id).await.unwrap();
        assert!(updated.is_read);
        assert_eq!(store.unread_count("alice").await.unwrap(), 1);

        assert_eq!(store.mark_all_read("alice").await.unwrap(), 1);
        assert_eq!(store.mark_all_read("alice").await.unwrap(), 0);
        assert_eq!(store.unread_count("bob").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_other_users_records_are_invisible() {
        let store = seeded().await;
        let bob_record = store.list_for_user("bob").await.unwrap().remove(0);

        assert!(matches!(
            store.mark_read("alice", &bob_record.id).await,
            Err(AppError::NotificationNotFound { .. })
        ));
        assert!(store.delete("alice", &bob_record.id).await.is_err());
        store.delete("bob", &bob_record.id).await.unwrap();
        assert!(store.list_for_user("bob").await.unwrap().is_empty());
    }
}

// Local store: one JSON array per entity in key/value storage
//
// Every mutation rewrites the full collection. Reads of a key that was never
// written persist and return the configured defaults.

use super::EntityStore;
use crate::db::KeyValueStorage;
use crate::entities::Entity;
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Return the collection stored under `key`, or write and return `defaults`
/// when nothing is stored yet.
///
/// A stored value that does not parse is reported as `StoreError::Corrupt`;
/// it is never replaced by the defaults. Callers sharing `storage` must
/// serialize calls, since seeding is a blind write.
pub fn get_collection<T>(storage: &dyn KeyValueStorage, key: &str, defaults: &[T]) -> Result<Vec<T>>
where
    T: Serialize + DeserializeOwned + Clone,
{
    match storage.get_item(key)? {
        Some(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        }),
        None => {
            debug!(key, rows = defaults.len(), "seeding collection");
            storage.set_item(key, &serde_json::to_string(defaults)?)?;
            Ok(defaults.to_vec())
        }
    }
}

pub struct LocalStore<E: Entity> {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    defaults: Vec<E>,
    // Held across read-modify-write so concurrent callers in this process
    // cannot drop each other's changes.
    write_lock: Mutex<()>,
}

impl<E: Entity> LocalStore<E> {
    /// Store seeded with the entity's example rows.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_defaults(storage, E::seed())
    }

    pub fn with_defaults(storage: Arc<dyn KeyValueStorage>, defaults: Vec<E>) -> Self {
        LocalStore {
            storage,
            key: E::COLLECTION_KEY.to_string(),
            defaults,
            write_lock: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Takes the write lock too: the first read of a fresh key seeds it.
    pub fn get(&self) -> Result<Vec<E>> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.load()
    }

    // Caller holds `write_lock`.
    fn load(&self) -> Result<Vec<E>> {
        get_collection(self.storage.as_ref(), &self.key, &self.defaults)
    }

    /// Append a new record with a fresh random id and return it.
    pub fn add(&self, new: E::New) -> Result<E> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut items = self.load()?;
        let item = E::from_new(uuid::Uuid::new_v4().to_string(), Utc::now(), new);
        items.push(item.clone());
        self.save(&items)?;

        debug!(kind = E::KIND, id = item.id(), "added");
        Ok(item)
    }

    /// No-op when no record has `id`.
    pub fn update(&self, id: &str, patch: &E::Patch) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut items = self.load()?;
        let mut matched = 0;
        for item in items.iter_mut().filter(|item| item.id() == id) {
            item.apply(patch);
            matched += 1;
        }
        self.save(&items)?;

        debug!(kind = E::KIND, id, matched, "updated");
        Ok(())
    }

    /// No-op when no record has `id`.
    pub fn delete(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut items = self.load()?;
        let before = items.len();
        items.retain(|item| item.id() != id);
        self.save(&items)?;

        debug!(kind = E::KIND, id, removed = before - items.len(), "deleted");
        Ok(())
    }

    fn save(&self, items: &[E]) -> Result<()> {
        self.storage
            .set_item(&self.key, &serde_json::to_string(items)?)
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for LocalStore<E> {
    fn backend_tag(&self) -> &'static str {
        "local"
    }

    async fn get(&self) -> Result<Vec<E>> {
        LocalStore::get(self)
    }

    async fn add(&self, new: E::New) -> Result<E> {
        LocalStore::add(self, new)
    }

    async fn update(&self, id: &str, patch: E::Patch) -> Result<()> {
        LocalStore::update(self, id, &patch)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        LocalStore::delete(self, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStorage, SqliteStorage};
    use crate::entities::{
        FinanceRecord, Member, MemberPatch, MemberStatus, NewFinanceRecord, NewMember,
        FinanceType,
    };
    use std::sync::mpsc;

    fn empty_members() -> LocalStore<Member> {
        LocalStore::with_defaults(Arc::new(MemoryStorage::new()), Vec::new())
    }

    #[test]
    fn test_member_lifecycle() {
        let store = empty_members();
        assert!(store.get().unwrap().is_empty());

        let created = store
            .add(NewMember {
                status: MemberStatus::Active,
                ..NewMember::new("Maria", "081200000000")
            })
            .unwrap();
        assert!(!created.id.is_empty());

        let members = store.get().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0], created);
        assert_eq!(members[0].status, MemberStatus::Active);

        store
            .update(
                &created.id,
                &MemberPatch {
                    status: Some(MemberStatus::Inactive),
                    ..Default::default()
                },
            )
            .unwrap();

        let members = store.get().unwrap();
        assert_eq!(members[0].status, MemberStatus::Inactive);
        assert_eq!(members[0].name, created.name);
        assert_eq!(members[0].phone, created.phone);
        assert_eq!(members[0].join_date, created.join_date);

        store.delete(&created.id).unwrap();
        assert!(store.get().unwrap().is_empty());
    }

    #[test]
    fn test_add_fields_equal_input() {
        let store = empty_members();
        let form = NewMember {
            email: "maria@email.com".to_string(),
            address: "Jl. Dago 1".to_string(),
            baptized: true,
            ..NewMember::new("Maria", "0812")
        };

        let created = store.add(form.clone()).unwrap();
        let stored = store.get().unwrap().remove(0);

        assert_eq!(stored.name, form.name);
        assert_eq!(stored.email, form.email);
        assert_eq!(stored.phone, form.phone);
        assert_eq!(stored.address, form.address);
        assert_eq!(stored.join_date, form.join_date);
        assert_eq!(stored.baptized, form.baptized);
        assert_eq!(stored.id, created.id);
    }

    #[test]
    fn test_ids_are_unique() {
        let store = empty_members();
        let a = store.add(NewMember::new("A", "1")).unwrap();
        let b = store.add(NewMember::new("B", "2")).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_first_get_seeds_and_persists() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let store: LocalStore<Member> = LocalStore::new(storage.clone());

        assert_eq!(storage.get_item("church_members").unwrap(), None);

        let members = store.get().unwrap();
        assert_eq!(members, Member::seed());
        assert!(storage.get_item("church_members").unwrap().is_some());
    }

    #[test]
    fn test_get_is_idempotent() {
        let store: LocalStore<Member> = LocalStore::new(Arc::new(MemoryStorage::new()));
        let first = store.get().unwrap();
        let second = store.get().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_seed_not_reapplied_after_delete_all() {
        let store: LocalStore<Member> = LocalStore::new(Arc::new(MemoryStorage::new()));
        for member in store.get().unwrap() {
            store.delete(&member.id).unwrap();
        }
        assert!(store.get().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let store: LocalStore<Member> = LocalStore::new(Arc::new(MemoryStorage::new()));
        let before = store.get().unwrap();

        store
            .update(
                "missing",
                &MemberPatch {
                    name: Some("Nobody".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        store.delete("missing").unwrap();

        assert_eq!(store.get().unwrap(), before);
    }

    #[test]
    fn test_update_leaves_other_records_untouched() {
        let store: LocalStore<Member> = LocalStore::new(Arc::new(MemoryStorage::new()));
        let before = store.get().unwrap();
        let target = before[1].id.clone();

        store
            .update(
                &target,
                &MemberPatch {
                    phone: Some("0800".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let after = store.get().unwrap();
        for (old, new) in before.iter().zip(after.iter()) {
            if old.id == target {
                assert_eq!(new.phone, "0800");
                assert_eq!(new.name, old.name);
            } else {
                assert_eq!(new, old);
            }
        }
    }

    #[test]
    fn test_corrupt_collection_is_reported() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        storage.set_item("church_members", "{not json").unwrap();

        let store: LocalStore<Member> = LocalStore::new(storage.clone());
        match store.get() {
            Err(StoreError::Corrupt { key, .. }) => assert_eq!(key, "church_members"),
            other => panic!("expected corrupt error, got {:?}", other),
        }

        // Stored value is left as-is
        assert_eq!(
            storage.get_item("church_members").unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[test]
    fn test_collections_are_independent() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let members: LocalStore<Member> = LocalStore::with_defaults(storage.clone(), Vec::new());
        let finance: LocalStore<FinanceRecord> = LocalStore::with_defaults(storage, Vec::new());

        members.add(NewMember::new("Maria", "0812")).unwrap();
        finance
            .add(NewFinanceRecord::new(FinanceType::Income, "Donasi", 250_000))
            .unwrap();

        assert_eq!(members.get().unwrap().len(), 1);
        assert_eq!(finance.get().unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_adds_are_not_lost() {
        let store: Arc<LocalStore<Member>> = Arc::new(empty_members());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .add(NewMember::new(format!("Member {}", i), "0812"))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get().unwrap().len(), 8);
    }

    /// Parks the first `get_item` call after it has read the key, until released.
    struct Stalling {
        inner: MemoryStorage,
        first_read: Mutex<Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>>,
    }

    impl KeyValueStorage for Stalling {
        fn get_item(&self, key: &str) -> Result<Option<String>> {
            let value = self.inner.get_item(key)?;
            let parked = self.first_read.lock().unwrap().take();
            if let Some((read_done, release)) = parked {
                read_done.send(()).unwrap();
                release.recv().unwrap();
            }
            Ok(value)
        }

        fn set_item(&self, key: &str, value: &str) -> Result<()> {
            self.inner.set_item(key, value)
        }

        fn remove_item(&self, key: &str) -> Result<()> {
            self.inner.remove_item(key)
        }
    }

    #[test]
    fn test_first_get_seeding_does_not_overwrite_concurrent_add() {
        let (read_done_tx, read_done_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let storage = Arc::new(Stalling {
            inner: MemoryStorage::new(),
            first_read: Mutex::new(Some((read_done_tx, release_rx))),
        });
        let store: Arc<LocalStore<Member>> = Arc::new(LocalStore::with_defaults(storage, Vec::new()));

        let reader = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || store.get().unwrap())
        };
        // Reader has seen the key missing and is about to seed.
        read_done_rx.recv().unwrap();

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || store.add(NewMember::new("Maria", "0812")).unwrap())
        };
        std::thread::sleep(std::time::Duration::from_millis(50));
        release_tx.send(()).unwrap();

        assert!(reader.join().unwrap().is_empty());
        let added = writer.join().unwrap();

        let members = store.get().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].id, added.id);
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let store: Arc<dyn EntityStore<Member>> = Arc::new(empty_members());
        assert_eq!(store.backend_tag(), "local");

        let created = store.add(NewMember::new("Maria", "0812")).await.unwrap();
        assert_eq!(store.get().await.unwrap().len(), 1);

        store.delete(&created.id).await.unwrap();
        assert!(store.get().await.unwrap().is_empty());
    }
}

// Registries - validation in front of a store
//
// Pages never talk to a store directly: input is checked here first and a
// rejected payload never reaches the backend.

use crate::db::KeyValueStorage;
use crate::entities::{ChurchEvent, Entity, FinanceRecord, Member};
use crate::error::{Result, StoreError};
use crate::store::{EntityStore, LocalStore, RemoteStore, RestClient};
use crate::validation::{describe, Validate};
use crate::views::DashboardSummary;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Registry<E: Entity> {
    store: Arc<dyn EntityStore<E>>,
}

impl<E: Entity> Clone for Registry<E> {
    fn clone(&self) -> Self {
        Registry {
            store: Arc::clone(&self.store),
        }
    }
}

impl<E: Entity> Registry<E> {
    pub fn new(store: Arc<dyn EntityStore<E>>) -> Self {
        Registry { store }
    }

    pub fn backend_tag(&self) -> &'static str {
        self.store.backend_tag()
    }

    pub async fn all(&self) -> Result<Vec<E>> {
        self.store.get().await
    }

    pub async fn find(&self, id: &str) -> Result<Option<E>> {
        Ok(self.all().await?.into_iter().find(|item| item.id() == id))
    }

    pub async fn create(&self, new: E::New) -> Result<E> {
        if let Err(errors) = new.validate() {
            warn!(kind = E::KIND, errors = %describe(&errors), "rejected create");
            return Err(StoreError::Validation(errors));
        }

        let created = self.store.add(new).await?;
        info!(kind = E::KIND, id = created.id(), backend = self.backend_tag(), "created");
        Ok(created)
    }

    pub async fn update(&self, id: &str, patch: E::Patch) -> Result<()> {
        if let Err(errors) = patch.validate() {
            warn!(kind = E::KIND, id, errors = %describe(&errors), "rejected update");
            return Err(StoreError::Validation(errors));
        }

        self.store.update(id, patch).await?;
        info!(kind = E::KIND, id, backend = self.backend_tag(), "updated");
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(id).await?;
        info!(kind = E::KIND, id, backend = self.backend_tag(), "deleted");
        Ok(())
    }
}

/// The three registries, built once at startup and shared by reference.
#[derive(Clone)]
pub struct ChurchRegistry {
    pub members: Registry<Member>,
    pub events: Registry<ChurchEvent>,
    pub finance: Registry<FinanceRecord>,
}

impl ChurchRegistry {
    /// Local collections, seeded with example rows on first use.
    pub fn local(storage: Arc<dyn KeyValueStorage>) -> Self {
        ChurchRegistry {
            members: Registry::new(Arc::new(LocalStore::<Member>::new(storage.clone()))),
            events: Registry::new(Arc::new(LocalStore::<ChurchEvent>::new(storage.clone()))),
            finance: Registry::new(Arc::new(LocalStore::<FinanceRecord>::new(storage))),
        }
    }

    /// Local collections that start empty.
    pub fn local_unseeded(storage: Arc<dyn KeyValueStorage>) -> Self {
        ChurchRegistry {
            members: Registry::new(Arc::new(LocalStore::<Member>::with_defaults(
                storage.clone(),
                Vec::new(),
            ))),
            events: Registry::new(Arc::new(LocalStore::<ChurchEvent>::with_defaults(
                storage.clone(),
                Vec::new(),
            ))),
            finance: Registry::new(Arc::new(LocalStore::<FinanceRecord>::with_defaults(
                storage,
                Vec::new(),
            ))),
        }
    }

    pub fn remote(client: RestClient) -> Self {
        ChurchRegistry {
            members: Registry::new(Arc::new(RemoteStore::<Member>::new(client.clone()))),
            events: Registry::new(Arc::new(RemoteStore::<ChurchEvent>::new(client.clone()))),
            finance: Registry::new(Arc::new(RemoteStore::<FinanceRecord>::new(client))),
        }
    }

    /// Fetch all three collections and summarise them for the home page.
    pub async fn dashboard(&self) -> Result<DashboardSummary> {
        let members = self.members.all().await?;
        let events = self.events.all().await?;
        let finance = self.finance.all().await?;
        Ok(DashboardSummary::build(&members, &events, &finance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStorage;
    use crate::entities::{
        FinanceRecordPatch, FinanceType, MemberPatch, NewChurchEvent, NewFinanceRecord,
        NewMember,
    };

    fn registry() -> ChurchRegistry {
        ChurchRegistry::local_unseeded(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn test_zero_amount_never_reaches_store() {
        let registry = registry();
        let before = registry.finance.all().await.unwrap();

        let err = registry
            .finance
            .create(NewFinanceRecord::new(FinanceType::Income, "Persembahan Minggu", 0))
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(registry.finance.all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_create_valid_records() {
        let registry = registry();

        registry
            .members
            .create(NewMember::new("Maria", "0812"))
            .await
            .unwrap();
        registry
            .events
            .create(NewChurchEvent::new("Ibadah Minggu", "2026-04-26"))
            .await
            .unwrap();
        registry
            .finance
            .create(NewFinanceRecord::new(FinanceType::Expense, "Operasional", 150_000))
            .await
            .unwrap();

        assert_eq!(registry.members.all().await.unwrap().len(), 1);
        assert_eq!(registry.events.all().await.unwrap().len(), 1);
        assert_eq!(registry.finance.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_patch_rejected() {
        let registry = registry();
        let member = registry
            .members
            .create(NewMember::new("Maria", "0812"))
            .await
            .unwrap();

        let err = registry
            .members
            .update(
                &member.id,
                MemberPatch {
                    phone: Some("   ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let stored = registry.members.find(&member.id).await.unwrap().unwrap();
        assert_eq!(stored.phone, "0812");
    }

    #[tokio::test]
    async fn test_update_then_refetch() {
        let registry = registry();
        let record = registry
            .finance
            .create(NewFinanceRecord::new(FinanceType::Income, "Donasi", 100_000))
            .await
            .unwrap();

        registry
            .finance
            .update(
                &record.id,
                FinanceRecordPatch {
                    amount: Some(125_000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stored = registry.finance.find(&record.id).await.unwrap().unwrap();
        assert_eq!(stored.amount, 125_000);
        assert_eq!(stored.category, "Donasi");
    }

    #[tokio::test]
    async fn test_seeded_dashboard() {
        let registry = ChurchRegistry::local(Arc::new(MemoryStorage::new()));
        let summary = registry.dashboard().await.unwrap();

        assert_eq!(summary.total_members, 4);
        assert_eq!(summary.active_members, 3);
        assert_eq!(summary.total_events, 4);
        assert_eq!(summary.total_income, 21_250_000);
        assert_eq!(summary.balance, 21_250_000 - 6_800_000);
        assert_eq!(registry.members.backend_tag(), "local");
    }
}

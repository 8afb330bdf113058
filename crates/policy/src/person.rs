use std::sync::Arc;

use approvals_model::PersonIdentification;
use approvals_storage::{PersonIdentificationStore, StorageError};
use async_trait::async_trait;

use crate::cache::LookupCache;

/// Cache key: one lookup namespace per variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PersonKey {
    Hanford(String),
    Employee(String),
    /// Domain and network id, lower-cased.
    Network(String, String),
}

impl PersonKey {
    fn network(domain: &str, network_id: &str) -> Self {
        PersonKey::Network(domain.to_lowercase(), network_id.to_lowercase())
    }
}

/// A person identification store that serves repeated lookups from a TTL
/// cache.
pub struct CachedPersonIdentificationStore {
    inner: Arc<dyn PersonIdentificationStore>,
    cache: Arc<dyn LookupCache<PersonKey, PersonIdentification>>,
}

impl CachedPersonIdentificationStore {
    pub fn new(
        inner: Arc<dyn PersonIdentificationStore>,
        cache: Arc<dyn LookupCache<PersonKey, PersonIdentification>>,
    ) -> Self {
        Self { inner, cache }
    }

    /// Store a found person under every key it can be looked up by.
    async fn remember(&self, found: Option<PersonIdentification>) -> Option<PersonIdentification> {
        if let Some(person) = &found {
            self.cache
                .insert(PersonKey::Hanford(person.hanford_id.clone()), person.clone())
                .await;
            self.cache
                .insert(PersonKey::Employee(person.employee_id.clone()), person.clone())
                .await;
            self.cache
                .insert(
                    PersonKey::network(&person.domain, &person.network_id),
                    person.clone(),
                )
                .await;
        }
        found
    }
}

fn require(name: &str, value: &str) -> Result<(), StorageError> {
    if value.trim().is_empty() {
        return Err(StorageError::InvalidArgument(format!("{name} is required")));
    }
    Ok(())
}

#[async_trait]
impl PersonIdentificationStore for CachedPersonIdentificationStore {
    async fn get_by_hanford_id(
        &self,
        hanford_id: &str,
    ) -> Result<Option<PersonIdentification>, StorageError> {
        require("hanford id", hanford_id)?;
        let key = PersonKey::Hanford(hanford_id.to_string());
        if let Some(hit) = self.cache.get(&key).await {
            return Ok(Some(hit));
        }
        let found = self.inner.get_by_hanford_id(hanford_id).await?;
        Ok(self.remember(found).await)
    }

    async fn get_by_employee_id(
        &self,
        employee_id: &str,
    ) -> Result<Option<PersonIdentification>, StorageError> {
        require("employee id", employee_id)?;
        let key = PersonKey::Employee(employee_id.to_string());
        if let Some(hit) = self.cache.get(&key).await {
            return Ok(Some(hit));
        }
        let found = self.inner.get_by_employee_id(employee_id).await?;
        Ok(self.remember(found).await)
    }

    async fn get_by_network_id(
        &self,
        domain: &str,
        network_id: &str,
    ) -> Result<Option<PersonIdentification>, StorageError> {
        require("domain", domain)?;
        require("network id", network_id)?;
        let key = PersonKey::network(domain, network_id);
        if let Some(hit) = self.cache.get(&key).await {
            return Ok(Some(hit));
        }
        let found = self.inner.get_by_network_id(domain, network_id).await?;
        Ok(self.remember(found).await)
    }

    /// Cached entries are matched by Hanford id, then employee id, then
    /// network id before the backing store is asked.
    async fn get_by_id(&self, id: &str) -> Result<Option<PersonIdentification>, StorageError> {
        require("id", id)?;
        let by_hanford = |p: &PersonIdentification| p.hanford_id == id;
        let by_employee = |p: &PersonIdentification| p.employee_id == id;
        let by_network = |p: &PersonIdentification| p.network_id.eq_ignore_ascii_case(id);
        for predicate in [
            &by_hanford as &(dyn for<'a> Fn(&'a PersonIdentification) -> bool + Send + Sync),
            &by_employee,
            &by_network,
        ] {
            if let Some(hit) = self.cache.find(predicate).await {
                return Ok(Some(hit));
            }
        }
        let found = self.inner.get_by_id(id).await?;
        Ok(self.remember(found).await)
    }
}

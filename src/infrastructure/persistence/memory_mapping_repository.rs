//! In-process mapping repository.
//!
//! Used for local development (`STORAGE_BACKEND=memory`) and tests. Contents are lost
//! on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::entities::{Mapping, NewMapping, StoreSummary};
use crate::domain::repositories::{
    MappingRepository, ORIGINAL_URL_CONSTRAINT, SHORT_CODE_CONSTRAINT,
};
use crate::error::AppError;

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    by_code: HashMap<String, Mapping>,
    code_by_url: HashMap<String, String>,
    code_by_id: HashMap<i64, String>,
}

impl Tables {
    fn get_by_id_mut(&mut self, id: i64) -> Option<&mut Mapping> {
        let code = self.code_by_id.get(&id)?;
        self.by_code.get_mut(code)
    }

    fn remove(&mut self, code: &str) -> Option<Mapping> {
        let removed = self.by_code.remove(code)?;
        self.code_by_url.remove(&removed.original_url);
        self.code_by_id.remove(&removed.id);
        Some(removed)
    }
}

/// Mapping store held in memory behind a single lock.
///
/// Enforces the same uniqueness constraints as the PostgreSQL schema and reports
/// violations with the same constraint names. The lock is never held across an await.
#[derive(Debug, Default)]
pub struct MemoryMappingRepository {
    tables: RwLock<Tables>,
}

impl MemoryMappingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, AppError> {
        self.tables
            .read()
            .map_err(|_| AppError::internal("Mapping store lock poisoned", json!({})))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, AppError> {
        self.tables
            .write()
            .map_err(|_| AppError::internal("Mapping store lock poisoned", json!({})))
    }
}

fn unique_violation(constraint: &str) -> AppError {
    AppError::conflict(
        "Unique constraint violation",
        json!({ "constraint": constraint }),
    )
}

#[async_trait]
impl MappingRepository for MemoryMappingRepository {
    async fn create(&self, new_mapping: NewMapping) -> Result<Mapping, AppError> {
        let mut tables = self.write()?;

        if tables.by_code.contains_key(&new_mapping.short_code) {
            return Err(unique_violation(SHORT_CODE_CONSTRAINT));
        }
        if tables.code_by_url.contains_key(&new_mapping.original_url) {
            return Err(unique_violation(ORIGINAL_URL_CONSTRAINT));
        }

        tables.next_id += 1;
        let mapping = new_mapping.into_mapping(tables.next_id);

        tables
            .code_by_url
            .insert(mapping.original_url.clone(), mapping.short_code.clone());
        tables
            .code_by_id
            .insert(mapping.id, mapping.short_code.clone());
        tables
            .by_code
            .insert(mapping.short_code.clone(), mapping.clone());

        Ok(mapping)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Mapping>, AppError> {
        Ok(self.read()?.by_code.get(code).cloned())
    }

    async fn find_by_original_url(
        &self,
        original_url: &str,
    ) -> Result<Option<Mapping>, AppError> {
        let tables = self.read()?;
        Ok(tables
            .code_by_url
            .get(original_url)
            .and_then(|code| tables.by_code.get(code))
            .cloned())
    }

    async fn code_exists(&self, code: &str) -> Result<bool, AppError> {
        Ok(self.read()?.by_code.contains_key(code))
    }

    async fn update_expiry(
        &self,
        id: i64,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Mapping, AppError> {
        let mut tables = self.write()?;
        let mapping = tables
            .get_by_id_mut(id)
            .ok_or_else(|| AppError::not_found("Mapping not found", json!({ "id": id })))?;

        mapping.expires_at = expires_at;
        Ok(mapping.clone())
    }

    async fn increment_clicks(&self, code: &str) -> Result<Option<Mapping>, AppError> {
        let mut tables = self.write()?;
        Ok(tables.by_code.get_mut(code).map(|m| {
            m.clicks += 1;
            m.clone()
        }))
    }

    async fn delete_if_expired(&self, id: i64, now: DateTime<Utc>) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        let code = tables
            .get_by_id_mut(id)
            .filter(|m| m.is_expired_at(now))
            .map(|m| m.short_code.clone());

        Ok(code.and_then(|code| tables.remove(&code)).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tables = self.write()?;
        let expired: Vec<String> = tables
            .by_code
            .values()
            .filter(|m| m.is_expired_at(now))
            .map(|m| m.short_code.clone())
            .collect();

        for code in &expired {
            tables.remove(code);
        }

        Ok(expired.len() as u64)
    }

    async fn summary(&self, now: DateTime<Utc>) -> Result<StoreSummary, AppError> {
        let tables = self.read()?;
        Ok(StoreSummary {
            mappings: tables.by_code.len() as i64,
            expired: tables
                .by_code
                .values()
                .filter(|m| m.is_expired_at(now))
                .count() as i64,
            clicks: tables.by_code.values().map(|m| m.clicks).sum(),
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.read().map(|_| ())
    }
}

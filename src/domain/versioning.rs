//! Optimistic concurrency protocol shared by every versioned entity.
//!
//! Each row carries a `version` that grows by one per successful mutation.
//! A write names the version it was based on and applies only if that is
//! still the persisted one (`WHERE id = $1 AND version = $2`). Storage
//! adapters supply the single-statement primitives through [`VersionedRows`];
//! the functions here decide what a missed compare-and-swap means.
//!
//! A swap that touches no row is always followed by an existence check, so
//! `NotFound` and `VersionConflict` are reported consistently for users,
//! addresses and contacts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::status::EntityStatus;
use crate::domain::validation::require_id;

/// Version and timestamp written by a successful swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VersionStamp {
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

/// Current status of a row together with its concurrency token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionedStatus {
    pub status: EntityStatus,
    pub stamp: VersionStamp,
}

/// Outcome of a disable/enable request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub status: EntityStatus,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
    /// `false` when the row was already in the requested state
    pub changed: bool,
}

/// Row-level primitives of one versioned table
#[async_trait]
pub trait VersionedRows: Send + Sync {
    /// Entity name used in errors and logs
    fn entity(&self) -> &'static str;

    async fn exists(&self, id: i64) -> StoreResult<bool>;

    async fn read_status(&self, id: i64) -> StoreResult<Option<VersionedStatus>>;

    /// Sets `status` and bumps the version if `version == expected`.
    ///
    /// Returns `None` when no row matched.
    async fn swap_status(
        &self,
        id: i64,
        expected: i64,
        status: EntityStatus,
    ) -> StoreResult<Option<VersionStamp>>;
}

/// Explains why a compare-and-swap touched no row.
pub async fn settle_missed_swap<R>(rows: &R, id: i64, expected: i64) -> StoreError
where
    R: VersionedRows + ?Sized,
{
    match rows.exists(id).await {
        Ok(true) => {
            warn!(
                entity = rows.entity(),
                id, expected, "version conflict on optimistic update"
            );
            StoreError::VersionConflict {
                entity: rows.entity(),
                id,
                expected,
            }
        }
        Ok(false) => StoreError::NotFound {
            entity: rows.entity(),
            id,
        },
        Err(e) => e,
    }
}

/// Turns the result of a compare-and-swap into the new stamp or the
/// matching error.
pub async fn finish_swap<R>(
    rows: &R,
    id: i64,
    expected: i64,
    swapped: Option<VersionStamp>,
) -> StoreResult<VersionStamp>
where
    R: VersionedRows + ?Sized,
{
    match swapped {
        Some(stamp) => Ok(stamp),
        None => Err(settle_missed_swap(rows, id, expected).await),
    }
}

/// Moves a row to `target`, writing only when the status actually changes.
///
/// An already matching row is reported with `changed: false` and keeps its
/// version, so redundant toggles never cause version churn.
pub async fn set_status<R>(rows: &R, id: i64, target: EntityStatus) -> StoreResult<StatusChange>
where
    R: VersionedRows + ?Sized,
{
    require_id(rows.entity(), id)?;

    let current = rows.read_status(id).await?.ok_or(StoreError::NotFound {
        entity: rows.entity(),
        id,
    })?;

    if current.status == target {
        debug!(entity = rows.entity(), id, status = %target, "status already set, skipping write");
        return Ok(StatusChange {
            status: target,
            version: current.stamp.version,
            updated_at: current.stamp.updated_at,
            changed: false,
        });
    }

    let swapped = rows.swap_status(id, current.stamp.version, target).await?;
    let stamp = finish_swap(rows, id, current.stamp.version, swapped).await?;

    info!(entity = rows.entity(), id, status = %target, version = stamp.version, "status changed");
    Ok(StatusChange {
        status: target,
        version: stamp.version,
        updated_at: stamp.updated_at,
        changed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeRows {
        rows: Mutex<HashMap<i64, VersionedStatus>>,
        writes: Mutex<usize>,
        /// Bumps the stored version right before the next swap
        interfere: Mutex<bool>,
    }

    impl FakeRows {
        fn with_row(id: i64, status: EntityStatus, version: i64) -> Self {
            let fake = Self::default();
            fake.rows.lock().unwrap().insert(
                id,
                VersionedStatus {
                    status,
                    stamp: VersionStamp {
                        version,
                        updated_at: Utc::now(),
                    },
                },
            );
            fake
        }

        fn version(&self, id: i64) -> i64 {
            self.rows.lock().unwrap()[&id].stamp.version
        }

        fn writes(&self) -> usize {
            *self.writes.lock().unwrap()
        }
    }

    #[async_trait]
    impl VersionedRows for FakeRows {
        fn entity(&self) -> &'static str {
            "user"
        }

        async fn exists(&self, id: i64) -> StoreResult<bool> {
            Ok(self.rows.lock().unwrap().contains_key(&id))
        }

        async fn read_status(&self, id: i64) -> StoreResult<Option<VersionedStatus>> {
            Ok(self.rows.lock().unwrap().get(&id).copied())
        }

        async fn swap_status(
            &self,
            id: i64,
            expected: i64,
            status: EntityStatus,
        ) -> StoreResult<Option<VersionStamp>> {
            let mut rows = self.rows.lock().unwrap();
            if std::mem::take(&mut *self.interfere.lock().unwrap()) {
                if let Some(row) = rows.get_mut(&id) {
                    row.stamp.version += 1;
                }
            }
            match rows.get_mut(&id) {
                Some(row) if row.stamp.version == expected => {
                    row.status = status;
                    row.stamp = VersionStamp {
                        version: expected + 1,
                        updated_at: Utc::now(),
                    };
                    *self.writes.lock().unwrap() += 1;
                    Ok(Some(row.stamp))
                }
                _ => Ok(None),
            }
        }
    }

    #[tokio::test]
    async fn enabling_an_enabled_row_writes_nothing() {
        let rows = FakeRows::with_row(1, EntityStatus::Enabled, 3);

        let change = set_status(&rows, 1, EntityStatus::Enabled).await.unwrap();

        assert!(!change.changed);
        assert_eq!(change.version, 3);
        assert_eq!(rows.writes(), 0);
        assert_eq!(rows.version(1), 3);
    }

    #[tokio::test]
    async fn enabling_a_disabled_row_writes_once() {
        let rows = FakeRows::with_row(1, EntityStatus::Disabled, 3);

        let change = set_status(&rows, 1, EntityStatus::Enabled).await.unwrap();

        assert!(change.changed);
        assert_eq!(change.version, 4);
        assert_eq!(rows.writes(), 1);
        assert_eq!(rows.version(1), 4);
    }

    #[tokio::test]
    async fn toggling_a_missing_row_is_not_found() {
        let rows = FakeRows::default();

        let err = set_status(&rows, 42, EntityStatus::Disabled).await.unwrap_err();

        assert!(matches!(err, StoreError::NotFound { entity: "user", id: 42 }));
    }

    #[tokio::test]
    async fn toggling_zero_id_fails_before_io() {
        let rows = FakeRows::default();
        let err = set_status(&rows, 0, EntityStatus::Disabled).await.unwrap_err();
        assert!(matches!(err, StoreError::ZeroId("user")));
    }

    #[tokio::test]
    async fn concurrent_write_between_read_and_swap_is_a_conflict() {
        let rows = FakeRows::with_row(1, EntityStatus::Enabled, 0);
        *rows.interfere.lock().unwrap() = true;

        let err = set_status(&rows, 1, EntityStatus::Disabled).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::VersionConflict { id: 1, expected: 0, .. }
        ));
        assert_eq!(rows.writes(), 0);
    }

    #[tokio::test]
    async fn missed_swap_distinguishes_missing_from_stale() {
        let rows = FakeRows::with_row(1, EntityStatus::Enabled, 5);

        let stale = finish_swap(&rows, 1, 4, None).await.unwrap_err();
        let missing = finish_swap(&rows, 2, 4, None).await.unwrap_err();

        assert!(stale.is_version_conflict());
        assert!(missing.is_not_found());
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage)
//! - Phase states (per-user progression)
//! - Daily earnings (per-user, per-day accrual records)

use crate::db::collections;
use crate::engine::RewardSchedule;
use crate::error::AppError;
use crate::models::{apply_step_sync, DailyEarningRecord, SyncOutcome, User, UserPhaseState};
use chrono::{DateTime, NaiveDate, Utc};
use firestore::FirestoreConsistencySelector;
use futures_util::{stream, StreamExt};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Commits that lose a race with another instance are retried this many times.
const MAX_TRANSACTION_ATTEMPTS: u32 = 5;
const TRANSACTION_RETRY_BASE: Duration = Duration::from_millis(50);
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // The emulator accepts any bearer token.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user profile.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        read_doc(self.get_client()?, collections::USERS, user_id).await
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.user_id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Fetch several profiles, skipping users without one.
    pub async fn get_users_by_ids(
        &self,
        user_ids: &[String],
    ) -> Result<HashMap<String, User>, AppError> {
        let users = stream::iter(user_ids.iter())
            .map(|user_id| self.get_user(user_id))
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .boxed()
            .collect::<Vec<Result<Option<User>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<User>>, AppError>>()?;

        Ok(users
            .into_iter()
            .flatten()
            .map(|user| (user.user_id.clone(), user))
            .collect())
    }

    // ─── Phase State Operations ──────────────────────────────────

    /// Get a user's phase state.
    pub async fn get_phase_state(&self, user_id: &str) -> Result<Option<UserPhaseState>, AppError> {
        read_doc(self.get_client()?, collections::PHASE_STATES, user_id).await
    }

    /// Highest lifetime step totals, descending.
    pub async fn get_top_phase_states(&self, limit: u32) -> Result<Vec<UserPhaseState>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::PHASE_STATES)
            .order_by([(
                "total_lifetime_steps",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Daily Earning Operations ────────────────────────────────

    /// Get one day's record for a user.
    pub async fn get_daily_earning(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyEarningRecord>, AppError> {
        read_doc(
            self.get_client()?,
            collections::DAILY_EARNINGS,
            &DailyEarningRecord::document_id(user_id, date),
        )
        .await
    }

    /// Most recent daily records for a user, newest first.
    pub async fn get_earnings_for_user(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<DailyEarningRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::DAILY_EARNINGS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([("date", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store multiple daily records.
    ///
    /// Uses concurrent writes with a limit to avoid overloading Firestore.
    pub async fn batch_set_daily_earnings(
        &self,
        records: &[DailyEarningRecord],
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        stream::iter(records.iter())
            .map(|record| async move {
                let doc_id = DailyEarningRecord::document_id(&record.user_id, record.date);

                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::DAILY_EARNINGS)
                    .document_id(&doc_id)
                    .object(record)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .boxed()
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }

    // ─── Atomic Step Processing ──────────────────────────────────

    /// Atomically apply a step sync: update the day record, the phase state
    /// and the user profile together.
    ///
    /// All three documents are read inside the transaction, so a concurrent
    /// sync from another instance makes one of the commits fail; that attempt
    /// is rebuilt from fresh reads. Callers still serialise syncs for the same
    /// user within an instance (see `StepService`).
    pub async fn record_steps_atomic(
        &self,
        user_id: &str,
        date: NaiveDate,
        reported_steps: i64,
        schedule: &RewardSchedule,
        now: DateTime<Utc>,
    ) -> Result<SyncOutcome, AppError> {
        for attempt in 1..=MAX_TRANSACTION_ATTEMPTS {
            if let Some(outcome) = self
                .try_record_steps(user_id, date, reported_steps, schedule, now)
                .await?
            {
                tracing::debug!(
                    user_id,
                    date = %date,
                    attempt,
                    new_steps = outcome.new_steps,
                    lifetime_steps = outcome.state.total_lifetime_steps,
                    "Step sync committed"
                );
                return Ok(outcome);
            }
            tokio::time::sleep(TRANSACTION_RETRY_BASE * attempt).await;
        }

        Err(AppError::Database(format!(
            "Step sync for {} did not commit after {} attempts",
            user_id, MAX_TRANSACTION_ATTEMPTS
        )))
    }

    /// One transaction attempt. `Ok(None)` means the commit failed and the
    /// attempt may be retried.
    async fn try_record_steps(
        &self,
        user_id: &str,
        date: NaiveDate,
        reported_steps: i64,
        schedule: &RewardSchedule,
        now: DateTime<Utc>,
    ) -> Result<Option<SyncOutcome>, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
        let reader = transaction_reader(client, &transaction);
        let doc_id = DailyEarningRecord::document_id(user_id, date);

        // 1. Read current documents within the transaction
        let reads = async {
            let state: Option<UserPhaseState> =
                read_doc(&reader, collections::PHASE_STATES, user_id).await?;
            let record: Option<DailyEarningRecord> =
                read_doc(&reader, collections::DAILY_EARNINGS, &doc_id).await?;
            let profile: Option<User> = read_doc(&reader, collections::USERS, user_id).await?;
            Ok::<_, AppError>((state, record, profile))
        };
        let (state, record, profile) = match reads.await {
            Ok(docs) => docs,
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(e);
            }
        };

        // 2. Apply the sync in memory
        let applied = apply_step_sync(user_id, date, reported_steps, state, record, schedule, now);
        let outcome = match applied {
            Ok(outcome) => outcome,
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(e.into());
            }
        };

        let mut profile = profile.unwrap_or_else(|| User::new(user_id, now));
        profile.last_active = now;

        // 3. Add writes to the transaction
        client
            .fluent()
            .update()
            .in_col(collections::DAILY_EARNINGS)
            .document_id(&doc_id)
            .object(&outcome.record)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add earning to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::PHASE_STATES)
            .document_id(user_id)
            .object(&outcome.state)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add phase state to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(&profile)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add profile to transaction: {}", e))
            })?;

        // 4. Commit
        if let Err(e) = transaction.commit().await {
            tracing::warn!(user_id, date = %date, error = %e, "Step sync commit failed");
            return Ok(None);
        }

        Ok(Some(outcome))
    }

    /// Redeem a pending day, expiring it first if it has fallen out of the
    /// redemption window.
    pub async fn redeem_earning_atomic(
        &self,
        user_id: &str,
        date: NaiveDate,
        expiry_days: i64,
        now: DateTime<Utc>,
    ) -> Result<DailyEarningRecord, AppError> {
        for attempt in 1..=MAX_TRANSACTION_ATTEMPTS {
            if let Some(record) = self
                .try_redeem_earning(user_id, date, expiry_days, now)
                .await?
            {
                return Ok(record);
            }
            tokio::time::sleep(TRANSACTION_RETRY_BASE * attempt).await;
        }

        Err(AppError::Database(format!(
            "Redemption of {} for {} did not commit after {} attempts",
            date, user_id, MAX_TRANSACTION_ATTEMPTS
        )))
    }

    async fn try_redeem_earning(
        &self,
        user_id: &str,
        date: NaiveDate,
        expiry_days: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<DailyEarningRecord>, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
        let reader = transaction_reader(client, &transaction);
        let doc_id = DailyEarningRecord::document_id(user_id, date);

        let existing: Option<DailyEarningRecord> =
            match read_doc(&reader, collections::DAILY_EARNINGS, &doc_id).await {
                Ok(existing) => existing,
                Err(e) => {
                    let _ = transaction.rollback().await;
                    return Err(e);
                }
            };
        let Some(mut record) = existing else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("No earnings for {}", date)));
        };

        let expired = record.expire_if_stale(now.date_naive(), expiry_days, now);
        let redeemed = record.redeem(now);

        if let Err(e) = &redeemed {
            if !expired {
                let _ = transaction.rollback().await;
                return Err(e.clone().into());
            }
        }

        // Persist the expiry even when redemption is refused because of it.
        client
            .fluent()
            .update()
            .in_col(collections::DAILY_EARNINGS)
            .document_id(&doc_id)
            .object(&record)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add earning to transaction: {}", e))
            })?;

        if let Err(e) = transaction.commit().await {
            tracing::warn!(user_id, date = %date, error = %e, "Redemption commit failed");
            return Ok(None);
        }

        let coins = redeemed?;
        tracing::info!(user_id, date = %date, coins, "Earning redeemed");

        Ok(Some(record))
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    // ─── User Data Deletion ────────────────────────────────────────

    /// Delete ALL data for a user.
    ///
    /// Deletes from all collections:
    /// - `daily_earnings` (query by user_id)
    /// - `phase_states/{user_id}`
    /// - `users/{user_id}`
    ///
    /// Returns the number of documents deleted.
    pub async fn delete_user_data(&self, user_id: &str) -> Result<usize, AppError> {
        let mut deleted_count = 0;

        // 1. Delete all daily earnings
        let earnings: Vec<DailyEarningRecord> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::DAILY_EARNINGS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let count = earnings.len();
        self.batch_delete(
            &earnings,
            collections::DAILY_EARNINGS,
            |record: &DailyEarningRecord| {
                DailyEarningRecord::document_id(&record.user_id, record.date)
            },
        )
        .await?;

        deleted_count += count;
        tracing::debug!(user_id, count, "Deleted daily earnings");

        // 2. Delete phase state
        let had_state = self.get_phase_state(user_id).await?.is_some();
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::PHASE_STATES)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        if had_state {
            deleted_count += 1;
            tracing::debug!(user_id, "Deleted phase state");
        }

        // 3. Delete user profile
        let had_profile = self.get_user(user_id).await?.is_some();
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        if had_profile {
            deleted_count += 1;
            tracing::debug!(user_id, "Deleted user profile");
        }

        tracing::info!(user_id, deleted_count, "User data deletion complete");

        Ok(deleted_count)
    }
}

/// Client whose reads join `transaction`, so Firestore detects conflicting
/// writes to the documents read.
fn transaction_reader(
    client: &firestore::FirestoreDb,
    transaction: &firestore::FirestoreTransaction<'_>,
) -> firestore::FirestoreDb {
    client.clone_with_consistency_selector(FirestoreConsistencySelector::Transaction(
        transaction.transaction_id().clone(),
    ))
}

/// Fetch one document by ID.
async fn read_doc<T>(
    client: &firestore::FirestoreDb,
    collection: &str,
    doc_id: &str,
) -> Result<Option<T>, AppError>
where
    T: DeserializeOwned + Send,
{
    client
        .fluent()
        .select()
        .by_id_in(collection)
        .obj()
        .one(doc_id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

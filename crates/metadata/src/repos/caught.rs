//! Caught set repository.

use crate::error::MetadataResult;
use async_trait::async_trait;
use dextrack_core::{CaughtChange, CaughtSet, User};

/// Repository for per-generation caught sets.
#[async_trait]
pub trait CaughtSetRepo: Send + Sync {
    /// Insert a caught set row.
    ///
    /// Fails with `InvalidUser` when `user_id` does not reference a user.
    async fn create_caught_set(&self, caught: &CaughtSet) -> MetadataResult<()>;

    /// Pure lookup by (user, generation).
    async fn find_caught_set(
        &self,
        user_id: i32,
        generation: i32,
    ) -> MetadataResult<Option<CaughtSet>>;

    /// Get the caught set for (user, generation), creating an empty one on
    /// first access.
    ///
    /// Lookup and insert run in one transaction under a per-(user, generation)
    /// lock, so concurrent first reads create a single row.
    async fn get_caught_set(&self, user: &User, generation: i32) -> MetadataResult<CaughtSet>;

    /// Read, change and write back the caught set in one locked transaction.
    ///
    /// The set is created empty when missing. When the change is rejected the
    /// stored IDs are left as they were and the core error is returned.
    async fn modify_caught_set(
        &self,
        user: &User,
        generation: i32,
        change: CaughtChange,
    ) -> MetadataResult<CaughtSet>;

    /// Overwrite the stored IDs of the (user, generation) row.
    ///
    /// Returns the number of rows affected. A missing row is not an error:
    /// nothing is written and 0 is returned.
    async fn update_caught_set(
        &self,
        caught: &CaughtSet,
        user: &User,
        generation: i32,
    ) -> MetadataResult<u64>;
}

/// Implement [`CaughtSetRepo`] for a store with `pool` and `queries` fields.
///
/// The store must provide
/// `async fn lock_caught_set(tx: &mut Transaction<'_, DB>, user_id: i32, generation: i32) -> MetadataResult<()>`,
/// which serializes transactions touching the same (user, generation) row.
macro_rules! impl_caught_set_repo {
    ($store:ty, $db:ty) => {
        impl $store {
            async fn find_or_create_caught_set(
                tx: &mut ::sqlx::Transaction<'_, $db>,
                queries: &$crate::dialect::QueryTable,
                user_id: i32,
                generation: i32,
            ) -> $crate::error::MetadataResult<::dextrack_core::CaughtSet> {
                use $crate::dialect::Query;

                Self::lock_caught_set(tx, user_id, generation).await?;

                let row = ::sqlx::query_as::<_, $crate::models::CaughtRow>(
                    queries.get(Query::GetCaughtSet),
                )
                .bind(user_id)
                .bind(generation)
                .fetch_optional(&mut **tx)
                .await?;
                if let Some(row) = row {
                    return Ok(row.into_caught_set(user_id, generation)?);
                }

                let caught = ::dextrack_core::CaughtSet::empty(user_id, generation);
                let result = ::sqlx::query(queries.get(Query::AddCaughtSet))
                    .bind(user_id)
                    .bind(caught.to_column())
                    .bind(generation)
                    .execute(&mut **tx)
                    .await;
                match result {
                    Ok(_) => {
                        ::tracing::debug!(
                            user_id = user_id,
                            generation = generation,
                            "Created empty caught set"
                        );
                        Ok(caught)
                    }
                    Err(::sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                        ::tracing::warn!(user_id = user_id, "Caught set for unknown user");
                        Err($crate::error::MetadataError::InvalidUser { user_id })
                    }
                    Err(e) => Err(e.into()),
                }
            }
        }

        #[::async_trait::async_trait]
        impl $crate::repos::CaughtSetRepo for $store {
            async fn create_caught_set(
                &self,
                caught: &::dextrack_core::CaughtSet,
            ) -> $crate::error::MetadataResult<()> {
                use $crate::dialect::Query;

                let mut tx = self.pool.begin().await?;
                let result = ::sqlx::query(self.queries.get(Query::AddCaughtSet))
                    .bind(caught.user_id)
                    .bind(caught.to_column())
                    .bind(caught.generation)
                    .execute(&mut *tx)
                    .await;

                match result {
                    Ok(_) => {
                        tx.commit().await?;
                        Ok(())
                    }
                    Err(::sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                        $crate::store::rollback(tx, Query::AddCaughtSet).await;
                        ::tracing::warn!(user_id = caught.user_id, "Caught set for unknown user");
                        Err($crate::error::MetadataError::InvalidUser {
                            user_id: caught.user_id,
                        })
                    }
                    Err(e) => {
                        $crate::store::rollback(tx, Query::AddCaughtSet).await;
                        Err(e.into())
                    }
                }
            }

            async fn find_caught_set(
                &self,
                user_id: i32,
                generation: i32,
            ) -> $crate::error::MetadataResult<Option<::dextrack_core::CaughtSet>> {
                use $crate::dialect::Query;

                let row = ::sqlx::query_as::<_, $crate::models::CaughtRow>(
                    self.queries.get(Query::GetCaughtSet),
                )
                .bind(user_id)
                .bind(generation)
                .fetch_optional(&self.pool)
                .await?;
                match row {
                    Some(row) => Ok(Some(row.into_caught_set(user_id, generation)?)),
                    None => Ok(None),
                }
            }

            async fn get_caught_set(
                &self,
                user: &::dextrack_core::User,
                generation: i32,
            ) -> $crate::error::MetadataResult<::dextrack_core::CaughtSet> {
                use $crate::dialect::Query;

                let mut tx = self.pool.begin().await?;
                match Self::find_or_create_caught_set(&mut tx, &self.queries, user.id, generation)
                    .await
                {
                    Ok(caught) => {
                        tx.commit().await?;
                        Ok(caught)
                    }
                    Err(e) => {
                        $crate::store::rollback(tx, Query::GetCaughtSet).await;
                        Err(e)
                    }
                }
            }

            async fn modify_caught_set(
                &self,
                user: &::dextrack_core::User,
                generation: i32,
                change: ::dextrack_core::CaughtChange,
            ) -> $crate::error::MetadataResult<::dextrack_core::CaughtSet> {
                use $crate::dialect::Query;

                let mut tx = self.pool.begin().await?;
                let mut caught = match Self::find_or_create_caught_set(
                    &mut tx,
                    &self.queries,
                    user.id,
                    generation,
                )
                .await
                {
                    Ok(caught) => caught,
                    Err(e) => {
                        $crate::store::rollback(tx, Query::GetCaughtSet).await;
                        return Err(e);
                    }
                };

                if let Err(e) = caught.apply(change) {
                    // Keep a row created by this call; the stored IDs are unchanged.
                    tx.commit().await?;
                    return Err(e.into());
                }

                let result = ::sqlx::query(self.queries.get(Query::UpdateCaughtSet))
                    .bind(caught.to_column())
                    .bind(user.id)
                    .bind(generation)
                    .execute(&mut *tx)
                    .await;
                if let Err(e) = result {
                    $crate::store::rollback(tx, Query::UpdateCaughtSet).await;
                    return Err(e.into());
                }
                tx.commit().await?;

                ::tracing::debug!(
                    user_id = user.id,
                    generation = generation,
                    change = ?change,
                    "Updated caught set"
                );
                Ok(caught)
            }

            async fn update_caught_set(
                &self,
                caught: &::dextrack_core::CaughtSet,
                user: &::dextrack_core::User,
                generation: i32,
            ) -> $crate::error::MetadataResult<u64> {
                use $crate::dialect::Query;

                let mut tx = self.pool.begin().await?;
                let result = ::sqlx::query(self.queries.get(Query::UpdateCaughtSet))
                    .bind(caught.to_column())
                    .bind(user.id)
                    .bind(generation)
                    .execute(&mut *tx)
                    .await;

                let affected = match result {
                    Ok(done) => done.rows_affected(),
                    Err(e) => {
                        $crate::store::rollback(tx, Query::UpdateCaughtSet).await;
                        return Err(e.into());
                    }
                };
                tx.commit().await?;

                if affected == 0 {
                    ::tracing::debug!(
                        user_id = user.id,
                        generation = generation,
                        "No caught set row to update"
                    );
                }
                Ok(affected)
            }
        }
    };
}

pub(crate) use impl_caught_set_repo;

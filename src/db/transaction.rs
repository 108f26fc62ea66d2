//! Transaction helper for all-or-nothing multi-row writes.

use metrics::counter;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionError, TransactionTrait};
use std::future::Future;
use std::pin::Pin;

/// Type alias for boxed future used in transactions
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Execute a function within a database transaction.
///
/// Commits when `f` returns `Ok`, rolls back otherwise. The caller's error
/// type comes back unchanged so field errors raised inside the transaction
/// reach the form intact.
///
/// ```rust,ignore
/// let variants = with_transaction(&db, move |txn| {
///     Box::pin(async move {
///         let mut created = Vec::new();
///         for row in rows {
///             created.push(row.insert(txn).await?);
///         }
///         Ok::<_, ServiceError>(created)
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<F, T, E>(db: &DatabaseConnection, f: F) -> Result<T, E>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, E>> + Send,
    T: Send,
    E: std::error::Error + From<DbErr> + Send,
{
    match db.transaction(f).await {
        Ok(value) => {
            counter!("fashion_backoffice.db.transaction.commit", 1);
            Ok(value)
        }
        Err(TransactionError::Connection(db_err)) => {
            counter!("fashion_backoffice.db.transaction.connection_error", 1);
            Err(E::from(db_err))
        }
        Err(TransactionError::Transaction(err)) => {
            counter!("fashion_backoffice.db.transaction.rollback", 1);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection_with_config, run_migrations, DbConfig};
    use crate::entities::brand;
    use crate::errors::ServiceError;
    use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

    async fn db() -> DatabaseConnection {
        let db = establish_connection_with_config(&DbConfig::in_memory())
            .await
            .unwrap();
        run_migrations(&db).await.unwrap();
        db
    }

    fn brand_row(name: &str) -> brand::ActiveModel {
        brand::ActiveModel {
            brand_name: Set(name.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn commits_on_success() {
        let db = db().await;
        let rows = vec![brand_row("Aurel"), brand_row("Brisa")];
        let created = with_transaction(&db, move |txn| {
            Box::pin(async move {
                let mut created = Vec::new();
                for row in rows {
                    created.push(row.insert(txn).await?);
                }
                Ok::<_, ServiceError>(created)
            })
        })
        .await
        .unwrap();

        assert_eq!(created.len(), 2);
        assert_eq!(brand::Entity::find().count(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn rolls_back_and_keeps_caller_error() {
        let db = db().await;
        let result: Result<(), ServiceError> = with_transaction(&db, |txn| {
            Box::pin(async move {
                brand_row("Corsa").insert(txn).await?;
                Err(ServiceError::field("brand_name", "rejected"))
            })
        })
        .await;

        match result {
            Err(ServiceError::ValidationFailed(errors)) => {
                assert_eq!(errors.get("brand_name"), Some("rejected"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(brand::Entity::find().count(&db).await.unwrap(), 0);
    }
}

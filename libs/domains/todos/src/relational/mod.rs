//! SeaORM implementation of the repositories
//!
//! Both repositories share one [`PersistenceContext`]. Statements run on the
//! context's active transaction when there is one and on the pooled
//! connection otherwise.

use sea_orm::sea_query::Expr;
use sea_orm::{
    DatabaseConnection, DatabaseTransaction, DbBackend, EntityTrait, QueryFilter, Select,
    TransactionTrait,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::TodoResult;

/// Run `$body` with `$conn` bound to the active transaction if one is open,
/// or to the connection pool otherwise.
macro_rules! with_connection {
    ($ctx:expr, $conn:ident => $body:expr) => {{
        let guard = $ctx.transaction.lock().await;
        match guard.as_ref() {
            Some($conn) => $body,
            None => {
                let $conn = &$ctx.db;
                $body
            }
        }
    }};
}

mod tags;
mod todos;

pub use tags::SeaTagRepository;
pub use todos::SeaTodoRepository;

/// Shared connection plus the optional active transaction
pub struct PersistenceContext {
    db: DatabaseConnection,
    transaction: Mutex<Option<DatabaseTransaction>>,
}

impl PersistenceContext {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            transaction: Mutex::new(None),
        }
    }

    /// The underlying pool, bypassing any active transaction
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn in_transaction(&self) -> bool {
        self.transaction.lock().await.is_some()
    }

    /// Open a transaction; no-op when one is already active
    pub async fn begin(&self) -> TodoResult<()> {
        let mut slot = self.transaction.lock().await;
        if slot.is_some() {
            debug!("Transaction already active");
            return Ok(());
        }

        *slot = Some(self.db.begin().await?);
        info!("Transaction started");
        Ok(())
    }

    /// Commit the active transaction; no-op when none is active
    pub async fn commit(&self) -> TodoResult<()> {
        let Some(txn) = self.transaction.lock().await.take() else {
            debug!("Commit requested without an active transaction");
            return Ok(());
        };

        txn.commit().await?;
        info!("Transaction committed");
        Ok(())
    }

    /// Roll back the active transaction; no-op when none is active
    pub async fn rollback(&self) -> TodoResult<()> {
        let Some(txn) = self.transaction.lock().await.take() else {
            debug!("Rollback requested without an active transaction");
            return Ok(());
        };

        txn.rollback().await?;
        info!("Transaction rolled back");
        Ok(())
    }
}

/// `%keyword%` with the LIKE wildcards in `keyword` escaped by `\`
fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Narrow `select` to rows whose `column` contains `keyword`, ignoring case.
///
/// SQLite's `LOWER` only folds ASCII, so on SQLite nothing is filtered in SQL
/// and [`contains_ignore_case`] decides alone. Callers always apply it to the
/// loaded rows.
fn filter_contains<E: EntityTrait>(
    select: Select<E>,
    backend: DbBackend,
    column: &str,
    keyword: &str,
) -> Select<E> {
    match backend {
        DbBackend::Postgres => select.filter(Expr::cust_with_values(
            format!("LOWER({column}) LIKE LOWER(?) ESCAPE '\\'"),
            [like_pattern(keyword)],
        )),
        _ => select,
    }
}

/// Literal, Unicode-aware, case-insensitive substring test
fn contains_ignore_case(text: &str, keyword: &str) -> bool {
    text.to_lowercase().contains(&keyword.to_lowercase())
}

//! Scoped units of work over a shared SQLite pool.
//!
//! A [`SessionFactory`] is cheap to clone and shared process-wide. Each call to
//! [`SessionFactory::open`] yields an independent [`Session`] that owns one
//! pooled transaction at a time. A session is never shared between tasks.
//!
//! Dropping a session releases its connection; sqlx rolls back a transaction
//! that is dropped without being committed. [`Session::close`] does the same
//! explicitly and surfaces rollback errors.

use crate::models::User;
use sqlx::sqlite::SqlitePool;
use sqlx::{Sqlite, Transaction};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Produces independent [`Session`]s bound to one connection pool.
#[derive(Debug, Clone)]
pub struct SessionFactory {
    pool: SqlitePool,
    expire_on_commit: bool,
}

impl SessionFactory {
    /// Create a factory with expire-on-commit disabled.
    pub fn new(pool: SqlitePool) -> Self {
        SessionFactory {
            pool,
            expire_on_commit: false,
        }
    }

    /// When enabled, a commit discards the session's identity map so later
    /// reads go back to storage.
    pub fn with_expire_on_commit(mut self, expire_on_commit: bool) -> Self {
        self.expire_on_commit = expire_on_commit;
        self
    }

    pub fn expire_on_commit(&self) -> bool {
        self.expire_on_commit
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Open a new session and begin its transaction.
    ///
    /// # Errors
    /// Returns an error if no connection can be acquired.
    pub async fn open(&self) -> Result<Session, sqlx::Error> {
        let tx = self.pool.begin().await?;
        debug!("Session opened");
        Ok(Session {
            pool: self.pool.clone(),
            tx: Some(tx),
            pending: Vec::new(),
            flushed: Vec::new(),
            identity: HashMap::new(),
            expire_on_commit: self.expire_on_commit,
        })
    }
}

/// A single unit of work.
///
/// Entities registered with [`Session::add`] are inserted on the next flush.
/// Loaded and flushed entities are kept in an identity map keyed by `pk`.
pub struct Session {
    pool: SqlitePool,
    tx: Option<Transaction<'static, Sqlite>>,
    pending: Vec<User>,
    flushed: Vec<User>,
    identity: HashMap<i64, User>,
    expire_on_commit: bool,
}

impl Session {
    /// Register a transient entity for insertion. No round trip.
    pub fn add(&mut self, user: User) {
        self.pending.push(user);
    }

    /// Whether `pk` is held in the identity map.
    pub fn contains(&self, pk: i64) -> bool {
        self.identity.contains_key(&pk)
    }

    /// Insert all pending entities, assigning their primary keys.
    ///
    /// # Errors
    /// Returns the storage error of the first insert that fails. The whole
    /// transaction is then rolled back and everything the session tracked
    /// (pending, flushed and cached entities) is discarded, so a later commit
    /// cannot persist a partial flush.
    pub async fn flush(&mut self) -> Result<(), sqlx::Error> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let pending = std::mem::take(&mut self.pending);
        let tx = self.transaction().await?;

        let inserted = match insert_users(tx, pending).await {
            Ok(inserted) => inserted,
            Err(e) => {
                self.discard().await;
                return Err(e);
            }
        };

        for user in &inserted {
            if let Some(pk) = user.pk() {
                self.identity.insert(pk, user.clone());
            }
        }
        self.flushed.extend(inserted);
        Ok(())
    }

    /// Flush and commit the current transaction.
    ///
    /// Returns the entities inserted since the previous commit, in the order
    /// they were added, with their primary keys assigned.
    ///
    /// # Errors
    /// Returns an error if the flush or the commit fails.
    pub async fn commit(&mut self) -> Result<Vec<User>, sqlx::Error> {
        self.flush().await?;
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        if self.expire_on_commit {
            self.identity.clear();
        }
        let committed = std::mem::take(&mut self.flushed);
        debug!(inserted = committed.len(), "Session committed");
        Ok(committed)
    }

    /// Reload `user` from storage.
    ///
    /// # Errors
    /// Returns `sqlx::Error::RowNotFound` if `user` has no primary key or its
    /// row no longer exists, or any other storage error.
    pub async fn refresh(&mut self, user: &mut User) -> Result<(), sqlx::Error> {
        let pk = user.pk().ok_or(sqlx::Error::RowNotFound)?;
        let row = self.select(pk).await?.ok_or(sqlx::Error::RowNotFound)?;
        self.identity.insert(pk, row.clone());
        *user = row;
        Ok(())
    }

    /// Look up a user by primary key, consulting the identity map first.
    ///
    /// Pending entities are flushed before the lookup.
    pub async fn get(&mut self, pk: i64) -> Result<Option<User>, sqlx::Error> {
        self.flush().await?;
        if let Some(user) = self.identity.get(&pk) {
            return Ok(Some(user.clone()));
        }
        let found = self.select(pk).await?;
        if let Some(user) = &found {
            self.identity.insert(pk, user.clone());
        }
        Ok(found)
    }

    /// Roll back uncommitted work and release the connection.
    pub async fn close(mut self) -> Result<(), sqlx::Error> {
        self.pending.clear();
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        debug!("Session closed");
        Ok(())
    }

    /// Roll back the open transaction and forget all tracked entities.
    async fn discard(&mut self) {
        self.pending.clear();
        self.flushed.clear();
        self.identity.clear();
        if let Some(tx) = self.tx.take() {
            if let Err(e) = tx.rollback().await {
                warn!(error = %e, "Rollback after failed flush failed");
            }
        }
    }

    async fn select(&mut self, pk: i64) -> Result<Option<User>, sqlx::Error> {
        let tx = self.transaction().await?;
        sqlx::query_as::<_, User>(r#"SELECT pk, name FROM "user" WHERE pk = ?"#)
            .bind(pk)
            .fetch_optional(&mut **tx)
            .await
    }

    /// The open transaction, beginning a new one after a commit.
    async fn transaction(&mut self) -> Result<&mut Transaction<'static, Sqlite>, sqlx::Error> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => self.pool.begin().await?,
        };
        Ok(self.tx.insert(tx))
    }
}

async fn insert_users(
    tx: &mut Transaction<'static, Sqlite>,
    pending: Vec<User>,
) -> Result<Vec<User>, sqlx::Error> {
    let mut inserted = Vec::with_capacity(pending.len());
    for mut user in pending {
        // NULL into an INTEGER PRIMARY KEY lets SQLite pick the rowid.
        let pk: i64 =
            sqlx::query_scalar(r#"INSERT INTO "user" (pk, name) VALUES (?, ?) RETURNING pk"#)
                .bind(user.pk())
                .bind(user.name())
                .fetch_one(&mut **tx)
                .await?;
        user.assign_pk(pk);
        debug!(pk, "Flushed user insert");
        inserted.push(user);
    }
    Ok(inserted)
}

//! SurrealDB implementation of [`CredentialStore`].

use campus_core::error::CampusResult;
use campus_core::repository::CredentialStore;
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use super::check;
use crate::credential::{hash_secret, verify_secret};
use crate::error::DbError;

#[derive(Debug, Deserialize)]
struct CredentialRow {
    secret_hash: String,
}

/// Stores Argon2id hashes in the `credential` table, keyed by account.
#[derive(Clone)]
pub struct SurrealCredentialStore<C: Connection> {
    db: Surreal<C>,
    pepper: Option<String>,
}

impl<C: Connection> SurrealCredentialStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }
}

impl<C: Connection> CredentialStore for SurrealCredentialStore<C> {
    async fn set_credential(&self, account_id: Uuid, secret: &str) -> CampusResult<()> {
        let secret_hash = hash_secret(secret, self.pepper.as_deref())?;

        check(
            self.db
                .query(
                    "UPSERT type::thing('credential', $id) SET \
                     account_id = $id, secret_hash = $secret_hash, \
                     updated_at = time::now()",
                )
                .bind(("id", account_id.to_string()))
                .bind(("secret_hash", secret_hash))
                .await
                .map_err(DbError::from)?,
        )?;
        Ok(())
    }

    async fn verify_credential(&self, account_id: Uuid, candidate: &str) -> CampusResult<bool> {
        let mut result = self
            .db
            .query("SELECT secret_hash FROM type::thing('credential', $id)")
            .bind(("id", account_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CredentialRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(verify_secret(
                candidate,
                &row.secret_hash,
                self.pepper.as_deref(),
            )?),
            None => Ok(false),
        }
    }
}

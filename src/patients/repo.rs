use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;

use super::repo_types::Patient;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    #[error("patient not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence for patient records. Every mutating call is durable once it returns.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Fails with [`StoreError::DuplicateEmail`] when the email is taken.
    async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Patient, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Patient>, StoreError>;

    /// Replaces the whole `data` document.
    async fn update_data(
        &self,
        email: &str,
        forms: &serde_json::Value,
    ) -> Result<Patient, StoreError>;
}

#[derive(Clone)]
pub struct PgPatientStore {
    db: PgPool,
}

impl PgPatientStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PatientStore for PgPatientStore {
    async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Patient, StoreError> {
        // No pre-check: the unique constraint decides concurrent registrations.
        let res = sqlx::query_as::<_, Patient>(
            r#"
            INSERT INTO patients (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, data, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(patient) => {
                debug!(patient_id = patient.id, "patient row inserted");
                Ok(patient)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::DuplicateEmail(email.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Patient>, StoreError> {
        let patient = sqlx::query_as::<_, Patient>(
            r#"
            SELECT id, name, email, password_hash, data, created_at, updated_at
            FROM patients
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(patient)
    }

    async fn update_data(
        &self,
        email: &str,
        forms: &serde_json::Value,
    ) -> Result<Patient, StoreError> {
        let patient = sqlx::query_as::<_, Patient>(
            r#"
            UPDATE patients
               SET data = $2, updated_at = now()
             WHERE email = $1
            RETURNING id, name, email, password_hash, data, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(sqlx::types::Json(forms))
        .fetch_optional(&self.db)
        .await?;

        patient.ok_or_else(|| StoreError::NotFound(email.to_string()))
    }
}

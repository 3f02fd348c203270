use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::repo::{PatientStore, StoreError};
use super::repo_types::Patient;

/// Map-backed store with the same contract as the Postgres one.
#[derive(Default)]
pub struct InMemoryPatientStore {
    rows: Mutex<HashMap<String, Patient>>,
}

impl InMemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl PatientStore for InMemoryPatientStore {
    async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Patient, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(email) {
            return Err(StoreError::DuplicateEmail(email.to_string()));
        }
        let now = OffsetDateTime::now_utc();
        let patient = Patient {
            id: rows.len() as i64 + 1,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            data: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        };
        rows.insert(email.to_string(), patient.clone());
        Ok(patient)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Patient>, StoreError> {
        Ok(self.rows.lock().unwrap().get(email).cloned())
    }

    async fn update_data(
        &self,
        email: &str,
        forms: &serde_json::Value,
    ) -> Result<Patient, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let patient = rows
            .get_mut(email)
            .ok_or_else(|| StoreError::NotFound(email.to_string()))?;
        patient.data = forms.clone();
        patient.updated_at = OffsetDateTime::now_utc();
        Ok(patient.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn duplicate_email_keeps_single_record() {
        let store = InMemoryPatientStore::new();
        store.create("Jo", "jo@x.com", "h1").await.unwrap();
        let err = store.create("Other", "jo@x.com", "h2").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail(_)));
        assert_eq!(store.len(), 1);
        let kept = store.find_by_email("jo@x.com").await.unwrap().unwrap();
        assert_eq!(kept.name, "Jo");
    }

    #[tokio::test]
    async fn update_data_missing_patient_is_not_found() {
        let store = InMemoryPatientStore::new();
        let err = store.update_data("ghost@x.com", &json!({"a": 1})).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}

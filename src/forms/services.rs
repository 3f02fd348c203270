use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use super::client::{NotesClient, UpstreamError};
use crate::patients::{PatientStore, StoreError};

#[derive(Debug, Error)]
pub enum FormsError {
    #[error("patient not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for FormsError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(email) => FormsError::NotFound(email),
            other => FormsError::Store(other),
        }
    }
}

/// The forms document is stored on our side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPersisted {
    pub patient_id: i64,
    pub email: String,
}

/// What the clinical-notes service made of the relayed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamResult {
    Accepted,
    Failed(UpstreamError),
}

/// Outcome of a submission that got as far as the local write.
///
/// `upstream` may be `Failed` while the document is already persisted; the
/// two sides are not reconciled and the caller has to resubmit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub persisted: LocalPersisted,
    pub upstream: UpstreamResult,
}

impl Submission {
    pub fn is_synced(&self) -> bool {
        self.upstream == UpstreamResult::Accepted
    }
}

#[derive(Clone)]
pub struct FormsGateway {
    store: Arc<dyn PatientStore>,
    notes: Arc<dyn NotesClient>,
}

impl FormsGateway {
    pub fn new(store: Arc<dyn PatientStore>, notes: Arc<dyn NotesClient>) -> Self {
        Self { store, notes }
    }

    /// Overwrites the patient's forms document, then relays it upstream.
    /// Callers must have authenticated the request already.
    pub async fn submit(
        &self,
        email: &str,
        forms: serde_json::Value,
    ) -> Result<Submission, FormsError> {
        let email = crate::auth::services::normalize_email(email);

        // update_data reports a missing patient before anything is sent out
        let patient = self.store.update_data(&email, &forms).await?;
        let persisted = LocalPersisted {
            patient_id: patient.id,
            email: patient.email,
        };

        let upstream = match self.notes.post_note(&forms).await {
            Ok(()) => {
                info!(patient_id = persisted.patient_id, "forms submitted");
                UpstreamResult::Accepted
            }
            Err(e) => {
                warn!(
                    patient_id = persisted.patient_id,
                    error = %e,
                    "forms stored locally but not accepted upstream"
                );
                UpstreamResult::Failed(e)
            }
        };

        Ok(Submission {
            persisted,
            upstream,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::patients::memory::InMemoryPatientStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every document and answers with a fixed result.
    #[derive(Default)]
    pub(crate) struct FakeNotes {
        pub fail_with: Option<UpstreamError>,
        pub received: Mutex<Vec<serde_json::Value>>,
    }

    impl FakeNotes {
        pub fn failing(e: UpstreamError) -> Self {
            Self {
                fail_with: Some(e),
                received: Mutex::default(),
            }
        }

        pub fn calls(&self) -> usize {
            self.received.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl NotesClient for FakeNotes {
        async fn post_note(&self, document: &serde_json::Value) -> Result<(), UpstreamError> {
            self.received.lock().unwrap().push(document.clone());
            match &self.fail_with {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }
    }

    async fn gateway_with(notes: FakeNotes) -> (FormsGateway, Arc<InMemoryPatientStore>, Arc<FakeNotes>) {
        let store = Arc::new(InMemoryPatientStore::new());
        store.create("Jo", "jo@x.com", "hash").await.unwrap();
        let notes = Arc::new(notes);
        (FormsGateway::new(store.clone(), notes.clone()), store, notes)
    }

    #[tokio::test]
    async fn unknown_patient_is_not_found_and_nothing_is_sent() {
        let (gateway, _, notes) = gateway_with(FakeNotes::default()).await;
        let err = gateway.submit("ghost@x.com", json!({"q1": "yes"})).await.unwrap_err();
        assert!(matches!(err, FormsError::NotFound(ref e) if e == "ghost@x.com"));
        assert_eq!(notes.calls(), 0);
    }

    #[tokio::test]
    async fn accepted_submission_persists_and_relays_document() {
        let (gateway, store, notes) = gateway_with(FakeNotes::default()).await;
        let forms = json!({"q1": "yes", "history": {"allergies": ["pollen"]}});

        let submission = gateway.submit("jo@x.com", forms.clone()).await.unwrap();
        assert!(submission.is_synced());
        assert_eq!(submission.persisted.email, "jo@x.com");

        let stored = store.find_by_email("jo@x.com").await.unwrap().unwrap();
        assert_eq!(stored.data, forms);
        assert_eq!(notes.received.lock().unwrap().as_slice(), &[forms]);
    }

    #[tokio::test]
    async fn rejected_upstream_still_keeps_local_copy() {
        let (gateway, store, _) =
            gateway_with(FakeNotes::failing(UpstreamError::Rejected { status: 503 })).await;

        let submission = gateway.submit("jo@x.com", json!({"q1": "yes"})).await.unwrap();
        assert_eq!(
            submission.upstream,
            UpstreamResult::Failed(UpstreamError::Rejected { status: 503 })
        );
        assert!(!submission.is_synced());

        let stored = store.find_by_email("jo@x.com").await.unwrap().unwrap();
        assert_eq!(stored.data, json!({"q1": "yes"}));
    }

    #[tokio::test]
    async fn resubmission_overwrites_previous_forms() {
        let (gateway, store, _) = gateway_with(FakeNotes::default()).await;
        gateway.submit("jo@x.com", json!({"q1": "yes", "q2": "no"})).await.unwrap();
        gateway.submit("jo@x.com", json!({"q3": "maybe"})).await.unwrap();

        let stored = store.find_by_email("jo@x.com").await.unwrap().unwrap();
        assert_eq!(stored.data, json!({"q3": "maybe"}));
    }
}

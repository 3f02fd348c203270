use std::sync::Arc;

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

use super::{
    jwt::JwtKeys,
    password::{hash_password, verify_password},
};
use crate::patients::{Patient, PatientStore, StoreError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("email already registered")]
    DuplicateEmail,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail(_) => AuthError::DuplicateEmail,
            other => AuthError::Store(other),
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registration, login and bearer-token checks over a [`PatientStore`].
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn PatientStore>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(store: Arc<dyn PatientStore>, keys: JwtKeys) -> Self {
        Self { store, keys }
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Patient, AuthError> {
        let name = name.trim();
        let email = normalize_email(email);

        if name.is_empty() {
            warn!("register without name");
            return Err(AuthError::Validation("Name is required".into()));
        }
        if !is_valid_email(&email) {
            warn!(email = %email, "invalid email");
            return Err(AuthError::Validation("Invalid email".into()));
        }
        if password.is_empty() {
            warn!(email = %email, "register without password");
            return Err(AuthError::Validation("Password is required".into()));
        }

        // argon2 runs on the blocking pool
        let plain = password.to_owned();
        let hash = tokio::task::spawn_blocking(move || hash_password(&plain))
            .await
            .context("join password hashing task")??;
        let patient = self.store.create(name, &email, &hash).await.map_err(|e| {
            if matches!(e, StoreError::DuplicateEmail(_)) {
                warn!(email = %email, "email already registered");
            }
            AuthError::from(e)
        })?;

        info!(patient_id = patient.id, email = %patient.email, "patient registered");
        Ok(patient)
    }

    /// Returns a signed bearer token whose subject is the patient's email.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let email = normalize_email(email);

        let patient = match self.store.find_by_email(&email).await? {
            Some(p) => p,
            None => {
                warn!(email = %email, "login unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let plain = password.to_owned();
        let stored = patient.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&plain, &stored))
            .await
            .context("join password verification task")??;
        if !matches {
            warn!(email = %email, patient_id = patient.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.keys.sign(&patient.email)?;
        info!(patient_id = patient.id, email = %patient.email, "patient logged in");
        Ok(token)
    }

    /// Verifies signature, expiry, issuer and audience; yields the subject email.
    pub fn authenticate(&self, token: &str) -> Result<String, AuthError> {
        self.keys.verify(token).map(|c| c.sub).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AuthError::Unauthorized("Invalid or expired token".into())
        })
    }
}

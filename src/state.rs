use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::postgres::PgPoolOptions;

use crate::auth::{AuthService, JwtKeys};
use crate::config::AppConfig;
use crate::forms::{FormsGateway, IcaNotesClient, NotesClient};
use crate::patients::{PatientStore, PgPatientStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
    pub forms: FormsGateway,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        let store = Arc::new(PgPatientStore::new(db)) as Arc<dyn PatientStore>;
        let notes = Arc::new(IcaNotesClient::new(&config.notes)?) as Arc<dyn NotesClient>;

        Ok(Self::from_parts(config, store, notes))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn PatientStore>,
        notes: Arc<dyn NotesClient>,
    ) -> Self {
        let keys = JwtKeys::from_config(&config.jwt);
        Self {
            auth: AuthService::new(store.clone(), keys),
            forms: FormsGateway::new(store, notes),
            config,
        }
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

use std::ops::RangeInclusive;

use serde::Deserialize;

const JWT_TTL_MINUTES: RangeInclusive<i64> = 1..=60 * 24 * 30;
const NOTES_TIMEOUT_SECS: RangeInclusive<u64> = 1..=120;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Clinical-notes upstream the submitted forms are relayed to.
#[derive(Debug, Clone, Deserialize)]
pub struct NotesConfig {
    pub api_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub notes: NotesConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| {
            var(key).ok_or_else(|| anyhow::anyhow!("missing required env var {}", key))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "patient-intake".into()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "patient-intake-users".into()),
            ttl_minutes: bounded(&var, "JWT_TTL_MINUTES", 60, JWT_TTL_MINUTES)?,
        };
        let notes = NotesConfig {
            api_url: var("NOTES_API_URL")
                .unwrap_or_else(|| "https://icanotes-api.com/patient".into()),
            api_key: required("NOTES_API_KEY")?,
            timeout_secs: bounded(&var, "NOTES_TIMEOUT_SECS", 5, NOTES_TIMEOUT_SECS)?,
        };
        Ok(Self {
            database_url,
            jwt,
            notes,
        })
    }
}

/// Optional numeric var: unset means `default`, anything else must parse and fall in `range`.
fn bounded<T>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    range: RangeInclusive<T>,
) -> anyhow::Result<T>
where
    T: std::str::FromStr + PartialOrd + std::fmt::Display,
{
    let Some(raw) = var(key) else {
        return Ok(default);
    };
    let value: T = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a number, got {:?}", key, raw))?;
    if !range.contains(&value) {
        anyhow::bail!(
            "{} must be between {} and {}, got {}",
            key,
            range.start(),
            range.end(),
            value
        );
    }
    Ok(value)
}

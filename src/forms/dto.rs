use serde::Deserialize;

/// Request body for `/submit_forms`.
#[derive(Debug, Deserialize)]
pub struct SubmitFormsRequest {
    pub email: String,
    pub forms: serde_json::Value, // stored and relayed as-is
}

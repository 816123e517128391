use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub text: String,
    #[serde(default)]
    pub response_to: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct EditPostRequest {
    pub text: String,
}

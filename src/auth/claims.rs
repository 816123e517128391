use serde::{Deserialize, Serialize};

/// JWT payload of a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "loggedInAs")]
    pub logged_in_as: String, // username
    pub iat: usize,           // issued at (unix timestamp)
    pub exp: usize,           // expires at (unix timestamp)
    pub iss: String,          // issuer
    pub aud: String,          // audience
}

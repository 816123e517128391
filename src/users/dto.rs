use serde::{Deserialize, Serialize};

/// Settings view of the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSettings {
    pub email: Option<String>,
}

/// Request body for a settings update. An absent field is left unchanged;
/// an empty email clears it.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsUpdate {
    pub email: Option<String>,
}

/// Directory entry, one per registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Blog {
    pub name: String,
}

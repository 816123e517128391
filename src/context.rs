/// Per-request caller context. The only trusted field is the username taken
/// from an already verified session token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    logged_in_as: Option<String>,
}

impl Context {
    pub fn guest() -> Self {
        Self::default()
    }

    pub fn user(username: impl Into<String>) -> Self {
        Self {
            logged_in_as: Some(username.into()),
        }
    }

    /// Authenticated username, if any. An empty username counts as a guest.
    pub fn logged_in_as(&self) -> Option<&str> {
        self.logged_in_as.as_deref().filter(|u| !u.is_empty())
    }
}

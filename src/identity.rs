use serde::{Deserialize, Serialize};

pub const GUEST_LABEL: &str = "Guest";

/// Who is timing. Read-only for the timer: it picks a label and keys remote writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Key for remote writes; blank usernames count as missing
    pub fn user_id(&self) -> Option<&str> {
        non_blank(self.username.as_deref())
    }

    pub fn display_label(&self) -> &str {
        non_blank(self.name.as_deref())
            .or_else(|| self.user_id())
            .unwrap_or(GUEST_LABEL)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

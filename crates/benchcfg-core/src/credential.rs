use std::fmt;

pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Optional bearer token sent with every remote request.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    token: Option<String>,
}

impl Credential {
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.trim().is_empty() {
            return Self::anonymous();
        }
        Self { token: Some(token) }
    }

    /// Reads `GITHUB_TOKEN`; unset or blank means anonymous.
    pub fn from_env() -> Self {
        match std::env::var(TOKEN_ENV_VAR) {
            Ok(value) => Self::bearer(value),
            Err(_) => Self::anonymous(),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn authorization_header(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Bearer {token}"))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = if self.token.is_some() {
            "Some(<redacted>)"
        } else {
            "None"
        };
        f.debug_struct("Credential")
            .field("token", &format_args!("{shown}"))
            .finish()
    }
}

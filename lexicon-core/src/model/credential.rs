use std::fmt;

/// Opaque access token for the generation service, resolved by the host.
/// Empty or whitespace-only values count as unset.
#[derive(Clone, Default)]
pub struct Credential(Option<String>);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.trim().is_empty() {
            Self(None)
        } else {
            Self(Some(token))
        }
    }

    pub fn unset() -> Self {
        Self(None)
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub fn secret(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl From<Option<String>> for Credential {
    fn from(value: Option<String>) -> Self {
        value.map(Credential::new).unwrap_or_default()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Credential(<redacted>)"),
            None => f.write_str("Credential(unset)"),
        }
    }
}

use std::collections::HashMap;

use serde::Serialize;

use crate::error::ConfigError;

/// An authenticated caller as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub is_operator: bool,
}

/// Who is calling the engine. Passed explicitly into every operation that
/// branches on privilege.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Actor {
    Client,
    Operator { name: String },
}

impl Actor {
    pub fn is_operator(&self) -> bool {
        matches!(self, Actor::Operator { .. })
    }
}

pub fn authorize(identity: Option<&Identity>) -> Actor {
    match identity {
        Some(identity) if identity.is_operator => Actor::Operator {
            name: identity.subject.clone(),
        },
        _ => Actor::Client,
    }
}

pub trait IdentityProvider: Send + Sync + 'static {
    fn resolve(&self, credential: &str) -> Option<Identity>;
}

/// Operators known from configuration, keyed by their password.
#[derive(Debug, Clone, Default)]
pub struct OperatorDirectory {
    by_password: HashMap<String, String>,
}

impl OperatorDirectory {
    /// Builds the directory from `name:password` entries.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut by_password = HashMap::new();
        for entry in entries {
            let entry = entry.as_ref();
            let (name, password) = entry
                .split_once(':')
                .map(|(name, password)| (name.trim(), password.trim()))
                .filter(|(name, password)| !name.is_empty() && !password.is_empty())
                .ok_or_else(|| ConfigError::InvalidOperator(entry.to_string()))?;
            by_password.insert(password.to_string(), name.to_string());
        }
        Ok(Self { by_password })
    }

    pub fn len(&self) -> usize {
        self.by_password.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_password.is_empty()
    }
}

impl IdentityProvider for OperatorDirectory {
    fn resolve(&self, credential: &str) -> Option<Identity> {
        self.by_password.get(credential).map(|name| Identity {
            subject: name.clone(),
            is_operator: true,
        })
    }
}

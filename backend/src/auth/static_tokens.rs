//! Fixed token table for local development and tests.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{AdminIdentity, AuthError, TokenVerifier};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid admin token entry '{0}', expected token=uid[:email]")]
pub struct TokenSpecError(pub String);

/// Verifier backed by an in-process `token -> identity` table.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, AdminIdentity>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, uid: impl Into<String>) -> Self {
        self.tokens.insert(
            token.into(),
            AdminIdentity {
                uid: uid.into(),
                email: None,
            },
        );
        self
    }

    /// Parse a `token=uid[:email],...` list. Blank entries are skipped.
    pub fn parse(spec: &str) -> Result<Self, TokenSpecError> {
        let mut tokens = HashMap::new();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (token, identity) = entry
                .split_once('=')
                .ok_or_else(|| TokenSpecError(entry.to_string()))?;
            let (uid, email) = match identity.split_once(':') {
                Some((uid, email)) => (uid, Some(email.trim().to_string())),
                None => (identity, None),
            };
            let (token, uid) = (token.trim(), uid.trim());
            if token.is_empty() || uid.is_empty() {
                return Err(TokenSpecError(entry.to_string()));
            }
            tokens.insert(
                token.to_string(),
                AdminIdentity {
                    uid: uid.to_string(),
                    email: email.filter(|e| !e.is_empty()),
                },
            );
        }
        Ok(Self { tokens })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<AdminIdentity, AuthError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::Rejected("unknown token".to_string()))
    }
}

//! Caller identification and the configured permission gate.
//!
//! Accounts authenticate with HTTP Basic credentials verified against an
//! argon2 hash. A price scraper may instead present the shared insert access
//! key in the `X-Insert-Access-Key` header, which grants `insert_records`
//! and nothing else.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use overseer_core::{
  auth::{Actor, Permission, PermissionGate},
  clock::Clock,
  store::PriceStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

pub const ACCESS_KEY_HEADER: &str = "x-insert-access-key";

/// One configured account.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  #[serde(default)]
  pub permissions:   Vec<Permission>,
}

/// Permission gate backed by the server configuration.
#[derive(Debug, Clone, Default)]
pub struct AccountGate {
  accounts:          Vec<Account>,
  insert_access_key: Option<String>,
}

impl AccountGate {
  pub fn new(accounts: Vec<Account>, insert_access_key: Option<String>) -> Self {
    let insert_access_key = insert_access_key
      .map(|k| k.trim().to_owned())
      .filter(|k| !k.is_empty());
    Self { accounts, insert_access_key }
  }

  fn account(&self, username: &str) -> Option<&Account> {
    self.accounts.iter().find(|a| a.username == username)
  }

  /// Work out who sent `headers`.
  ///
  /// No credentials at all yields [`Actor::Anonymous`]; credentials that are
  /// present but wrong are rejected outright.
  pub fn identify(&self, headers: &HeaderMap) -> Result<Actor, ApiError> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
      let value = value.to_str().map_err(|_| ApiError::Unauthorized)?;
      return self.verify_basic(value);
    }

    if headers.contains_key(ACCESS_KEY_HEADER) {
      return if self.access_key_matches(headers) {
        Ok(Actor::AccessKey)
      } else {
        Err(ApiError::Unauthorized)
      };
    }

    Ok(Actor::Anonymous)
  }

  /// Whether `headers` carry the configured insert access key.
  fn access_key_matches(&self, headers: &HeaderMap) -> bool {
    let presented = headers
      .get(ACCESS_KEY_HEADER)
      .and_then(|v| v.to_str().ok())
      .map(str::trim);
    match (&self.insert_access_key, presented) {
      (Some(key), Some(presented)) => presented == key,
      _ => false,
    }
  }

  fn verify_basic(&self, header_val: &str) -> Result<Actor, ApiError> {
    let encoded = header_val
      .strip_prefix("Basic ")
      .ok_or(ApiError::Unauthorized)?;

    let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
    let creds   = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

    let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
    let account = self.account(username).ok_or(ApiError::Unauthorized)?;

    let parsed_hash = PasswordHash::new(&account.password_hash)
      .map_err(|_| ApiError::Unauthorized)?;

    Argon2::default()
      .verify_password(password.as_bytes(), &parsed_hash)
      .map_err(|_| ApiError::Unauthorized)?;

    Ok(Actor::Account { username: account.username.clone() })
  }

  /// Fail unless `actor` holds `permission`. Anonymous callers are told to
  /// authenticate; known callers are told they lack the permission.
  pub fn require(&self, actor: &Actor, permission: Permission) -> Result<(), ApiError> {
    if self.has_permission(actor, permission) {
      Ok(())
    } else if *actor == Actor::Anonymous {
      Err(ApiError::Unauthorized)
    } else {
      tracing::debug!(%actor, %permission, "permission denied");
      Err(ApiError::Forbidden(permission))
    }
  }

  /// [`require`](Self::require) for `insert_records`, except that an account
  /// lacking the permission is still let through when the request also
  /// carries the insert access key.
  pub fn require_insert(&self, actor: &Actor, headers: &HeaderMap) -> Result<(), ApiError> {
    match self.require(actor, Permission::InsertRecords) {
      Err(ApiError::Forbidden(_)) if self.access_key_matches(headers) => {
        tracing::debug!(%actor, "insert allowed by access key");
        Ok(())
      }
      other => other,
    }
  }
}

impl PermissionGate for AccountGate {
  fn has_permission(&self, actor: &Actor, permission: Permission) -> bool {
    match actor {
      Actor::Account { username } => self
        .account(username)
        .is_some_and(|a| a.permissions.contains(&permission)),
      Actor::AccessKey => {
        self.insert_access_key.is_some() && permission == Permission::InsertRecords
      }
      Actor::Anonymous => false,
    }
  }
}

/// The identified caller of a request.
pub struct Caller(pub Actor);

impl<S, C> FromRequestParts<AppState<S, C>> for Caller
where
  S: PriceStore + 'static,
  C: Clock + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, C>,
  ) -> Result<Self, Self::Rejection> {
    state.gate.identify(&parts.headers).map(Caller)
  }
}

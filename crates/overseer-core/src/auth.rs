//! Permission model.
//!
//! The ledger itself performs no authorization. Outer layers resolve the
//! calling [`Actor`] and ask a [`PermissionGate`] before reaching into the
//! [`crate::ledger::Ledger`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named capability checked before a ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
  ReadRecords,
  InsertRecords,
  UpdateRecords,
  DeleteRecords,
  ReadItems,
  InsertItems,
  DeleteItems,
}

impl Permission {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::ReadRecords => "read_records",
      Self::InsertRecords => "insert_records",
      Self::UpdateRecords => "update_records",
      Self::DeleteRecords => "delete_records",
      Self::ReadItems => "read_items",
      Self::InsertItems => "insert_items",
      Self::DeleteItems => "delete_items",
    }
  }
}

impl fmt::Display for Permission {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Who is making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
  /// A configured account whose credentials were verified.
  Account { username: String },
  /// A caller that presented the shared insert access key.
  AccessKey,
  /// No credentials were presented.
  Anonymous,
}

impl fmt::Display for Actor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Account { username } => write!(f, "account {username:?}"),
      Self::AccessKey => f.write_str("access key"),
      Self::Anonymous => f.write_str("anonymous"),
    }
  }
}

/// Capability check consulted before every ledger operation.
pub trait PermissionGate: Send + Sync {
  fn has_permission(&self, actor: &Actor, permission: Permission) -> bool;
}

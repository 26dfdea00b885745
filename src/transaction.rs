//! Explicit transaction state for one connection.
//!
//! The guard only tracks state and validates transitions; the facade issues `BEGIN`, `COMMIT`
//! and `ROLLBACK` and reports back. A rejected transition never changes the state and never
//! touches the server.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PgWrapError;

pub(crate) const ERR_ALREADY_ACTIVE: &str =
    "Cannot start another transaction, commit or rollback the previous one.";
pub(crate) const ERR_COMMIT_IDLE: &str =
    "Trying to commit without having an explicitly opened transaction.";
pub(crate) const ERR_ROLLBACK_IDLE: &str =
    "Trying to roll back without having an explicitly opened transaction.";
pub(crate) const ERR_MUTATION_IDLE: &str =
    "Trying to perform a DDL/DML operation without having an explicitly opened transaction.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxState {
    #[default]
    Idle,
    Active,
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxState::Idle => write!(f, "idle"),
            TxState::Active => write!(f, "active"),
        }
    }
}

/// What `query_auto` does when a transaction is already open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoTxPolicy {
    /// Run inside the open transaction; its owner commits.
    #[default]
    Join,
    /// Fail with a transaction state error.
    Reject,
}

/// How a single auto-transaction statement is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AutoTxPlan {
    /// Wrap in `BEGIN` / `COMMIT`.
    Wrap,
    /// Run inside the already open transaction.
    Join,
}

/// Transaction state machine (`Idle` ⇄ `Active`).
#[derive(Debug, Default)]
pub struct TxGuard {
    state: TxState,
}

impl TxGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> TxState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TxState::Active
    }

    /// # Errors
    /// Returns `PgWrapError::TransactionStateError` if a transaction is already open.
    pub fn check_begin(&self) -> Result<(), PgWrapError> {
        self.require(TxState::Idle, ERR_ALREADY_ACTIVE)
    }

    /// # Errors
    /// Returns `PgWrapError::TransactionStateError` if no transaction is open.
    pub fn check_commit(&self) -> Result<(), PgWrapError> {
        self.require(TxState::Active, ERR_COMMIT_IDLE)
    }

    /// # Errors
    /// Returns `PgWrapError::TransactionStateError` if no transaction is open.
    pub fn check_rollback(&self) -> Result<(), PgWrapError> {
        self.require(TxState::Active, ERR_ROLLBACK_IDLE)
    }

    /// Mutating statements run only inside an explicit transaction.
    ///
    /// # Errors
    /// Returns `PgWrapError::TransactionStateError` if no transaction is open.
    pub fn check_mutation(&self) -> Result<(), PgWrapError> {
        self.require(TxState::Active, ERR_MUTATION_IDLE)
    }

    pub(crate) fn plan_auto(&self, policy: AutoTxPolicy) -> Result<AutoTxPlan, PgWrapError> {
        match (self.state, policy) {
            (TxState::Idle, _) => Ok(AutoTxPlan::Wrap),
            (TxState::Active, AutoTxPolicy::Join) => Ok(AutoTxPlan::Join),
            (TxState::Active, AutoTxPolicy::Reject) => Err(
                PgWrapError::TransactionStateError(ERR_ALREADY_ACTIVE.to_string()),
            ),
        }
    }

    pub(crate) fn activate(&mut self) {
        self.state = TxState::Active;
    }

    pub(crate) fn reset(&mut self) {
        self.state = TxState::Idle;
    }

    fn require(&self, expected: TxState, message: &str) -> Result<(), PgWrapError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(PgWrapError::TransactionStateError(message.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_guard_rejects_commit_rollback_and_mutation() {
        let guard = TxGuard::new();
        assert_eq!(guard.state(), TxState::Idle);
        assert!(guard.check_begin().is_ok());
        assert!(guard.check_commit().unwrap_err().is_transaction_state_error());
        assert!(guard.check_rollback().is_err());
        let err = guard.check_mutation().unwrap_err();
        assert!(err.to_string().contains("DDL/DML"));
    }

    #[test]
    fn active_guard_rejects_second_begin() {
        let mut guard = TxGuard::new();
        guard.activate();
        let err = guard.check_begin().unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Transaction state error: {ERR_ALREADY_ACTIVE}")
        );
        assert!(guard.is_active());
        assert!(guard.check_commit().is_ok());
        guard.reset();
        assert!(!guard.is_active());
    }

    #[test]
    fn auto_plan_follows_policy() {
        let mut guard = TxGuard::new();
        assert_eq!(guard.plan_auto(AutoTxPolicy::Reject).unwrap(), AutoTxPlan::Wrap);
        guard.activate();
        assert_eq!(guard.plan_auto(AutoTxPolicy::Join).unwrap(), AutoTxPlan::Join);
        assert!(guard.plan_auto(AutoTxPolicy::Reject).is_err());
    }
}

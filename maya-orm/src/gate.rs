//! # Method Gate
//!
//! A small state machine restricting which operations may follow which on a
//! single [`Record`](crate::Record) chain.
//!
//! - `Fresh`: the full CRUD surface.
//! - `Filtered`: after a `where*`, `order_by` or `limit` call; only further
//!   shaping or a read terminal (`get`, `first`, `last`, `count`).
//! - `Located`: after a single row was found or saved; only single-row
//!   mutators (`update`, `delete`, `save`, `increment`, `decrement`,
//!   `restore`, `force_delete`).
//!
//! Transitions only move forward within one chain. Terminal operations hand
//! back either a fresh chain or freshly hydrated, located records.

use std::fmt;

use crate::Error;

/// Every operation that the gate knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Where,
    OrderBy,
    Limit,
    Select,
    WithTrashed,
    Get,
    First,
    Last,
    Count,
    All,
    Find,
    FindFrom,
    Create,
    Update,
    Save,
    Delete,
    Increment,
    Decrement,
    Restore,
    ForceDelete,
    RestoreAll,
    RestoreFrom,
    ForceDeleteAll,
    ForceDeleteFrom,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Where => "where",
            Method::OrderBy => "order_by",
            Method::Limit => "limit",
            Method::Select => "select",
            Method::WithTrashed => "with_trashed",
            Method::Get => "get",
            Method::First => "first",
            Method::Last => "last",
            Method::Count => "count",
            Method::All => "all",
            Method::Find => "find",
            Method::FindFrom => "find_from",
            Method::Create => "create",
            Method::Update => "update",
            Method::Save => "save",
            Method::Delete => "delete",
            Method::Increment => "increment",
            Method::Decrement => "decrement",
            Method::Restore => "restore",
            Method::ForceDelete => "force_delete",
            Method::RestoreAll => "restore_all",
            Method::RestoreFrom => "restore_from",
            Method::ForceDeleteAll => "force_delete_all",
            Method::ForceDeleteFrom => "force_delete_from",
        }
    }
}

/// The chain state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Fresh,
    Filtered,
    Located,
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateState::Fresh => f.write_str("fresh"),
            GateState::Filtered => f.write_str("filtered"),
            GateState::Located => f.write_str("located"),
        }
    }
}

impl GateState {
    /// Transition table: whether `method` may be invoked in this state.
    pub fn allows(self, method: Method) -> bool {
        use Method::*;

        match self {
            GateState::Fresh => true,
            GateState::Filtered => matches!(
                method,
                Where | OrderBy | Limit | Select | WithTrashed | Get | First | Last | Count
            ),
            GateState::Located => matches!(
                method,
                Update | Delete | Save | Increment | Decrement | Restore | ForceDelete
            ),
        }
    }

    /// State reached after `method` completes without consuming the chain.
    pub fn after(self, method: Method) -> GateState {
        use Method::*;

        match method {
            Where | OrderBy | Limit => GateState::Filtered,
            Find | FindFrom | First | Last | Create | Update | Save | Increment | Decrement => GateState::Located,
            Delete | Restore | ForceDelete | RestoreAll | RestoreFrom | ForceDeleteAll | ForceDeleteFrom => {
                GateState::Fresh
            }
            Select | WithTrashed | Get | Count | All => self,
        }
    }
}

/// Per-record gate. Pure in-instance state.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodGate {
    state: GateState,
}

impl MethodGate {
    pub fn located() -> Self {
        Self { state: GateState::Located }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Fails with [`Error::MethodNotAllowed`] when `method` is outside the
    /// current allowed set.
    pub fn check(&self, method: Method) -> Result<(), Error> {
        if self.state.allows(method) {
            Ok(())
        } else {
            Err(Error::MethodNotAllowed { method: method.as_str(), state: self.state })
        }
    }

    pub fn advance(&mut self, method: Method) {
        self.state = self.state.after(method);
    }

    pub fn reset(&mut self) {
        self.state = GateState::Fresh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_allows_everything() {
        let gate = MethodGate::default();
        for method in [Method::Find, Method::Where, Method::All, Method::Create, Method::Save, Method::Delete] {
            assert!(gate.check(method).is_ok(), "{:?} should be allowed", method);
        }
    }

    #[test]
    fn test_filter_narrows_to_shaping_and_reads() {
        let mut gate = MethodGate::default();
        gate.advance(Method::Where);
        assert_eq!(gate.state(), GateState::Filtered);

        assert!(gate.check(Method::OrderBy).is_ok());
        assert!(gate.check(Method::Count).is_ok());
        assert!(matches!(gate.check(Method::Save), Err(Error::MethodNotAllowed { method: "save", .. })));
        assert!(gate.check(Method::Find).is_err());
        assert!(gate.check(Method::Delete).is_err());
    }

    #[test]
    fn test_located_allows_only_row_mutators() {
        let mut gate = MethodGate::default();
        gate.advance(Method::Find);
        assert_eq!(gate.state(), GateState::Located);

        assert!(gate.check(Method::Update).is_ok());
        assert!(gate.check(Method::ForceDelete).is_ok());
        assert!(matches!(
            gate.check(Method::Where),
            Err(Error::MethodNotAllowed { method: "where", state: GateState::Located })
        ));
        assert!(gate.check(Method::Get).is_err());
    }

    #[test]
    fn test_delete_returns_to_fresh() {
        let mut gate = MethodGate::located();
        gate.advance(Method::Delete);
        assert_eq!(gate.state(), GateState::Fresh);

        gate.advance(Method::WithTrashed);
        assert_eq!(gate.state(), GateState::Fresh);
    }
}

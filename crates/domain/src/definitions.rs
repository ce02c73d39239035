//! Declarative role/permission matrix accumulated before reconciliation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Declarative allow/deny matrix keyed by role name.
///
/// Repeated calls for the same role merge (append to) that role's path list
/// rather than replacing it, so definitions can be accumulated from several
/// call sites before a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissionDefinitions {
    /// Permission paths each role is allowed.
    #[serde(default)]
    allow: BTreeMap<String, Vec<String>>,
    /// Permission paths each role is denied.
    #[serde(default)]
    deny: BTreeMap<String, Vec<String>>,
}

impl RolePermissionDefinitions {
    /// Creates an empty definitions value.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends allowed paths for a role, merging with earlier calls.
    ///
    /// A role registered with an empty path list is still created during
    /// reconciliation.
    pub fn allow_for_role<I, S>(&mut self, role: impl Into<String>, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::merge(&mut self.allow, role.into(), paths);
    }

    /// Appends denied paths for a role, merging with earlier calls.
    pub fn deny_for_role<I, S>(&mut self, role: impl Into<String>, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::merge(&mut self.deny, role.into(), paths);
    }

    /// Appends both allowed and denied paths for a role in one call.
    pub fn set_for_role<I, J, S, T>(&mut self, role: impl Into<String>, allow: I, deny: J)
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        let role = role.into();
        Self::merge(&mut self.allow, role.clone(), allow);
        Self::merge(&mut self.deny, role, deny);
    }

    /// Returns the allow map in role-name order.
    #[must_use]
    pub fn allow(&self) -> &BTreeMap<String, Vec<String>> {
        &self.allow
    }

    /// Returns the deny map in role-name order.
    #[must_use]
    pub fn deny(&self) -> &BTreeMap<String, Vec<String>> {
        &self.deny
    }

    /// Returns whether no role is registered at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty()
    }

    fn merge<I, S>(map: &mut BTreeMap<String, Vec<String>>, role: String, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        map.entry(role)
            .or_default()
            .extend(paths.into_iter().map(Into::into));
    }
}

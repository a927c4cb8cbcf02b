//! Role → permitted operations table.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use common::ConfigError;
use domain::{Role, RoleSet};

/// Operation names as they appear in the gRPC path.
pub mod operations {
    pub const REGISTER_USER: &str = "RegisterUser";
    pub const LOGIN_USER: &str = "LoginUser";
    pub const GET_USER_DATA: &str = "GetUserData";
    pub const GRANT_ADMIN_RIGHTS: &str = "GrantAdminRights";
    pub const GRANT_ROLE: &str = "GrantRole";
    pub const CREATE_REQUEST: &str = "CreateRequest";
    pub const GET_LOGISTICS_DATA: &str = "GetLogisticsData";
}

/// Immutable mapping from role to the operations it may invoke.
///
/// Unlisted operations are denied to every role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionTable {
    grants: HashMap<Role, HashSet<String>>,
}

impl PermissionTable {
    /// Empty table: denies everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add operations to a role.
    pub fn grant<I, S>(mut self, role: Role, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grants
            .entry(role)
            .or_default()
            .extend(operations.into_iter().map(Into::into));
        self
    }

    /// The built-in policy.
    pub fn standard() -> Self {
        use operations::*;

        Self::new()
            .grant(
                Role::Admin,
                [REGISTER_USER, LOGIN_USER, GRANT_ADMIN_RIGHTS, GRANT_ROLE, GET_USER_DATA],
            )
            .grant(
                Role::Logistics,
                [GET_USER_DATA, CREATE_REQUEST, GET_LOGISTICS_DATA],
            )
            .grant(Role::User, [REGISTER_USER, LOGIN_USER, GET_USER_DATA])
    }

    /// Parse a policy of the form `{"role": ["Operation", ...], ...}`.
    ///
    /// Unknown role names are rejected.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let raw: HashMap<String, Vec<String>> =
            serde_json::from_str(json).map_err(|e| e.to_string())?;

        let mut table = Self::new();
        for (name, ops) in raw {
            let role: Role = name.parse().map_err(|e: domain::DomainError| e.to_string())?;
            table = table.grant(role, ops);
        }
        Ok(table)
    }

    /// Load a JSON policy file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let json = fs::read_to_string(path)
            .map_err(|e| ConfigError::invalid("RBAC_POLICY_PATH", &display, e.to_string()))?;
        Self::from_json(&json)
            .map_err(|reason| ConfigError::invalid("RBAC_POLICY_PATH", &display, reason))
    }

    /// Whether any of `roles` grants `operation`.
    pub fn allows(&self, roles: &RoleSet, operation: &str) -> bool {
        roles.iter().any(|role| {
            self.grants
                .get(&role)
                .is_some_and(|ops| ops.contains(operation))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::operations::*;
    use super::*;

    fn roles(list: &[Role]) -> RoleSet {
        list.iter().copied().collect()
    }

    #[test]
    fn test_standard_table() {
        let table = PermissionTable::standard();

        assert!(table.allows(&roles(&[Role::User]), GET_USER_DATA));
        assert!(table.allows(&roles(&[Role::Admin]), GRANT_ROLE));
        assert!(table.allows(&roles(&[Role::Logistics]), GET_LOGISTICS_DATA));
        assert!(!table.allows(&roles(&[Role::User]), GRANT_ADMIN_RIGHTS));
        assert!(!table.allows(&roles(&[Role::Logistics]), LOGIN_USER));
    }

    #[test]
    fn test_any_role_suffices() {
        let table = PermissionTable::standard();
        assert!(table.allows(&roles(&[Role::User, Role::Logistics]), CREATE_REQUEST));
    }

    #[test]
    fn test_empty_roles_denied() {
        let table = PermissionTable::standard();
        assert!(!table.allows(&RoleSet::new(), GET_USER_DATA));
    }

    #[test]
    fn test_unknown_operation_denied() {
        let table = PermissionTable::standard();
        let everyone = roles(&Role::ALL);

        assert!(!table.allows(&everyone, "DropDatabase"));
        assert!(!table.allows(&everyone, ""));
    }

    #[test]
    fn test_from_json() {
        let table =
            PermissionTable::from_json(r#"{"logistics": ["CreateRequest"], "user": []}"#).unwrap();

        assert!(table.allows(&roles(&[Role::Logistics]), CREATE_REQUEST));
        assert!(!table.allows(&roles(&[Role::Logistics]), GET_USER_DATA));
        assert!(!table.allows(&roles(&[Role::User]), GET_USER_DATA));
    }

    #[test]
    fn test_from_json_rejects_unknown_role() {
        assert!(PermissionTable::from_json(r#"{"root": ["GrantRole"]}"#).is_err());
        assert!(PermissionTable::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let result = PermissionTable::load(Path::new("/nonexistent/policy.json"));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}

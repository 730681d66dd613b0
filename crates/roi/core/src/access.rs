// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Report access control

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
}

impl Principal {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), role: Role::User }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), role: Role::Admin }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
}

/// Ownership and sharing facts an authorizer decides on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportAccessInfo<'a> {
    pub owner_id: &'a str,
    pub is_public: bool,
    pub shared_with: &'a [String],
}

pub trait Authorizer: Send + Sync {
    fn authorize(&self, principal: &Principal, access: Access, report: &ReportAccessInfo<'_>) -> bool;
}

/// Admins and owners may do anything; shared users and anyone on a public report may read
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAuthorizer;

impl Authorizer for DefaultAuthorizer {
    fn authorize(&self, principal: &Principal, access: Access, report: &ReportAccessInfo<'_>) -> bool {
        if principal.is_admin() || principal.user_id == report.owner_id {
            return true;
        }
        match access {
            Access::Read => report.is_public || report.shared_with.iter().any(|user| *user == principal.user_id),
            Access::Write => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info<'a>(shared_with: &'a [String], is_public: bool) -> ReportAccessInfo<'a> {
        ReportAccessInfo { owner_id: "owner", is_public, shared_with }
    }

    #[test]
    fn test_owner_and_admin() {
        let auth = DefaultAuthorizer;
        let report = info(&[], false);
        assert!(auth.authorize(&Principal::user("owner"), Access::Write, &report));
        assert!(auth.authorize(&Principal::admin("root"), Access::Write, &report));
        assert!(!auth.authorize(&Principal::user("stranger"), Access::Read, &report));
    }

    #[test]
    fn test_shared_and_public_are_read_only() {
        let auth = DefaultAuthorizer;
        let shared = vec!["friend".to_string()];
        let report = info(&shared, false);
        assert!(auth.authorize(&Principal::user("friend"), Access::Read, &report));
        assert!(!auth.authorize(&Principal::user("friend"), Access::Write, &report));

        let public = info(&[], true);
        assert!(auth.authorize(&Principal::user("anyone"), Access::Read, &public));
        assert!(!auth.authorize(&Principal::user("anyone"), Access::Write, &public));
    }
}

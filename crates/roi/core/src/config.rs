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

//! Service configuration

use crate::history::HistoryConfig;
use std::env;

/// Configuration for [`crate::service::ReportService`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Back up live sections before a restore unless the caller opts out
    pub auto_backup_on_restore: bool,

    /// Retention cap per report; `None` keeps every version
    pub max_versions_per_report: Option<usize>,

    /// Notify the owner when someone else changes their report
    pub notify_owner: bool,

    /// Actor recorded when the service acts on its own behalf
    pub system_actor: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            auto_backup_on_restore: true,
            max_versions_per_report: None,
            notify_owner: true,
            system_actor: "system".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`; unparsable values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            auto_backup_on_restore: lookup("ROI_AUTO_BACKUP_ON_RESTORE")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.auto_backup_on_restore),

            max_versions_per_report: lookup("ROI_MAX_VERSIONS_PER_REPORT")
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|max| *max > 0),

            notify_owner: lookup("ROI_NOTIFY_OWNER").and_then(|v| v.trim().parse().ok()).unwrap_or(defaults.notify_owner),

            system_actor: lookup("ROI_SYSTEM_ACTOR").filter(|v| !v.trim().is_empty()).unwrap_or(defaults.system_actor),
        }
    }

    pub fn history(&self) -> HistoryConfig {
        HistoryConfig {
            max_versions: self.max_versions_per_report,
        }
    }
}

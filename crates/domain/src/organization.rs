use std::str::FromStr;

use cohort_core::{AccessType, AppError};
use serde::{Deserialize, Serialize};

/// Organization-wide access level configured for a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrganizationAccess {
    /// Anyone may read and edit.
    PublicReadWrite,
    /// Anyone may read.
    PublicReadOnly,
    /// Regular ownership, policy and connection checks apply.
    Private,
}

impl OrganizationAccess {
    /// Returns a stable storage value for the access level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PublicReadWrite => "public-read-write",
            Self::PublicReadOnly => "public-read-only",
            Self::Private => "private",
        }
    }

    /// Returns whether this level exempts `access_type` from checks.
    #[must_use]
    pub fn permits(&self, access_type: AccessType) -> bool {
        match self {
            Self::PublicReadWrite => true,
            Self::PublicReadOnly => access_type == AccessType::Read,
            Self::Private => false,
        }
    }
}

impl FromStr for OrganizationAccess {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "public-read-write" => Ok(Self::PublicReadWrite),
            "public-read-only" => Ok(Self::PublicReadOnly),
            "private" => Ok(Self::Private),
            _ => Err(AppError::Validation(format!(
                "unknown organization access level '{value}'"
            ))),
        }
    }
}

/// Organization-level default for one resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationLevelDefault {
    /// Resource type the default applies to.
    pub resource_type: String,
    /// Configured access level.
    pub access: OrganizationAccess,
}

#[cfg(test)]
mod tests {
    use cohort_core::AccessType;

    use super::OrganizationAccess;

    #[test]
    fn read_only_level_exempts_reads_only() {
        assert!(OrganizationAccess::PublicReadOnly.permits(AccessType::Read));
        assert!(!OrganizationAccess::PublicReadOnly.permits(AccessType::Edit));
        assert!(OrganizationAccess::PublicReadWrite.permits(AccessType::Edit));
        assert!(!OrganizationAccess::Private.permits(AccessType::Read));
    }
}

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use cohort_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::Reference;

const WILDCARD_VERB: &str = "*";

/// A `"<ResourceType>:<verb>"` or `"<ResourceType>:*"` action string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceAction {
    resource_type: NonEmptyString,
    verb: String,
}

impl ResourceAction {
    /// Creates an action from a resource type and verb.
    pub fn new(resource_type: impl Into<String>, verb: impl Into<String>) -> AppResult<Self> {
        let resource_type = NonEmptyString::new(resource_type)?;
        let verb = String::from(NonEmptyString::new(verb)?);
        if resource_type.as_str().contains(':') || verb.contains(':') {
            return Err(AppError::Validation(format!(
                "resource action '{}:{}' must contain exactly one ':'",
                resource_type.as_str(),
                verb
            )));
        }

        Ok(Self {
            resource_type,
            verb,
        })
    }

    /// Parses a `"<ResourceType>:<verb>"` value.
    pub fn parse(value: &str) -> AppResult<Self> {
        let Some((resource_type, verb)) = value.split_once(':') else {
            return Err(AppError::Validation(format!(
                "resource action '{value}' must have the form '<ResourceType>:<verb>'"
            )));
        };

        Self::new(resource_type, verb)
    }

    /// Returns the resource type part.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        self.resource_type.as_str()
    }

    /// Returns the verb part.
    #[must_use]
    pub fn verb(&self) -> &str {
        self.verb.as_str()
    }

    /// Returns whether the verb is the `*` wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.verb == WILDCARD_VERB
    }

    /// Returns the `"<ResourceType>:*"` action covering this one.
    #[must_use]
    pub fn wildcard(&self) -> Self {
        Self {
            resource_type: self.resource_type.clone(),
            verb: WILDCARD_VERB.to_owned(),
        }
    }
}

impl Display for ResourceAction {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}:{}",
            self.resource_type.as_str(),
            self.verb
        )
    }
}

impl FromStr for ResourceAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for ResourceAction {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value.as_str())
    }
}

impl From<ResourceAction> for String {
    fn from(value: ResourceAction) -> Self {
        value.to_string()
    }
}

/// Effect of a policy document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyEffect {
    /// Grants the listed actions.
    Allow,
    /// Denies the listed actions.
    Deny,
}

impl PolicyEffect {
    /// Returns a stable storage value for the effect.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

impl FromStr for PolicyEffect {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            _ => Err(AppError::Validation(format!(
                "unknown policy effect '{value}'"
            ))),
        }
    }
}

/// Lifecycle status of a policy document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyStatus {
    /// Policy is in force.
    Active,
    /// Policy is retired.
    Inactive,
}

impl PolicyStatus {
    /// Returns a stable storage value for the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl FromStr for PolicyStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(AppError::Validation(format!(
                "unknown policy status '{value}'"
            ))),
        }
    }
}

/// Static permission document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Bare policy id.
    pub id: String,
    /// Human-readable policy name.
    #[serde(default)]
    pub name: Option<String>,
    /// Lifecycle status.
    pub status: PolicyStatus,
    /// Effect applied to the listed actions.
    pub effect: PolicyEffect,
    /// Actions covered by the policy.
    pub actions: Vec<ResourceAction>,
    /// Soft-delete marker.
    #[serde(default)]
    pub is_deleted: bool,
}

impl Policy {
    /// Returns the `Policy/<id>` reference.
    pub fn reference(&self) -> AppResult<Reference> {
        Reference::new(crate::ReferenceKind::Policy, self.id.as_str())
    }

    /// Returns whether the policy is an active, non-deleted allow policy.
    #[must_use]
    pub fn is_enforceable_allow(&self) -> bool {
        self.effect == PolicyEffect::Allow
            && self.status == PolicyStatus::Active
            && !self.is_deleted
    }

    /// Returns whether the policy lists `action` or its resource wildcard.
    #[must_use]
    pub fn permits(&self, action: &ResourceAction) -> bool {
        let wildcard = action.wildcard();
        self.actions
            .iter()
            .any(|listed| listed == action || listed == &wildcard)
    }

    /// Returns whether the policy permits every action in `actions`.
    #[must_use]
    pub fn permits_all(&self, actions: &[ResourceAction]) -> bool {
        actions.iter().all(|action| self.permits(action))
    }
}

/// Grants a policy to a principal within a resource scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyAssignment {
    /// Bare assignment id.
    pub id: String,
    /// Profile receiving the policy.
    pub principal: Reference,
    /// Study, site or similar scope the grant applies to.
    pub resource_scope: Reference,
    /// Policy being granted.
    pub policy: Reference,
    /// Soft-delete marker.
    #[serde(default)]
    pub is_deleted: bool,
}

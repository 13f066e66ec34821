//! Where owner and information-source references live in each resource type.

use std::collections::HashMap;

use cohort_core::{AppError, AppResult};
use serde_json::Value;

use crate::Reference;

/// Field path inside a JSON resource, one key per nesting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(&'static [&'static str]);

impl FieldPath {
    /// Creates a path from its keys.
    #[must_use]
    pub const fn new(keys: &'static [&'static str]) -> Self {
        Self(keys)
    }

    /// Returns the string value stored at this path, if any.
    #[must_use]
    pub fn lookup<'a>(&self, resource: &'a Value) -> Option<&'a str> {
        self.0
            .iter()
            .try_fold(resource, |value, key| value.get(key))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Returns the dotted representation of this path.
    #[must_use]
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }
}

/// Owner and information-source paths for one resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipPaths {
    /// Path to the owner reference.
    pub owner: FieldPath,
    /// Path to the information-source reference, when the type records one.
    pub information_source: Option<FieldPath>,
}

/// References extracted from a resource payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceOwnership {
    /// Owner reference.
    pub owner: Reference,
    /// Information-source reference, when present in the payload.
    pub information_source: Option<Reference>,
}

/// Registry of ownership paths keyed by resource type.
#[derive(Debug, Clone)]
pub struct OwnershipRegistry {
    paths: HashMap<String, OwnershipPaths>,
}

impl Default for OwnershipRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(
            "Task",
            OwnershipPaths {
                owner: FieldPath::new(&["for", "reference"]),
                information_source: Some(FieldPath::new(&["requester", "reference"])),
            },
        );
        registry.register(
            "Observation",
            OwnershipPaths {
                owner: FieldPath::new(&["subject", "reference"]),
                information_source: Some(FieldPath::new(&["informationSource", "reference"])),
            },
        );
        registry.register(
            "QuestionnaireResponse",
            OwnershipPaths {
                owner: FieldPath::new(&["subject", "reference"]),
                information_source: Some(FieldPath::new(&["source", "reference"])),
            },
        );
        registry.register(
            "Device",
            OwnershipPaths {
                owner: FieldPath::new(&["patient", "reference"]),
                information_source: None,
            },
        );
        registry.register(
            "Connection",
            OwnershipPaths {
                owner: FieldPath::new(&["from", "reference"]),
                information_source: None,
            },
        );
        registry.register(
            "ResearchSubject",
            OwnershipPaths {
                owner: FieldPath::new(&["individual", "reference"]),
                information_source: None,
            },
        );
        registry
    }
}

impl OwnershipRegistry {
    /// Creates a registry without any resource types.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            paths: HashMap::new(),
        }
    }

    /// Registers or replaces the paths for a resource type.
    pub fn register(&mut self, resource_type: impl Into<String>, paths: OwnershipPaths) {
        self.paths.insert(resource_type.into(), paths);
    }

    /// Returns the paths registered for a resource type.
    #[must_use]
    pub fn paths(&self, resource_type: &str) -> Option<&OwnershipPaths> {
        self.paths.get(resource_type)
    }

    /// Extracts the owner and information source from a resource payload.
    pub fn extract(&self, resource_type: &str, resource: &Value) -> AppResult<ResourceOwnership> {
        let paths = self.paths(resource_type).ok_or_else(|| {
            AppError::Validation(format!(
                "resource type '{resource_type}' has no registered ownership paths"
            ))
        })?;

        let owner = paths.owner.lookup(resource).ok_or_else(|| {
            AppError::Validation(format!(
                "'{resource_type}' payload is missing owner field '{}'",
                paths.owner.dotted()
            ))
        })?;

        let information_source = paths
            .information_source
            .and_then(|path| path.lookup(resource))
            .map(Reference::parse)
            .transpose()?;

        Ok(ResourceOwnership {
            owner: Reference::parse(owner)?,
            information_source,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::OwnershipRegistry;
    use crate::Reference;

    #[test]
    fn extract_reads_owner_and_information_source() {
        let registry = OwnershipRegistry::default();
        let payload = json!({
            "resourceType": "Observation",
            "subject": { "reference": "ResearchSubject/rs-1" },
            "informationSource": { "reference": "UserProfile/prac-1" }
        });

        let extracted = registry.extract("Observation", &payload);
        assert!(extracted.is_ok());
        let extracted = extracted.unwrap_or_else(|_| unreachable!());
        assert_eq!(
            extracted.owner,
            Reference::parse("ResearchSubject/rs-1").unwrap_or_else(|_| unreachable!())
        );
        assert_eq!(
            extracted.information_source.map(|value| value.to_string()),
            Some("UserProfile/prac-1".to_owned())
        );
    }

    #[test]
    fn extract_without_information_source_path_returns_none() {
        let registry = OwnershipRegistry::default();
        let payload = json!({ "patient": { "reference": "UserProfile/p-1" } });

        let extracted = registry.extract("Device", &payload);
        assert!(matches!(extracted, Ok(value) if value.information_source.is_none()));
    }

    #[test]
    fn extract_rejects_unknown_types_and_missing_owner() {
        let registry = OwnershipRegistry::default();
        assert!(registry.extract("Invoice", &json!({})).is_err());
        assert!(registry.extract("Task", &json!({ "for": {} })).is_err());
    }
}

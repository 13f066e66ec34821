use super::*;

impl AuthorizationService {
    /// Returns whether the organization-level default for `resource_type`
    /// makes it public for `access_type`.
    ///
    /// A missing default means "not public" rather than an error.
    pub async fn resource_access_level(
        &self,
        resource_type: &str,
        access_type: AccessType,
    ) -> AppResult<bool> {
        Ok(self
            .organization_defaults
            .find_default(resource_type)
            .await?
            .is_some_and(|default| default.access.permits(access_type)))
    }
}

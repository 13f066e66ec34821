use cohort_domain::{Connection, ResourceAction};
use serde_json::Value;

use super::*;

impl AuthorizationService {
    /// Authorizes writing `payload` as a `resource_type` resource.
    ///
    /// The owner and information source are read from the payload through
    /// the ownership registry; a payload without an information source is
    /// treated as submitted by the requester.
    pub async fn authorize_resource_write(
        &self,
        requester: &Reference,
        resource_type: &str,
        access_type: AccessType,
        payload: &Value,
        resource_actions: &[ResourceAction],
    ) -> AppResult<Vec<Connection>> {
        let ownership = self.ownership.extract(resource_type, payload)?;

        self.authorize_request_sharing_rules(&AuthorizationRequest {
            requester: requester.clone(),
            information_source: ownership
                .information_source
                .unwrap_or_else(|| requester.clone()),
            owner: ownership.owner,
            resource_type: resource_type.to_owned(),
            access_type,
            owner_type: None,
            resource_actions: resource_actions.to_vec(),
        })
        .await
    }
}

//! Idempotent scenario state cleanup.
//!
//! Every scenario is bracketed by a [`StateReset`] so runs are isolated
//! from each other: enumerate all persisted entities through the
//! service's list endpoint and delete each one. A transiently
//! unreachable target is tolerated and logged, not raised: "cannot
//! clean because the target is down" is diagnostic information, not a
//! harness bug.

use crate::client::ApiClient;
use tracing::{debug, info, warn};

/// Deletes all persisted entities through the external service.
#[derive(Debug, Clone)]
pub struct StateReset {
    client: ApiClient,
}

impl StateReset {
    /// Create a reset helper over the given client.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Delete every persisted entity. Idempotent: running it against an
    /// already-empty store is a no-op.
    pub async fn reset(&self) {
        let users = match self.client.list_users().await {
            Ok(users) => users,
            Err(e) => {
                warn!(
                    target: "harness.reset",
                    error = %e,
                    "Unable to enumerate entities for cleanup; target may be down"
                );
                return;
            }
        };

        if users.is_empty() {
            debug!(target: "harness.reset", "Store already empty");
            return;
        }

        info!(
            target: "harness.reset",
            count = users.len(),
            "Deleting persisted entities"
        );

        for user in users {
            if let Err(e) = self.client.delete_user(user.id).await {
                warn!(
                    target: "harness.reset",
                    id = user.id,
                    error = %e,
                    "Failed to delete entity during cleanup"
                );
            }
        }
    }
}

//! GetUserEntitlementsHandler - Query handler for a user's entitlement records.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::foundation::{DomainError, RequestContext, UserId};
use crate::domain::policy::EntitlementRecord;
use crate::ports::{PurchaseRepository, SubscriptionRepository};

/// Query for one user's entitlements.
#[derive(Debug, Clone)]
pub struct GetUserEntitlementsQuery {
    pub user_id: UserId,
}

/// Builds the entitlement records the policy engine consumes.
///
/// An active subscription yields one subscription record expiring at the
/// end of the current period; every completed, unexpired purchase yields a
/// purchase record.
pub struct GetUserEntitlementsHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    purchases: Arc<dyn PurchaseRepository>,
}

impl GetUserEntitlementsHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        purchases: Arc<dyn PurchaseRepository>,
    ) -> Self {
        Self {
            subscriptions,
            purchases,
        }
    }

    /// # Errors
    ///
    /// - `Unauthorized` - no bearer credential
    /// - `Forbidden` - caller is neither the owner nor an admin
    pub async fn handle(
        &self,
        ctx: &RequestContext,
        query: GetUserEntitlementsQuery,
    ) -> Result<Vec<EntitlementRecord>, DomainError> {
        ctx.authorize_owner(&query.user_id)?;

        let now = Utc::now();
        let mut records = Vec::new();

        if let Some(subscription) = self.subscriptions.find_by_user(&query.user_id).await? {
            if subscription.is_active() {
                records.push(EntitlementRecord::subscription(
                    subscription.plan_id,
                    subscription.status,
                    Some(subscription.current_period_end),
                ));
            }
        }

        for purchase in self
            .purchases
            .list_active_by_user(&query.user_id, now)
            .await?
        {
            records.push(EntitlementRecord::purchase(
                purchase.content_id,
                purchase.status,
                purchase.expires_at,
            ));
        }

        Ok(records)
    }
}

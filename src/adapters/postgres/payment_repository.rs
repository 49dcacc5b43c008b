//! PostgreSQL implementation of the payment repositories.
//!
//! Provides persistent storage for Stripe links, subscriptions and
//! purchases. Every write is an upsert keyed by its natural key, so
//! replaying the same mutation leaves the same state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::payments::{
    Purchase, PurchaseType, StripeLink, Subscription, SubscriptionStatusUpdate,
    PURCHASE_COMPLETED,
};
use crate::ports::{PurchaseRepository, StripeLinkRepository, SubscriptionRepository};

/// PostgreSQL implementation of the payment repository ports.
pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn user_by(&self, column: &str, value: &str) -> Result<Option<UserId>, DomainError> {
        if value.is_empty() {
            return Ok(None);
        }
        let sql = format!(
            "SELECT user_id FROM stripe_customer_links WHERE {} = $1 \
             ORDER BY updated_at DESC LIMIT 1",
            column
        );
        let user_id: Option<String> = sqlx::query_scalar(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to resolve user: {}", e)))?;

        user_id.map(parse_user_id).transpose()
    }
}

fn parse_user_id(raw: String) -> Result<UserId, DomainError> {
    UserId::new(raw).map_err(|e| DomainError::database(format!("Invalid user_id: {}", e)))
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    user_id: String,
    plan_id: String,
    status: String,
    payment_method_id: Option<String>,
    stripe_customer_id: Option<String>,
    stripe_subscription_id: Option<String>,
    current_period_start: DateTime<Utc>,
    current_period_end: DateTime<Utc>,
    cancel_at_period_end: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            user_id: parse_user_id(row.user_id)?,
            plan_id: row.plan_id,
            status: row.status,
            payment_method_id: row.payment_method_id.unwrap_or_default(),
            stripe_customer_id: row.stripe_customer_id.unwrap_or_default(),
            stripe_subscription_id: row.stripe_subscription_id.unwrap_or_default(),
            current_period_start: row.current_period_start,
            current_period_end: row.current_period_end,
            cancel_at_period_end: row.cancel_at_period_end,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row representation of a purchase.
#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: String,
    user_id: String,
    content_id: String,
    purchase_type: String,
    amount: Option<i64>,
    currency: String,
    status: String,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = DomainError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        Ok(Purchase {
            id: row.id,
            user_id: parse_user_id(row.user_id)?,
            content_id: row.content_id,
            purchase_type: PurchaseType::parse(Some(&row.purchase_type)),
            amount: row.amount,
            currency: row.currency,
            status: row.status,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl StripeLinkRepository for PostgresPaymentRepository {
    async fn upsert_link(&self, link: StripeLink) -> Result<(), DomainError> {
        if !link.has_identifiers() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO stripe_customer_links (
                user_id, customer_id, subscription_id, created_at, updated_at
            ) VALUES ($1, NULLIF($2, ''), NULLIF($3, ''), $4, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                customer_id = COALESCE(EXCLUDED.customer_id, stripe_customer_links.customer_id),
                subscription_id = COALESCE(EXCLUDED.subscription_id, stripe_customer_links.subscription_id),
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(link.user_id.as_str())
        .bind(&link.customer_id)
        .bind(&link.subscription_id)
        .bind(link.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save stripe link: {}", e)))?;

        Ok(())
    }

    async fn resolve_user(
        &self,
        customer_id: &str,
        subscription_id: &str,
    ) -> Result<Option<UserId>, DomainError> {
        if let Some(user_id) = self.user_by("subscription_id", subscription_id).await? {
            return Ok(Some(user_id));
        }
        self.user_by("customer_id", customer_id).await
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresPaymentRepository {
    async fn upsert_by_user(&self, subscription: Subscription) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                user_id, plan_id, status, payment_method_id, stripe_customer_id,
                stripe_subscription_id, current_period_start, current_period_end,
                cancel_at_period_end, created_at, updated_at
            ) VALUES ($1, $2, $3, NULLIF($4, ''), NULLIF($5, ''), NULLIF($6, ''), $7, $8, $9, $10, $11)
            ON CONFLICT (user_id) DO UPDATE SET
                plan_id = EXCLUDED.plan_id,
                status = EXCLUDED.status,
                payment_method_id = EXCLUDED.payment_method_id,
                stripe_customer_id = EXCLUDED.stripe_customer_id,
                stripe_subscription_id = EXCLUDED.stripe_subscription_id,
                current_period_start = EXCLUDED.current_period_start,
                current_period_end = EXCLUDED.current_period_end,
                cancel_at_period_end = EXCLUDED.cancel_at_period_end,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(subscription.user_id.as_str())
        .bind(&subscription.plan_id)
        .bind(&subscription.status)
        .bind(&subscription.payment_method_id)
        .bind(&subscription.stripe_customer_id)
        .bind(&subscription.stripe_subscription_id)
        .bind(subscription.current_period_start)
        .bind(subscription.current_period_end)
        .bind(subscription.cancel_at_period_end)
        .bind(subscription.created_at)
        .bind(subscription.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save subscription: {}", e)))?;

        Ok(())
    }

    async fn update_status_by_user(
        &self,
        user_id: &UserId,
        update: &SubscriptionStatusUpdate,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                status = $2,
                cancel_at_period_end = $3,
                updated_at = $4
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .bind(&update.status)
        .bind(update.cancel_at_period_end)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update subscription: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT user_id, plan_id, status, payment_method_id, stripe_customer_id,
                   stripe_subscription_id, current_period_start, current_period_end,
                   cancel_at_period_end, created_at, updated_at
            FROM subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load subscription: {}", e)))?
        .map(Subscription::try_from)
        .transpose()
    }
}

#[async_trait]
impl PurchaseRepository for PostgresPaymentRepository {
    async fn upsert_purchase(&self, purchase: Purchase) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, user_id, content_id, purchase_type, amount, currency, status,
                expires_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                content_id = EXCLUDED.content_id,
                purchase_type = EXCLUDED.purchase_type,
                amount = EXCLUDED.amount,
                currency = EXCLUDED.currency,
                status = EXCLUDED.status,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(&purchase.id)
        .bind(purchase.user_id.as_str())
        .bind(&purchase.content_id)
        .bind(purchase.purchase_type.as_str())
        .bind(purchase.amount)
        .bind(&purchase.currency)
        .bind(&purchase.status)
        .bind(purchase.expires_at)
        .bind(purchase.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save purchase: {}", e)))?;

        Ok(())
    }

    async fn list_active_by_user(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Purchase>, DomainError> {
        sqlx::query_as::<_, PurchaseRow>(
            r#"
            SELECT id, user_id, content_id, purchase_type, amount, currency, status,
                   expires_at, created_at
            FROM purchases
            WHERE user_id = $1
              AND status = $2
              AND (expires_at IS NULL OR expires_at > $3)
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id.as_str())
        .bind(PURCHASE_COMPLETED)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list purchases: {}", e)))?
        .into_iter()
        .map(Purchase::try_from)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_row_fills_missing_ids_with_empty_strings() {
        let now = Utc::now();
        let row = SubscriptionRow {
            user_id: "u1".to_string(),
            plan_id: "tier2".to_string(),
            status: "active".to_string(),
            payment_method_id: None,
            stripe_customer_id: Some("cus_1".to_string()),
            stripe_subscription_id: None,
            current_period_start: now,
            current_period_end: now,
            cancel_at_period_end: false,
            created_at: now,
            updated_at: now,
        };

        let subscription = Subscription::try_from(row).unwrap();

        assert_eq!(subscription.stripe_customer_id, "cus_1");
        assert_eq!(subscription.stripe_subscription_id, "");
        assert!(subscription.is_active());
    }

    #[test]
    fn purchase_row_parses_type() {
        let now = Utc::now();
        let row = PurchaseRow {
            id: "cs_1".to_string(),
            user_id: "u1".to_string(),
            content_id: "movie-1".to_string(),
            purchase_type: "rent".to_string(),
            amount: Some(399),
            currency: "usd".to_string(),
            status: PURCHASE_COMPLETED.to_string(),
            expires_at: Some(now),
            created_at: now,
        };

        let purchase = Purchase::try_from(row).unwrap();

        assert_eq!(purchase.purchase_type, PurchaseType::Rent);
        assert_eq!(purchase.amount, Some(399));
    }

    #[test]
    fn blank_user_id_is_rejected() {
        assert!(parse_user_id("  ".to_string()).is_err());
    }
}

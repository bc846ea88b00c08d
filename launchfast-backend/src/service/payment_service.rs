// launchfast-backend/src/service/payment_service.rs

use crate::config::StripeConfig;
use crate::db::DbPool;
use crate::domain::profile_model::Model as Profile;
use crate::domain::subscription_state::SubscriptionState;
use crate::domain::subscription_tier::SubscriptionTier;
use crate::error::{AppError, AppResult};
use crate::repository::profile_repository::{BillingUpdate, ProfileRepository};
use crate::utils::email::{payment_failed_template, EmailMessage, Mailer};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use stripe::{
    BillingPortalSession, CheckoutSession, CheckoutSessionMode, Client, CreateBillingPortalSession,
    CreateCheckoutSession, CreateCheckoutSessionLineItems, CreateCustomer, Customer, Event,
    EventObject, EventType, Invoice, Subscription, Webhook,
};
use uuid::Uuid;

/// Stripeのサブスクリプションステータスのうち、課金関係が終了したもの
const TERMINAL_STATUSES: &[&str] = &["canceled", "incomplete_expired"];

#[derive(Clone)]
pub struct PaymentService {
    profile_repo: Arc<ProfileRepository>,
    stripe_config: StripeConfig,
    client: Client,
    frontend_url: String,
    mailer: Arc<dyn Mailer>,
}

impl PaymentService {
    pub fn new(
        db: DbPool,
        stripe_config: StripeConfig,
        frontend_url: String,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let client = Client::new(stripe_config.secret_key.clone());

        Self {
            profile_repo: Arc::new(ProfileRepository::new(db)),
            stripe_config,
            client,
            frontend_url,
            mailer,
        }
    }

    fn billing_url(&self) -> String {
        format!("{}/billing", self.frontend_url)
    }

    /// Pro プランのチェックアウトセッションを作成し、URLを返す
    pub async fn create_checkout_session(&self, user_id: Uuid) -> AppResult<String> {
        let profile = self
            .profile_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        let state = SubscriptionState::resolve(Some(&profile.subscription_data()), Utc::now());
        if state.can_access_features {
            return Err(AppError::Conflict(format!(
                "You already have access through the {} plan",
                state.plan.name
            )));
        }

        // 開発モードの場合はモックURLを返す
        if self.stripe_config.development_mode {
            tracing::info!(user_id = %user_id, "Development mode: returning mock checkout URL");
            return Ok(format!(
                "{}/mock-checkout?user_id={}&tier={}",
                self.frontend_url,
                user_id,
                SubscriptionTier::Pro
            ));
        }

        let customer_id = self.ensure_customer(&profile).await?;

        let cancel_url = format!("{}/pricing", self.frontend_url);
        let success_url = format!(
            "{}/billing?session_id={{CHECKOUT_SESSION_ID}}",
            self.frontend_url
        );
        let user_id_str = user_id.to_string();

        let mut params = CreateCheckoutSession::new();
        params.cancel_url = Some(&cancel_url);
        params.success_url = Some(&success_url);
        params.client_reference_id = Some(&user_id_str);
        params.customer = Some(customer_id.parse().map_err(|_| {
            AppError::InternalServerError("Invalid customer ID format".to_string())
        })?);
        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            price: Some(self.stripe_config.pro_price_id.clone()),
            quantity: Some(1),
            ..Default::default()
        }]);
        params.mode = Some(CheckoutSessionMode::Subscription);
        params.metadata = Some(
            [
                ("user_id".to_string(), user_id_str.clone()),
                ("tier".to_string(), SubscriptionTier::Pro.as_str().to_string()),
            ]
            .into_iter()
            .collect(),
        );

        let session = CheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user_id, error = %e, "Failed to create checkout session");
                AppError::ExternalServiceError(format!("Stripe error: {}", e))
            })?;

        session.url.ok_or_else(|| {
            AppError::ExternalServiceError("No checkout URL returned from Stripe".to_string())
        })
    }

    /// Stripe顧客IDを取得、無ければ作成して保存
    async fn ensure_customer(&self, profile: &Profile) -> AppResult<String> {
        if let Some(id) = profile
            .stripe_customer_id
            .as_deref()
            .filter(|id| !id.is_empty())
        {
            return Ok(id.to_string());
        }

        let params = CreateCustomer {
            email: Some(&profile.email),
            name: profile.full_name.as_deref(),
            metadata: Some(
                [("user_id".to_string(), profile.id.to_string())]
                    .into_iter()
                    .collect(),
            ),
            ..Default::default()
        };

        let customer = Customer::create(&self.client, params)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %profile.id, error = %e, "Failed to create Stripe customer");
                AppError::ExternalServiceError(format!("Stripe error: {}", e))
            })?;

        self.profile_repo
            .update_billing(
                profile.id,
                BillingUpdate {
                    stripe_customer_id: Some(customer.id.to_string()),
                    ..Default::default()
                },
            )
            .await?;

        Ok(customer.id.to_string())
    }

    /// カスタマーポータルのURLを生成
    pub async fn create_portal_session(&self, user_id: Uuid) -> AppResult<String> {
        let profile = self
            .profile_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        let state = SubscriptionState::resolve(Some(&profile.subscription_data()), Utc::now());
        if !state.can_manage_subscription {
            return Err(AppError::Forbidden(
                "No manageable subscription for this account".to_string(),
            ));
        }

        // 開発モードの場合はモックURLを返す
        if self.stripe_config.development_mode {
            return Ok(format!(
                "{}/mock-portal?user_id={}",
                self.frontend_url, user_id
            ));
        }

        let customer_id = profile
            .stripe_customer_id
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("No Stripe customer ID found".to_string()))?
            .parse()
            .map_err(|_| AppError::InternalServerError("Invalid customer ID format".to_string()))?;

        let return_url = self.billing_url();
        let mut params = CreateBillingPortalSession::new(customer_id);
        params.return_url = Some(&return_url);

        let session = BillingPortalSession::create(&self.client, params)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user_id, error = %e, "Failed to create customer portal session");
                AppError::ExternalServiceError(format!("Stripe error: {}", e))
            })?;

        Ok(session.url)
    }

    /// Webhookイベントを検証して処理
    pub async fn handle_webhook(&self, payload: &str, stripe_signature: &str) -> AppResult<()> {
        let event = self.parse_event(payload, stripe_signature)?;

        tracing::info!(event_id = %event.id, event_type = %event.type_, "Processing webhook event");

        match (event.type_, event.data.object) {
            (EventType::CheckoutSessionCompleted, EventObject::CheckoutSession(session)) => {
                self.handle_checkout_completed(session).await
            }
            (
                EventType::CustomerSubscriptionCreated | EventType::CustomerSubscriptionUpdated,
                EventObject::Subscription(subscription),
            ) => self.handle_subscription_changed(subscription).await,
            (EventType::CustomerSubscriptionDeleted, EventObject::Subscription(subscription)) => {
                self.handle_subscription_deleted(subscription).await
            }
            (EventType::InvoicePaymentFailed, EventObject::Invoice(invoice)) => {
                self.handle_payment_failed(invoice).await
            }
            (event_type, _) => {
                tracing::debug!(event_type = %event_type, "Unhandled webhook event type");
                Ok(())
            }
        }
    }

    fn parse_event(&self, payload: &str, stripe_signature: &str) -> AppResult<Event> {
        // 開発モードの場合は、署名検証せずにペイロードを直接処理
        if self.stripe_config.development_mode {
            tracing::info!("Development mode: processing webhook without signature verification");
            return serde_json::from_str::<Event>(payload).map_err(|e| {
                tracing::error!(error = %e, "Failed to parse webhook payload");
                AppError::BadRequest(format!("Invalid webhook payload: {}", e))
            });
        }

        if self.stripe_config.webhook_secret.is_empty() {
            tracing::error!("STRIPE_WEBHOOK_SECRET not set - rejecting webhook");
            return Err(AppError::InternalServerError(
                "Webhook secret is not configured".to_string(),
            ));
        }

        Webhook::construct_event(payload, stripe_signature, &self.stripe_config.webhook_secret)
            .map_err(|e| {
                tracing::warn!(error = %e, "Invalid webhook signature");
                AppError::BadRequest(format!("Invalid webhook: {}", e))
            })
    }

    /// チェックアウト完了処理
    async fn handle_checkout_completed(&self, session: CheckoutSession) -> AppResult<()> {
        let user_id = session
            .metadata
            .as_ref()
            .and_then(|m| m.get("user_id"))
            .or(session.client_reference_id.as_ref())
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or_else(|| {
                tracing::error!(session_id = %session.id, "Invalid or missing user_id in checkout session");
                AppError::BadRequest("Invalid user_id in metadata".to_string())
            })?;

        let profile = self
            .profile_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        let mut update = BillingUpdate {
            stripe_customer_id: session.customer.as_ref().map(|c| c.id().to_string()),
            stripe_subscription_id: session
                .subscription
                .as_ref()
                .map(|s| Some(s.id().to_string())),
            ..Default::default()
        };
        // 無制限ユーザーは階層を変えない
        if SubscriptionTier::normalize(&profile.subscription_tier)
            != Some(SubscriptionTier::Unlimited)
        {
            update.subscription_tier = Some(SubscriptionTier::Pro.as_str().to_string());
        }

        self.profile_repo.update_billing(user_id, update).await?;

        tracing::info!(user_id = %user_id, "Checkout completed, profile linked to subscription");
        Ok(())
    }

    /// サブスクリプション作成・更新の同期
    async fn handle_subscription_changed(&self, subscription: Subscription) -> AppResult<()> {
        let profile = self.find_profile_for_customer(&subscription).await?;

        let update = billing_update_for_subscription(
            &profile,
            &SubscriptionSnapshot::from_stripe(&subscription),
        );
        self.profile_repo.update_billing(profile.id, update).await?;

        tracing::info!(
            user_id = %profile.id,
            subscription_id = %subscription.id,
            status = %subscription.status,
            "Subscription synced"
        );
        Ok(())
    }

    /// サブスクリプション削除処理
    async fn handle_subscription_deleted(&self, subscription: Subscription) -> AppResult<()> {
        let profile = self.find_profile_for_customer(&subscription).await?;

        let mut snapshot = SubscriptionSnapshot::from_stripe(&subscription);
        snapshot.status = "canceled".to_string();
        snapshot.cancel_at_period_end = false;

        let update = billing_update_for_subscription(&profile, &snapshot);
        self.profile_repo.update_billing(profile.id, update).await?;

        tracing::info!(user_id = %profile.id, "Subscription deleted, access revoked");
        Ok(())
    }

    /// 支払い失敗処理（通知メールは失敗してもエラーにしない）
    async fn handle_payment_failed(&self, invoice: Invoice) -> AppResult<()> {
        let customer_id = invoice
            .customer
            .as_ref()
            .map(|c| c.id().to_string())
            .ok_or_else(|| {
                tracing::error!(invoice_id = %invoice.id, "No customer ID in failed invoice");
                AppError::BadRequest("No customer ID in invoice".to_string())
            })?;

        let Some(profile) = self
            .profile_repo
            .find_by_stripe_customer_id(&customer_id)
            .await?
        else {
            tracing::warn!(customer_id = %customer_id, "Profile not found for failed invoice");
            return Ok(());
        };

        tracing::warn!(user_id = %profile.id, invoice_id = %invoice.id, "Payment failed");

        let message = EmailMessage::from_template(
            &profile.email,
            profile.full_name.as_deref(),
            payment_failed_template(profile.display_name(), &self.billing_url()),
        );
        if let Err(e) = self.mailer.send(message).await {
            tracing::warn!(user_id = %profile.id, error = %e, "Failed to send payment failed email");
        }

        Ok(())
    }

    async fn find_profile_for_customer(&self, subscription: &Subscription) -> AppResult<Profile> {
        let customer_id = subscription.customer.id().to_string();
        if let Some(profile) = self
            .profile_repo
            .find_by_stripe_customer_id(&customer_id)
            .await?
        {
            return Ok(profile);
        }

        // 顧客IDの保存前にイベントが届いた場合はサブスクリプションIDで探す
        self.profile_repo
            .find_by_stripe_subscription_id(subscription.id.as_str())
            .await?
            .ok_or_else(|| {
                tracing::warn!(customer_id = %customer_id, "Profile not found for Stripe customer");
                AppError::NotFound("Profile not found".to_string())
            })
    }
}

/// Stripeのサブスクリプションから同期に必要な値だけを抜き出したもの
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionSnapshot {
    pub subscription_id: String,
    pub status: String,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
}

impl SubscriptionSnapshot {
    fn from_stripe(subscription: &Subscription) -> Self {
        Self {
            subscription_id: subscription.id.to_string(),
            status: subscription.status.as_str().to_string(),
            current_period_end: DateTime::<Utc>::from_timestamp(subscription.current_period_end, 0),
            cancel_at_period_end: subscription.cancel_at_period_end,
        }
    }
}

/// サブスクリプションの状態をプロフィールの課金フィールドへ写像する
///
/// 終了済みステータスでは expired に戻す。
/// 無制限ユーザーは階層・ステータス・期限を変更せず、サブスクリプションIDのみ記録する。
/// 新しいトライアルが始まった場合はリマインダー送信記録をリセットする。
pub fn billing_update_for_subscription(
    profile: &Profile,
    snapshot: &SubscriptionSnapshot,
) -> BillingUpdate {
    let is_unlimited =
        SubscriptionTier::normalize(&profile.subscription_tier) == Some(SubscriptionTier::Unlimited);
    let tier = if TERMINAL_STATUSES.contains(&snapshot.status.as_str()) {
        SubscriptionTier::Expired
    } else {
        SubscriptionTier::Pro
    };

    if is_unlimited {
        return BillingUpdate {
            stripe_subscription_id: Some(Some(snapshot.subscription_id.clone())),
            ..Default::default()
        };
    }

    let new_trial = snapshot.status == "trialing"
        && profile.stripe_subscription_id.as_deref() != Some(snapshot.subscription_id.as_str());

    BillingUpdate {
        subscription_tier: Some(tier.as_str().to_string()),
        subscription_status: Some(Some(snapshot.status.clone())),
        stripe_subscription_id: Some(Some(snapshot.subscription_id.clone())),
        current_period_end: Some(snapshot.current_period_end),
        cancel_at_period_end: Some(snapshot.cancel_at_period_end),
        trial_reminder_sent_at: new_trial.then_some(None),
        ..Default::default()
    }
}

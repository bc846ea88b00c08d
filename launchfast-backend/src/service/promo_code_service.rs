// launchfast-backend/src/service/promo_code_service.rs

use crate::db::DbPool;
use crate::domain::plan::PlanDefinition;
use crate::domain::profile_model::Model as Profile;
use crate::domain::promo_code_model::{self, PromoRejection};
use crate::domain::subscription_state::SubscriptionState;
use crate::domain::subscription_tier::SubscriptionTier;
use crate::error::{AppError, AppResult};
use crate::repository::promo_code_repository::{
    PromoCodeRepository, PromoGrant, RedemptionOutcome,
};
use crate::service::subscription_service::SubscriptionService;
use crate::utils::email::{promo_applied_template, EmailMessage, Mailer};
use crate::utils::validation::{normalize_promo_code, validate_promo_code};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct PromoCodeService {
    promo_repo: Arc<PromoCodeRepository>,
    subscription_service: Arc<SubscriptionService>,
    mailer: Arc<dyn Mailer>,
}

impl PromoCodeService {
    pub fn new(
        db: DbPool,
        subscription_service: Arc<SubscriptionService>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            promo_repo: Arc::new(PromoCodeRepository::new(db)),
            subscription_service,
            mailer,
        }
    }

    /// プロモコードを引き換え、更新後のサブスクリプション状態を返す
    pub async fn redeem(
        &self,
        user_id: Uuid,
        raw_code: &str,
        now: DateTime<Utc>,
    ) -> AppResult<SubscriptionState> {
        let code = normalize_promo_code(raw_code);
        validate_promo_code(&code).map_err(|_| {
            AppError::ValidationError("Promo code format is invalid".to_string())
        })?;

        let (current_profile, current_state) = self
            .subscription_service
            .get_profile_with_state(user_id)
            .await?;

        let promo_code = self
            .promo_repo
            .find_by_code(&code)
            .await?
            .ok_or_else(|| AppError::NotFound(PromoRejection::Unknown.message().to_string()))?;

        let tier = SubscriptionTier::normalize(&promo_code.tier).ok_or_else(|| {
            warn!(code = %code, tier = %promo_code.tier, "Promo code has an unknown tier");
            AppError::InternalServerError("Promo code is misconfigured".to_string())
        })?;

        // 無制限ユーザーを下位の階層へ変更しない
        if current_state.has_unlimited_access && !tier.is_at_least(&SubscriptionTier::Unlimited) {
            return Err(AppError::Conflict(
                "Your account already has unlimited access".to_string(),
            ));
        }

        // Stripeで課金中の期間・ステータスはWebhookが管理するため上書きしない
        if has_live_stripe_subscription(&current_profile, &current_state) {
            return Err(AppError::Conflict(
                "Your account already has an active subscription".to_string(),
            ));
        }

        let outcome = self
            .promo_repo
            .redeem(&code, user_id, now, |claimed, at| {
                grant_for(claimed, tier, &current_state, at)
            })
            .await?;

        let (promo_code, profile) = match outcome {
            RedemptionOutcome::Redeemed {
                promo_code,
                profile,
            } => (promo_code, profile),
            RedemptionOutcome::Rejected(rejection) => {
                info!(user_id = %user_id, code = %code, rejection = ?rejection, "Promo code rejected");
                return Err(rejection_error(rejection));
            }
        };

        info!(
            user_id = %user_id,
            code = %promo_code.code,
            tier = %tier,
            previous_tier = %current_profile.subscription_tier,
            "Promo code redeemed"
        );

        let state = SubscriptionState::resolve(Some(&profile.subscription_data()), now);

        let access_until = profile
            .current_period_end
            .map(|end| end.format("%Y-%m-%d").to_string());
        let message = EmailMessage::from_template(
            &profile.email,
            profile.full_name.as_deref(),
            promo_applied_template(
                profile.display_name(),
                &promo_code.code,
                PlanDefinition::for_tier(tier).name,
                access_until.as_deref(),
            ),
        );
        if let Err(e) = self.mailer.send(message).await {
            warn!(user_id = %user_id, error = %e, "Failed to send promo confirmation email");
        }

        Ok(state)
    }
}

/// 付与内容を決める（期間指定が無ければ無期限）
///
/// 同じ階層のアクセスが残っている場合は、残り期間の後ろに付与日数を足す。
fn grant_for(
    promo_code: &promo_code_model::Model,
    tier: SubscriptionTier,
    current: &SubscriptionState,
    now: DateTime<Utc>,
) -> PromoGrant {
    let subscription_tier = tier.as_str().to_string();
    let Some(days) = promo_code.duration_days.filter(|days| *days > 0) else {
        return PromoGrant {
            subscription_tier,
            current_period_end: None,
        };
    };
    let duration = Duration::days(i64::from(days));

    let current_period_end = if current.can_access_features && current.tier == Some(tier) {
        // 無期限のアクセスは短くしない
        current.current_period_end.map(|end| end.max(now) + duration)
    } else {
        Some(now + duration)
    };

    PromoGrant {
        subscription_tier,
        current_period_end,
    }
}

fn has_live_stripe_subscription(profile: &Profile, state: &SubscriptionState) -> bool {
    state.is_active
        && profile
            .stripe_subscription_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
}

fn rejection_error(rejection: PromoRejection) -> AppError {
    let message = rejection.message().to_string();
    match rejection {
        PromoRejection::Unknown => AppError::NotFound(message),
        PromoRejection::AlreadyRedeemed => AppError::Conflict(message),
        PromoRejection::Inactive | PromoRejection::Expired | PromoRejection::Exhausted => {
            AppError::BadRequest(message)
        }
    }
}

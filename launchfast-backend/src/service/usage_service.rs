// launchfast-backend/src/service/usage_service.rs

use crate::db::DbPool;
use crate::domain::subscription_state::SubscriptionState;
use crate::domain::usage::{
    evaluate_usage, month_key, UsageAction, UsageCounters, UsageDecision, UsageLimits,
};
use crate::error::AppResult;
use crate::repository::usage_repository::UsageRepository;
use crate::service::subscription_service::SubscriptionService;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// 当月の利用状況
#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    pub month: String,
    pub counters: UsageCounters,
    pub limits: UsageLimits,
    pub decisions: Vec<UsageDecision>,
}

#[derive(Clone)]
pub struct UsageService {
    usage_repo: Arc<UsageRepository>,
    subscription_service: Arc<SubscriptionService>,
}

impl UsageService {
    pub fn new(db: DbPool, subscription_service: Arc<SubscriptionService>) -> Self {
        Self {
            usage_repo: Arc::new(UsageRepository::new(db)),
            subscription_service,
        }
    }

    async fn limits_for(&self, user_id: Uuid) -> AppResult<UsageLimits> {
        let state: SubscriptionState = self.subscription_service.get_state(user_id).await?;
        Ok(UsageLimits::for_tier(state.effective_tier()))
    }

    async fn counters_for(&self, user_id: Uuid, month: &str) -> AppResult<UsageCounters> {
        Ok(self
            .usage_repo
            .find_for_month(user_id, month)
            .await?
            .map(|record| record.counters())
            .unwrap_or_default())
    }

    /// 当月のカウンタと各アクションの判定
    pub async fn get_summary(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<UsageSummary> {
        let month = month_key(now);
        let limits = self.limits_for(user_id).await?;
        let counters = self.counters_for(user_id, &month).await?;
        let decisions = UsageAction::all()
            .into_iter()
            .map(|action| evaluate_usage(&limits, &counters, action))
            .collect();

        Ok(UsageSummary {
            month,
            counters,
            limits,
            decisions,
        })
    }

    /// 加算せずに判定のみ行う
    pub async fn check(
        &self,
        user_id: Uuid,
        action: UsageAction,
        now: DateTime<Utc>,
    ) -> AppResult<UsageDecision> {
        let month = month_key(now);
        let limits = self.limits_for(user_id).await?;
        let counters = self.counters_for(user_id, &month).await?;
        Ok(evaluate_usage(&limits, &counters, action))
    }

    /// 判定し、許可された場合のみ原子的にカウンタを加算する
    ///
    /// 返す判定の `current` は加算後の値。拒否時は保存値を変更しない。
    pub async fn consume(
        &self,
        user_id: Uuid,
        action: UsageAction,
        now: DateTime<Utc>,
    ) -> AppResult<UsageDecision> {
        let month = month_key(now);
        // 利用記録はプロフィールに紐づくため、存在しない場合は NotFound
        let (_, state) = self
            .subscription_service
            .get_profile_with_state(user_id)
            .await?;
        let limits = UsageLimits::for_tier(state.effective_tier());

        if !limits.feature_enabled(action) {
            let counters = self.counters_for(user_id, &month).await?;
            let decision = evaluate_usage(&limits, &counters, action);
            warn!(user_id = %user_id, action = %action, tier = %limits.tier, "Usage denied by plan");
            return Ok(decision);
        }

        let cap = limits.cap_for(action);
        match self
            .usage_repo
            .try_consume(user_id, &month, action, cap)
            .await?
        {
            Some(counters) => {
                let current = counters.get(action);
                info!(user_id = %user_id, action = %action, current, month = %month, "Usage recorded");
                Ok(UsageDecision {
                    action,
                    allowed: true,
                    current,
                    limit: cap,
                    remaining: cap.map(|c| c.saturating_sub(current)),
                    reason: None,
                })
            }
            None => {
                let counters = self.counters_for(user_id, &month).await?;
                let mut decision = evaluate_usage(&limits, &counters, action);
                // 判定後に他リクエストで枠が埋まった場合も拒否として返す
                if decision.allowed {
                    decision.allowed = false;
                    decision.reason = Some(format!("Monthly {} limit reached", action));
                }
                warn!(
                    user_id = %user_id,
                    action = %action,
                    current = decision.current,
                    limit = ?decision.limit,
                    "Usage limit reached"
                );
                Ok(decision)
            }
        }
    }
}

// launchfast-backend/src/domain/subscription_state.rs

//! サブスクリプション状態の解決
//!
//! DBのプロフィール行から得た生の課金フィールドを正規化し、
//! 検証済みの状態と画面側で使う権限フラグを組み立てる。
//! I/Oは行わず、異常は全て `errors` に積んで返す。

use super::plan::PlanDefinition;
use super::subscription_tier::SubscriptionTier;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// アクティブとみなすステータス
pub const ACTIVE_STATUSES: &[&str] = &["active", "trialing"];

pub const ERR_NO_DATA: &str = "No subscription data found";
pub const ERR_PERIOD_ENDED: &str = "Subscription period has ended but status is still active";

/// 解決器への入力（プロフィール行の課金関連カラム）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionData {
    pub subscription_tier: Option<String>,
    pub subscription_status: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    /// ISO-8601形式の文字列
    pub current_period_end: Option<String>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

/// 解決済みのサブスクリプション状態（リクエストごとに生成し、永続化しない）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionState {
    /// 正規化済みの階層。認識できない値の場合は None
    pub tier: Option<SubscriptionTier>,
    pub status: Option<String>,
    pub is_active: bool,
    pub is_valid: bool,
    pub can_access_features: bool,
    pub can_manage_subscription: bool,
    pub has_unlimited_access: bool,
    pub cancel_at_period_end: bool,
    pub current_period_end: Option<DateTime<Utc>>,
    pub plan: &'static PlanDefinition,
    pub errors: Vec<String>,
}

impl SubscriptionState {
    /// 入力が無い場合の固定エラー状態
    fn missing() -> Self {
        Self {
            tier: Some(SubscriptionTier::Expired),
            status: None,
            is_active: false,
            is_valid: false,
            can_access_features: false,
            can_manage_subscription: false,
            has_unlimited_access: false,
            cancel_at_period_end: false,
            current_period_end: None,
            plan: PlanDefinition::for_tier(SubscriptionTier::Expired),
            errors: vec![ERR_NO_DATA.to_string()],
        }
    }

    /// 指定時刻を基準に状態を解決
    pub fn resolve(data: Option<&SubscriptionData>, now: DateTime<Utc>) -> Self {
        let Some(data) = data else {
            return Self::missing();
        };

        let mut errors = Vec::new();

        let tier = match data.subscription_tier.as_deref() {
            Some(raw) => {
                let normalized = SubscriptionTier::normalize(raw);
                if normalized.is_none() {
                    errors.push(format!("Invalid subscription tier: {}", raw));
                }
                normalized
            }
            None => {
                errors.push("Missing subscription tier".to_string());
                None
            }
        };

        let status = data
            .subscription_status
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let is_active = status
            .as_deref()
            .is_some_and(|s| ACTIVE_STATUSES.contains(&s));

        let current_period_end = match data.current_period_end.as_deref() {
            Some(raw) => {
                let parsed = parse_timestamp(raw);
                if parsed.is_none() {
                    errors.push(format!("Invalid current_period_end: {}", raw));
                }
                parsed
            }
            None => None,
        };

        // 期限切れなのに active の場合は不整合として記録する（is_active 自体は変えない）
        if is_active && current_period_end.is_some_and(|end| end < now) {
            errors.push(ERR_PERIOD_ENDED.to_string());
        }

        let tier_allows = match tier {
            Some(SubscriptionTier::Unlimited) | Some(SubscriptionTier::Expired) => true,
            Some(SubscriptionTier::Pro) => is_active,
            None => false,
        };
        let is_valid = errors.is_empty() && tier_allows;

        let can_access_features = is_valid
            && matches!(
                (tier, is_active),
                (Some(SubscriptionTier::Unlimited), _) | (Some(SubscriptionTier::Pro), true)
            );

        let has_stripe_customer = data
            .stripe_customer_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty());
        let can_manage_subscription = has_stripe_customer
            && matches!(
                tier,
                Some(SubscriptionTier::Pro) | Some(SubscriptionTier::Expired)
            );

        let has_unlimited_access = is_valid && tier == Some(SubscriptionTier::Unlimited);

        Self {
            tier,
            status,
            is_active,
            is_valid,
            can_access_features,
            can_manage_subscription,
            has_unlimited_access,
            cancel_at_period_end: data.cancel_at_period_end,
            current_period_end,
            plan: PlanDefinition::for_tier(tier.unwrap_or_default()),
            errors,
        }
    }

    /// 機能制限の判定に使う実効階層（アクセス不可の場合は常に Expired）
    pub fn effective_tier(&self) -> SubscriptionTier {
        if self.can_access_features {
            self.tier.unwrap_or_default()
        } else {
            SubscriptionTier::Expired
        }
    }

    /// 課金画面向けの状態説明文
    pub fn billing_summary(&self) -> String {
        if !self.is_valid && self.tier != Some(SubscriptionTier::Expired) {
            return "We could not verify your subscription. Please contact support.".to_string();
        }

        match self.tier {
            Some(SubscriptionTier::Unlimited) => "You have unlimited access.".to_string(),
            Some(SubscriptionTier::Pro) => {
                let end = self
                    .current_period_end
                    .map(|d| d.format("%B %-d, %Y").to_string());
                match (self.status.as_deref(), self.cancel_at_period_end, end) {
                    (Some("trialing"), _, Some(end)) => format!("Your free trial ends on {}.", end),
                    (_, true, Some(end)) => {
                        format!("Your subscription is canceled and ends on {}.", end)
                    }
                    (_, false, Some(end)) => format!("Your subscription renews on {}.", end),
                    _ => format!("You are subscribed to {}.", self.plan.name),
                }
            }
            _ => "You do not have an active subscription.".to_string(),
        }
    }
}

/// 現在時刻で状態を解決
pub fn get_subscription_state(data: Option<&SubscriptionData>) -> SubscriptionState {
    SubscriptionState::resolve(data, Utc::now())
}

/// RFC 3339、タイムゾーン無しの日時（UTC扱い）、日付のみを受け付ける
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// launchfast-backend/src/domain/plan.rs

use super::subscription_tier::SubscriptionTier;
use serde::Serialize;

/// プラン定義（UI表示と課金画面の文言に使用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanDefinition {
    pub tier: SubscriptionTier,
    pub name: &'static str,
    pub description: &'static str,
    pub monthly_price_cents: u32,
    pub features: &'static [&'static str],
}

pub static PLANS: [PlanDefinition; 3] = [
    PlanDefinition {
        tier: SubscriptionTier::Expired,
        name: "Free",
        description: "Limited product research for evaluation",
        monthly_price_cents: 0,
        features: &["10 product searches per month", "Product grades"],
    },
    PlanDefinition {
        tier: SubscriptionTier::Pro,
        name: "LaunchFast Pro",
        description: "Full product research dashboard",
        monthly_price_cents: 19900,
        features: &[
            "Unlimited product searches",
            "Product grades with score breakdown",
            "Keyword and market analysis",
            "CSV export",
        ],
    },
    PlanDefinition {
        tier: SubscriptionTier::Unlimited,
        name: "LaunchFast Unlimited",
        description: "Lifetime or partner access without billing",
        monthly_price_cents: 0,
        features: &[
            "Unlimited product searches",
            "Product grades with score breakdown",
            "Keyword and market analysis",
            "CSV export",
            "API access",
        ],
    },
];

impl PlanDefinition {
    /// 階層に対応するプラン定義を取得
    pub fn for_tier(tier: SubscriptionTier) -> &'static PlanDefinition {
        match tier {
            SubscriptionTier::Expired => &PLANS[0],
            SubscriptionTier::Pro => &PLANS[1],
            SubscriptionTier::Unlimited => &PLANS[2],
        }
    }

    pub fn all() -> &'static [PlanDefinition] {
        &PLANS
    }
}

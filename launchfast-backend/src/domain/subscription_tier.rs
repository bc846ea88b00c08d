// launchfast-backend/src/domain/subscription_tier.rs

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 旧バージョンの値を含むティア名のエイリアス表
const TIER_ALIASES: &[(&str, SubscriptionTier)] = &[
    ("expired", SubscriptionTier::Expired),
    ("inactive", SubscriptionTier::Expired),
    ("cancelled", SubscriptionTier::Expired),
    ("unlimited", SubscriptionTier::Unlimited),
    ("unlimited_user", SubscriptionTier::Unlimited),
    ("special", SubscriptionTier::Unlimited),
    ("pro", SubscriptionTier::Pro),
    ("premium", SubscriptionTier::Pro),
    ("paid", SubscriptionTier::Pro),
];

/// サブスクリプション階層
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Expired,
    Pro,
    Unlimited,
}

impl SubscriptionTier {
    /// 文字列（エイリアス含む）からSubscriptionTierに正規化
    pub fn normalize(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase();
        TIER_ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, tier)| *tier)
    }

    /// SubscriptionTierを文字列として取得
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::Pro => "pro",
            Self::Unlimited => "unlimited",
        }
    }

    /// 階層レベルを数値で取得
    pub fn level(&self) -> u8 {
        match self {
            Self::Expired => 1,
            Self::Pro => 2,
            Self::Unlimited => 3,
        }
    }

    /// 指定した階層以上かチェック
    pub fn is_at_least(&self, other: &Self) -> bool {
        self.level() >= other.level()
    }

    /// 全ての有効な階層を取得
    pub fn all() -> Vec<Self> {
        vec![Self::Expired, Self::Pro, Self::Unlimited]
    }
}

impl FromStr for SubscriptionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s).ok_or_else(|| format!("Invalid subscription tier: {}", s))
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

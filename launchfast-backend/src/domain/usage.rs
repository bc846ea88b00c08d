// launchfast-backend/src/domain/usage.rs

//! 月次利用量の制限判定

use super::subscription_tier::SubscriptionTier;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 無料枠の月間検索回数
pub const FREE_MONTHLY_SEARCHES: u32 = 10;

/// 利用量を計測するアクション
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageAction {
    Search,
    CsvExport,
    ApiCall,
}

impl UsageAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::CsvExport => "csv_export",
            Self::ApiCall => "api_call",
        }
    }

    /// usage_records テーブル上のカウンタ列名
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::Search => "searches",
            Self::CsvExport => "csv_exports",
            Self::ApiCall => "api_calls",
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::Search, Self::CsvExport, Self::ApiCall]
    }
}

impl FromStr for UsageAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "search" => Ok(Self::Search),
            "csv_export" => Ok(Self::CsvExport),
            "api_call" => Ok(Self::ApiCall),
            _ => Err(format!("Invalid usage action: {}", s)),
        }
    }
}

impl std::fmt::Display for UsageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 階層ごとの利用制限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageLimits {
    pub tier: SubscriptionTier,
    /// None = 無制限
    pub monthly_searches: Option<u32>,
    pub csv_export: bool,
    pub api_access: bool,
}

impl UsageLimits {
    /// 実効階層に対応する制限を取得
    ///
    /// | Tier | Searches/month | CSV export | API |
    /// |------|----------------|------------|-----|
    /// | Expired (free) | 10 | No | No |
    /// | Pro | Unlimited | Yes | No |
    /// | Unlimited | Unlimited | Yes | Yes |
    pub fn for_tier(tier: SubscriptionTier) -> Self {
        match tier {
            SubscriptionTier::Expired => Self {
                tier,
                monthly_searches: Some(FREE_MONTHLY_SEARCHES),
                csv_export: false,
                api_access: false,
            },
            SubscriptionTier::Pro => Self {
                tier,
                monthly_searches: None,
                csv_export: true,
                api_access: false,
            },
            SubscriptionTier::Unlimited => Self {
                tier,
                monthly_searches: None,
                csv_export: true,
                api_access: true,
            },
        }
    }

    /// 件数上限（件数で制限しないアクションは None）
    pub fn cap_for(&self, action: UsageAction) -> Option<u32> {
        match action {
            UsageAction::Search => self.monthly_searches,
            UsageAction::CsvExport | UsageAction::ApiCall => None,
        }
    }

    /// 機能フラグとして許可されているか
    pub fn feature_enabled(&self, action: UsageAction) -> bool {
        match action {
            UsageAction::Search => true,
            UsageAction::CsvExport => self.csv_export,
            UsageAction::ApiCall => self.api_access,
        }
    }
}

/// 当月のカウンタ（行が無い場合は全て0）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounters {
    pub searches: u32,
    pub csv_exports: u32,
    pub api_calls: u32,
}

impl UsageCounters {
    pub fn get(&self, action: UsageAction) -> u32 {
        match action {
            UsageAction::Search => self.searches,
            UsageAction::CsvExport => self.csv_exports,
            UsageAction::ApiCall => self.api_calls,
        }
    }
}

/// 判定結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageDecision {
    pub action: UsageAction,
    pub allowed: bool,
    pub current: u32,
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// 現在のカウンタに対してアクションを許可するか判定する
///
/// `current` は判定時点（インクリメント前）の値。
pub fn evaluate_usage(
    limits: &UsageLimits,
    counters: &UsageCounters,
    action: UsageAction,
) -> UsageDecision {
    let current = counters.get(action);
    let limit = limits.cap_for(action);
    let remaining = limit.map(|cap| cap.saturating_sub(current));

    let reason = if !limits.feature_enabled(action) {
        Some(format!(
            "{} is not available on the {} plan",
            action,
            limits.tier.as_str()
        ))
    } else if let Some(cap) = limit.filter(|cap| current >= *cap) {
        Some(format!(
            "Monthly {} limit reached ({} of {})",
            action, current, cap
        ))
    } else {
        None
    };

    UsageDecision {
        action,
        allowed: reason.is_none(),
        current,
        limit,
        remaining,
        reason,
    }
}

/// 利用量ウィンドウのキー（UTC暦月の "YYYY-MM"）
pub fn month_key(at: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", at.year(), at.month())
}

// launchfast-backend/src/domain/product_scoring.rs

//! 商品スコアリング（A10〜F1のグレード判定）
//!
//! 各指標を0〜1のランプ関数で正規化し、固定の重みで合算した0〜100のスコアから
//! グレードを決める。重み・閾値は定数であり、UIのバッジ表示も同じグレード表を参照する。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

pub const WEIGHT_PROFIT: f64 = 30.0;
pub const WEIGHT_MARGIN: f64 = 15.0;
pub const WEIGHT_DEMAND: f64 = 15.0;
pub const WEIGHT_COMPETITION: f64 = 15.0;
pub const WEIGHT_KEYWORDS: f64 = 10.0;
pub const WEIGHT_CONSISTENCY: f64 = 10.0;
pub const WEIGHT_RISK: f64 = 5.0;

/// 満点となる月間利益（USD）
const FULL_MONTHLY_PROFIT: f64 = 10_000.0;
/// 満点となる利益率
const FULL_MARGIN: f64 = 0.40;
/// 満点となる月間販売数
const FULL_MONTHLY_SALES: f64 = 1_000.0;
/// レビュー数がこれ以下なら競合点は満点、ZERO以上で0点
const LOW_COMPETITION_REVIEWS: f64 = 50.0;
const HIGH_COMPETITION_REVIEWS: f64 = 5_000.0;
/// 満点となる平均検索ボリューム
const FULL_KEYWORD_VOLUME: f64 = 20_000.0;

/// グレード帯の下限（上から順）
const BANDS: [(GradeLetter, f64, f64); 6] = [
    (GradeLetter::A, 85.0, 100.0),
    (GradeLetter::B, 70.0, 85.0),
    (GradeLetter::C, 55.0, 70.0),
    (GradeLetter::D, 40.0, 55.0),
    (GradeLetter::E, 25.0, 40.0),
    (GradeLetter::F, 0.0, 25.0),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductData {
    pub asin: String,
    pub title: String,
    pub price: f64,
    pub bsr: Option<u32>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalesPrediction {
    pub monthly_sales: f64,
    pub monthly_revenue: f64,
    pub monthly_profit: f64,
    /// 0.0〜1.0 の利益率
    pub profit_margin: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskClassification {
    Safe,
    Electric,
    Breakable,
    Medical,
    Prohibited,
    Banned,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyRating {
    Consistent,
    Seasonal,
    Trendy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiAnalysis {
    pub risk_classification: RiskClassification,
    pub consistency_rating: ConsistencyRating,
    pub estimated_weight_lbs: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordData {
    pub keyword: String,
    pub search_volume: Option<f64>,
    pub ranking_position: Option<u32>,
    pub cpc: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GradeLetter {
    // 並び順は悪い方から（Ord を使うため）
    F,
    E,
    D,
    C,
    B,
    A,
}

impl GradeLetter {
    pub fn as_char(&self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
            Self::F => 'F',
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            'E' => Some(Self::E),
            'F' => Some(Self::F),
            _ => None,
        }
    }
}

/// UIのバッジ種別（グレード文字と1対1）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeBadge {
    Gold,
    Green,
    Blue,
    Yellow,
    Orange,
    Red,
}

/// A10（最良）〜F1（最悪）のグレード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Grade {
    pub letter: GradeLetter,
    /// 1〜10
    pub step: u8,
}

impl Grade {
    pub const BEST: Grade = Grade {
        letter: GradeLetter::A,
        step: 10,
    };
    pub const WORST: Grade = Grade {
        letter: GradeLetter::F,
        step: 1,
    };

    /// 0〜100のスコアからグレードを決定
    pub fn from_score(score: f64) -> Self {
        let score = sanitize(score).clamp(0.0, 100.0);
        let (letter, min, max) = BANDS
            .iter()
            .copied()
            .find(|(_, min, _)| score >= *min)
            .unwrap_or(BANDS[BANDS.len() - 1]);
        let fraction = (score - min) / (max - min);
        let step = (1.0 + (fraction * 10.0).floor()).clamp(1.0, 10.0) as u8;
        Self { letter, step }
    }

    /// 序数（F1 = 1 〜 A10 = 60）
    pub fn rank(&self) -> u8 {
        self.letter as u8 * 10 + self.step
    }

    pub fn badge(&self) -> GradeBadge {
        match self.letter {
            GradeLetter::A => GradeBadge::Gold,
            GradeLetter::B => GradeBadge::Green,
            GradeLetter::C => GradeBadge::Blue,
            GradeLetter::D => GradeBadge::Yellow,
            GradeLetter::E => GradeBadge::Orange,
            GradeLetter::F => GradeBadge::Red,
        }
    }
}

impl PartialOrd for Grade {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Grade {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.letter.as_char(), self.step)
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let letter = chars
            .next()
            .and_then(|c| GradeLetter::from_char(c.to_ascii_uppercase()))
            .ok_or_else(|| format!("Invalid grade: {}", s))?;
        let step: u8 = chars
            .as_str()
            .parse()
            .map_err(|_| format!("Invalid grade: {}", s))?;
        if !(1..=10).contains(&step) {
            return Err(format!("Invalid grade: {}", s));
        }
        Ok(Self { letter, step })
    }
}

impl From<Grade> for String {
    fn from(grade: Grade) -> Self {
        grade.to_string()
    }
}

impl TryFrom<String> for Grade {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringResult {
    pub grade: Grade,
    pub badge: GradeBadge,
    pub score: f64,
    pub breakdown: BTreeMap<String, f64>,
}

/// 商品をスコアリングする
pub fn score_product(
    product: &ProductData,
    sales: &SalesPrediction,
    analysis: &AiAnalysis,
    keywords: &[KeywordData],
) -> ScoringResult {
    let mut breakdown = BTreeMap::new();

    if analysis.risk_classification == RiskClassification::Banned {
        breakdown.insert("risk_gate".to_string(), 0.0);
        return ScoringResult {
            grade: Grade::WORST,
            badge: Grade::WORST.badge(),
            score: 0.0,
            breakdown,
        };
    }

    let profit = WEIGHT_PROFIT * ramp(sales.monthly_profit, 0.0, FULL_MONTHLY_PROFIT);
    let margin = WEIGHT_MARGIN * ramp(sales.profit_margin, 0.0, FULL_MARGIN);
    let demand = WEIGHT_DEMAND * ramp(sales.monthly_sales, 0.0, FULL_MONTHLY_SALES);
    let competition = product.review_count.map_or(0.0, |reviews| {
        WEIGHT_COMPETITION
            * ramp(
                f64::from(reviews),
                HIGH_COMPETITION_REVIEWS,
                LOW_COMPETITION_REVIEWS,
            )
    });
    let keyword = average_search_volume(keywords).map_or(0.0, |avg| {
        WEIGHT_KEYWORDS * ramp(avg, 0.0, FULL_KEYWORD_VOLUME)
    });
    let consistency = WEIGHT_CONSISTENCY
        * match analysis.consistency_rating {
            ConsistencyRating::Consistent => 1.0,
            ConsistencyRating::Seasonal => 0.5,
            ConsistencyRating::Trendy => 0.0,
        };
    let risk = WEIGHT_RISK
        * match analysis.risk_classification {
            RiskClassification::Safe => 1.0,
            RiskClassification::Electric | RiskClassification::Breakable => 0.5,
            RiskClassification::Medical
            | RiskClassification::Prohibited
            | RiskClassification::Banned => 0.0,
        };

    for (name, value) in [
        ("profit", profit),
        ("margin", margin),
        ("demand", demand),
        ("competition", competition),
        ("keywords", keyword),
        ("consistency", consistency),
        ("risk", risk),
    ] {
        breakdown.insert(name.to_string(), round1(value));
    }

    let score = round1(profit + margin + demand + competition + keyword + consistency + risk);
    let grade = Grade::from_score(score);

    ScoringResult {
        grade,
        badge: grade.badge(),
        score,
        breakdown,
    }
}

/// 検索ボリュームを持つキーワードの平均（該当なしは None）
fn average_search_volume(keywords: &[KeywordData]) -> Option<f64> {
    let volumes: Vec<f64> = keywords
        .iter()
        .filter_map(|k| k.search_volume)
        .map(sanitize)
        .collect();
    if volumes.is_empty() {
        None
    } else {
        Some(volumes.iter().sum::<f64>() / volumes.len() as f64)
    }
}

/// `zero_at` で0、`full_at` で1となる線形ランプ（逆向きも可）
fn ramp(value: f64, zero_at: f64, full_at: f64) -> f64 {
    let value = sanitize(value);
    ((value - zero_at) / (full_at - zero_at)).clamp(0.0, 1.0)
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

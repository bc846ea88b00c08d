// launchfast-backend/src/api/dto/product_dto.rs

use crate::domain::product_scoring::{AiAnalysis, KeywordData, ProductData, SalesPrediction};
use crate::utils::validation::{validate_asin, validate_finite};
use serde::{Deserialize, Serialize};
use validator::Validate;

// --- Request DTOs ---

/// 商品スコアリングリクエスト
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScoreProductRequest {
    #[validate(nested)]
    pub product: ProductInput,

    #[validate(nested)]
    pub sales: SalesPredictionInput,

    pub ai_analysis: AiAnalysis,

    #[serde(default)]
    #[validate(length(max = 100, message = "At most 100 keywords can be scored"))]
    pub keywords: Vec<KeywordData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(custom(function = "validate_asin"))]
    pub asin: String,

    #[validate(length(max = 500, message = "Title must be 500 characters or less"))]
    #[serde(default)]
    pub title: String,

    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: f64,

    pub bsr: Option<u32>,

    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    pub rating: Option<f64>,

    pub review_count: Option<u32>,

    #[validate(length(max = 200))]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SalesPredictionInput {
    #[validate(range(min = 0.0, message = "Monthly sales must not be negative"))]
    pub monthly_sales: f64,

    #[validate(custom(function = "validate_finite"))]
    pub monthly_revenue: f64,

    #[validate(custom(function = "validate_finite"))]
    pub monthly_profit: f64,

    #[validate(custom(function = "validate_finite"))]
    pub profit_margin: f64,
}

impl From<ProductInput> for ProductData {
    fn from(input: ProductInput) -> Self {
        Self {
            asin: input.asin.trim().to_uppercase(),
            title: input.title,
            price: input.price,
            bsr: input.bsr,
            rating: input.rating,
            review_count: input.review_count,
            category: input.category,
        }
    }
}

impl From<SalesPredictionInput> for SalesPrediction {
    fn from(input: SalesPredictionInput) -> Self {
        Self {
            monthly_sales: input.monthly_sales,
            monthly_revenue: input.monthly_revenue,
            monthly_profit: input.monthly_profit,
            profit_margin: input.profit_margin,
        }
    }
}

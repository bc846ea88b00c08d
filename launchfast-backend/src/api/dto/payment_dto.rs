// launchfast-backend/src/api/dto/payment_dto.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCheckoutResponse {
    pub checkout_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerPortalResponse {
    pub portal_url: String,
}

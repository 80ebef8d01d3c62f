use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::orders::CustomerSnapshot;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PosSaleRequest {
    /// Product ids scanned into the ticket; each product is a single unit.
    pub items: Vec<Uuid>,
    pub payment_method: String,
    pub customer: Option<CustomerSnapshot>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PosProductQuery {
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

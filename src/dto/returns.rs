use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::AppError, lifecycle::ReturnStatus, models::ReturnTicket};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateReturnRequest {
    pub reason: String,
    pub items: Vec<ReturnItemInput>,
}

impl CreateReturnRequest {
    /// `ordered` holds `(product_id, quantity)` for every line on the order.
    pub fn validate(self, ordered: &[(Uuid, i32)]) -> Result<(String, Vec<ReturnItemInput>), AppError> {
        let reason = self.reason.trim().to_string();
        if reason.is_empty() {
            return Err(AppError::validation("reason is required"));
        }
        if self.items.is_empty() {
            return Err(AppError::validation("at least one item must be returned"));
        }

        let mut seen = HashSet::new();
        for item in &self.items {
            if !seen.insert(item.product_id) {
                return Err(AppError::validation(format!(
                    "product {} appears more than once",
                    item.product_id
                )));
            }
            let bought = ordered
                .iter()
                .find(|(id, _)| *id == item.product_id)
                .map(|(_, qty)| *qty)
                .ok_or_else(|| {
                    AppError::validation(format!("product {} is not on this order", item.product_id))
                })?;
            if item.quantity < 1 || item.quantity > bought {
                return Err(AppError::validation(format!(
                    "quantity for product {} must be between 1 and {bought}",
                    item.product_id
                )));
            }
        }

        Ok((reason, self.items))
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReturnStatusRequest {
    pub status: ReturnStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReturnList {
    pub items: Vec<ReturnTicket>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_items_must_come_from_the_order() {
        let bought = Uuid::new_v4();
        let ordered = [(bought, 1)];

        let ok = CreateReturnRequest {
            reason: " wrong size ".into(),
            items: vec![ReturnItemInput { product_id: bought, quantity: 1 }],
        }
        .validate(&ordered)
        .unwrap();
        assert_eq!(ok.0, "wrong size");

        let stranger = CreateReturnRequest {
            reason: "x".into(),
            items: vec![ReturnItemInput { product_id: Uuid::new_v4(), quantity: 1 }],
        };
        assert!(stranger.validate(&ordered).is_err());

        let too_many = CreateReturnRequest {
            reason: "x".into(),
            items: vec![ReturnItemInput { product_id: bought, quantity: 2 }],
        };
        assert!(too_many.validate(&ordered).is_err());
    }

    #[test]
    fn reason_and_items_are_required() {
        let ordered = [(Uuid::new_v4(), 1)];
        assert!(CreateReturnRequest { reason: "  ".into(), items: vec![] }.validate(&ordered).is_err());
        assert!(CreateReturnRequest { reason: "broken".into(), items: vec![] }.validate(&ordered).is_err());
    }
}

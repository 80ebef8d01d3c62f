use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppError,
    lifecycle::{OrderStatus, SalesChannel},
    models::{Order, OrderItem},
};

/// Customer data frozen onto the order at creation time.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct CustomerSnapshot {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Option<i64>,
    pub quantity: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub channel: Option<SalesChannel>,
    pub customer: Option<CustomerSnapshot>,
    pub items: Vec<LineItemInput>,
    pub subtotal: Option<i64>,
    pub shipping_cost: Option<i64>,
    pub total: Option<i64>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: i64,
    pub quantity: i32,
}

impl LineItem {
    fn line_total(&self) -> Option<i64> {
        self.unit_price.checked_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub total: i64,
}

impl OrderTotals {
    /// `total` is derived when absent and must equal `subtotal + shipping_cost`
    /// when supplied; the subtotal must match the frozen line prices.
    pub fn validate(
        items: &[LineItem],
        subtotal: Option<i64>,
        shipping_cost: Option<i64>,
        total: Option<i64>,
    ) -> Result<Self, AppError> {
        let subtotal = non_negative(subtotal, "subtotal")?;
        let shipping_cost = non_negative(shipping_cost, "shippingCost")?;

        let line_sum = items
            .iter()
            .try_fold(0_i64, |acc, item| item.line_total().and_then(|t| acc.checked_add(t)))
            .ok_or_else(|| AppError::validation("line totals overflow"))?;
        if line_sum != subtotal {
            return Err(AppError::validation(format!(
                "subtotal {subtotal} does not match line items sum {line_sum}"
            )));
        }

        let expected = subtotal
            .checked_add(shipping_cost)
            .ok_or_else(|| AppError::validation("total overflows"))?;
        if let Some(total) = total {
            if total < 0 {
                return Err(AppError::validation("total must not be negative"));
            }
            if total != expected {
                return Err(AppError::validation(format!(
                    "total {total} must equal subtotal + shippingCost ({expected})"
                )));
            }
        }

        Ok(Self {
            subtotal,
            shipping_cost,
            total: expected,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedOrder {
    pub channel: SalesChannel,
    pub customer: CustomerSnapshot,
    pub items: Vec<LineItem>,
    pub totals: OrderTotals,
    pub payment_method: Option<String>,
}

impl CreateOrderRequest {
    pub fn validate(self) -> Result<ValidatedOrder, AppError> {
        let items = validate_line_items(self.items)?;
        let totals = OrderTotals::validate(&items, self.subtotal, self.shipping_cost, self.total)?;
        Ok(ValidatedOrder {
            channel: self.channel.unwrap_or(SalesChannel::Online),
            customer: self.customer.unwrap_or_default(),
            items,
            totals,
            payment_method: self
                .payment_method
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        })
    }
}

pub fn validate_line_items(items: Vec<LineItemInput>) -> Result<Vec<LineItem>, AppError> {
    if items.is_empty() {
        return Err(AppError::validation("order must contain at least one item"));
    }

    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|item| {
            if !seen.insert(item.product_id) {
                return Err(AppError::validation(format!(
                    "product {} appears more than once",
                    item.product_id
                )));
            }
            let name = item.name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::validation("item name is required"));
            }
            let unit_price = non_negative(item.unit_price, "unitPrice")?;
            // Every product is a single unit of stock.
            let quantity = item.quantity.unwrap_or(1);
            if quantity != 1 {
                return Err(AppError::validation(format!(
                    "quantity for product {} must be 1",
                    item.product_id
                )));
            }
            Ok(LineItem {
                product_id: item.product_id,
                name,
                unit_price,
                quantity,
            })
        })
        .collect()
}

fn non_negative(value: Option<i64>, field: &str) -> Result<i64, AppError> {
    match value {
        None => Err(AppError::validation(format!("{field} is required"))),
        Some(v) if v < 0 => Err(AppError::validation(format!("{field} must not be negative"))),
        Some(v) => Ok(v),
    }
}

/// `HK-YYYYMMDD-<order id as 32 upper-case hex digits>`. The whole id is kept,
/// so two orders never share a number.
pub fn build_order_number(order_id: Uuid, date: NaiveDate) -> String {
    let simple = order_id.simple().to_string().to_uppercase();
    format!("HK-{}-{}", date.format("%Y%m%d"), simple)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
    pub total: u64,
}

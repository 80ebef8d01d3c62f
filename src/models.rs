use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{
        addresses, order_items, orders, payment_methods, products, return_items, return_tickets,
        users::{self, UserRole},
    },
    lifecycle::{OrderStatus, ProductStatus, ReturnStatus, SalesChannel},
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub category: String,
    pub images: Vec<String>,
    pub highlights: Vec<String>,
    pub discount: i16,
    pub status: ProductStatus,
    pub barcode: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub total: i64,
    pub channel: SalesChannel,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub name: String,
    pub unit_price: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnTicket {
    pub id: Uuid,
    pub order_id: Uuid,
    pub customer_email: String,
    pub reason: String,
    pub status: ReturnStatus,
    pub items: Vec<ReturnItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub label: Option<String>,
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: Uuid,
    pub brand: String,
    pub holder_name: String,
    pub last4: String,
    pub exp_month: i16,
    pub exp_year: i16,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        User {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Product {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            category: model.category,
            images: string_list(model.images),
            highlights: string_list(model.highlights),
            discount: model.discount,
            status: model.status,
            barcode: model.barcode,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Order {
            id: model.id,
            order_number: model.order_number,
            customer_id: model.customer_id,
            customer_name: model.customer_name,
            customer_email: model.customer_email,
            customer_address: model.customer_address,
            subtotal: model.subtotal,
            shipping_cost: model.shipping_cost,
            total: model.total,
            channel: model.channel,
            status: model.status,
            payment_method: model.payment_method,
            tracking_number: model.tracking_number,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        OrderItem {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            name: model.name,
            unit_price: model.unit_price,
            quantity: model.quantity,
        }
    }
}

impl From<return_items::Model> for ReturnItem {
    fn from(model: return_items::Model) -> Self {
        ReturnItem {
            product_id: model.product_id,
            quantity: model.quantity,
        }
    }
}

impl ReturnTicket {
    pub fn from_parts(ticket: return_tickets::Model, items: Vec<return_items::Model>) -> Self {
        ReturnTicket {
            id: ticket.id,
            order_id: ticket.order_id,
            customer_email: ticket.customer_email,
            reason: ticket.reason,
            status: ticket.status,
            items: items.into_iter().map(ReturnItem::from).collect(),
            created_at: ticket.created_at.with_timezone(&Utc),
            updated_at: ticket.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<addresses::Model> for Address {
    fn from(model: addresses::Model) -> Self {
        Address {
            id: model.id,
            label: model.label,
            street: model.street,
            city: model.city,
            state: model.state,
            postal_code: model.postal_code,
            country: model.country,
            phone: model.phone,
        }
    }
}

impl From<payment_methods::Model> for PaymentMethod {
    fn from(model: payment_methods::Model) -> Self {
        PaymentMethod {
            id: model.id,
            brand: model.brand,
            holder_name: model.holder_name,
            last4: model.last4,
            exp_month: model.exp_month,
            exp_year: model.exp_year,
        }
    }
}

fn string_list(value: serde_json::Value) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_list_tolerates_malformed_json() {
        assert_eq!(string_list(json!(["a.jpg", "b.jpg"])), vec!["a.jpg", "b.jpg"]);
        assert!(string_list(json!(null)).is_empty());
        assert!(string_list(json!({"oops": 1})).is_empty());
    }
}

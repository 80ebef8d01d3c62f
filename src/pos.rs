//! Staff-side point-of-sale ticket.
//!
//! Every product is a single unit of stock, so a ticket holds each product at
//! most once. Availability seen here is only a hint: the authoritative check
//! happens when the sale is finalized against the store.

use uuid::Uuid;

use crate::{
    dto::orders::{CustomerSnapshot, LineItem, OrderTotals, ValidatedOrder},
    error::{AppError, AppResult},
    lifecycle::{ProductStatus, SalesChannel},
    models::Product,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosItem {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: i64,
}

impl PosItem {
    pub fn from_product(product: &Product) -> Self {
        PosItem {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: discounted_price(product.price, product.discount),
        }
    }
}

/// Price after the product's stored discount percent, rounded down to whole
/// minor units of discount.
pub fn discounted_price(price: i64, discount: i16) -> i64 {
    let discount = i64::from(discount.clamp(0, 100));
    price - price * discount / 100
}

#[derive(Debug, Clone, Default)]
pub struct PosSession {
    items: Vec<PosItem>,
}

impl PosSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, product: &Product) -> AppResult<&PosItem> {
        if self.contains(product.id) {
            return Err(AppError::validation(format!(
                "product {} is already on the ticket",
                product.id
            )));
        }
        if product.status != ProductStatus::Available {
            return Err(AppError::conflict(format!(
                "product {} is {}",
                product.id, product.status
            )));
        }
        self.items.push(PosItem::from_product(product));
        Ok(&self.items[self.items.len() - 1])
    }

    pub fn remove(&mut self, product_id: Uuid) -> AppResult<PosItem> {
        let index = self
            .items
            .iter()
            .position(|item| item.product_id == product_id)
            .ok_or(AppError::NotFound)?;
        Ok(self.items.remove(index))
    }

    pub fn contains(&self, product_id: Uuid) -> bool {
        self.items.iter().any(|item| item.product_id == product_id)
    }

    pub fn items(&self) -> &[PosItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> i64 {
        self.items.iter().map(|item| item.unit_price).sum()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Build the in-store order for this ticket. Walk-in customers get a
    /// generic name.
    pub fn to_order(
        &self,
        customer: Option<CustomerSnapshot>,
        payment_method: &str,
    ) -> AppResult<ValidatedOrder> {
        if self.is_empty() {
            return Err(AppError::validation("ticket is empty"));
        }
        let payment_method = payment_method.trim();
        if payment_method.is_empty() {
            return Err(AppError::validation("paymentMethod is required"));
        }

        let items: Vec<LineItem> = self
            .items
            .iter()
            .map(|item| LineItem {
                product_id: item.product_id,
                name: item.name.clone(),
                unit_price: item.unit_price,
                quantity: 1,
            })
            .collect();
        let totals = OrderTotals::validate(&items, Some(self.total()), Some(0), None)?;

        let mut customer = customer.unwrap_or_default();
        if customer.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
            customer.name = Some(WALK_IN_CUSTOMER.to_string());
        }

        Ok(ValidatedOrder {
            channel: SalesChannel::InStore,
            customer,
            items,
            totals,
            payment_method: Some(payment_method.to_string()),
        })
    }
}

pub const WALK_IN_CUSTOMER: &str = "Walk-in customer";

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(name: &str, price: i64, discount: i16, status: ProductStatus) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            price,
            category: "Hats".into(),
            images: vec![],
            highlights: vec![],
            discount,
            status,
            barcode: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn running_total_is_a_simple_sum() {
        let mut session = PosSession::new();
        session.add(&product("Cap", 200, 0, ProductStatus::Available)).unwrap();
        session.add(&product("Scarf", 350, 0, ProductStatus::Available)).unwrap();
        assert_eq!(session.total(), 550);
        assert_eq!(session.items().len(), 2);
    }

    #[test]
    fn stored_discount_is_applied_once() {
        assert_eq!(discounted_price(1000, 15), 850);
        assert_eq!(discounted_price(999, 10), 900);
        assert_eq!(discounted_price(500, 0), 500);
        assert_eq!(discounted_price(500, 100), 0);
    }

    #[test]
    fn duplicate_products_are_rejected() {
        let cap = product("Cap", 200, 0, ProductStatus::Available);
        let mut session = PosSession::new();
        session.add(&cap).unwrap();
        let err = session.add(&cap).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(session.items().len(), 1);
    }

    #[test]
    fn unavailable_products_cannot_be_added() {
        let mut session = PosSession::new();
        for status in [ProductStatus::Sold, ProductStatus::PendingShipment] {
            let err = session.add(&product("Cap", 200, 0, status)).unwrap_err();
            assert!(matches!(err, AppError::Conflict(_)));
        }
        assert!(session.is_empty());
    }

    #[test]
    fn remove_returns_the_item_or_not_found() {
        let cap = product("Cap", 200, 0, ProductStatus::Available);
        let mut session = PosSession::new();
        session.add(&cap).unwrap();
        assert_eq!(session.remove(cap.id).unwrap().name, "Cap");
        assert!(matches!(session.remove(cap.id), Err(AppError::NotFound)));
        assert_eq!(session.total(), 0);
    }

    #[test]
    fn ticket_becomes_an_in_store_order_without_shipping() {
        let mut session = PosSession::new();
        session.add(&product("Cap", 200, 0, ProductStatus::Available)).unwrap();
        let order = session.to_order(None, " card ").unwrap();

        assert_eq!(order.channel, SalesChannel::InStore);
        assert_eq!(order.totals.subtotal, 200);
        assert_eq!(order.totals.shipping_cost, 0);
        assert_eq!(order.totals.total, 200);
        assert_eq!(order.payment_method.as_deref(), Some("card"));
        assert_eq!(order.customer.name.as_deref(), Some(WALK_IN_CUSTOMER));
        assert!(order.items.iter().all(|item| item.quantity == 1));
    }

    #[test]
    fn empty_ticket_or_missing_payment_cannot_be_finalized() {
        let session = PosSession::new();
        assert!(session.to_order(None, "cash").is_err());

        let mut session = PosSession::new();
        session.add(&product("Cap", 200, 0, ProductStatus::Available)).unwrap();
        assert!(session.to_order(None, "  ").is_err());
    }
}

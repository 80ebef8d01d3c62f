//! Order status and product availability machines.
//!
//! The two machines are kept separate and joined through order line items: an
//! order status change may carry a [`ProductTransition`] that must be applied to
//! every product on the order inside the same transaction as the order write.

use std::fmt;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "pending_shipment")]
    PendingShipment,
    #[sea_orm(string_value = "sold")]
    Sold,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Available => "available",
            ProductStatus::PendingShipment => "pending_shipment",
            ProductStatus::Sold => "sold",
        }
    }

    /// Sold -> Available is only reachable through an approved return.
    pub fn can_transition_to(self, next: ProductStatus) -> bool {
        use ProductStatus::*;
        matches!(
            (self, next),
            (Available, PendingShipment)
                | (Available, Sold)
                | (PendingShipment, Sold)
                | (PendingShipment, Available)
                | (Sold, Available)
        )
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "preparing")]
    Preparing,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "returned")]
    Returned,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Paid => "paid",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Returned => "returned",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Returned
        )
    }

    pub fn is_cancellable(self) -> bool {
        matches!(
            self,
            OrderStatus::Paid | OrderStatus::Preparing | OrderStatus::Shipped
        )
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Paid, Preparing) | (Preparing, Shipped) | (Shipped, Delivered) => true,
            (current, Cancelled) => current.is_cancellable(),
            (Delivered, Returned) => true,
            _ => false,
        }
    }

    /// Validate `self -> next` and return the availability change the order's
    /// products must go through in the same transaction, if any.
    pub fn plan_transition(self, next: OrderStatus) -> AppResult<Option<ProductTransition>> {
        if !self.can_transition_to(next) {
            return Err(AppError::invalid_transition(self, next));
        }
        Ok(match next {
            OrderStatus::Delivered => Some(ProductTransition::DELIVER),
            OrderStatus::Cancelled => Some(ProductTransition::RELEASE),
            OrderStatus::Returned => Some(ProductTransition::RESTOCK),
            _ => None,
        })
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum SalesChannel {
    #[sea_orm(string_value = "online")]
    Online,
    #[sea_orm(string_value = "in_store")]
    InStore,
}

impl SalesChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            SalesChannel::Online => "online",
            SalesChannel::InStore => "in_store",
        }
    }

    /// In-store sales skip the shipping pipeline: the goods leave with the buyer.
    pub fn initial_status(self) -> OrderStatus {
        match self {
            SalesChannel::Online => OrderStatus::Paid,
            SalesChannel::InStore => OrderStatus::Delivered,
        }
    }

    pub fn claim(self) -> ProductTransition {
        match self {
            SalesChannel::Online => ProductTransition::RESERVE,
            SalesChannel::InStore => ProductTransition::SELL,
        }
    }
}

impl fmt::Display for SalesChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    #[sea_orm(string_value = "requested")]
    Requested,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl ReturnStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReturnStatus::Requested => "requested",
            ReturnStatus::Approved => "approved",
            ReturnStatus::Rejected => "rejected",
            ReturnStatus::Completed => "completed",
        }
    }

    pub fn is_open(self) -> bool {
        matches!(self, ReturnStatus::Requested | ReturnStatus::Approved)
    }

    pub fn ensure_transition(self, next: ReturnStatus) -> AppResult<()> {
        use ReturnStatus::*;
        match (self, next) {
            (Requested, Approved) | (Requested, Rejected) | (Approved, Completed) => Ok(()),
            _ => Err(AppError::invalid_transition(self, next)),
        }
    }
}

impl fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A check-and-set on product availability: every affected product must be in
/// `from` at the moment it is moved to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductTransition {
    pub from: ProductStatus,
    pub to: ProductStatus,
}

impl ProductTransition {
    pub const RESERVE: Self = Self::new(ProductStatus::Available, ProductStatus::PendingShipment);
    pub const SELL: Self = Self::new(ProductStatus::Available, ProductStatus::Sold);
    pub const DELIVER: Self = Self::new(ProductStatus::PendingShipment, ProductStatus::Sold);
    pub const RELEASE: Self = Self::new(ProductStatus::PendingShipment, ProductStatus::Available);
    pub const RESTOCK: Self = Self::new(ProductStatus::Sold, ProductStatus::Available);

    const fn new(from: ProductStatus, to: ProductStatus) -> Self {
        Self { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn happy_path_moves_forward_one_step_at_a_time() {
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Preparing));
        assert!(OrderStatus::Preparing.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));

        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Preparing));
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges_except_return() {
        let terminal: Vec<_> = OrderStatus::iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(
            terminal,
            vec![OrderStatus::Delivered, OrderStatus::Cancelled, OrderStatus::Returned]
        );
        for next in OrderStatus::iter() {
            assert!(!OrderStatus::Cancelled.can_transition_to(next));
            assert!(!OrderStatus::Returned.can_transition_to(next));
        }
        let from_delivered: Vec<_> = OrderStatus::iter()
            .filter(|next| OrderStatus::Delivered.can_transition_to(*next))
            .collect();
        assert_eq!(from_delivered, vec![OrderStatus::Returned]);
    }

    #[test]
    fn self_transitions_are_rejected() {
        for status in OrderStatus::iter() {
            assert!(!status.can_transition_to(status), "{status} -> {status}");
        }
    }

    #[test]
    fn cancelling_before_delivery_releases_inventory() {
        for status in [OrderStatus::Paid, OrderStatus::Preparing, OrderStatus::Shipped] {
            let effect = status.plan_transition(OrderStatus::Cancelled).unwrap();
            assert_eq!(effect, Some(ProductTransition::RELEASE));
        }
    }

    #[test]
    fn cancelling_a_delivered_order_is_an_invalid_transition() {
        let err = OrderStatus::Delivered
            .plan_transition(OrderStatus::Cancelled)
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition { ref from, ref to } if from == "delivered" && to == "cancelled"
        ));
    }

    #[test]
    fn delivery_and_return_carry_product_effects() {
        assert_eq!(
            OrderStatus::Shipped.plan_transition(OrderStatus::Delivered).unwrap(),
            Some(ProductTransition::DELIVER)
        );
        assert_eq!(
            OrderStatus::Delivered.plan_transition(OrderStatus::Returned).unwrap(),
            Some(ProductTransition::RESTOCK)
        );
        assert_eq!(
            OrderStatus::Paid.plan_transition(OrderStatus::Preparing).unwrap(),
            None
        );
    }

    #[test]
    fn every_product_effect_is_a_legal_availability_move() {
        for effect in [
            ProductTransition::RESERVE,
            ProductTransition::SELL,
            ProductTransition::DELIVER,
            ProductTransition::RELEASE,
            ProductTransition::RESTOCK,
        ] {
            assert!(effect.from.can_transition_to(effect.to), "{effect:?}");
        }
    }

    #[test]
    fn sold_only_returns_to_available() {
        assert!(ProductStatus::Sold.can_transition_to(ProductStatus::Available));
        assert!(!ProductStatus::Sold.can_transition_to(ProductStatus::PendingShipment));
        assert!(!ProductStatus::Available.can_transition_to(ProductStatus::Available));
    }

    #[test]
    fn channels_start_in_their_own_states() {
        assert_eq!(SalesChannel::Online.initial_status(), OrderStatus::Paid);
        assert_eq!(SalesChannel::InStore.initial_status(), OrderStatus::Delivered);
        assert_eq!(SalesChannel::Online.claim(), ProductTransition::RESERVE);
        assert_eq!(SalesChannel::InStore.claim(), ProductTransition::SELL);
    }

    #[test]
    fn return_tickets_follow_the_approval_workflow() {
        assert!(ReturnStatus::Requested.ensure_transition(ReturnStatus::Approved).is_ok());
        assert!(ReturnStatus::Requested.ensure_transition(ReturnStatus::Rejected).is_ok());
        assert!(ReturnStatus::Approved.ensure_transition(ReturnStatus::Completed).is_ok());
        assert!(ReturnStatus::Requested.ensure_transition(ReturnStatus::Completed).is_err());
        assert!(ReturnStatus::Rejected.ensure_transition(ReturnStatus::Approved).is_err());
        assert!(ReturnStatus::Requested.is_open());
        assert!(!ReturnStatus::Rejected.is_open());
    }

    #[test]
    fn statuses_serialize_as_snake_case() {
        assert_eq!(
            serde_json::to_value(ProductStatus::PendingShipment).unwrap(),
            serde_json::json!("pending_shipment")
        );
        assert_eq!(
            serde_json::from_value::<SalesChannel>(serde_json::json!("in_store")).unwrap(),
            SalesChannel::InStore
        );
        assert_eq!(OrderStatus::Cancelled.to_value(), "cancelled");
    }
}

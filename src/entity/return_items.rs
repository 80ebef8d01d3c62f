use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "return_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub return_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::return_tickets::Entity",
        from = "Column::ReturnId",
        to = "super::return_tickets::Column::Id"
    )]
    ReturnTickets,
}

impl Related<super::return_tickets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReturnTickets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

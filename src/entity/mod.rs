pub mod addresses;
pub mod audit_logs;
pub mod order_items;
pub mod orders;
pub mod payment_methods;
pub mod products;
pub mod return_items;
pub mod return_tickets;
pub mod users;

pub use addresses::Entity as Addresses;
pub use audit_logs::Entity as AuditLogs;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use payment_methods::Entity as PaymentMethods;
pub use products::Entity as Products;
pub use return_items::Entity as ReturnItems;
pub use return_tickets::Entity as ReturnTickets;
pub use users::Entity as Users;

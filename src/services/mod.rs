pub mod account_service;
pub mod admin_service;
pub mod auth_service;
pub mod order_service;
pub mod pos_service;
pub mod product_service;
pub mod return_service;

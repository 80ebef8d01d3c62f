pub mod account;
pub mod auth;
pub mod orders;
pub mod pos;
pub mod products;
pub mod returns;

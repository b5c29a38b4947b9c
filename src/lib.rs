pub mod config;
pub mod network;
pub mod product_system;
pub mod view;

pub mod api;
pub mod availability;
pub mod config;
pub mod db;
pub mod identity;
pub mod models;
pub mod payment;
pub mod video;

pub mod app;
pub mod catalog;
pub mod category;
pub mod config;
pub mod detail;
pub mod error;
pub mod favorites;
pub mod home;
pub mod models;
pub mod search;
pub mod storage;

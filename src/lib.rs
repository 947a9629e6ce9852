pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod storage;
pub mod visitor;
pub mod visits;

pub mod auth;
pub mod company;
pub mod dashboard;
pub mod document;
pub mod supplier;
pub mod user;

pub mod auth;
pub mod companies;
pub mod dashboard;
pub mod documents;
pub mod suppliers;
pub mod users;

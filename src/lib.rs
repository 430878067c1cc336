pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod fiscal;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod render;
pub mod routes;
pub mod services;

// src/handlers/dashboard.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::AppError,
    config::AppState,
    // Importamos os models para referenciar no Swagger
    models::dashboard::{DashboardStats, MonthlyEntry, TopSupplierEntry},
};

// GET /api/dashboard/stats
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Contagens por status, totais e fornecedores", body = DashboardStats),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_stats(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stats = app_state.dashboard_service.get_stats().await?;
    Ok((StatusCode::OK, Json(stats)))
}

// GET /api/dashboard/monthly
#[utoipa::path(
    get,
    path = "/api/dashboard/monthly",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Quantidade e valor por mês (últimos 12 meses)", body = Vec<MonthlyEntry>),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_monthly(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let data = app_state.dashboard_service.get_monthly().await?;
    Ok((StatusCode::OK, Json(data)))
}

// GET /api/dashboard/top-suppliers
#[utoipa::path(
    get,
    path = "/api/dashboard/top-suppliers",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Top 5 emitentes por valor", body = Vec<TopSupplierEntry>),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_top_suppliers(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let data = app_state.dashboard_service.get_top_suppliers().await?;
    Ok((StatusCode::OK, Json(data)))
}

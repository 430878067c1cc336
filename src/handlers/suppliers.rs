// src/handlers/suppliers.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, pagination::Paginated},
    config::AppState,
    models::supplier::{Supplier, SupplierListQuery, SupplierPayload, SupplierSyncResult},
};

#[utoipa::path(
    get,
    path = "/api/fornecedores",
    tag = "Suppliers",
    params(SupplierListQuery),
    responses((status = 200, description = "Lista paginada de fornecedores", body = Paginated<Supplier>)),
    security(("api_jwt" = []))
)]
pub async fn list_suppliers(
    State(app_state): State<AppState>,
    Query(query): Query<SupplierListQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.supplier_service.list(&query).await?))
}

#[utoipa::path(
    get,
    path = "/api/fornecedores/{id}",
    tag = "Suppliers",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 200, description = "Fornecedor", body = Supplier),
        (status = 404, description = "Fornecedor não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_supplier(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.supplier_service.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/fornecedores",
    tag = "Suppliers",
    request_body = SupplierPayload,
    responses(
        (status = 201, description = "Fornecedor cadastrado", body = Supplier),
        (status = 409, description = "CNPJ já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_supplier(
    State(app_state): State<AppState>,
    Json(payload): Json<SupplierPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let supplier = app_state.supplier_service.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

#[utoipa::path(
    put,
    path = "/api/fornecedores/{id}",
    tag = "Suppliers",
    request_body = SupplierPayload,
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 200, description = "Fornecedor atualizado", body = Supplier),
        (status = 404, description = "Fornecedor não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_supplier(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SupplierPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    Ok(Json(app_state.supplier_service.update(id, &payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/fornecedores/{id}",
    tag = "Suppliers",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 204, description = "Fornecedor excluído"),
        (status = 404, description = "Fornecedor não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_supplier(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.supplier_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/fornecedores/{id}/sync-erp
#[utoipa::path(
    post,
    path = "/api/fornecedores/{id}/sync-erp",
    tag = "Suppliers",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 200, description = "Consulta feita; `found` indica se o CNPJ existe no ERP", body = SupplierSyncResult),
        (status = 400, description = "ERP não configurado"),
        (status = 404, description = "Fornecedor não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn sync_supplier_erp(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.supplier_service.sync_erp(id).await?))
}

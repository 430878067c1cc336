// src/handlers/documents.rs
//
// NFe (`/api/nfe-documents`) e NFSe recebidas (`/api/nfse-recebidas`).

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::Paginated},
    config::AppState,
    models::document::{
        DocumentListQuery, ErpCheckResult, ImportReport, NfeDocument, NfseDocument,
        UpdateStatusPayload,
    },
    services::{
        document_service::FileDownload,
        import_service::{DocumentKind, UploadedFile},
    },
};

/// Limite do corpo das rotas de upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// Só para o Swagger: um ou mais arquivos XML no campo `files`
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct XmlUpload {
    #[schema(value_type = Vec<String>, format = Binary)]
    files: Vec<Vec<u8>>,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(format!("Upload inválido: {}", e.body_text()))
    }
}

pub(crate) async fn read_files(mut multipart: Multipart) -> Result<Vec<UploadedFile>, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let file_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("arquivo-{}.xml", files.len() + 1));
        let bytes = field.bytes().await.map_err(multipart_error)?;
        files.push(UploadedFile {
            file_name,
            bytes: bytes.to_vec(),
        });
    }
    if files.is_empty() {
        return Err(AppError::BadRequest("Nenhum arquivo enviado.".into()));
    }
    Ok(files)
}

// O número vem do XML: só letras, dígitos, `.`, `_` e `-` chegam ao cabeçalho
fn safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "documento".to_string()
    } else {
        cleaned
    }
}

fn download(file: FileDownload, content_type: &'static str, disposition: &str) -> Response {
    let headers = [
        (header::CONTENT_TYPE, content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("{disposition}; filename=\"{}\"", safe_file_name(&file.file_name)),
        ),
    ];
    (headers, file.bytes).into_response()
}

// ---
// NFe
// ---

#[utoipa::path(
    get,
    path = "/api/nfe-documents",
    tag = "NFe",
    params(DocumentListQuery),
    responses((status = 200, description = "Lista paginada de NFe", body = Paginated<NfeDocument>)),
    security(("api_jwt" = []))
)]
pub async fn list_nfe(
    State(app_state): State<AppState>,
    Query(query): Query<DocumentListQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.document_service.list_nfe(&query).await?))
}

#[utoipa::path(
    get,
    path = "/api/nfe-documents/{id}",
    tag = "NFe",
    params(("id" = Uuid, Path, description = "ID da NFe")),
    responses(
        (status = 200, description = "NFe (sem o XML)", body = NfeDocument),
        (status = 404, description = "NFe não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_nfe(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.document_service.get_nfe(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/nfe-documents/{id}/xml",
    tag = "NFe",
    params(("id" = Uuid, Path, description = "ID da NFe")),
    responses(
        (status = 200, description = "XML original", body = String, content_type = "application/xml"),
        (status = 404, description = "NFe não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_nfe_xml(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let file = app_state.document_service.nfe_xml(id).await?;
    Ok(download(file, "application/xml; charset=utf-8", "attachment"))
}

#[utoipa::path(
    get,
    path = "/api/nfe-documents/{id}/danfe",
    tag = "NFe",
    params(("id" = Uuid, Path, description = "ID da NFe")),
    responses(
        (status = 200, description = "DANFE em PDF", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "NFe não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_nfe_danfe(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let file = app_state.document_service.nfe_danfe(id).await?;
    Ok(download(file, "application/pdf", "inline"))
}

#[utoipa::path(
    patch,
    path = "/api/nfe-documents/{id}/status",
    tag = "NFe",
    request_body = UpdateStatusPayload,
    params(("id" = Uuid, Path, description = "ID da NFe")),
    responses(
        (status = 200, description = "Status atualizado", body = NfeDocument),
        (status = 404, description = "NFe não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_nfe_status(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.document_service.update_nfe_status(id, &payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/nfe-documents/{id}/check-erp",
    tag = "NFe",
    params(("id" = Uuid, Path, description = "ID da NFe")),
    responses(
        (status = 200, description = "Status consultado no ERP e gravado", body = ErpCheckResult),
        (status = 400, description = "ERP não configurado"),
        (status = 404, description = "NFe não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn check_nfe_erp(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.document_service.check_nfe_erp(id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/nfe-documents/{id}",
    tag = "NFe",
    params(("id" = Uuid, Path, description = "ID da NFe")),
    responses(
        (status = 204, description = "NFe excluída"),
        (status = 404, description = "NFe não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_nfe(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.document_service.delete_nfe(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/nfe-documents/import",
    tag = "NFe",
    request_body(content = XmlUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Resultado por arquivo", body = ImportReport),
        (status = 400, description = "Nenhum arquivo enviado"),
        (status = 413, description = "Upload acima de 10 MB")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_nfe(
    State(app_state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let files = read_files(multipart).await?;
    Ok(Json(app_state.import_service.import(DocumentKind::Nfe, files).await))
}

// ---
// NFSe recebidas
// ---

#[utoipa::path(
    get,
    path = "/api/nfse-recebidas",
    tag = "NFSe",
    params(DocumentListQuery),
    responses((status = 200, description = "Lista paginada de NFS-e", body = Paginated<NfseDocument>)),
    security(("api_jwt" = []))
)]
pub async fn list_nfse(
    State(app_state): State<AppState>,
    Query(query): Query<DocumentListQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.document_service.list_nfse(&query).await?))
}

#[utoipa::path(
    get,
    path = "/api/nfse-recebidas/{id}",
    tag = "NFSe",
    params(("id" = Uuid, Path, description = "ID da NFS-e")),
    responses(
        (status = 200, description = "NFS-e (sem o XML)", body = NfseDocument),
        (status = 404, description = "NFS-e não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_nfse(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.document_service.get_nfse(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/nfse-recebidas/{id}/xml",
    tag = "NFSe",
    params(("id" = Uuid, Path, description = "ID da NFS-e")),
    responses(
        (status = 200, description = "XML original", body = String, content_type = "application/xml"),
        (status = 404, description = "NFS-e não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_nfse_xml(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let file = app_state.document_service.nfse_xml(id).await?;
    Ok(download(file, "application/xml; charset=utf-8", "attachment"))
}

#[utoipa::path(
    get,
    path = "/api/nfse-recebidas/{id}/danfse",
    tag = "NFSe",
    params(("id" = Uuid, Path, description = "ID da NFS-e")),
    responses(
        (status = 200, description = "DANFSe em PDF", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "NFS-e não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_nfse_danfse(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let file = app_state.document_service.nfse_danfse(id).await?;
    Ok(download(file, "application/pdf", "inline"))
}

#[utoipa::path(
    post,
    path = "/api/nfse-recebidas/preview",
    tag = "NFSe",
    request_body(content = XmlUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "DANFSe gerado sem gravar o documento", body = Vec<u8>, content_type = "application/pdf"),
        (status = 400, description = "XML inválido ou não reconhecido")
    ),
    security(("api_jwt" = []))
)]
pub async fn preview_nfse(
    State(app_state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut files = read_files(multipart).await?;
    // Só o primeiro arquivo é usado
    let upload = files.swap_remove(0);
    let file = app_state.document_service.preview_danfse(&upload.bytes).await?;
    Ok(download(file, "application/pdf", "inline"))
}

#[utoipa::path(
    patch,
    path = "/api/nfse-recebidas/{id}/status",
    tag = "NFSe",
    request_body = UpdateStatusPayload,
    params(("id" = Uuid, Path, description = "ID da NFS-e")),
    responses(
        (status = 200, description = "Status atualizado", body = NfseDocument),
        (status = 404, description = "NFS-e não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_nfse_status(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.document_service.update_nfse_status(id, &payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/nfse-recebidas/{id}",
    tag = "NFSe",
    params(("id" = Uuid, Path, description = "ID da NFS-e")),
    responses(
        (status = 204, description = "NFS-e excluída"),
        (status = 404, description = "NFS-e não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_nfse(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.document_service.delete_nfse(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/nfse-recebidas/import",
    tag = "NFSe",
    request_body(content = XmlUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Resultado por arquivo", body = ImportReport),
        (status = 400, description = "Nenhum arquivo enviado"),
        (status = 413, description = "Upload acima de 10 MB")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_nfse(
    State(app_state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let files = read_files(multipart).await?;
    Ok(Json(app_state.import_service.import(DocumentKind::Nfse, files).await))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_keeps_only_safe_characters() {
        assert_eq!(safe_file_name("DANFSe-2024/15.pdf"), "DANFSe-202415.pdf");
        assert_eq!(safe_file_name("NFSe-1\"; x=\"y\r\n.xml"), "NFSe-1xy.xml");
        assert_eq!(safe_file_name("NFe-3524.xml"), "NFe-3524.xml");
        assert_eq!(safe_file_name("\"\r\n"), "documento");
    }

    #[test]
    fn download_sets_sanitized_disposition() {
        let file = FileDownload {
            file_name: "NFSe-12 \"34\".xml".to_string(),
            bytes: b"<a/>".to_vec(),
        };
        let response = download(file, "application/xml", "attachment");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"NFSe-1234.xml\""
        );
    }
}

// src/routes.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, patch, post, MethodRouter},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers::{self, documents::MAX_UPLOAD_BYTES},
    middleware::auth::auth_guard,
};

// Uploads: o limite padrão do axum (2 MB) dá lugar ao de 10 MB.
// O `Multipart` respeita esse limite e o estouro vira 413.
fn upload<S>(route: MethodRouter<S>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

pub fn build_router(app_state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/", get(handlers::users::list_users).post(handlers::users::create_user))
        .route(
            "/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        );

    let company_routes = Router::new()
        .route(
            "/",
            get(handlers::companies::list_companies).post(handlers::companies::create_company),
        )
        .route(
            "/{id}",
            get(handlers::companies::get_company)
                .put(handlers::companies::update_company)
                .delete(handlers::companies::delete_company),
        );

    let supplier_routes = Router::new()
        .route(
            "/",
            get(handlers::suppliers::list_suppliers).post(handlers::suppliers::create_supplier),
        )
        .route(
            "/{id}",
            get(handlers::suppliers::get_supplier)
                .put(handlers::suppliers::update_supplier)
                .delete(handlers::suppliers::delete_supplier),
        )
        .route("/{id}/sync-erp", post(handlers::suppliers::sync_supplier_erp));

    let nfe_routes = Router::new()
        .route("/", get(handlers::documents::list_nfe))
        .route("/import", upload(post(handlers::documents::import_nfe)))
        .route(
            "/{id}",
            get(handlers::documents::get_nfe).delete(handlers::documents::delete_nfe),
        )
        .route("/{id}/xml", get(handlers::documents::get_nfe_xml))
        .route("/{id}/danfe", get(handlers::documents::get_nfe_danfe))
        .route("/{id}/status", patch(handlers::documents::update_nfe_status))
        .route("/{id}/check-erp", post(handlers::documents::check_nfe_erp));

    let nfse_routes = Router::new()
        .route("/", get(handlers::documents::list_nfse))
        .route("/import", upload(post(handlers::documents::import_nfse)))
        .route("/preview", upload(post(handlers::documents::preview_nfse)))
        .route(
            "/{id}",
            get(handlers::documents::get_nfse).delete(handlers::documents::delete_nfse),
        )
        .route("/{id}/xml", get(handlers::documents::get_nfse_xml))
        .route("/{id}/danfse", get(handlers::documents::get_nfse_danfse))
        .route("/{id}/status", patch(handlers::documents::update_nfse_status));

    let dashboard_routes = Router::new()
        .route("/stats", get(handlers::dashboard::get_stats))
        .route("/monthly", get(handlers::dashboard::get_monthly))
        .route("/top-suppliers", get(handlers::dashboard::get_top_suppliers));

    // Tudo aqui exige Bearer válido
    let protected = Router::new()
        .route("/auth/me", get(handlers::auth::get_me))
        .nest("/usuarios", user_routes)
        .nest("/companies", company_routes)
        .nest("/fornecedores", supplier_routes)
        .nest("/nfe-documents", nfe_routes)
        .nest("/nfse-recebidas", nfse_routes)
        .nest("/dashboard", dashboard_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let api = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/auth/login", post(handlers::auth::login))
        .merge(protected);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

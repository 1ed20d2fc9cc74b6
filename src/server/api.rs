use crate::cli::ServeArgs;
use crate::proxy::ProxyService;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    routing::{ any, get },
    Router,
    extract::{ Request, State },
    response::{ IntoResponse, Response },
    http::StatusCode,
    Json,
};
use tower_http::cors::{ Any, CorsLayer };
use log::info;

#[derive(Clone)]
struct AppState {
    service: Arc<ProxyService>,
}

pub fn router(service: Arc<ProxyService>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/chat", any(chat_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(AppState { service })
}

pub async fn start_http_server(
    service: Arc<ProxyService>,
    args: &ServeArgs
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = args.server_addr.parse::<SocketAddr>()?;
    let app = router(service);

    match (args.enable_tls, &args.tls_cert_path, &args.tls_key_path) {
        (true, Some(cert_path), Some(key_path)) => {
            info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);
            let tls_config = axum_server::tls_rustls::RustlsConfig
                ::from_pem_file(cert_path, key_path).await?;

            info!("Starting HTTPS chat proxy on: https://{}", addr);
            axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
        }
        (true, _, _) => {
            return Err("TLS enabled without both --tls-cert-path and --tls-key-path".into());
        }
        (false, _, _) => {
            let listener = tokio::net::TcpListener
                ::bind(addr).await
                .map_err(|e| format!("Failed to bind HTTP server to {}: {}", addr, e))?;
            info!("Starting HTTP chat proxy on: http://{}", addr);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

async fn chat_handler(State(state): State<AppState>, request: Request) -> Response {
    let result = state.service.handle(request).await;
    let status = StatusCode::from_u16(result.http_status()).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(result.to_body())).into_response()
}

async fn health_handler() -> &'static str {
    "ok"
}

//! Router assembly and server lifecycle

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, Uri, header};
use core_config::server::ServerConfig;
use domain_events::EventError;
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, error, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Combine API routes with docs, tracing, compression and CORS.
///
/// Routes are nested under `/api`; Swagger UI is served at `/swagger-ui`
/// with the document at `/api-docs/openapi.json`. CORS is only enabled when
/// `allowed_origins` is non-empty.
pub fn create_router<T>(apis: Router, allowed_origins: &[String]) -> io::Result<Router>
where
    T: OpenApi + 'static,
{
    let router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", T::openapi()))
        .nest("/api", apis)
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let router = match cors_layer(allowed_origins)? {
        Some(cors) => router.layer(cors),
        None => router,
    };

    Ok(router.layer(CompressionLayer::new()))
}

fn cors_layer(allowed_origins: &[String]) -> io::Result<Option<CorsLayer>> {
    if allowed_origins.is_empty() {
        return Ok(None);
    }

    let origins = allowed_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid CORS_ALLOWED_ORIGIN value: {}", e),
            )
        })?;

    info!("CORS configured with allowed origins: {}", allowed_origins.join(","));

    Ok(Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
                HeaderName::from_static(domain_events::USER_ID_HEADER),
                HeaderName::from_static(domain_events::USER_EMAIL_HEADER),
            ])
            .max_age(Duration::from_secs(3600)),
    ))
}

async fn not_found(uri: Uri) -> EventError {
    EventError::NotFound(format!("route {}", uri.path()))
}

/// Serve until SIGINT/SIGTERM, then run `cleanup` bounded by the shutdown timeout
pub async fn serve<F>(router: Router, server_config: &ServerConfig, cleanup: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    let serve_result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| {
            error!("Server encountered an error: {:?}", e);
        });

    let shutdown_timeout = server_config.shutdown_timeout();
    info!("Starting cleanup tasks (timeout: {:?})", shutdown_timeout);
    match tokio::time::timeout(shutdown_timeout, cleanup).await {
        Ok(()) => info!("Cleanup completed successfully"),
        Err(_) => warn!(
            "Cleanup exceeded timeout of {:?}, forcing shutdown",
            shutdown_timeout
        ),
    }

    serve_result
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}

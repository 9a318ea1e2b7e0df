//! HTTP front for the remote pipeline.
//!
//! `POST /scan` takes the request body a proxy event would carry and answers
//! with the envelope's status and body. `GET /sys/_health` is a liveness
//! check. Each scan runs on the blocking pool so staging and recognition
//! calls never stall the async workers.

use std::sync::Arc;

use actix_web::{
    App, HttpResponse, HttpServer,
    http::{StatusCode, header},
    middleware::Logger,
    web::{self, Bytes},
};
use anyhow::{Context, Result};
use tracing::{error, info};

use crate::handler::{LambdaEvent, handle_event};
use crate::pipeline::RemotePipeline;

/// Shared state backing HTTP handlers.
pub struct ServerState {
    pub pipeline: Arc<RemotePipeline>,
}

/// Register the service routes
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/scan", web::post().to(scan_handler))
        .route("/sys/_health", web::get().to(health_handler));
}

async fn health_handler() -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn scan_handler(state: web::Data<ServerState>, body: Bytes) -> HttpResponse {
    let event = if body.is_empty() {
        LambdaEvent::default()
    } else {
        LambdaEvent::with_body(String::from_utf8_lossy(&body).into_owned())
    };

    let pipeline = state.pipeline.clone();
    match web::block(move || handle_event(&pipeline, &event)).await {
        Ok(response) => {
            let status = StatusCode::from_u16(response.status_code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            HttpResponse::build(status)
                .insert_header((header::CONTENT_TYPE, "application/json"))
                .body(response.body)
        }
        Err(err) => {
            error!(error = %err, "scan worker failed");
            HttpResponse::InternalServerError()
                .insert_header((header::CONTENT_TYPE, "application/json"))
                .body(r#"{"data":[],"message":"internal error"}"#)
        }
    }
}

/// Serve until the process is interrupted
pub async fn serve(pipeline: Arc<RemotePipeline>, host: &str, port: u16) -> Result<()> {
    let state = web::Data::new(ServerState { pipeline });

    info!("HTTP server running at {}:{}", host, port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(routes)
    })
    .bind((host.to_string(), port))
    .with_context(|| format!("Failed to bind {}:{}", host, port))?
    .run()
    .await
    .context("HTTP server stopped with an error")
}

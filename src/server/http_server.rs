use crate::error::{BarristerError, BarristerResult};
use crate::rpc::Dispatcher;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer as ActixHttpServer, Responder};
use log::{debug, info};
use std::sync::Arc;

/// HTTP host for a [`Dispatcher`].
///
/// Routes:
///
/// * `POST /` and `POST /rpc` - JSON-RPC requests; `200` with a JSON body, or
///   `204 No Content` when only notifications were sent
/// * `GET /idl` - the IDL in its JSON form
pub struct RpcHttpServer {
    dispatcher: Arc<Dispatcher>,
    bind_address: String,
}

/// Shared application state for the HTTP server.
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

impl RpcHttpServer {
    pub fn new(dispatcher: Arc<Dispatcher>, bind_address: &str) -> Self {
        Self {
            dispatcher,
            bind_address: bind_address.to_string(),
        }
    }

    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    /// Runs the server until it is stopped.
    ///
    /// # Errors
    ///
    /// Returns a `BarristerError` if:
    /// * There is an error binding to the specified address
    /// * The server stops with an IO error
    pub async fn run(&self) -> BarristerResult<()> {
        info!("JSON-RPC server running on {}", self.bind_address);

        let app_state = web::Data::new(AppState {
            dispatcher: self.dispatcher.clone(),
        });

        let server = ActixHttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(app_state.clone())
                .route("/", web::post().to(handle_rpc))
                .route("/rpc", web::post().to(handle_rpc))
                .route("/idl", web::get().to(get_idl))
        })
        .bind(&self.bind_address)
        .map_err(|e| {
            BarristerError::Transport(format!("Failed to bind {}: {}", self.bind_address, e))
        })?
        .run();

        server.await?;
        Ok(())
    }
}

async fn handle_rpc(body: String, state: web::Data<AppState>) -> impl Responder {
    debug!("Received {} byte request", body.len());
    match state.dispatcher.handle_json(&body).await {
        Some(response) => HttpResponse::Ok()
            .content_type("application/json")
            .body(response),
        None => HttpResponse::NoContent().finish(),
    }
}

async fn get_idl(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.dispatcher.idl_json())
}

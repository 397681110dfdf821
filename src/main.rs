//! Valkyrja demo application.
//!
//! ```text
//! cargo run -- serve
//! cargo run -- routes:list
//! cargo run -- --config valkyrja.toml routes:cache
//! ```

use std::process::ExitCode;
use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::Json;
use clap::Parser;
use serde_json::{json, Value};

use valkyrja::console::{self, Cli};
use valkyrja::http::{Next, RequestIdExt};
use valkyrja::routing::{Cast, Parameter};
use valkyrja::{Application, Collector, Dispatch, Dispatcher, HandlerError, RouteContext, RouteProvider};

/// Home page, version and articles.
struct WelcomeController;

impl WelcomeController {
    const NAME: &'static str = "WelcomeController";

    async fn welcome(_ctx: RouteContext) -> Result<Json<Value>, HandlerError> {
        Ok(Json(json!({ "message": "Welcome to Valkyrja" })))
    }

    async fn version(_ctx: RouteContext) -> Result<Json<Value>, HandlerError> {
        Ok(Json(json!({ "version": env!("CARGO_PKG_VERSION") })))
    }

    async fn article(ctx: RouteContext) -> Result<Json<Value>, HandlerError> {
        let slug = ctx.require("slug")?;
        let page = ctx.param("page").and_then(|p| p.as_i64()).unwrap_or(1);
        Ok(Json(json!({ "article": slug, "page": page })))
    }
}

impl RouteProvider for WelcomeController {
    fn routes(&self, routes: &mut Collector) {
        routes.get("/", Dispatch::method(Self::NAME, "welcome")).name("welcome");
        routes
            .get("/version", Dispatch::method(Self::NAME, "version"))
            .name("version");
        routes
            .get("/article/{slug:slug}[/{page:num}]", Dispatch::method(Self::NAME, "article"))
            .name("article")
            .parameter(Parameter::new("page").with_cast(Cast::Int).with_default("1"));
        routes.redirect("/home", "/", 301);
    }

    fn handlers(&self, handlers: &mut Dispatcher) {
        handlers
            .register(Dispatch::method(Self::NAME, "welcome"), Self::welcome)
            .register(Dispatch::method(Self::NAME, "version"), Self::version)
            .register(Dispatch::method(Self::NAME, "article"), Self::article);
    }
}

async fn request_log(request: Request<Body>, next: Next) -> axum::response::Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request.request_id().unwrap_or("-").to_string();

    let response = next.run(request).await;

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );
    response
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    console::run(cli, |config| {
        Application::builder(config)
            .provider(WelcomeController)
            .middleware("request_log", request_log)
    })
    .await
}

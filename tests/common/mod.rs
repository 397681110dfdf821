//! Shared providers and helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use futures_util::FutureExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use valkyrja::http::{HttpServer, Next};
use valkyrja::routing::{Cast, Collection, Parameter};
use valkyrja::{
    AppConfig, Application, ApplicationBuilder, Collector, Dispatch, Dispatcher, Group,
    HandlerError, RouteContext, RouteProvider, Shutdown,
};

/// Public pages: welcome, version, articles, a redirect and a failing route.
pub struct SiteController;

impl RouteProvider for SiteController {
    fn routes(&self, routes: &mut Collector) {
        routes.get("/", Dispatch::function("welcome")).name("welcome");
        routes.get("/version", Dispatch::function("version")).name("version");
        routes
            .get("/article/{slug:slug}", Dispatch::method("ArticleController", "show"))
            .name("article");
        routes
            .get("/items/{id:num}", Dispatch::method("ItemController", "show"))
            .name("items.show")
            .parameter(Parameter::new("id").with_pattern("num").with_cast(Cast::UInt));
        routes.post("/items", Dispatch::method("ItemController", "store")).name("items.store");
        routes.get("/boom", Dispatch::function("boom")).name("boom");
        routes.redirect("/home", "/", 301);
    }

    fn handlers(&self, handlers: &mut Dispatcher) {
        handlers
            .register(Dispatch::function("welcome"), |_ctx: RouteContext| async {
                Ok::<_, HandlerError>("Welcome")
            })
            .register(Dispatch::function("version"), |_ctx: RouteContext| async {
                Ok::<_, HandlerError>(axum::Json(json!({ "version": "1.0.0" })))
            })
            .register(Dispatch::method("ArticleController", "show"), |ctx: RouteContext| async move {
                let slug = ctx.require("slug")?.to_string();
                Ok::<_, HandlerError>(axum::Json(json!({ "slug": slug })))
            })
            .register(Dispatch::method("ItemController", "show"), |ctx: RouteContext| async move {
                let id = ctx
                    .param("id")
                    .and_then(|v| v.as_u64())
                    .ok_or_else(|| HandlerError::bad_request("id"))?;
                Ok::<_, HandlerError>(axum::Json(json!({ "id": id })))
            })
            .register(Dispatch::method("ItemController", "store"), |ctx: RouteContext| async move {
                let item: Value = ctx.json().await?;
                Ok::<_, HandlerError>((StatusCode::CREATED, axum::Json(item)))
            })
            .register(Dispatch::function("boom"), |_ctx: RouteContext| async {
                Err::<&str, _>(
                    HandlerError::internal("connection refused").with_source(std::io::Error::other("socket closed")),
                )
            });
    }
}

/// Admin area behind the `auth` middleware.
pub struct AdminController;

impl RouteProvider for AdminController {
    fn routes(&self, routes: &mut Collector) {
        routes.group(Group::new("/admin").name("admin.").middleware("auth"), |admin| {
            admin
                .get("/dashboard", Dispatch::method("AdminController", "dashboard"))
                .name("dashboard")
                .middleware("trace");
        });
    }

    fn handlers(&self, handlers: &mut Dispatcher) {
        handlers.register(
            Dispatch::method("AdminController", "dashboard"),
            |_ctx: RouteContext| async { Ok::<_, HandlerError>("dashboard") },
        );
    }
}

/// Middleware appending its label to a shared log, before and after the rest of the chain.
pub fn recorder(
    log: Arc<Mutex<Vec<String>>>,
    label: &'static str,
) -> impl Fn(Request<Body>, Next) -> futures_util::future::BoxFuture<'static, Response> + Send + Sync + 'static {
    move |request: Request<Body>, next: Next| {
        let log = log.clone();
        async move {
            log.lock().unwrap().push(format!("{label}:before"));
            let response = next.run(request).await;
            log.lock().unwrap().push(format!("{label}:after"));
            response
        }
        .boxed()
    }
}

/// Rejects requests without `authorization`.
pub async fn auth(request: Request<Body>, next: Next) -> Response {
    if request.headers().contains_key("authorization") {
        next.run(request).await
    } else {
        Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .body(Body::empty())
            .unwrap()
    }
}

/// Builder with both providers and the `auth` / `trace` middleware.
pub fn builder(config: AppConfig) -> ApplicationBuilder {
    Application::builder(config)
        .provider(SiteController)
        .provider(AdminController)
        .middleware("auth", auth)
        .middleware("trace", |request: Request<Body>, next: Next| next.run(request))
}

pub fn app() -> Application {
    builder(AppConfig::default()).build().unwrap()
}

pub fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Serve `app` on an ephemeral port. Returns the address, the shutdown
/// coordinator and the route update sender.
pub async fn start_server(app: Application) -> (SocketAddr, Shutdown, mpsc::UnboundedSender<Collection>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let (route_tx, route_updates) = mpsc::unbounded_channel();

    let server = HttpServer::new(Arc::new(app));
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, route_updates, server_shutdown).await;
    });

    (addr, shutdown, route_tx)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

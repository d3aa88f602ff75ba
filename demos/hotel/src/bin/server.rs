#![allow(missing_docs)]

use bytes::Bytes;
use concierge_router::{Fragment, FragmentServer, PageKey};
use concierge_utils::query_param;
use http::header::CONTENT_TYPE;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode, body::Incoming as IncomingBody};
use hyper_util::rt::TokioIo;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

const ENDPOINT: &str = "/api/content.php";

fn full<T: Into<Bytes>>(chunk: T) -> BoxBody {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

fn respond(status: StatusCode, content_type: &str, body: impl Into<Bytes>) -> Response<BoxBody> {
    let mut response = Response::new(full(body));
    *response.status_mut() = status;
    if let Ok(value) = content_type.parse() {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

async fn serve_static(path: &str) -> Response<BoxBody> {
    let file_path = format!("static{path}");

    if path.contains("..") {
        return respond(StatusCode::NOT_FOUND, "text/plain", "File not found");
    }

    match tokio::fs::read(&file_path).await {
        Ok(content) => {
            let content_type = match Path::new(&file_path).extension().and_then(|s| s.to_str()) {
                Some("html") => "text/html",
                Some("css") => "text/css",
                Some("js") => "application/javascript",
                Some("wasm") => "application/wasm",
                Some("png") => "image/png",
                Some("jpg" | "jpeg") => "image/jpeg",
                Some("svg") => "image/svg+xml",
                _ => "application/octet-stream",
            };
            respond(StatusCode::OK, content_type, content)
        }
        Err(_) => respond(StatusCode::NOT_FOUND, "text/plain", "File not found"),
    }
}

/// Direct load of a page: render its fragment inside the full shell.
async fn serve_page(path: &str, query: &str, fragments: &FragmentServer) -> Response<BoxBody> {
    let page = PageKey::from_path(path);
    let mut fragment_query = format!("page={page}");

    if page == PageKey::Room
        && let Some(slug) = query_param(query, "room")
    {
        fragment_query.push_str("&slug=");
        fragment_query.push_str(slug);
    }

    let answer = fragments.handle_query(&fragment_query).await;
    let fragment = match serde_json::from_str::<Fragment>(&answer.body) {
        Ok(fragment) if answer.status == 200 => fragment,
        _ => {
            return respond(StatusCode::NOT_FOUND, "text/plain", "Not Found");
        }
    };

    respond(StatusCode::OK, "text/html; charset=utf-8", hotel::render_page(&page, &fragment))
}

async fn handle_request(
    req: Request<IncomingBody>,
    fragments: Arc<FragmentServer>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let path = req.uri().path();
    let query = req.uri().query().unwrap_or_default();

    if let Some(file) = path.strip_prefix("/static") {
        return Ok(serve_static(file).await);
    }

    if path == ENDPOINT {
        let answer = fragments.handle_query(query).await;
        let status =
            StatusCode::from_u16(answer.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return Ok(respond(status, "application/json", answer.body));
    }

    Ok(serve_page(path, query, &fragments).await)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fragments = Arc::new(hotel::fragment_server());

    let listener = TcpListener::bind("0.0.0.0:9999").await?;
    println!("Server running on http://0.0.0.0:9999");

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let fragments = Arc::clone(&fragments);

        tokio::task::spawn(async move {
            let service = service_fn(move |req| {
                let fragments = Arc::clone(&fragments);
                async move { handle_request(req, fragments).await }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                eprintln!("Error serving connection: {err:?}");
            }
        });
    }
}

//! Async HTTP server: tokio + hyper. Converts each hyper request into a
//! `Request`, dispatches it through the `App`, converts the `ResponseWriter`
//! back into a hyper response.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use http::StatusCode;
use hyper::{Request as HyperRequest, Response as HyperResponse};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::{App, Request, ResponseWriter, ServerConfig};

/// Accepts connections on `listener` until `shutdown` resolves. Connections
/// already accepted are served to completion on their own tasks.
pub async fn serve(
    listener: TcpListener,
    app: Arc<App>,
    shutdown: impl Future<Output = ()>,
) -> std::io::Result<()> {
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("shutting down");
                return Ok(());
            }
            accept_result = listener.accept() => {
                let (stream, peer) = match accept_result {
                    Ok(x) => x,
                    Err(e) => {
                        tracing::error!(error = %e, "accept error");
                        continue;
                    }
                };
                let io = TokioIo::new(stream);
                let app = Arc::clone(&app);
                tokio::task::spawn(async move {
                    let service = service_fn(move |req: HyperRequest<hyper::body::Incoming>| {
                        let app = Arc::clone(&app);
                        async move { dispatch_to_hyper(app, req).await }
                    });
                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        tracing::warn!(%peer, error = %e, "serve_connection error");
                    }
                });
            }
        }
    }
}

/// Blocking entry point: own runtime, bind `config.addr()`, serve until ctrl-c.
pub fn run(app: App, config: &ServerConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = config.addr();
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(async move {
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(address = %listener.local_addr()?, nodes = app.router.node_count(), "listening");
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
        };
        serve(listener, Arc::new(app), shutdown).await?;
        Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
    })
}

async fn dispatch_to_hyper(
    app: Arc<App>,
    req: HyperRequest<hyper::body::Incoming>,
) -> Result<HyperResponse<Full<Bytes>>, Infallible> {
    let req = match hyper_request_to_request(req).await {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read request body");
            return Ok(empty_response(StatusCode::BAD_REQUEST));
        }
    };
    Ok(into_hyper_response(app.dispatch(&req)))
}

async fn hyper_request_to_request(
    req: HyperRequest<hyper::body::Incoming>,
) -> Result<Request, hyper::Error> {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or("").to_string();
    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                String::from_utf8_lossy(v.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = req.into_body().collect().await?.to_bytes();
    Ok(Request {
        method,
        path,
        query,
        headers,
        body,
    })
}

fn into_hyper_response(w: ResponseWriter) -> HyperResponse<Full<Bytes>> {
    let mut b = HyperResponse::builder().status(w.status());
    for (k, v) in w.headers() {
        b = b.header(k.as_str(), v.as_str());
    }
    match b.body(Full::new(Bytes::copy_from_slice(w.body()))) {
        Ok(resp) => resp,
        Err(e) => {
            tracing::error!(error = %e, "handler produced an invalid response");
            empty_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn empty_response(status: StatusCode) -> HyperResponse<Full<Bytes>> {
    let mut resp = HyperResponse::new(Full::new(Bytes::new()));
    *resp.status_mut() = status;
    resp
}

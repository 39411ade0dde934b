//! End to end over a real socket.

use std::net::SocketAddr;
use std::sync::Arc;

use pathtrie_core::{http, App};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

async fn raw_request(addr: SocketAddr, request: impl AsRef<[u8]>) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_ref()).await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8(buf).unwrap()
}

#[tokio::test]
async fn serves_routes_and_404() {
    let mut app = App::new();
    app.get("/hello/:name", |w, _req, p| {
        w.set_header("Content-Type", "text/plain");
        w.write_str(&format!("hello {}", p.get("name").unwrap_or("")));
    })
    .unwrap();
    app.post("/form/:id", |w, _req, p| {
        w.write_str(&p.get_all("id").join(","));
    })
    .unwrap();

    app.get("/header", |w, req, _p| {
        w.write_str(req.header("x-name").unwrap_or("<missing>"));
    })
    .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let server = tokio::spawn(http::serve(listener, Arc::new(app), async move {
        let _ = rx.await;
    }));

    let resp = raw_request(
        addr,
        "GET /hello/world HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(resp.starts_with("HTTP/1.1 200 OK"), "{}", resp);
    assert!(resp.to_ascii_lowercase().contains("content-type: text/plain"), "{}", resp);
    assert!(resp.ends_with("hello world"), "{}", resp);

    let resp = raw_request(
        addr,
        "POST /form/7?id=q HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\
         Content-Type: application/x-www-form-urlencoded\r\nContent-Length: 4\r\n\r\nid=b",
    )
    .await;
    assert!(resp.starts_with("HTTP/1.1 200 OK"), "{}", resp);
    assert!(resp.ends_with("b,q,7"), "{}", resp);

    let resp = raw_request(
        addr,
        "GET /missing HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(resp.starts_with("HTTP/1.1 404 Not Found"), "{}", resp);

    // Non-UTF-8 header bytes are kept, lossily decoded.
    let mut request = b"GET /header HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nX-Name: caf".to_vec();
    request.extend_from_slice(b"\xe9\r\n\r\n");
    let resp = raw_request(addr, request).await;
    assert!(resp.starts_with("HTTP/1.1 200 OK"), "{}", resp);
    assert!(resp.ends_with("caf\u{fffd}"), "{}", resp);

    tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}

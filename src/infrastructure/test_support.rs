//! Local HTTP stubs for exercising the reqwest-based clients

use std::net::SocketAddr;

/// Serve `app` on an ephemeral localhost port and return its base URL
pub(crate) async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub server");
    let addr: SocketAddr = listener.local_addr().expect("stub server address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    format!("http://{}", addr)
}

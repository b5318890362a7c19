#![allow(dead_code)]

use axum::extract::{Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One multipart field as the stand-in server saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedField {
    pub name: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub len: usize,
}

#[derive(Clone, Default)]
pub struct Recorder {
    pub requests: Arc<Mutex<Vec<Vec<ReceivedField>>>>,
}

impl Recorder {
    pub fn requests(&self) -> Vec<Vec<ReceivedField>> {
        self.requests.lock().expect("recorder lock").clone()
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 30, 40, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

pub fn write_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, png_bytes(4, 3)).expect("write png");
    path
}

async fn record(recorder: &Recorder, mut multipart: Multipart) {
    let mut fields = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let len = field.bytes().await.map(|b| b.len()).unwrap_or(0);
        fields.push(ReceivedField {
            name,
            file_name,
            content_type,
            len,
        });
    }
    recorder.requests.lock().expect("recorder lock").push(fields);
}

/// Router answering every `/predict` with `reply` and `status`, and serving
/// a small PNG under `/static/out.png`.
pub fn predict_router(recorder: Recorder, status: StatusCode, reply: Value) -> Router {
    Router::new()
        .route(
            "/predict",
            post(move |State(rec): State<Recorder>, multipart: Multipart| {
                let reply = reply.clone();
                async move {
                    record(&rec, multipart).await;
                    (status, Json(reply))
                }
            }),
        )
        .route(
            "/static/out.png",
            get(|| async { ([(header::CONTENT_TYPE, "image/png")], png_bytes(6, 5)) }),
        )
        .with_state(recorder)
}

/// Router whose `/predict` fails with an HTML error page.
pub fn html_error_router() -> Router {
    Router::new().route(
        "/predict",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "<h1>Internal Server Error</h1>",
            )
                .into_response()
        }),
    )
}

pub fn healthy_reply() -> Value {
    json!({
        "class": "Sehat",
        "confidence": 0.95,
        "details": "...",
        "image_path": "/static/out.png"
    })
}

/// Serves `router` on an ephemeral port from its own runtime thread and
/// returns the base URL.
pub fn spawn_server(router: Router) -> String {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind");
            tx.send(listener.local_addr().expect("local addr"))
                .expect("send addr");
            axum::serve(listener, router).await.expect("serve");
        });
    });
    let addr = rx.recv().expect("server address");
    format!("http://{addr}")
}

/// Base URL nothing listens on.
pub fn dead_server() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

//! Shared fakes for the HTTP integration tests.
#![allow(dead_code)]

use axum::{http::StatusCode, routing::get, Router};
use futures::future::BoxFuture;
use lender_pdf_parse::{
    Completion, ExtractedTable, PdfSource, PdfTableError, TableCollection, TableExtractor,
    TextGenerator,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const VALID_REPLY: &str = r#"{"rentRollSummary":[
  [{"key":"Unit","value":"101","type":"string"},{"key":"Rent","value":"$1,200.00","type":"currency"}],
  [{"key":"Unit","value":"102","type":"string"},{"key":"Rent","value":"$1,350.00","type":"currency"}],
  [{"key":"Total Annual Revenue","value":"$30,600.00","type":"currency"}]
]}"#;

pub fn table(rows: &[&[&str]]) -> ExtractedTable {
    ExtractedTable::new(
        rows.iter()
            .map(|r| r.iter().map(|c| Some(c.to_string())).collect())
            .collect(),
    )
}

/// Returns fixed tables (or a fixed failure) and counts calls.
pub struct FakeExtractor {
    result: Result<TableCollection, String>,
    calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn returning(tables: Vec<ExtractedTable>) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(TableCollection::new(tables)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(detail: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Err(detail.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TableExtractor for FakeExtractor {
    fn extract(&self, source: &PdfSource) -> Result<TableCollection, PdfTableError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let PdfSource::File(path) = source {
            assert!(path.exists(), "upload must be on disk during extraction");
        }
        match &self.result {
            Ok(tables) => Ok(tables.clone()),
            Err(detail) => Err(PdfTableError::CorruptPdf {
                detail: detail.clone(),
            }),
        }
    }
}

/// Replies with one fixed text and records every prompt.
pub struct FakeGenerator {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl TextGenerator for FakeGenerator {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Completion, PdfTableError>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = Completion::text(self.reply.clone());
        Box::pin(async move { Ok(reply) })
    }
}

/// Local origin serving `/rent-roll.pdf` (200) and `/gone.pdf` (404).
pub async fn spawn_origin() -> String {
    let app = Router::new()
        .route("/rent-roll.pdf", get(|| async { b"%PDF-1.7 rent roll".to_vec() }))
        .route("/gone.pdf", get(|| async { StatusCode::NOT_FOUND }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

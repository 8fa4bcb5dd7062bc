mod common;

use std::fs;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use rag_chat::error::RagError;
use rag_chat::models::IngestOutcome;
use rag_chat::qa::AnswerEngine;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{open_store, FailingEmbedder, HashEmbedder, RecordingModel};

fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html><head><title>{}</title></head><body><p>{}</p></body></html>",
            title, body
        ),
        "text/html",
    )
}

#[tokio::test]
async fn create_is_idempotent_and_reports_path() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(tmp.path(), Arc::new(HashEmbedder::default())).await;

    let first = store.create().await.unwrap();
    let second = store.create().await.unwrap();
    assert_eq!(first, second);
    assert!(first.exists());
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn added_document_is_listed_with_its_source() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(tmp.path(), Arc::new(HashEmbedder::default())).await;

    let doc = tmp.path().join("alpha.txt");
    fs::write(&doc, "Rust programming with cargo and crates.").unwrap();

    let outcome = store.add_documents(&doc).await.unwrap();
    assert_eq!(outcome, IngestOutcome::Added { fragments: 1 });

    let listed = store.list_documents().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].source, doc.display().to_string());
    assert_eq!(listed[0].content_type, "text/plain");
    assert_eq!(listed[0].title.as_deref(), Some("alpha.txt"));
}

#[tokio::test]
async fn missing_path_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let embedder = Arc::new(HashEmbedder::default());
    let store = open_store(tmp.path(), embedder.clone()).await;

    let outcome = store
        .add_documents(&tmp.path().join("nope.txt"))
        .await
        .unwrap();
    assert_eq!(outcome, IngestOutcome::MissingPath);
    assert_eq!(
        store.add_images(&tmp.path().join("nope.png")).await.unwrap(),
        IngestOutcome::MissingPath
    );
    assert_eq!(store.count().await.unwrap(), 0);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn blank_document_adds_zero_fragments() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(tmp.path(), Arc::new(HashEmbedder::default())).await;

    let doc = tmp.path().join("empty.txt");
    fs::write(&doc, "   \n\n  ").unwrap();

    let outcome = store.add_documents(&doc).await.unwrap();
    assert_eq!(outcome, IngestOutcome::Added { fragments: 0 });
    assert!(store.list_documents().await.unwrap().is_empty());
}

#[tokio::test]
async fn broken_pdf_is_an_extraction_error() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(tmp.path(), Arc::new(HashEmbedder::default())).await;

    let doc = tmp.path().join("bad.pdf");
    fs::write(&doc, b"not a valid pdf").unwrap();

    let err = store.add_documents(&doc).await.unwrap_err();
    assert!(matches!(err, RagError::Extract(_)), "got {:?}", err);
    assert_eq!(store.count().await.unwrap(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn image_text_comes_from_ocr_command() {
    let tmp = TempDir::new().unwrap();
    let mut cfg = common::test_config(tmp.path());
    cfg.ocr.command = "echo".to_string();
    let store = rag_chat::store::VectorStore::open(&cfg, Arc::new(HashEmbedder::default()))
        .await
        .unwrap();

    let image = tmp.path().join("receipt.png");
    fs::write(&image, b"\x89PNG").unwrap();

    let outcome = store.add_images(&image).await.unwrap();
    assert_eq!(outcome, IngestOutcome::Added { fragments: 1 });

    let listed = store.list_documents().await.unwrap();
    assert_eq!(listed[0].source, image.display().to_string());
    assert_eq!(listed[0].content_type, "image/png");
    assert!(listed[0].text.contains("stdout -l eng"));
}

#[tokio::test]
async fn query_ranks_by_similarity_and_respects_k() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(tmp.path(), Arc::new(HashEmbedder::default())).await;

    for (name, text) in [
        ("rust.txt", "rust cargo crates borrow checker"),
        ("python.txt", "python pip wheels interpreter"),
        ("k8s.txt", "kubernetes pods deployments clusters"),
    ] {
        let p = tmp.path().join(name);
        fs::write(&p, text).unwrap();
        store.add_documents(&p).await.unwrap();
    }

    let hits = store.query("cargo crates", 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits[0].fragment.source.ends_with("rust.txt"));
    assert!(hits[0].score >= hits[1].score);

    assert_eq!(store.query("cargo", 10).await.unwrap().len(), 3);
    assert!(store.query("cargo", 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn query_on_empty_store_skips_embedding() {
    let tmp = TempDir::new().unwrap();
    let embedder = Arc::new(HashEmbedder::default());
    let store = open_store(tmp.path(), embedder.clone()).await;

    assert!(store.query("anything", 2).await.unwrap().is_empty());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn equal_scores_keep_insertion_order() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(tmp.path(), Arc::new(HashEmbedder::default())).await;

    for name in ["first.txt", "second.txt", "third.txt"] {
        let p = tmp.path().join(name);
        fs::write(&p, "identical text").unwrap();
        store.add_documents(&p).await.unwrap();
    }

    let hits = store.query("identical text", 3).await.unwrap();
    let sources: Vec<_> = hits.iter().map(|h| h.fragment.source.clone()).collect();
    assert!(sources[0].ends_with("first.txt"));
    assert!(sources[1].ends_with("second.txt"));
    assert!(sources[2].ends_with("third.txt"));
}

#[tokio::test]
async fn remove_then_remove_again_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(tmp.path(), Arc::new(HashEmbedder::default())).await;

    let doc = tmp.path().join("a.txt");
    fs::write(&doc, "alpha").unwrap();
    store.add_documents(&doc).await.unwrap();

    let id = store.list_documents().await.unwrap()[0].id.clone();
    store.remove_document(&id).await.unwrap();
    assert!(store
        .list_documents()
        .await
        .unwrap()
        .iter()
        .all(|f| f.id != id));

    let err = store.remove_document(&id).await.unwrap_err();
    assert!(matches!(err, RagError::NotFound(_)));
}

#[tokio::test]
async fn clear_empties_store_and_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(tmp.path(), Arc::new(HashEmbedder::default())).await;

    let doc = tmp.path().join("a.txt");
    fs::write(&doc, "alpha\n\nbeta").unwrap();
    store.add_documents(&doc).await.unwrap();
    assert!(store.count().await.unwrap() > 0);

    store.clear().await.unwrap();
    assert!(store.list_documents().await.unwrap().is_empty());
    store.clear().await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn webpages_are_stored_under_their_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/one"))
        .respond_with(html_page("One", "Ferris the crab"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/two"))
        .respond_with(html_page("Two", "Tokio runtime"))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let store = open_store(tmp.path(), Arc::new(HashEmbedder::default())).await;

    let urls = vec![
        format!("{}/one", server.uri()),
        format!("{}/two", server.uri()),
    ];
    let added = store.add_webpages(&urls).await.unwrap();
    assert_eq!(added, 2);

    let listed = store.list_documents().await.unwrap();
    assert_eq!(listed[0].source, urls[0]);
    assert_eq!(listed[0].title.as_deref(), Some("One"));
    assert_eq!(listed[1].source, urls[1]);
}

#[tokio::test]
async fn one_failing_url_persists_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html_page("Ok", "good content"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let store = open_store(tmp.path(), Arc::new(HashEmbedder::default())).await;

    let urls = vec![
        format!("{}/ok", server.uri()),
        format!("{}/broken", server.uri()),
    ];
    let err = store.add_webpages(&urls).await.unwrap_err();
    assert!(matches!(err, RagError::Upstream(_)));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn invalid_url_is_rejected_before_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html_page("Ok", "good content"))
        .expect(0)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let store = open_store(tmp.path(), Arc::new(HashEmbedder::default())).await;

    let urls = vec![format!("{}/ok", server.uri()), "ftp://nope".to_string()];
    let err = store.add_webpages(&urls).await.unwrap_err();
    assert!(matches!(err, RagError::InvalidInput(_)));
}

#[tokio::test]
async fn embedding_failure_leaves_store_unchanged() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(tmp.path(), Arc::new(FailingEmbedder)).await;

    let doc = tmp.path().join("a.txt");
    fs::write(&doc, "alpha").unwrap();

    let err = store.add_documents(&doc).await.unwrap_err();
    assert!(matches!(err, RagError::Upstream(_)));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn answer_uses_retrieved_context() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(tmp.path(), Arc::new(HashEmbedder::default())).await;

    let doc = tmp.path().join("policy.txt");
    fs::write(&doc, "Refunds are issued within 30 days.").unwrap();
    store.add_documents(&doc).await.unwrap();

    let model = Arc::new(RecordingModel::new("Within 30 days."));
    let engine = AnswerEngine::new(store.retriever(2), model.clone());

    let answer = engine.ask_question("When are refunds issued?").await.unwrap();
    assert_eq!(answer, "Within 30 days.");
    assert_eq!(
        model.last_prompt().unwrap(),
        "Answer the question based on the context: Refunds are issued within 30 days.\
         \n\nQuestion: When are refunds issued?"
    );
}

#[tokio::test]
async fn answer_on_empty_store_has_empty_context() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(tmp.path(), Arc::new(HashEmbedder::default())).await;

    let model = Arc::new(RecordingModel::new("I don't know."));
    let engine = AnswerEngine::new(store.retriever(2), model.clone());

    let answer = engine.ask_question("Anything?").await.unwrap();
    assert!(!answer.is_empty());
    assert_eq!(
        model.last_prompt().unwrap(),
        "Answer the question based on the context: \n\nQuestion: Anything?"
    );
}

#[tokio::test]
async fn explain_wraps_text_in_request() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(tmp.path(), Arc::new(HashEmbedder::default())).await;

    let model = Arc::new(RecordingModel::new("It means..."));
    let engine = AnswerEngine::new(store.retriever(2), model.clone());

    engine.explain_text("foo").await.unwrap();
    assert!(model
        .last_prompt()
        .unwrap()
        .ends_with("Question: Explain the following text: foo"));
}

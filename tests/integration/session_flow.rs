//! End-to-end collection, report and compile flows on real files.

use pdfstack::compile::{CompileOptions, CoverPlacement};
use pdfstack::error::{CollectionError, CompileError};
use pdfstack::report::{LoadMode, Report};

use crate::common::{library, page_count, page_labels, session_for, write_pdf};

fn names(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_add_remove_reorder_sequence() {
    let dir = library(&[("a.pdf", 1), ("b.pdf", 1), ("c.pdf", 1)]);
    let session = session_for(&dir);
    let store = session.store();

    store.add("a.pdf").await.unwrap();
    store.add("b.pdf").await.unwrap();
    assert_eq!(store.add("c.pdf").await.unwrap(), names(&["a.pdf", "b.pdf", "c.pdf"]));

    assert_eq!(
        store.reorder(2, 0).await.unwrap(),
        names(&["c.pdf", "a.pdf", "b.pdf"])
    );
    assert_eq!(store.remove("a.pdf").await.unwrap(), names(&["c.pdf", "b.pdf"]));

    assert!(matches!(
        store.add("b.pdf").await.unwrap_err(),
        CollectionError::Duplicate(_)
    ));
    assert!(matches!(
        store.remove("a.pdf").await.unwrap_err(),
        CollectionError::NotFound(_)
    ));
    assert_eq!(store.list().await, names(&["c.pdf", "b.pdf"]));
}

#[tokio::test]
async fn test_metadata_for_selected_document() {
    let dir = library(&[("three.pdf", 3)]);
    let session = session_for(&dir);
    session.store().add("three.pdf").await.unwrap();

    let meta = session.store().metadata("three.pdf").await.unwrap();
    assert_eq!(meta.page_count, 3);
    assert!(meta.size_bytes > 0);

    assert!(matches!(
        session.store().metadata("unknown.pdf").await.unwrap_err(),
        CollectionError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_metadata_for_vanished_file_is_not_found() {
    let dir = library(&[("gone.pdf", 1)]);
    let session = session_for(&dir);
    session.store().add("gone.pdf").await.unwrap();
    std::fs::remove_file(dir.path().join("gone.pdf")).unwrap();

    assert!(matches!(
        session.store().metadata("gone.pdf").await.unwrap_err(),
        CollectionError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_refresh_library_lists_nested_documents() {
    let dir = library(&[("a.pdf", 1), ("nested/b.pdf", 1)]);
    std::fs::write(dir.path().join("notes.txt"), b"not a pdf").unwrap();
    let session = session_for(&dir);

    let available = session.refresh_library().await.unwrap();
    assert_eq!(available, names(&["a.pdf", "nested/b.pdf"]));

    let meta = session.store().metadata("nested/b.pdf").await.unwrap();
    assert_eq!(meta.page_count, 1);
}

#[tokio::test]
async fn test_compile_in_collection_order() {
    let dir = library(&[("a.pdf", 2), ("b.pdf", 3)]);
    let session = session_for(&dir);
    session.store().add("b.pdf").await.unwrap();
    session.store().add("a.pdf").await.unwrap();

    let options = CompileOptions {
        output_name: Some("ordered".to_string()),
        ..CompileOptions::default()
    };
    let outcome = session.compile(&options).await.unwrap();

    assert_eq!(outcome.files, names(&["b.pdf", "a.pdf"]));
    assert_eq!(outcome.files_merged, 2);
    assert_eq!(outcome.total_pages, 5);
    assert_eq!(outcome.output, dir.path().join("out").join("ordered.pdf"));
    assert_eq!(page_count(&outcome.output), 5);
    assert_eq!(session.store().list().await, names(&["b.pdf", "a.pdf"]));
}

#[tokio::test]
async fn test_compiled_pages_follow_collection_order() {
    let dir = library(&[("a.pdf", 2), ("b.pdf", 2)]);
    let session = session_for(&dir);
    session.store().add("a.pdf").await.unwrap();
    session.store().add("b.pdf").await.unwrap();
    session.store().reorder(1, 0).await.unwrap();

    let outcome = session.compile(&CompileOptions::default()).await.unwrap();

    assert_eq!(
        page_labels(&outcome.output, &["a.pdf", "b.pdf"]),
        vec!["b.pdf page 1", "b.pdf page 2", "a.pdf page 1", "a.pdf page 2"]
    );
}

#[tokio::test]
async fn test_compile_with_generated_cover_per_document() {
    let dir = library(&[("a.pdf", 1), ("b.pdf", 2)]);
    let session = session_for(&dir);
    session.store().add("a.pdf").await.unwrap();
    session.store().add("b.pdf").await.unwrap();

    let options = CompileOptions {
        use_cover_pages: true,
        cover_placement: CoverPlacement::PerDocument,
        ..CompileOptions::default()
    };
    let outcome = session.compile(&options).await.unwrap();

    assert_eq!(outcome.cover_pages_inserted, 2);
    assert_eq!(page_count(&outcome.output), 5);
}

#[tokio::test]
async fn test_compile_with_cover_file() {
    let dir = library(&[("a.pdf", 2), ("covers/front.pdf", 1)]);
    let session = session_for(&dir);
    session.store().add("a.pdf").await.unwrap();

    let options = CompileOptions {
        use_cover_pages: true,
        cover_pages: "covers/front.pdf".to_string(),
        ..CompileOptions::default()
    };
    let outcome = session.compile(&options).await.unwrap();
    assert_eq!(outcome.cover_pages_inserted, 1);
    assert_eq!(page_count(&outcome.output), 3);
}

#[tokio::test]
async fn test_compile_missing_document_is_unresolved() {
    let dir = library(&[("a.pdf", 1)]);
    let session = session_for(&dir);
    session.store().add("a.pdf").await.unwrap();
    session.store().add("missing.pdf").await.unwrap();

    let err = session.compile(&CompileOptions::default()).await.unwrap_err();
    assert!(matches!(err, CompileError::Unresolved { ref identifier, .. } if identifier == "missing.pdf"));
    assert_eq!(session.store().len().await, 2);
}

#[tokio::test]
async fn test_compile_empty_collection() {
    let dir = library(&[]);
    let session = session_for(&dir);
    let err = session.compile(&CompileOptions::default()).await.unwrap_err();
    assert!(matches!(err, CompileError::EmptyCollection));
}

#[tokio::test]
async fn test_report_file_round_trip_into_new_session() {
    let dir = library(&[("a.pdf", 1), ("b.pdf", 1)]);
    let source = session_for(&dir);
    source.store().add("b.pdf").await.unwrap();
    source.store().add("a.pdf").await.unwrap();
    source
        .set_options(CompileOptions {
            use_cover_pages: true,
            cover_pages: "1".to_string(),
            ..CompileOptions::default()
        })
        .await;

    let path = dir.path().join("session.json");
    source.save_report().await.write_to(&path).await.unwrap();

    let target = session_for(&dir);
    let report = Report::read_from(&path).await.unwrap();
    let summary = target.load_report(&report, LoadMode::Replace).await.unwrap();

    assert_eq!(summary.added, names(&["b.pdf", "a.pdf"]));
    assert!(summary.skipped.is_empty());
    assert_eq!(target.save_report().await, source.save_report().await);
}

#[tokio::test]
async fn test_concurrent_mutations_keep_collection_consistent() {
    let dir = library(&[]);
    let session = session_for(&dir);

    let mut handles = Vec::new();
    for i in 0..32 {
        let session = session.clone();
        handles.push(tokio::spawn(async move {
            let name = format!("doc{}.pdf", i % 8);
            let _ = session.store().add(&name).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut list = session.store().list().await;
    assert_eq!(list.len(), 8);
    list.sort();
    list.dedup();
    assert_eq!(list.len(), 8);
}

#[tokio::test]
async fn test_describe_collection_reports_missing_file() {
    let dir = library(&[("a.pdf", 2)]);
    write_pdf(dir.path(), "b.pdf", 1);
    let session = session_for(&dir);
    session.store().add("a.pdf").await.unwrap();
    session.store().add("b.pdf").await.unwrap();
    std::fs::remove_file(dir.path().join("b.pdf")).unwrap();

    let details = session.describe_collection().await;
    assert_eq!(details[0].metadata.as_ref().unwrap().page_count, 2);
    assert!(details[1].error.is_some());
}

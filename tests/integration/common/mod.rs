//! Shared fixtures for integration tests.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use pdfstack::config::Config;
use pdfstack::session::Session;

/// Write a PDF with `pages` numbered pages to `dir/name`.
pub fn write_pdf(dir: &Path, name: &str, pages: usize) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for number in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 18.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("{name} page {number}"))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    doc.save(&path).unwrap();
    path
}

/// Page count of a PDF on disk.
pub fn page_count(path: &Path) -> usize {
    Document::load(path).unwrap().get_pages().len()
}

/// For each output page, the `"{name} page {n}"` label it carries.
///
/// Pages without a label (generated covers) are reported as `"cover"`.
pub fn page_labels(path: &Path, names: &[&str]) -> Vec<String> {
    let mut doc = Document::load(path).unwrap();
    doc.decompress();

    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let content = doc.get_page_content(page_id).unwrap();
            let text = String::from_utf8_lossy(&content);
            names
                .iter()
                .flat_map(|name| (1..=64).map(move |n| format!("{name} page {n}")))
                .find(|label| text.contains(&format!("({label})")))
                .unwrap_or_else(|| "cover".to_string())
        })
        .collect()
}

/// Library directory seeded with `(name, pages)` documents.
pub fn library(documents: &[(&str, usize)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, pages) in documents {
        write_pdf(dir.path(), name, *pages);
    }
    dir
}

pub fn config_for(library: &TempDir) -> Config {
    Config {
        library_dir: library.path().to_path_buf(),
        output_dir: library.path().join("out"),
        compile_timeout: Duration::from_secs(30),
        ..Config::default()
    }
}

pub fn session_for(library: &TempDir) -> Arc<Session> {
    Arc::new(Session::from_config(&config_for(library)).unwrap())
}

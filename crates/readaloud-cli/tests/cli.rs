use std::path::{Path, PathBuf};

use assert_cmd::Command;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use predicates::prelude::*;
use tempfile::TempDir;

/// Write a PDF with one text object per page; `\n` starts a new line
/// inside that object.
fn write_pdf(dir: &Path, name: &str, pages: &[&str]) -> PathBuf {
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

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
        ];
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                operations.push(Operation::new("Td", vec![0.into(), (-30).into()]));
            }
            operations.push(Operation::new("Tj", vec![Object::string_literal(line)]));
        }
        operations.push(Operation::new("ET", vec![]));
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

fn readaloud(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("readaloud").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path());
    cmd
}

#[test]
fn extract_prints_pages_separated_by_blank_line() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "sample.pdf", &["Hello", "World"]);

    readaloud(&dir)
        .arg("extract")
        .arg(&pdf)
        .assert()
        .success()
        .stdout("Hello\n\nWorld\n");
}

#[test]
fn extract_separates_lines_drawn_in_one_text_object() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "lines.pdf", &["Hello\nWorld", "Again"]);

    readaloud(&dir)
        .arg("extract")
        .arg(&pdf)
        .assert()
        .success()
        .stdout("Hello World\n\nAgain\n");
}

#[test]
fn extract_json_output() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "sample.pdf", &["Hello", "World"]);

    readaloud(&dir)
        .args(["extract", "--format", "json"])
        .arg(&pdf)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""text": "Hello\n\nWorld""#))
        .stdout(predicate::str::contains(r#""words": 2"#));
}

#[test]
fn extract_rejects_non_pdf_before_reading() {
    let dir = TempDir::new().unwrap();
    let txt = dir.path().join("notes.txt");
    std::fs::write(&txt, "Hello").unwrap();

    readaloud(&dir)
        .arg("extract")
        .arg(&txt)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please upload a valid PDF file."));
}

#[test]
fn extract_rejects_oversized_file() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "sample.pdf", &["Hello"]);
    let config = dir.path().join("small.json");
    std::fs::write(&config, r#"{ "upload": { "max_file_size": 16 } }"#).unwrap();

    readaloud(&dir)
        .arg("--config")
        .arg(&config)
        .arg("extract")
        .arg(&pdf)
        .assert()
        .failure()
        .stderr(predicate::str::contains("File is too large."));
}

#[test]
fn extract_reports_broken_pdf() {
    let dir = TempDir::new().unwrap();
    let pdf = dir.path().join("broken.pdf");
    std::fs::write(&pdf, "%PDF-1.5 this is not really a document").unwrap();

    readaloud(&dir)
        .arg("extract")
        .arg(&pdf)
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("Failed to process PDF file")
                .or(predicate::str::contains("Invalid PDF document structure")),
        );
}

#[test]
fn extract_missing_file() {
    let dir = TempDir::new().unwrap();

    readaloud(&dir)
        .args(["extract", "nope.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[cfg(unix)]
#[test]
fn read_once_through_speech_program() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "sample.pdf", &["Hello", "World"]);
    let config = dir.path().join("cat.json");
    std::fs::write(
        &config,
        r#"{ "speech": { "program": "cat", "args": [], "amplitude_arg": null } }"#,
    )
    .unwrap();

    readaloud(&dir)
        .arg("--config")
        .arg(&config)
        .args(["read", "--no-interactive"])
        .arg(&pdf)
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello\n\nWorld"));
}

#[test]
fn read_without_speech_program_fails() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "sample.pdf", &["Hello"]);
    let config = dir.path().join("none.json");
    std::fs::write(
        &config,
        r#"{ "speech": { "program": "no-such-speech-program-here" } }"#,
    )
    .unwrap();

    readaloud(&dir)
        .arg("--config")
        .arg(&config)
        .args(["read", "--no-interactive"])
        .arg(&pdf)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Text-to-speech is not supported"));
}

#[cfg(target_os = "linux")]
#[test]
fn config_init_then_get() {
    let dir = TempDir::new().unwrap();

    readaloud(&dir).args(["config", "init"]).assert().success();
    readaloud(&dir)
        .args(["config", "set", "speech.default_volume", "0.5"])
        .assert()
        .success();
    readaloud(&dir)
        .args(["config", "get", "speech.default_volume"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.5"));
    readaloud(&dir)
        .args(["config", "get", "speech.nonsense"])
        .assert()
        .failure();
}

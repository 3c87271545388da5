use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Run the binary with preferences isolated inside `home`
fn run_command(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bibslide"))
        .args(args)
        .env("BIBSLIDE_PREFERENCES", home.join("preferences.json"))
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute command")
}

fn write_bible(dir: &Path) -> String {
    let path = dir.join("psalm23.json");
    fs::write(
        &path,
        r#"{"book":"Psalm","chapter":23,"verses":[
            {"number":1,"text":"The Lord is my shepherd"},
            {"number":2,"text":"He maketh me to lie down"},
            {"number":3,"text":"He restoreth my soul"}
        ]}"#,
    )
    .unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_pptx_command() {
    let temp_dir = TempDir::new().unwrap();
    let bible = write_bible(temp_dir.path());
    let out = temp_dir.path().to_string_lossy().to_string();

    let output = run_command(
        temp_dir.path(),
        &["pptx", "--bible", &bible, "--verses-per-slide", "2", "-o", &out],
    );
    assert!(
        output.status.success(),
        "Command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(temp_dir.path().join("Psalm_23.pptx").is_file());
}

#[test]
fn test_pdf_and_html_commands() {
    let temp_dir = TempDir::new().unwrap();
    let bible = write_bible(temp_dir.path());
    let out = temp_dir.path().to_string_lossy().to_string();

    for command in ["pdf", "html"] {
        let output = run_command(
            temp_dir.path(),
            &[command, "--bible", &bible, "--church-name", "Bethel", "-o", &out],
        );
        assert!(output.status.success(), "{} failed", command);
    }
    assert!(temp_dir.path().join("Psalm_23.pdf").is_file());

    let html = fs::read_to_string(temp_dir.path().join("Psalm_23.html")).unwrap();
    assert_eq!(html.matches("class=\"slide").count(), 3);
    assert!(html.contains("Bethel"));
}

#[test]
fn test_slides_command_prints_chunks() {
    let temp_dir = TempDir::new().unwrap();
    let paste = temp_dir.path().join("lines.txt");
    fs::write(&paste, "one\ntwo\n\nthree").unwrap();

    let output = run_command(
        temp_dir.path(),
        &[
            "slides",
            "--paste",
            paste.to_str().unwrap(),
            "--paste-type",
            "song",
        ],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--- Slide 1 / 2 ---"));
    assert!(stdout.contains("one\ntwo"));
    assert!(stdout.contains("--- Slide 2 / 2 ---"));

    let output = run_command(
        temp_dir.path(),
        &["slides", "--paste", paste.to_str().unwrap(), "--index", "5"],
    );
    assert!(!output.status.success());
}

#[test]
fn test_empty_source_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let paste = temp_dir.path().join("blank.txt");
    fs::write(&paste, "\n\n").unwrap();
    let out = temp_dir.path().join("out");

    let output = run_command(
        temp_dir.path(),
        &[
            "pdf",
            "--paste",
            paste.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ],
    );
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Nothing to export"));
    assert!(!out.exists());
}

#[test]
fn test_saved_style_is_reused() {
    let temp_dir = TempDir::new().unwrap();
    let bible = write_bible(temp_dir.path());
    let out = temp_dir.path().to_string_lossy().to_string();

    let output = run_command(
        temp_dir.path(),
        &[
            "html",
            "--bible",
            &bible,
            "--bg-color",
            "#123456",
            "--save-style",
            "-o",
            &out,
        ],
    );
    assert!(output.status.success());

    let stored = fs::read_to_string(temp_dir.path().join("preferences.json")).unwrap();
    assert!(stored.contains("#123456"));

    fs::remove_file(temp_dir.path().join("Psalm_23.html")).unwrap();
    let output = run_command(temp_dir.path(), &["html", "--bible", &bible, "-o", &out]);
    assert!(output.status.success());
    let html = fs::read_to_string(temp_dir.path().join("Psalm_23.html")).unwrap();
    assert!(html.contains("#123456"));
}

#[test]
fn test_invalid_arguments_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let bible = write_bible(temp_dir.path());

    let output = run_command(
        temp_dir.path(),
        &["pdf", "--bible", &bible, "--brightness", "0"],
    );
    assert!(!output.status.success());

    let output = run_command(
        temp_dir.path(),
        &["pdf", "--bible", &bible, "--song", &bible],
    );
    assert!(!output.status.success());

    let missing = temp_dir.path().join("missing.json").to_string_lossy().to_string();
    let output = run_command(temp_dir.path(), &["pdf", "--bible", &missing]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

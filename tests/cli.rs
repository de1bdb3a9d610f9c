//! Exit-code behaviour of the `markdown2pdf` binary.

use std::path::Path;
use std::process::Command;

fn bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_markdown2pdf"));
    // Keep the environment from leaking flag defaults into the tests.
    for (key, _) in std::env::vars_os() {
        if key.to_string_lossy().starts_with("MARKDOWN2PDF_") {
            cmd.env_remove(key);
        }
    }
    cmd.env_remove("PANDOC_PATH").env_remove("CHROME_PATH");
    cmd
}

#[test]
fn no_arguments_prints_usage_and_exits_one() {
    let out = bin().output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Usage"), "stderr: {stderr}");
    assert!(!String::from_utf8_lossy(&out.stdout).contains("Generating"));
}

#[test]
fn help_exits_zero() {
    let out = bin().arg("--help").output().unwrap();
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("markdown2pdf"));
}


#[test]
fn unspawnable_pandoc_exits_one_without_pdf() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("doc.md"), "# Hello\n").unwrap();
    let output = dir.path().join("output.pdf");

    let out = bin()
        .current_dir(dir.path())
        .args(["doc.md", "--pandoc", "/definitely/not/pandoc"])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Generating PDF..."), "stdout: {stdout}");
    assert!(!stdout.contains("PDF generated"), "stdout: {stdout}");
    assert!(!output.exists());
    assert_no_tmp_html(dir.path());
}

// ── Scripted pandoc stand-ins ────────────────────────────────────────────────

/// Echoes to both streams, then fails with a distinctive code.
#[cfg(unix)]
const PANDOC_FAILS_42: &str = "#!/bin/sh
echo out-text
echo err-text >&2
exit 42
";

/// Prints its arguments and writes a stub PDF to whatever follows `-o`.
#[cfg(unix)]
const PANDOC_WRITES_PDF: &str = r#"#!/bin/sh
echo "args: $*"
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
printf '%%PDF-1.4 stub\n' > "$out"
"#;

#[cfg(unix)]
fn install_script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A scratch directory holding `doc.md` and the given pandoc script.
#[cfg(unix)]
fn workspace(script: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("doc.md"), "# Hello\n").unwrap();
    let pandoc = install_script(dir.path(), "fake-pandoc", script);
    (dir, pandoc)
}

#[cfg(unix)]
#[test]
fn failing_pandoc_exit_code_and_streams_are_forwarded() {
    let (dir, pandoc) = workspace(PANDOC_FAILS_42);
    let output = dir.path().join("output.pdf");

    let out = bin()
        .current_dir(dir.path())
        .arg("doc.md")
        .arg("--pandoc")
        .arg(&pandoc)
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(42));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stdout.contains("out-text"), "stdout: {stdout}");
    assert!(stderr.contains("err-text"), "stderr: {stderr}");
    assert!(
        stdout.contains("Pandoc failed with exit code 42"),
        "stdout: {stdout}"
    );
    assert!(!stdout.contains("PDF generated"), "stdout: {stdout}");
    assert!(!output.exists());
    assert_no_tmp_html(dir.path());
}

#[cfg(unix)]
#[test]
fn engine_backend_success_reports_absolute_output() {
    let (dir, pandoc) = workspace(PANDOC_WRITES_PDF);
    let root = dir.path().canonicalize().unwrap();

    let out = bin()
        .current_dir(&root)
        .args(["doc.md", "--backend", "engine", "--pandoc"])
        .arg(&pandoc)
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("Generating PDF..."), "stdout: {stdout}");
    let expected = format!("PDF generated: {}", root.join("output.pdf").display());
    assert!(stdout.contains(&expected), "stdout: {stdout}");
    assert!(root.join("output.pdf").exists());
}

#[cfg(unix)]
#[test]
fn positional_output_beats_env_output() {
    let (dir, pandoc) = workspace(PANDOC_WRITES_PDF);

    let out = bin()
        .current_dir(dir.path())
        .env("MARKDOWN2PDF_OUTPUT", "from-env.pdf")
        .args(["doc.md", "positional.pdf", "--backend", "engine", "--pandoc"])
        .arg(&pandoc)
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(dir.path().join("positional.pdf").exists());
    assert!(!dir.path().join("from-env.pdf").exists());
}

#[cfg(unix)]
#[test]
fn no_css_beats_env_stylesheet() {
    let (dir, pandoc) = workspace(PANDOC_WRITES_PDF);
    std::fs::write(dir.path().join("a.css"), "body {}").unwrap();

    let out = bin()
        .current_dir(dir.path())
        .env("MARKDOWN2PDF_CSS", "a.css")
        .args(["doc.md", "--no-css", "--backend", "engine", "--pandoc"])
        .arg(&pandoc)
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("args: "), "stdout: {stdout}");
    assert!(!stdout.contains("--css"), "stdout: {stdout}");
}

#[cfg(unix)]
#[test]
fn env_stylesheet_is_used_without_no_css() {
    let (dir, pandoc) = workspace(PANDOC_WRITES_PDF);
    std::fs::write(dir.path().join("a.css"), "body {}").unwrap();

    let out = bin()
        .current_dir(dir.path())
        .env("MARKDOWN2PDF_CSS", "a.css")
        .args(["doc.md", "--backend", "engine", "--pandoc"])
        .arg(&pandoc)
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("--css="), "stdout: {stdout}");
    assert!(stdout.contains("a.css"), "stdout: {stdout}");
}

fn assert_no_tmp_html(dir: &Path) {
    let leftovers: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.to_string_lossy().ends_with(".tmp.html"))
        .collect();
    assert!(leftovers.is_empty(), "left behind: {leftovers:?}");
}

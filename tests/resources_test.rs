use std::fs;
use std::path::{Path, PathBuf};

use docpipe::resources::copy_resources;
use docpipe::shell::Shell;

const SHELL: Shell = Shell {
    dry_run: false,
    verbose: false,
};

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Source dir with an HTML file referencing `pic.png` and `style.css`,
/// both present next to it.
fn sample_tree(root: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let src_dir = root.join("src");
    let dst_dir = root.join("dst");
    fs::create_dir_all(&dst_dir).unwrap();
    let html = src_dir.join("out.html");
    write(
        &html,
        br#"<html><head>
            <link rel="stylesheet" type="text/css" href="style.css"/>
        </head><body>
            <img src="pic.png">
        </body></html>"#,
    );
    write(&src_dir.join("pic.png"), b"PNG-BYTES");
    write(&src_dir.join("style.css"), b"body { margin: 0 }");
    (src_dir, dst_dir, html)
}

#[test]
fn test_copies_referenced_resources() {
    let root = tempfile::tempdir().unwrap();
    let (src_dir, dst_dir, html) = sample_tree(root.path());

    let report = copy_resources(&[html], &src_dir, &dst_dir, &[], &[], &SHELL).unwrap();

    assert!(report.warnings.is_empty());
    assert_eq!(report.copied.len(), 2);
    assert_eq!(fs::read(dst_dir.join("pic.png")).unwrap(), b"PNG-BYTES");
    assert_eq!(
        fs::read(dst_dir.join("style.css")).unwrap(),
        fs::read(src_dir.join("style.css")).unwrap()
    );
}

#[test]
fn test_second_pass_performs_no_operations() {
    let root = tempfile::tempdir().unwrap();
    let (src_dir, dst_dir, html) = sample_tree(root.path());

    let first = copy_resources(&[html.clone()], &src_dir, &dst_dir, &[], &[], &SHELL).unwrap();
    assert_eq!(first.copied.len(), 2);

    let second = copy_resources(&[html], &src_dir, &dst_dir, &[], &[], &SHELL).unwrap();
    assert!(second.copied.is_empty());
    assert!(second.warnings.is_empty());
}

#[test]
fn test_fallback_search_by_basename() {
    let root = tempfile::tempdir().unwrap();
    let src_dir = root.path().join("src");
    let dst_dir = root.path().join("dst");
    let shared = root.path().join("shared");
    fs::create_dir_all(&src_dir).unwrap();
    fs::create_dir_all(&dst_dir).unwrap();
    // The resource lives in a nested subdirectory of the resource dir.
    write(&shared.join("theme/icons/note.png"), b"NOTE-ICON");

    let html = src_dir.join("out.html");
    write(&html, br#"<img src="images/note.png">"#);

    let report = copy_resources(&[html], &src_dir, &dst_dir, &[], &[shared], &SHELL).unwrap();

    assert!(report.warnings.is_empty());
    // Copied to the reference's relative path, not the fallback layout.
    assert_eq!(
        fs::read(dst_dir.join("images/note.png")).unwrap(),
        b"NOTE-ICON"
    );
}

#[test]
fn test_missing_resource_is_nonfatal() {
    let root = tempfile::tempdir().unwrap();
    let src_dir = root.path().join("src");
    let dst_dir = root.path().join("dst");
    fs::create_dir_all(&src_dir).unwrap();
    fs::create_dir_all(&dst_dir).unwrap();
    let html = src_dir.join("out.html");
    write(&html, br#"<img src="nowhere.png"><img src="also/nowhere.png">"#);

    let report = copy_resources(&[html], &src_dir, &dst_dir, &[], &[], &SHELL).unwrap();

    assert_eq!(report.warnings.len(), 2);
    assert!(report.warnings[0].contains("missing resource"));
    assert!(report.copied.is_empty());
}

#[test]
fn test_pre_existing_destination_satisfies_missing_source() {
    let root = tempfile::tempdir().unwrap();
    let src_dir = root.path().join("src");
    let dst_dir = root.path().join("dst");
    fs::create_dir_all(&src_dir).unwrap();
    let html = src_dir.join("out.html");
    write(&html, br#"<img src="pic.png">"#);
    // Already in place from an earlier run; source long gone.
    write(&dst_dir.join("pic.png"), b"OLD-COPY");

    let report = copy_resources(&[html], &src_dir, &dst_dir, &[], &[], &SHELL).unwrap();

    assert!(report.warnings.is_empty());
    assert!(report.copied.is_empty());
    assert_eq!(fs::read(dst_dir.join("pic.png")).unwrap(), b"OLD-COPY");
}

#[test]
fn test_absolute_references_are_never_copied() {
    let root = tempfile::tempdir().unwrap();
    let src_dir = root.path().join("src");
    let dst_dir = root.path().join("dst");
    fs::create_dir_all(&dst_dir).unwrap();
    let present = root.path().join("present.png");
    write(&present, b"IN-PLACE");

    let html = src_dir.join("out.html");
    write(
        &html,
        format!(
            r#"<img src="{}"><img src="/no/such/absolute.png">"#,
            present.display()
        )
        .as_bytes(),
    );

    let report = copy_resources(&[html], &src_dir, &dst_dir, &[], &[], &SHELL).unwrap();

    // The existing absolute reference is fine as-is; the missing one warns.
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("/no/such/absolute.png"));
    assert!(report.copied.is_empty());
    assert!(!dst_dir.join("present.png").exists());
}

#[test]
fn test_extra_references_without_html() {
    let root = tempfile::tempdir().unwrap();
    let src_dir = root.path().join("src");
    let dst_dir = root.path().join("dst");
    fs::create_dir_all(&dst_dir).unwrap();
    write(&src_dir.join("cover.png"), b"COVER");

    let extra = vec!["cover.png".to_string()];
    let report = copy_resources(&[], &src_dir, &dst_dir, &extra, &[], &SHELL).unwrap();

    assert!(report.warnings.is_empty());
    assert_eq!(fs::read(dst_dir.join("cover.png")).unwrap(), b"COVER");
}

#[test]
fn test_changed_source_is_recopied() {
    let root = tempfile::tempdir().unwrap();
    let (src_dir, dst_dir, html) = sample_tree(root.path());

    copy_resources(&[html.clone()], &src_dir, &dst_dir, &[], &[], &SHELL).unwrap();
    write(&src_dir.join("pic.png"), b"UPDATED-PNG-BYTES");

    let report = copy_resources(&[html], &src_dir, &dst_dir, &[], &[], &SHELL).unwrap();
    assert_eq!(report.copied.len(), 1);
    assert_eq!(
        fs::read(dst_dir.join("pic.png")).unwrap(),
        b"UPDATED-PNG-BYTES"
    );
}

use super::*;

#[test]
fn basename_handles_mixed_separators() {
    let cases = [
        ("justafile.txt", "justafile.txt"),
        ("/Linux path/with spaces.txt", "with spaces.txt"),
        ("C:\\ünicode\\is\\awésom.tar.gz", "awésom.tar.gz"),
        ("/out/shots/010/", "010"),
        ("///", "/"),
    ];
    for (input, expect) in cases {
        assert_eq!(basename(input).unwrap(), expect, "input {input:?}");
    }
}

#[test]
fn dirname_matches_crossplatform_expectations() {
    let cases = [
        ("justafile.txt", "."),
        ("/", "/"),
        ("/file-at-root", "/"),
        ("C:\\file-at-root", "C:"),
        ("/Linux path/with spaces.txt", "/Linux path"),
        ("/Mixed path\\with/slash.txt", "/Mixed path/with"),
        ("\\\\SERVER\\share\\dir\\file.exr", "//SERVER/share/dir"),
        ("/out/shots/010/frames/######", "/out/shots/010/frames"),
    ];
    for (input, expect) in cases {
        assert_eq!(dirname(input).unwrap(), expect, "input {input:?}");
    }
}

#[test]
fn stem_strips_only_final_extension() {
    assert_eq!(stem("stem.txt").unwrap(), "stem");
    assert_eq!(stem("stem.tar.gz").unwrap(), "stem.tar");
    assert_eq!(stem("C:\\path\\to/mixed/file.txt").unwrap(), "file");
    assert_eq!(stem("/render/scene.flamenco.blend").unwrap(), "scene.flamenco");
    assert_eq!(stem("noext").unwrap(), "noext");
}

#[test]
fn extension_includes_dot() {
    assert_eq!(extension("/a/b.png").unwrap(), ".png");
    assert_eq!(extension("/a/b").unwrap(), "");
}

#[test]
fn join_collapses_boundaries_and_keeps_prefix() {
    assert_eq!(join(&["", "", "a", "", "b", ""]).unwrap(), "a/b");
    assert_eq!(join(&["/", "file-at-root"]).unwrap(), "/file-at-root");
    assert_eq!(join(&["C:", "file-at-root"]).unwrap(), "C:/file-at-root");
    assert_eq!(
        join(&["C:\\ünicode", "is\\awésom.tar.gz"]).unwrap(),
        "C:/ünicode/is/awésom.tar.gz"
    );
    assert_eq!(
        join(&["\\\\SERVER", "mount", "dir", "file.txt"]).unwrap(),
        "//SERVER/mount/dir/file.txt"
    );
    assert_eq!(join(&["/out/", "/frames/", "######"]).unwrap(), "/out/frames/######");
}

#[test]
fn empty_input_is_rejected() {
    assert!(matches!(basename(""), Err(CompileError::InvalidPath(_))));
    assert!(matches!(dirname(""), Err(CompileError::InvalidPath(_))));
    assert!(matches!(stem(""), Err(CompileError::InvalidPath(_))));
    assert!(matches!(join::<&str>(&[]), Err(CompileError::InvalidPath(_))));
    assert!(matches!(join(&["", ""]), Err(CompileError::InvalidPath(_))));
}

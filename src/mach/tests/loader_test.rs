use super::*;
use crate::lang::ErrorCode;
use crate::mach::read_blobs;

#[test]
fn test_lines_are_attributed() {
    let dir = tree(&[
        ("main.bas", "a = 1\n\nprint a : b = 2\n#include \"one.inc\"\nend\n"),
        ("one.inc", "' header\nc = 3\n"),
    ]);
    let loader = load(&dir, "main.bas");
    assert_eq!(
        loader.program().listing(),
        [
            "LET A = 1 '|1",
            "PRINT A:LET B = 2 '|3",
            "LET C = 3 '|one.inc,2",
            "END '|5",
            "END",
        ]
    );
    let (start, _) = loader.program().lines().nth(2).unwrap();
    assert_eq!(loader.locate(start + 1), Some(("one.inc".to_string(), 2)));
    let (start, _) = loader.program().lines().nth(1).unwrap();
    let (file, line) = loader.locate(start + 3).unwrap();
    assert!(file.ends_with("main.bas"));
    assert_eq!(line, 3);
}

#[test]
fn test_include_order_and_trace() {
    let dir = tree(&[
        ("main.bas", "#include \"one.inc\"\n#include \"two.inc\"\n"),
        ("one.inc", "#include \"lib/three.inc\"\nx = 1\n"),
        ("lib/three.inc", "x = 3\n"),
        ("two.inc", "x = 2\n"),
    ]);
    let loader = load(&dir, "main");
    assert_eq!(
        loader.program().listing(),
        [
            "LET X = 3 '|lib/three.inc,1",
            "LET X = 1 '|one.inc,2",
            "LET X = 2 '|two.inc,1",
            "END",
        ]
    );
    let depths: Vec<usize> = loader.trace().iter().map(|(depth, _)| *depth).collect();
    assert_eq!(depths, [0, 1, 2, 1]);
    assert!(loader.current_file().unwrap().is_absolute());
}

#[test]
fn test_include_resolves_against_includer() {
    let dir = tree(&[
        ("main.bas", "#include \"lib/one.inc\"\n"),
        ("lib/one.inc", "#include \"two.inc\"\n"),
        ("lib/two.inc", "y = 2\n"),
    ]);
    let loader = load(&dir, "main.bas");
    assert_eq!(loader.program().listing()[0], "LET Y = 2 '|two.inc,1");
}

#[test]
fn test_custom_resolver() {
    let dir = tree(&[("prog.bas", "#include \"two.inc\"\n"), ("two.inc", "z = 1\n")]);
    let mut loader = jailed(&dir);
    loader.load("prog.bas").unwrap();
    assert_eq!(loader.program().listing()[0], "LET Z = 1 '|two.inc,1");
    let e = loader.load("nope.bas").unwrap_err();
    assert_eq!(e.code(), ErrorCode::FileNotFound);
}

#[test]
fn test_failure_leaves_store_empty() {
    let dir = tree(&[
        ("main.bas", "a = 1\n#include \"one.inc\"\n"),
        ("one.inc", "b = 2\n*/\n"),
    ]);
    let mut loader = Loader::default();
    let e = loader
        .load(&dir.path().join("main.bas").to_string_lossy())
        .unwrap_err();
    assert_eq!(e.code(), ErrorCode::NoCommentToTerminate);
    assert_eq!(e.location(), Some(("one.inc", 2)));
    assert!(loader.program().is_empty());
    assert!(!loader.program().is_finished());
}

#[test]
fn test_missing_include_is_located() {
    let dir = tree(&[("main.bas", "a = 1\n#include \"gone.inc\"\n")]);
    let mut loader = Loader::default();
    let e = loader
        .load(&dir.path().join("main.bas").to_string_lossy())
        .unwrap_err();
    assert_eq!(e.code(), ErrorCode::FileNotFound);
    let (file, line) = e.location().unwrap();
    assert!(file.ends_with("main.bas"));
    assert_eq!(line, 2);
}

#[test]
fn test_unterminated_comment() {
    let dir = tree(&[("main.bas", "a = 1\n/* open\n")]);
    let mut loader = Loader::default();
    let e = loader
        .load(&dir.path().join("main.bas").to_string_lossy())
        .unwrap_err();
    assert_eq!(e.code(), ErrorCode::UnterminatedComment);
    let (file, line) = e.location().unwrap();
    assert!(file.ends_with("main.bas"));
    assert_eq!(line, 2);
}

#[test]
fn test_comment_cannot_leave_include() {
    let dir = tree(&[
        ("main.bas", "#include \"x.inc\"\nprint 1 */\nprint 2\n"),
        ("x.inc", "/*\n"),
    ]);
    let mut loader = Loader::default();
    let e = loader
        .load(&dir.path().join("main.bas").to_string_lossy())
        .unwrap_err();
    assert_eq!(e.code(), ErrorCode::UnterminatedComment);
    assert_eq!(e.location(), Some(("x.inc", 1)));
    assert!(loader.program().is_empty());
}

#[test]
fn test_self_include_runs_out_of_files() {
    let dir = tree(&[("main.bas", "a = 1\n#include \"main.bas\"\n")]);
    let mut loader = Loader::default();
    let e = loader
        .load(&dir.path().join("main.bas").to_string_lossy())
        .unwrap_err();
    assert_eq!(e.code(), ErrorCode::TooManyFiles);
    assert_eq!(e.location().map(|(_, line)| line), Some(2));
    assert!(loader.program().is_empty());
    assert!(!loader.program().is_finished());
}

#[test]
fn test_defines_reset_between_loads() {
    let dir = tree(&[
        ("one.bas", "#define \"a\",\"b\"\na = 1\n"),
        ("two.bas", "a = 1\n"),
    ]);
    let mut loader = Loader::default();
    loader
        .load(&dir.path().join("one.bas").to_string_lossy())
        .unwrap();
    assert_eq!(loader.program().listing()[0], "LET B = 1 '|2");
    assert_eq!(loader.defines().len(), 1);
    loader
        .load(&dir.path().join("two.bas").to_string_lossy())
        .unwrap();
    assert_eq!(loader.program().listing()[0], "LET A = 1 '|1");
}

#[test]
fn test_tabs_follow_config() {
    let dir = tree(&[("main.bas", "print \"a\tb\"\n")]);
    let config = Config {
        tab_width: 8,
        ..Config::default()
    };
    let mut loader = Loader::new(config);
    loader
        .load(&dir.path().join("main.bas").to_string_lossy())
        .unwrap();
    let expected = format!("PRINT \"a{}b\" '|1", " ".repeat(8));
    assert_eq!(loader.program().listing()[0], expected);
}

#[test]
fn test_blobs_are_packed() {
    let dir = tree(&[(
        "main.bas",
        concat!(
            "print 1\ncsub blink integer\n00000000 e12fff1e\nend csub\n",
            "definefont #1\n08080000\nend definefont\n",
        ),
    )]);
    let loader = load(&dir, "main.bas");
    let blobs = read_blobs(loader.program().blob_region()).unwrap();
    assert_eq!(blobs.len(), 2);
    assert_eq!(blobs[0].words, [0, 0xE12F_FF1E]);
    let (file, line) = loader.locate(blobs[0].owner as usize).unwrap();
    assert!(file.ends_with("main.bas"));
    assert_eq!(line, 2);
    assert_eq!(blobs[1].owner, 0);
    assert_eq!(blobs[1].words, [0x0808_0000]);
}

#[test]
fn test_program_too_long() {
    let text = "print \"0123456789012345678901234567890123456789\"\n".repeat(20);
    let dir = tree(&[("main.bas", text.as_str())]);
    let config = Config {
        program_size: 256,
        ..Config::default()
    };
    let mut loader = Loader::new(config);
    let e = loader
        .load(&dir.path().join("main.bas").to_string_lossy())
        .unwrap_err();
    assert_eq!(e.code(), ErrorCode::ProgramTooLong);
    assert!(loader.program().is_empty());
}

#[test]
fn test_text_bytes_are_stored_verbatim() {
    let dir = tree(&[("main.bas", &b"print \"25\xB0C\" ' \xE9t\xE9\ndata \xC0\n"[..])]);
    let loader = load(&dir, "main.bas");
    assert_eq!(
        loader.program().listing(),
        ["PRINT \"25\u{B0}C\" '|1", "DATA \u{C0} '|2", "END"]
    );
    let (_, line) = loader.program().lines().next().unwrap();
    assert!(line.windows(4).any(|w| w == b"25\xB0C"));
}

#[test]
fn test_utf8_source_and_include_names() {
    let dir = tree(&[
        ("main.bas", "print \"25°C\"\n#include \"café.inc\"\n"),
        ("café.inc", "x = 1\n"),
    ]);
    let loader = load(&dir, "main.bas");
    let (_, line) = loader.program().lines().next().unwrap();
    assert!(line.windows(2).any(|w| w == [0xC2, 0xB0]));
    assert_eq!(loader.trace()[1], (1, "café.inc".to_string()));
    let (start, _) = loader.program().lines().nth(1).unwrap();
    assert_eq!(loader.locate(start + 1), Some(("café.inc".to_string(), 1)));
}

#[test]
fn test_bare_high_bytes_are_rejected() {
    let dir = tree(&[("main.bas", &b"a = 1\nb\xB0 = 2\n"[..])]);
    let mut loader = Loader::default();
    let e = loader
        .load(&dir.path().join("main.bas").to_string_lossy())
        .unwrap_err();
    assert_eq!(e.code(), ErrorCode::SyntaxError);
    assert_eq!(e.location().map(|(_, line)| line), Some(2));
}

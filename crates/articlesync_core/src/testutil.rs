use similar::TextDiff;

/// Compare file contents, panicking with a unified diff on mismatch.
pub(crate) fn assert_same_text(expected: &str, actual: &str) {
    if expected != actual {
        let diff = TextDiff::from_lines(expected, actual)
            .unified_diff()
            .header("expected", "actual")
            .to_string();
        panic!("content mismatch:\n{diff}");
    }
}

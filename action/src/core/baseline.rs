//! Compare `grep` match counts against an expected baseline.

/// Verdict for one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaselineOutcome {
    /// Found exactly the expected number of matching lines.
    Matches,
    /// Found a different number of matching lines.
    Mismatch { found: usize, expected: usize },
    /// The search itself failed (grep exit code above 1).
    SearchFailed { exit_code: i32 },
}

/// Number of non-empty lines in grep output.
pub fn count_match_lines(output: &str) -> usize {
    output.lines().filter(|line| !line.trim().is_empty()).count()
}

/// Classify a grep run. Exit code 1 means "no matches", not failure.
pub fn evaluate(exit_code: i32, output: Option<&str>, expected: usize) -> BaselineOutcome {
    if !(0..=1).contains(&exit_code) {
        return BaselineOutcome::SearchFailed { exit_code };
    }
    let found = output.map(count_match_lines).unwrap_or(0);
    if found == expected {
        BaselineOutcome::Matches
    } else {
        BaselineOutcome::Mismatch { found, expected }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_non_empty_lines() {
        let output = "src/Driver.java:12:public static void main\n\nsrc/Other.java:3:x\n";
        assert_eq!(count_match_lines(output), 2);
        assert_eq!(count_match_lines(""), 0);
    }

    #[test]
    fn single_expected_match_passes() {
        let output = "src/Driver.java:12:    public static void main(String[] args) {\n";
        assert_eq!(evaluate(0, Some(output), 1), BaselineOutcome::Matches);
    }

    #[test]
    fn extra_matches_are_a_mismatch() {
        let output = "a.java:1:main\nb.java:2:main\n";
        assert_eq!(
            evaluate(0, Some(output), 1),
            BaselineOutcome::Mismatch {
                found: 2,
                expected: 1
            }
        );
    }

    #[test]
    fn no_matches_exit_code_counts_as_zero() {
        assert_eq!(evaluate(1, Some(""), 0), BaselineOutcome::Matches);
        assert_eq!(
            evaluate(1, None, 1),
            BaselineOutcome::Mismatch {
                found: 0,
                expected: 1
            }
        );
    }

    #[test]
    fn grep_errors_are_search_failures() {
        assert_eq!(
            evaluate(2, Some(""), 1),
            BaselineOutcome::SearchFailed { exit_code: 2 }
        );
        assert_eq!(
            evaluate(-1, None, 0),
            BaselineOutcome::SearchFailed { exit_code: -1 }
        );
    }
}

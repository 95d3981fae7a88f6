//! Rendering the probe results and choosing the exit code.

use std::fmt::Write as _;

use crate::checks::CheckOutcome;

const RULE: &str = "============================================================";

/// Overall health of discovery, from the number of passing checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    AllPassed,
    Partial,
    NonePassed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub total: usize,
}

impl Summary {
    pub fn of(outcomes: &[CheckOutcome]) -> Self {
        Self {
            passed: outcomes.iter().filter(|o| o.passed()).count(),
            total: outcomes.len(),
        }
    }

    pub fn verdict(&self) -> Verdict {
        if self.passed == 0 {
            Verdict::NonePassed
        } else if self.passed < self.total {
            Verdict::Partial
        } else {
            Verdict::AllPassed
        }
    }

    /// 0 if anything worked, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.passed > 0 {
            0
        } else {
            1
        }
    }
}

/// Header printed before the checks run.
pub fn header(hostname: &str) -> String {
    format!("{RULE}\nmDNS Resolution Test\n{RULE}\nTesting hostname: {hostname}\n{RULE}")
}

/// Block for one finished check.
pub fn render_check(index: usize, outcome: &CheckOutcome) -> String {
    let mut out = format!("\nTest {}: {}\n", index + 1, outcome.name);
    match &outcome.result {
        Ok(lines) => {
            out.push_str("✓ SUCCESS\n");
            for line in lines {
                let _ = writeln!(out, "  {line}");
            }
        }
        Err(e) if e.is_skip() => {
            let _ = writeln!(out, "⚠ SKIPPED: {e}");
        }
        Err(e) => {
            let _ = writeln!(out, "✗ FAILED: {e}");
        }
    }
    out
}

/// Summary table, totals line, and the diagnostic hint.
pub fn render_summary(outcomes: &[CheckOutcome]) -> String {
    let summary = Summary::of(outcomes);
    let mut out = format!("\n{RULE}\nTest Summary\n{RULE}\n");
    for outcome in outcomes {
        let status = if outcome.passed() { "PASS" } else { "FAIL" };
        let _ = writeln!(out, "  {:.<40} {status}", outcome.name);
    }
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Results: {}/{} tests passed", summary.passed, summary.total);
    out.push('\n');
    out.push_str(hint(summary.verdict()));
    out
}

fn hint(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::NonePassed => {
            "⚠ mDNS is not working!\n\
             \n\
             Possible issues:\n  \
             1. Mock server is not running\n  \
             2. mDNS/Bonjour service is not running on this system\n  \
             3. Firewall is blocking mDNS (UDP port 5353)\n  \
             4. Testing from Android emulator (mDNS often doesn't work in emulators)\n"
        }
        Verdict::Partial => "⚠ Partial mDNS functionality\n",
        Verdict::AllPassed => "✓ All mDNS tests passed!\n",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::ProbeError;

    fn pass(name: &'static str) -> CheckOutcome {
        CheckOutcome {
            name,
            result: Ok(vec!["robot-spider.local → 192.168.1.20".into()]),
        }
    }

    fn fail(name: &'static str) -> CheckOutcome {
        CheckOutcome {
            name,
            result: Err(ProbeError::PingTimedOut),
        }
    }

    #[test]
    fn test_summary_counts_passes() {
        let outcomes = [pass("a"), fail("b"), pass("c"), fail("d")];
        assert_eq!(Summary::of(&outcomes), Summary { passed: 2, total: 4 });
    }

    #[test]
    fn test_verdicts() {
        assert_eq!(Summary { passed: 0, total: 4 }.verdict(), Verdict::NonePassed);
        assert_eq!(Summary { passed: 3, total: 4 }.verdict(), Verdict::Partial);
        assert_eq!(Summary { passed: 4, total: 4 }.verdict(), Verdict::AllPassed);
    }

    #[test]
    fn test_exit_code_zero_if_any_check_passed() {
        assert_eq!(Summary { passed: 1, total: 4 }.exit_code(), 0);
        assert_eq!(Summary { passed: 0, total: 4 }.exit_code(), 1);
    }

    #[test]
    fn test_summary_render_lists_each_check_and_total() {
        // Arrange
        let outcomes = [pass("Ping Test"), fail("mDNS Service Discovery")];

        // Act
        let text = render_summary(&outcomes);

        // Assert
        assert!(text.contains("Results: 1/2 tests passed"));
        assert!(text.contains("  Ping Test............................... PASS"));
        assert!(text.contains("⚠ Partial mDNS functionality"));
    }

    #[test]
    fn test_none_passed_prints_likely_causes() {
        let text = render_summary(&[fail("x")]);
        assert!(text.contains("Possible issues:"));
        assert!(text.contains("UDP port 5353"));
    }

    #[test]
    fn test_render_check_marks_skips() {
        let outcome = CheckOutcome {
            name: "Ping Test",
            result: Err(ProbeError::PingMissing),
        };
        assert!(render_check(3, &outcome).contains("Test 4: Ping Test\n⚠ SKIPPED: ping command not found"));
    }
}

//! Interpreter output contract
//!
//! The interpreter prints the program's output, then the diagnostics marker,
//! then its end-of-run memory report. The report must contain every
//! sentinel; otherwise the run leaked or corrupted memory.

use super::DriverError;

pub const DIAGNOSTICS_MARKER: &str = "======== Memory diagnostics ========";

pub const SENTINELS: [&str; 3] = ["All memory freed", "All allocations freed", "No live objects"];

/// Normalize line terminators to `\n`.
pub fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Check the memory report and return the program output preceding the marker.
pub fn split_output(text: &str) -> Result<&str, DriverError> {
    let Some(marker_at) = text.find(DIAGNOSTICS_MARKER) else {
        return Err(DriverError::MissingDiagnosticsMarker {
            output: text.to_string(),
        });
    };

    let report = &text[marker_at + DIAGNOSTICS_MARKER.len()..];
    let missing: Vec<&'static str> = SENTINELS.into_iter().filter(|s| !report.contains(s)).collect();
    if !missing.is_empty() {
        return Err(DriverError::MemorySafetyViolation {
            missing,
            report: report.trim_start_matches('\n').to_string(),
        });
    }

    Ok(&text[..marker_at])
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN_REPORT: &str = "\nAll memory freed.\nAll allocations freed.\nNo live objects.\n";

    #[test]
    fn test_returns_output_before_marker() {
        let text = format!("3\n{DIAGNOSTICS_MARKER}{CLEAN_REPORT}");
        assert_eq!(split_output(&text).unwrap(), "3\n");
    }

    #[test]
    fn test_empty_program_output() {
        let text = format!("{DIAGNOSTICS_MARKER}{CLEAN_REPORT}");
        assert_eq!(split_output(&text).unwrap(), "");
    }

    #[test]
    fn test_missing_marker() {
        let err = split_output("3\nAll memory freed\n").unwrap_err();
        assert!(matches!(err, DriverError::MissingDiagnosticsMarker { ref output } if output.starts_with("3")));
    }

    #[test]
    fn test_missing_sentinel() {
        let text = format!("3\n{DIAGNOSTICS_MARKER}\nAll memory freed.\nAll allocations freed.\n");
        match split_output(&text).unwrap_err() {
            DriverError::MemorySafetyViolation { missing, .. } => assert_eq!(missing, ["No live objects"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sentinels_before_marker_do_not_count() {
        let text = format!("All memory freed\nAll allocations freed\nNo live objects\n{DIAGNOSTICS_MARKER}\n");
        match split_output(&text).unwrap_err() {
            DriverError::MemorySafetyViolation { missing, .. } => assert_eq!(missing.len(), 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_normalize_crlf() {
        assert_eq!(normalize("a\r\nb\r\n"), "a\nb\n");
        assert_eq!(normalize("a\rb"), "a\rb");
    }
}

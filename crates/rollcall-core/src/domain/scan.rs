//! Scanner input handling
//!
//! QR codes reach the kiosk as keyboard-wedge text, frequently mangled by an
//! active input method. [`normalize_scan`] recovers the 7-digit subject id;
//! [`ScanGate`] drops repeated reads of the same code.

use chrono::{DateTime, Duration, Utc};

use super::{errors::DomainError, newtypes::SubjectRef};

/// Length of a subject id encoded in a QR payload
const SCAN_ID_LEN: usize = 7;

/// Offset between full-width and ASCII forms (U+FF01..U+FF5E)
const FULL_WIDTH_OFFSET: u32 = 0xFEE0;

/// Folds full-width ASCII letters and digits to their half-width form
fn fold_full_width(c: char) -> char {
    match c {
        '\u{FF10}'..='\u{FF19}' | '\u{FF21}'..='\u{FF3A}' | '\u{FF41}'..='\u{FF5A}' => {
            char::from_u32(c as u32 - FULL_WIDTH_OFFSET).unwrap_or(c)
        }
        _ => c,
    }
}

/// Maps the grade letters `A..=F` to `1..=6`; digits pass through
fn grade_digit(c: char) -> char {
    match c {
        'A'..='F' => char::from(b'1' + (c as u8 - b'A')),
        _ => c,
    }
}

/// Normalizes raw scanner text into a subject id
///
/// 1. Full-width letters/digits become half-width, then upper case.
/// 2. The first run of 7 hex characters is taken; an `ID_` marker and any
///    IME residue around it are skipped.
/// 3. `A..F` map to `1..6`.
///
/// # Examples
///
/// ```
/// use rollcall_core::domain::scan::normalize_scan;
///
/// assert_eq!(normalize_scan("tyID_20F0946").unwrap().as_str(), "2060946");
/// assert!(normalize_scan("hello").is_err());
/// ```
///
/// # Errors
/// Returns [`DomainError::InvalidScan`] when no 7-character id can be found.
pub fn normalize_scan(raw: &str) -> Result<SubjectRef, DomainError> {
    let folded: Vec<char> = raw
        .chars()
        .map(fold_full_width)
        .flat_map(char::to_uppercase)
        .collect();

    let start = (0..folded.len())
        .find(|&i| {
            folded.len() - i >= SCAN_ID_LEN
                && folded[i..i + SCAN_ID_LEN]
                    .iter()
                    .all(|c| c.is_ascii_hexdigit())
        })
        .ok_or_else(|| DomainError::InvalidScan(raw.to_string()))?;

    let id: String = folded[start..start + SCAN_ID_LEN]
        .iter()
        .copied()
        .map(grade_digit)
        .collect();

    if !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(DomainError::InvalidScan(raw.to_string()));
    }

    SubjectRef::new(id)
}

/// Suppresses repeated scans of the same subject within a time window
#[derive(Debug, Clone)]
pub struct ScanGate {
    window: Duration,
    last: Option<(SubjectRef, DateTime<Utc>)>,
}

impl ScanGate {
    /// Creates a gate with the given duplicate window
    #[must_use]
    pub fn new(window: std::time::Duration) -> Self {
        Self {
            window: Duration::from_std(window).unwrap_or_else(|_| Duration::seconds(5)),
            last: None,
        }
    }

    /// Returns true if the scan should be processed
    ///
    /// A rejected duplicate does not extend the window.
    pub fn admit(&mut self, subject: &SubjectRef, now: DateTime<Utc>) -> bool {
        if let Some((last_subject, at)) = &self.last {
            if last_subject == subject && now - *at < self.window {
                return false;
            }
        }
        self.last = Some((subject.clone(), now));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_digits() {
        assert_eq!(normalize_scan("1234567").unwrap().as_str(), "1234567");
    }

    #[test]
    fn test_marker_and_noise_are_stripped() {
        assert_eq!(normalize_scan("tyID_20F0946").unwrap().as_str(), "2060946");
        assert_eq!(normalize_scan("ID_A012345\r").unwrap().as_str(), "1012345");
    }

    #[test]
    fn test_full_width_input() {
        // Full-width "ID_２０Ｆ０９４６" as typed through an IME.
        let raw = "ＩＤ_\u{FF12}\u{FF10}\u{FF26}\u{FF10}\u{FF19}\u{FF14}\u{FF16}";
        assert_eq!(normalize_scan(raw).unwrap().as_str(), "2060946");
    }

    #[test]
    fn test_lower_case_hex() {
        assert_eq!(normalize_scan("id_b0c1d2e").unwrap().as_str(), "2031425");
    }

    #[test]
    fn test_too_short_is_rejected() {
        assert!(matches!(
            normalize_scan("ID_12345"),
            Err(DomainError::InvalidScan(_))
        ));
        assert!(normalize_scan("").is_err());
    }

    #[test]
    fn test_takes_first_run() {
        assert_eq!(normalize_scan("1234567890").unwrap().as_str(), "1234567");
    }

    #[test]
    fn test_gate_blocks_duplicates_inside_window() {
        let mut gate = ScanGate::new(std::time::Duration::from_secs(5));
        let s = SubjectRef::new("1234567").unwrap();
        let t0 = Utc::now();

        assert!(gate.admit(&s, t0));
        assert!(!gate.admit(&s, t0 + Duration::seconds(4)));
        assert!(gate.admit(&s, t0 + Duration::seconds(5)));
    }

    #[test]
    fn test_gate_admits_other_subjects() {
        let mut gate = ScanGate::new(std::time::Duration::from_secs(5));
        let a = SubjectRef::new("1111111").unwrap();
        let b = SubjectRef::new("2222222").unwrap();
        let t0 = Utc::now();

        assert!(gate.admit(&a, t0));
        assert!(gate.admit(&b, t0));
        assert!(gate.admit(&a, t0));
    }
}

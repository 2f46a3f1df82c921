//! Post-enactment enrichment: chapter citation and coming-into-force analysis.
//!
//! Runs once per enacted bill. The enacted text itself comes from an
//! [`EnactedTextSource`]; fetching and rendering documents is left to that
//! collaborator.

use super::domain::{BillKey, CifStatus};
use super::record::BillRecord;
use regex::Regex;
use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{debug, info};

const CITATION_SCAN_CHARS: usize = 5000;
const CIF_TAIL_CHARS: usize = 2000;
const CIF_EXCERPT_CHARS: usize = 500;

pub const NO_CIF_SECTION_NOTE: &str =
    "No Coming into Force section found; in force on royal assent";

/// Enacted text of a bill plus any free-form metadata published alongside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnactedText {
    pub text: String,
    pub metadata: Option<String>,
}

/// Supplies enacted texts for bills that have received royal assent.
pub trait EnactedTextSource: Send + Sync {
    fn enacted_text(&self, key: &BillKey) -> Result<Option<EnactedText>, EnactedTextError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EnactedTextError {
    #[error("failed to read enacted text {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reads `{session}-{bill}.txt` and the optional `{session}-{bill}.meta` from a directory.
#[derive(Debug, Clone)]
pub struct EnactedTextDirectory {
    root: PathBuf,
}

impl EnactedTextDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_optional(&self, file_name: String) -> Result<Option<String>, EnactedTextError> {
        let path = self.root.join(file_name);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(EnactedTextError::Io { path, source }),
        }
    }
}

impl EnactedTextSource for EnactedTextDirectory {
    fn enacted_text(&self, key: &BillKey) -> Result<Option<EnactedText>, EnactedTextError> {
        let Some(text) = self.read_optional(format!("{key}.txt"))? else {
            return Ok(None);
        };
        let metadata = self.read_optional(format!("{key}.meta"))?;
        Ok(Some(EnactedText { text, metadata }))
    }
}

/// Fills chapter citation and coming-into-force status on an enacted record.
///
/// Returns false without touching the record when either field is already set.
pub fn process_enacted_bill(record: &mut BillRecord, enacted: &EnactedText) -> bool {
    if record.enactment_processed() {
        debug!(bill = %record.key(), "enactment metadata already recorded");
        return false;
    }

    let citation = extract_chapter_citation(&enacted.text, enacted.metadata.as_deref());
    let (status, details) = analyze_coming_into_force(&enacted.text);

    info!(
        bill = %record.key(),
        citation = citation.as_deref().unwrap_or("none"),
        cif = status.code(),
        "enactment metadata recorded"
    );

    record.set_enactment_outcome(citation, status, Some(details));
    true
}

fn citation_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"S\.C\.\s*(\d{4}),\s*c\.\s*(\d+)").expect("valid citation pattern"),
            Regex::new(r"(?i)Statutes\s+of\s+Canada\s*,?\s*(\d{4})\s*,?\s*Chapter\s+(\d+)")
                .expect("valid citation pattern"),
            Regex::new(concat!(
                r"(?i)\b(?:S\.?\s?C\.?|Statutes\s+of\s+Canada)\s*,?\s*(\d{4})\s*,?\s*",
                r"(?:chapter|chap\.?|ch\.?|c\.?)\s*(\d+)",
            ))
            .expect("valid citation pattern"),
        ]
    })
}

/// Finds the statute citation, looking in metadata first and then the start
/// of the text, normalized to `S.C. {year}, c. {chapter}`.
pub fn extract_chapter_citation(text: &str, metadata: Option<&str>) -> Option<String> {
    let leading = head_chars(text, CITATION_SCAN_CHARS);
    metadata
        .into_iter()
        .chain(std::iter::once(leading))
        .find_map(|haystack| {
            citation_patterns().iter().find_map(|pattern| {
                pattern
                    .captures(haystack)
                    .map(|caps| format!("S.C. {}, c. {}", &caps[1], &caps[2]))
            })
        })
}

/// A month name with whatever day, ordinal or year sits next to it, or an ISO
/// date. Only a capitalised `May` counts so the modal verb is not a date.
const DATE_PATTERN: &str = r"(?x)
    (?:\b\d{1,2}(?:st|nd|rd|th)?\s+(?:day\s+of\s+)?)?
    (?:
        \b(?i:january|february|march|april|june|july|august|september|october|november|december)\b
        | \bMay\b
    )
    (?:\s+\d{1,2}(?:st|nd|rd|th)?\b)?
    (?:,?\s+\d{4}\b)?
    | \b\d{4}-\d{2}-\d{2}\b
";

struct CifPatterns {
    heading: Regex,
    order: Regex,
    date: Regex,
    assent: Regex,
}

fn cif_patterns() -> &'static CifPatterns {
    static PATTERNS: OnceLock<CifPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| CifPatterns {
        heading: Regex::new(r"(?i)coming\s+into\s+force|commencement")
            .expect("valid heading pattern"),
        order: Regex::new(
            r"(?i)order\s+in\s+council|governor\s+in\s+council|order\s+of\s+the\s+governor",
        )
        .expect("valid order pattern"),
        date: Regex::new(DATE_PATTERN).expect("valid date pattern"),
        assent: Regex::new(r"(?i)royal\s+assent|assented\s+to|sanction")
            .expect("valid assent pattern"),
    })
}

/// Classifies when an enacted bill takes effect from the tail of its text,
/// where coming-into-force provisions conventionally sit.
pub fn analyze_coming_into_force(text: &str) -> (CifStatus, String) {
    let patterns = cif_patterns();
    let tail = tail_chars(text, CIF_TAIL_CHARS);

    let Some(heading) = patterns.heading.find(tail) else {
        return (CifStatus::ActiveOnAssent, NO_CIF_SECTION_NOTE.to_string());
    };

    let excerpt = collapse_whitespace(head_chars(&tail[heading.end()..], CIF_EXCERPT_CHARS));

    if patterns.order.is_match(&excerpt) {
        return (
            CifStatus::WaitingForOrder,
            format!("Awaiting order in council: {excerpt}"),
        );
    }

    if let Some(date) = patterns.date.find(&excerpt) {
        if excerpt.to_lowercase().contains("to be fixed") {
            return (
                CifStatus::WaitingForOrder,
                format!("Date to be fixed by order: {excerpt}"),
            );
        }
        return (
            CifStatus::FixedDate,
            format!("Comes into force on {}: {excerpt}", date.as_str()),
        );
    }

    if patterns.assent.is_match(&excerpt) {
        return (
            CifStatus::ActiveOnAssent,
            "Comes into force on royal assent".to_string(),
        );
    }

    (CifStatus::ActiveOnAssent, excerpt)
}

fn head_chars(text: &str, count: usize) -> &str {
    match text.char_indices().nth(count) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

fn tail_chars(text: &str, count: usize) -> &str {
    let total = text.chars().count();
    if total <= count {
        return text;
    }
    match text.char_indices().nth(total - count) {
        Some((index, _)) => &text[index..],
        None => text,
    }
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn enacted_record() -> BillRecord {
        let mut record = BillRecord::new(BillKey::new("44-1", "C-11"), "Test Act");
        let assent = NaiveDate::from_ymd_opt(2024, 1, 20)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date");
        record.record_enactment(assent);
        record
    }

    #[test]
    fn extracts_standard_citation() {
        let text = "Some preamble text...\nS.C. 2024, c. 15\nMore content...";
        assert_eq!(
            extract_chapter_citation(text, None).as_deref(),
            Some("S.C. 2024, c. 15")
        );
    }

    #[test]
    fn normalizes_long_form_citation() {
        let text = "Statutes of Canada 2024 Chapter 42";
        assert_eq!(
            extract_chapter_citation(text, None).as_deref(),
            Some("S.C. 2024, c. 42")
        );
    }

    #[test]
    fn loose_citation_forms_are_normalized() {
        assert_eq!(
            extract_chapter_citation("Assented to as SC 2023 ch. 7", None).as_deref(),
            Some("S.C. 2023, c. 7")
        );
    }

    #[test]
    fn metadata_wins_over_text() {
        let citation =
            extract_chapter_citation("S.C. 2024, c. 15", Some("chapter: S.C. 2023, c. 3"));
        assert_eq!(citation.as_deref(), Some("S.C. 2023, c. 3"));
    }

    #[test]
    fn citation_beyond_leading_window_is_ignored() {
        let text = format!("{}S.C. 2024, c. 15", "x".repeat(CITATION_SCAN_CHARS + 10));
        assert_eq!(extract_chapter_citation(&text, None), None);
        assert_eq!(extract_chapter_citation("No chapter citation in this text", None), None);
    }

    #[test]
    fn order_in_council_waits_for_order() {
        let text = "Coming into Force\n\
                    This Act comes into force on a day to be fixed by Order in Council.";
        let (status, details) = analyze_coming_into_force(text);
        assert_eq!(status, CifStatus::WaitingForOrder);
        assert!(details.to_lowercase().contains("order"));
    }

    #[test]
    fn date_to_be_fixed_waits_for_order() {
        let text = "Commencement\n\
                    Sections 3 to 5 come into force on January 1, 2026 \
                    or on a later day to be fixed.";
        let (status, _) = analyze_coming_into_force(text);
        assert_eq!(status, CifStatus::WaitingForOrder);
    }

    #[test]
    fn explicit_date_is_fixed() {
        let text = "Coming into Force\nThis Act comes into force on January 1, 2025.";
        let (status, details) = analyze_coming_into_force(text);
        assert_eq!(status, CifStatus::FixedDate);
        assert!(details.contains("January"));
    }

    #[test]
    fn statutory_date_wordings_are_fixed() {
        let cases = [
            (
                "This Act comes into force on the first day of January, 2025.",
                "January, 2025",
            ),
            ("This Act comes into force on January 1st, 2025.", "January 1st, 2025"),
            ("This Act comes into force on the 1st day of July next.", "1st day of July"),
            ("Section 4 comes into force on 2025-04-01.", "2025-04-01"),
            ("This Act comes into force on May 15, 2026.", "May 15, 2026"),
        ];
        for (provision, date) in cases {
            let text = format!("Coming into Force\n{provision}");
            let (status, details) = analyze_coming_into_force(&text);
            assert_eq!(status, CifStatus::FixedDate, "{provision}");
            assert!(details.starts_with(&format!("Comes into force on {date}:")), "{details}");
        }
    }

    #[test]
    fn modal_may_is_not_a_date() {
        let text = "Coming into Force\nThis Act may be cited on royal assent.";
        let (status, details) = analyze_coming_into_force(text);
        assert_eq!(status, CifStatus::ActiveOnAssent);
        assert_eq!(details, "Comes into force on royal assent");
    }

    #[test]
    fn assent_language_is_active_on_assent() {
        let text = "Coming into Force\n\
                    This Act comes into force on the day on which it receives royal assent.";
        let (status, details) = analyze_coming_into_force(text);
        assert_eq!(status, CifStatus::ActiveOnAssent);
        assert!(details.to_lowercase().contains("royal assent"));
    }

    #[test]
    fn missing_section_defaults_to_assent_with_note() {
        let (status, details) =
            analyze_coming_into_force("Just some regular bill text without CIF section.");
        assert_eq!(status, CifStatus::ActiveOnAssent);
        assert!(details.contains("No Coming into Force section"));
    }

    #[test]
    fn unrecognized_section_keeps_excerpt() {
        let text = "Coming into Force\nThis Act applies to fiscal periods after its publication.";
        let (status, details) = analyze_coming_into_force(text);
        assert_eq!(status, CifStatus::ActiveOnAssent);
        assert!(details.contains("fiscal periods"));
    }

    #[test]
    fn only_the_tail_is_inspected() {
        let text = format!(
            "Coming into Force\nby order in council.{}",
            " filler".repeat(CIF_TAIL_CHARS)
        );
        let (status, details) = analyze_coming_into_force(&text);
        assert_eq!(status, CifStatus::ActiveOnAssent);
        assert_eq!(details, NO_CIF_SECTION_NOTE);
    }

    #[test]
    fn processing_happens_once() {
        let mut record = enacted_record();
        let enacted = EnactedText {
            text: "S.C. 2024, c. 15\nComing into Force\n\
                   This Act comes into force on the day on which it receives royal assent."
                .to_string(),
            metadata: None,
        };

        assert!(process_enacted_bill(&mut record, &enacted));
        assert_eq!(record.chapter_citation(), Some("S.C. 2024, c. 15"));
        assert_eq!(record.cif_status(), CifStatus::ActiveOnAssent);

        let other = EnactedText {
            text: "S.C. 2025, c. 1\nComing into Force\nby order in council".to_string(),
            metadata: None,
        };
        assert!(!process_enacted_bill(&mut record, &other));
        assert_eq!(record.chapter_citation(), Some("S.C. 2024, c. 15"));
        assert_eq!(record.cif_status(), CifStatus::ActiveOnAssent);
    }

    #[test]
    fn processing_without_citation_still_locks_cif() {
        let mut record = enacted_record();
        let enacted = EnactedText {
            text: "Coming into Force\nby order in council".to_string(),
            metadata: None,
        };
        assert!(process_enacted_bill(&mut record, &enacted));
        assert_eq!(record.chapter_citation(), None);
        assert_eq!(record.cif_status(), CifStatus::WaitingForOrder);
        assert!(!process_enacted_bill(&mut record, &enacted));
    }

    #[test]
    fn char_window_helpers_respect_boundaries() {
        assert_eq!(head_chars("é€abc", 2), "é€");
        assert_eq!(tail_chars("é€abc", 2), "bc");
        assert_eq!(tail_chars("ab", 5), "ab");
    }
}

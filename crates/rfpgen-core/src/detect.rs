//! Integration-count detection.
//!
//! Grammar, applied to a copy of the text with every `,` removed so that
//! `1,700` reads as `1700`:
//!
//! ```text
//! match   := "~"? WORD_BOUNDARY count WS* keyword WORD_BOUNDARY
//! count   := DIGIT{1,5}
//! tier 1  := ICO | ICOs | integration configuration object(s)
//! tier 2  := interface(s) | integration point(s) | flow(s) | connection(s)
//!            | touchpoint(s) | IFlow(s) | mapping(s) | adapter(s)
//! ```
//!
//! Matching is case-insensitive. Tier 1 is searched first; any tier 1 match
//! decides the result and tier 2 is not consulted. Within the deciding tier the
//! largest count wins. Counts preceding unrelated uses of the keywords (for
//! example "3 data flows") are accepted as false positives.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static TIER1_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)~?\b([0-9]{1,5})\s*(?:icos?|integration configuration objects?)\b").unwrap()
});

static TIER2_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)~?\b([0-9]{1,5})\s*(?:interfaces?|integration points?|flows?|connections?|touchpoints?|iflows?|mappings?|adapters?)\b",
    )
    .unwrap()
});

/// Which keyword tier produced the count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParameterKind {
    Icos,
    Interfaces,
}

impl ParameterKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Icos => "ICOs",
            Self::Interfaces => "interfaces",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DetectedParameter {
    pub count: u32,
    pub kind: ParameterKind,
}

impl DetectedParameter {
    /// User-facing notice describing a detection result.
    #[must_use]
    pub fn notice(detected: Option<&Self>) -> String {
        match detected {
            Some(p) => format!("Detected approximately {} {} in RFP.", p.count, p.kind),
            None => "No explicit integration count detected; using generic scope wording.".into(),
        }
    }
}

fn max_count(re: &Regex, text: &str) -> Option<u32> {
    re.captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse::<u32>().ok())
        .max()
}

/// Detect the integration count quoted in `text`, if any.
#[must_use]
pub fn detect_parameter(text: &str) -> Option<DetectedParameter> {
    let text = text.replace(',', "");
    if let Some(count) = max_count(&TIER1_RE, &text) {
        return Some(DetectedParameter {
            count,
            kind: ParameterKind::Icos,
        });
    }
    max_count(&TIER2_RE, &text).map(|count| DetectedParameter {
        count,
        kind: ParameterKind::Interfaces,
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn detected(count: u32, kind: ParameterKind) -> Option<DetectedParameter> {
        Some(DetectedParameter { count, kind })
    }

    #[test]
    fn tier1_beats_larger_tier2() {
        let text = "The landscape has 500 interfaces, of which 113 ICOs are in scope.";
        assert_eq!(detect_parameter(text), detected(113, ParameterKind::Icos));
    }

    #[test]
    fn largest_count_within_tier_wins() {
        let text = "Phase 1 covers 40 ICOs; overall ~150 ICOs to migrate and 12 iCos later.";
        assert_eq!(detect_parameter(text), detected(150, ParameterKind::Icos));
    }

    #[test]
    fn long_form_tier1_keyword() {
        let text = "approximately 87 Integration Configuration Objects";
        assert_eq!(detect_parameter(text), detected(87, ParameterKind::Icos));
    }

    #[test]
    fn tier2_keywords() {
        for (text, n) in [
            ("We run 25 interfaces today", 25),
            ("about 9 integration points", 9),
            ("~30 IFlows deployed", 30),
            ("14 mappings and 3 adapters", 14),
            ("7 touchpoints", 7),
            ("60 connections", 60),
            ("11 flows", 11),
        ] {
            assert_eq!(
                detect_parameter(text),
                detected(n, ParameterKind::Interfaces),
                "{text}"
            );
        }
    }

    #[test]
    fn thousands_separators_are_ignored() {
        let text = "The estate contains 1,700 interfaces.";
        assert_eq!(detect_parameter(text), detected(1700, ParameterKind::Interfaces));
    }

    #[test]
    fn no_space_between_count_and_keyword() {
        assert_eq!(detect_parameter("migrate 42ICOs"), detected(42, ParameterKind::Icos));
    }

    #[test]
    fn six_digit_numbers_do_not_match() {
        assert_eq!(detect_parameter("123456 interfaces"), None);
    }

    #[test]
    fn keyword_must_end_at_word_boundary() {
        assert_eq!(detect_parameter("3 flowsheets and 4 interfacesX"), None);
    }

    #[test]
    fn nothing_to_detect() {
        assert_eq!(detect_parameter("Migrate the platform by Q3 2025."), None);
        assert_eq!(detect_parameter(""), None);
    }

    #[test]
    fn notice_wording() {
        let p = DetectedParameter {
            count: 150,
            kind: ParameterKind::Icos,
        };
        assert_eq!(
            DetectedParameter::notice(Some(&p)),
            "Detected approximately 150 ICOs in RFP."
        );
        assert!(DetectedParameter::notice(None).starts_with("No explicit integration count"));
    }

    proptest! {
        #[test]
        fn tier1_always_wins(ico in 0u32..100_000, iface in 0u32..100_000) {
            let text = format!("{iface} interfaces and {ico} ICOs");
            prop_assert_eq!(detect_parameter(&text), detected(ico, ParameterKind::Icos));
        }

        #[test]
        fn max_of_tier2(counts in proptest::collection::vec(0u32..100_000, 1..6)) {
            let text: Vec<String> = counts.iter().map(|c| format!("{c} interfaces")).collect();
            let expected = counts.iter().copied().max();
            prop_assert_eq!(
                detect_parameter(&text.join("; ")).map(|p| p.count),
                expected
            );
        }

        #[test]
        fn keyword_free_text_is_undetected(text in "[a-hj-z .;]{0,200}") {
            prop_assert_eq!(detect_parameter(&text), None);
        }
    }
}

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// The five proposal sections, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    ExecutiveSummary,
    Objective,
    ScopeAndAssumptions,
    ResourceSchedule,
    CommunicationPlan,
}

impl Section {
    pub const ALL: [Self; 5] = [
        Self::ExecutiveSummary,
        Self::Objective,
        Self::ScopeAndAssumptions,
        Self::ResourceSchedule,
        Self::CommunicationPlan,
    ];

    /// Template token replaced by this section's text.
    #[must_use]
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::ExecutiveSummary => "<<EXEC_SUMMARY>>",
            Self::Objective => "<<OBJECTIVE>>",
            Self::ScopeAndAssumptions => "<<SCOPE_TEXT>>",
            Self::ResourceSchedule => "<<RESOURCE_SCHEDULE>>",
            Self::CommunicationPlan => "<<COMMUNICATION_PLAN>>",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::ExecutiveSummary => "Executive Summary",
            Self::Objective => "Objective",
            Self::ScopeAndAssumptions => "Scope & Assumptions",
            Self::ResourceSchedule => "Resource & Schedule",
            Self::CommunicationPlan => "Communication Plan",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedSection {
    pub section: Section,
    pub text: String,
}

impl GeneratedSection {
    #[must_use]
    pub fn new(section: Section, text: impl Into<String>) -> Self {
        Self {
            section,
            text: text.into(),
        }
    }
}

/// A header: the whole name wrapped in `*`/`**` emphasis, an emphasis opener
/// followed by the name and a colon, or a `#` heading line.
fn header_re(name: &str) -> Regex {
    Regex::new(&format!(
        r"(?im)(?:\*{{1,2}}[ \t]*{name}\b[ \t]*:?[ \t]*\*{{1,2}}[ \t]*:?|\*{{1,2}}[ \t]*{name}[ \t]*:|^[ \t]*#{{1,6}}[ \t]*{name}[ \t]*:?[ \t]*$)"
    ))
    .unwrap()
}

static EXEC_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| header_re("Executive Summary"));
static OBJECTIVE_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| header_re("Objective"));

/// Split the combined executive summary / objective response.
///
/// Returns `(executive_summary, objective)`. Without an "Objective" header the
/// whole response is the executive summary and the objective is empty.
/// Otherwise the summary is the text before the objective header, minus any
/// "Executive Summary" header.
#[must_use]
pub fn split_summary_objective(response: &str) -> (String, String) {
    let Some(obj) = OBJECTIVE_HEADER_RE.find(response) else {
        return (response.trim().to_owned(), String::new());
    };
    let before = &response[..obj.start()];
    let exec = match EXEC_HEADER_RE.find(before) {
        Some(m) => &before[m.end()..],
        None => before,
    };
    (exec.trim().to_owned(), response[obj.end()..].trim().to_owned())
}

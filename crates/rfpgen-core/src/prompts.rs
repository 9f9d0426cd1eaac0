//! Instruction templates for the four generation calls.
//!
//! Each template embeds the retrieved reference text as the style to imitate
//! and the RFP text as source content. The executive summary and objective
//! share one call whose response is split afterwards.

/// Inputs shared by every section prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub vendor: &'a str,
    /// Year the SAP partnership began, quoted in the executive summary.
    pub partner_since: Option<u16>,
    pub reference_text: &'a str,
    pub source_text: &'a str,
    /// Detected integration count; `None` selects generic wording.
    pub interface_count: Option<u32>,
}

impl PromptContext<'_> {
    fn project_context(&self) -> String {
        match self.interface_count {
            Some(n) => format!(
                "The ~{n} interfaces represent a scope of approximately {n} ICOs to migrate."
            ),
            None => "The project involves migration from the current SAP PI/PO integration \
                     platform to SAP Integration Suite."
                .into(),
        }
    }

    fn partnership(&self) -> String {
        self.partner_since
            .map_or_else(String::new, |year| format!(" (since {year})"))
    }

    fn scope_line(&self) -> String {
        match self.interface_count {
            Some(n) => format!(
                "Migration of approximately {n} interfaces from SAP PI/PO to SAP Integration Suite."
            ),
            None => "Migration of interfaces from SAP PI/PO to SAP Integration Suite.".into(),
        }
    }

    fn interface_cell(&self) -> String {
        self.interface_count
            .map_or_else(|| "as per the RFP inventory".into(), |n| n.to_string())
    }
}

#[must_use]
pub fn executive_summary_and_objective(ctx: &PromptContext<'_>) -> String {
    let vendor = ctx.vendor;
    let partnership = ctx.partnership();
    let project = ctx.project_context();
    let count = ctx.interface_cell();
    let reference = ctx.reference_text;
    let source = ctx.source_text;
    format!(
        r#"You are an expert SAP RFP proposal writer for **{vendor}**.

Follow the tone, structure, and style of the reference text below exactly.
Do not open with generic phrases such as "honored" or "delighted".
Always begin with:
**"{vendor} is pleased to submit proposal for the PI/PO Integration Migration..."**

---

### TASK
Write exactly two labeled sections.

**Executive Summary** (300-350 words)
- Start with "{vendor} is pleased to submit proposal for..."
- Mention the {vendor} SAP partnership{partnership}, global presence, and integration expertise.
- Include bullet points for key SAP competencies (reuse the reference list when the RFP gives none).
- Mention ISO 9000 quality assurance.
- Keep the language formal and client-centric, without a sales tone.

**Objective** (a short paragraph of about 100 words) followed by this table:

| No. | Migration of ICOs from SAP PI/PO to SAP Integration Suite as per details below |
|------|--------------------------------------------------------------------------------|
| 1 | No of Interfaces to be migrated from SAP PI/PO to SAP Integration Suite: {count} |

Then add:
**Interfaces Configuration Objects (ICOs) are listed in the Appendix.**

---

### PROJECT CONTEXT
{project}

### STYLE AND TONE REFERENCE
{reference}

### CONDENSED RFP CONTENT
{source}
"#
    )
}

#[must_use]
pub fn scope_and_assumptions(ctx: &PromptContext<'_>) -> String {
    let vendor = ctx.vendor;
    let scope = ctx.scope_line();
    let reference = ctx.reference_text;
    let source = ctx.source_text;
    format!(
        r"You are an SAP proposal writer at {vendor}.

Write a concise, professional section covering:
- In Scope
- Migration Project Prerequisites
- Assumptions
- Out of Scope

Match the tone of a real client proposal: crisp and business-like.
Give each part 4-8 bullet points of one or two lines.
Mention {scope} in the scope.
Refer to 'the client' instead of any past customer name.
Do not add closing summaries.

Reference Text:
{reference}

Condensed RFP:
{source}
"
    )
}

#[must_use]
pub fn resource_schedule_and_commercials(ctx: &PromptContext<'_>) -> String {
    let vendor = ctx.vendor;
    let reference = ctx.reference_text;
    let source = ctx.source_text;
    format!(
        r#"You are a senior SAP proposal writer at {vendor}.

Write the section titled **Resource Schedule and Commercials** in Markdown, following this structure exactly.

### Resource Schedule

Start with: "{vendor} proposes to deploy the following team with their indicative loading based on current understanding -"
Then a 4-column table (`{vendor} Resources`, `Location`, `Allocation`, `Resource Count`) with these roles:
Project Manager (Onshore, Fulltime), Integration Developer (Onshore, Fulltime),
Integration Developer (Offshore, Fulltime), Business Analyst (Offshore, Fulltime).

Then: "Recommended team from the client who need to be available during the project execution -"
Then a 3-column table (`Client Resources`, `Allocation`, `Resource Count`) with these roles:
Project Manager, SAP IT/Basis, Solution Architect, Integration Specialist,
Business Analysts/Functional SME, ABAP (If required).

### Commercials

Start with: "We propose to execute this project on T&M basis. Following is the resource estimation and indicative of total cost:"
Include the line: "Cost: $ (17 Weeks)"
Include the bold paragraph: "**Any new enhancements or changes identified during the project phase will be considered a change request and will be estimated separately**"
Add the header `Note:` followed by two bullets on resource/fee estimates and onsite billing.
Add the header `Timesheet, Invoices and Payment Terms` followed by four bullets on timesheets, invoicing, and payment.

Reference Material:
{reference}

Condensed RFP:
{source}
"#
    )
}

#[must_use]
pub fn communication_plan(ctx: &PromptContext<'_>) -> String {
    let vendor = ctx.vendor;
    let reference = ctx.reference_text;
    let source = ctx.source_text;
    format!(
        r"You are an expert SAP proposal writer at {vendor}.

Write a formal, client-ready **Communication Plan** section for an SAP migration RFP.
Describe how {vendor} and the client (use the client's name from the RFP when available)
will manage communication, meetings, reporting, and escalation.

Include:

1. Two or three lines on why clear, consistent communication matters for alignment and timely decisions.
2. **Exhibit: Daily Interaction**: a table with columns
   Activity | Communication Mode | Report Recipient/s | Frequency | Comments
   with rows for Kick-off Meeting, Daily Stand-up, Weekly Status Report, Steering Committee.
   Label every role as {vendor}-side or client-side.
3. **Issue Resolution and Escalation Procedure**: a short paragraph, then
   - **Table: Issue Management** (Task | Timescale | Responsibility)
   - a bulleted list of issue reporting guidelines naming responsibilities on both sides.
4. **Table: Issue Classification** with columns
   Problem Type | Definition | Reporting Process | Solution Responsible
   and rows for Low, Serious, and Critical.
5. **Table: Escalation Process** with columns
   Issue Type | Escalation Point | Escalation Criteria | Governance Role (Project Core Group)
   and rows for Project Delivery, Contract, Unresolved Delivery Issue, Program Management Issue.
6. One or two closing lines on transparency and collaboration between {vendor} and the client.

Formatting:
- Use Markdown headers and pipe tables.
- Keep the tone formal and enterprise-level.
- Aim for 700-900 words.

### STYLE AND TONE REFERENCE
{reference}

Condensed RFP:
{source}
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(count: Option<u32>) -> PromptContext<'static> {
        PromptContext {
            vendor: "Crave InfoTech",
            partner_since: Some(2007),
            reference_text: "REFERENCE-PASSAGE",
            source_text: "RFP-BODY",
            interface_count: count,
        }
    }

    #[test]
    fn every_prompt_embeds_reference_and_source() {
        let c = ctx(Some(150));
        for prompt in [
            executive_summary_and_objective(&c),
            scope_and_assumptions(&c),
            resource_schedule_and_commercials(&c),
            communication_plan(&c),
        ] {
            assert!(prompt.contains("REFERENCE-PASSAGE"));
            assert!(prompt.contains("RFP-BODY"));
            assert!(prompt.contains("Crave InfoTech"));
        }
    }

    #[test]
    fn detected_count_reaches_exec_and_scope_prompts() {
        let c = ctx(Some(150));
        let exec = executive_summary_and_objective(&c);
        assert!(exec.contains("approximately 150 ICOs to migrate"));
        assert!(exec.contains("SAP Integration Suite: 150 |"));
        assert!(scope_and_assumptions(&c).contains("approximately 150 interfaces"));
    }

    #[test]
    fn undetected_count_uses_generic_wording() {
        let c = ctx(None);
        let exec = executive_summary_and_objective(&c);
        assert!(exec.contains("involves migration from the current SAP PI/PO"));
        assert!(!exec.contains("~"));
        let scope = scope_and_assumptions(&c);
        assert!(scope.contains("Migration of interfaces from SAP PI/PO"));
    }

    #[test]
    fn partnership_year_is_optional() {
        let exec = executive_summary_and_objective(&ctx(None));
        assert!(exec.contains("Crave InfoTech SAP partnership (since 2007), global presence"));

        let c = PromptContext {
            partner_since: None,
            ..ctx(None)
        };
        let exec = executive_summary_and_objective(&c);
        assert!(exec.contains("Crave InfoTech SAP partnership, global presence"));
        assert!(!exec.contains("since"));
    }

    #[test]
    fn vendor_name_is_configurable() {
        let c = PromptContext {
            vendor: "Acme",
            ..ctx(None)
        };
        assert!(communication_plan(&c).contains("proposal writer at Acme"));
        assert!(resource_schedule_and_commercials(&c).contains("`Acme Resources`"));
    }
}

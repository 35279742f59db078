use crate::RetrievedRecord;

pub const TRAVEL_CONSULTANT_TEMPLATE: &str = "
You are TRIP NEXUS, a professional AI travel consultant.
{context}
Question:
{question}

Respond in 5 short bullet points.
Be concise and professional.
";

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    include_context: bool,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(TRAVEL_CONSULTANT_TEMPLATE, true)
    }
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>, include_context: bool) -> Self {
        Self {
            template: template.into(),
            include_context,
        }
    }

    pub fn include_context(&self) -> bool {
        self.include_context
    }

    /// With context disabled, or nothing retrieved, the prompt carries the raw
    /// question only.
    pub fn render(&self, question: &str, records: &[RetrievedRecord]) -> String {
        let context = if self.include_context && !records.is_empty() {
            let mut section = String::from("\nTravel records:\n");
            for record in records {
                section.push_str("- ");
                section.push_str(&record.document.content);
                section.push('\n');
            }
            section
        } else {
            String::new()
        };

        fill(&self.template, &[("{context}", &context), ("{question}", question)])
    }
}

/// Substitutes placeholders in one left-to-right scan, so text coming from a
/// value is never scanned again for another placeholder.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    'scan: while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        for &(placeholder, value) in values {
            if let Some(after) = tail.strip_prefix(placeholder) {
                out.push_str(value);
                rest = after;
                continue 'scan;
            }
        }
        out.push('{');
        rest = &tail[1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::PromptTemplate;
    use crate::{DocumentMetadata, RetrievedRecord, TravelDocument};

    fn record(content: &str) -> RetrievedRecord {
        RetrievedRecord {
            document: TravelDocument {
                id: 0,
                content: content.to_string(),
                metadata: DocumentMetadata::default(),
            },
            score: 0.8,
        }
    }

    #[test]
    fn question_is_interpolated_verbatim() {
        let prompt = PromptTemplate::default().render("Top hill stations in India", &[]);
        assert!(prompt.contains("Question:\nTop hill stations in India\n"));
        assert!(prompt.contains("You are TRIP NEXUS"));
        assert!(prompt.contains("Respond in 5 short bullet points."));
        assert!(!prompt.contains("Travel records:"));
        assert!(!prompt.contains("{context}"));
    }

    #[test]
    fn retrieved_records_are_listed_when_enabled() {
        let records = [record("Destination: Goa."), record("Destination: Manali.")];
        let prompt = PromptTemplate::default().render("where to go", &records);
        assert!(prompt.contains("Travel records:\n- Destination: Goa.\n- Destination: Manali.\n"));
    }

    #[test]
    fn records_are_dropped_when_context_is_disabled() {
        let template = PromptTemplate::new(super::TRAVEL_CONSULTANT_TEMPLATE, false);
        let prompt = template.render("where to go", &[record("Destination: Goa.")]);
        assert!(!prompt.contains("Destination: Goa."));
        assert_eq!(prompt, PromptTemplate::default().render("where to go", &[]));
    }

    #[test]
    fn placeholders_inside_values_stay_literal() {
        let records = [record("Destination: {question} Lodge.")];
        let prompt = PromptTemplate::default().render("Any {context} here?", &records);
        assert!(prompt.contains("- Destination: {question} Lodge.\n"));
        assert!(prompt.contains("Question:\nAny {context} here?\n"));
        assert_eq!(prompt.matches("Travel records:").count(), 1);
    }

    #[test]
    fn stray_braces_in_template_are_kept() {
        let template = PromptTemplate::new("{weather} {question} {", true);
        assert_eq!(template.render("Goa", &[]), "{weather} Goa {");
    }
}

//! Result notification formatting and sending
//!
//! Renders a result document into the fixed plain-text layout and
//! transmits it over the chat transport. A transport rejection is
//! surfaced to the caller - it is never equivalent to a successful
//! send, and the caller must leave the identifier undelivered.

use std::sync::Arc;

use tracing::debug;

use crate::db::schemas::{ResultDoc, SubjectScore};
use crate::transport::{ChatId, Transport};
use crate::types::Result;

/// Sends formatted result notifications over the transport
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn Transport>,
}

impl Notifier {
    /// Create a notifier over a transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Format and send a result to a chat
    pub async fn deliver(&self, chat: ChatId, result: &ResultDoc) -> Result<()> {
        let text = format_result(result);
        self.transport.send_text(chat, &text).await?;
        debug!(
            chat = chat,
            national_id = %result.national_id,
            "Result notification sent"
        );
        Ok(())
    }
}

/// Render a result into the notification text layout
pub fn format_result(result: &ResultDoc) -> String {
    let mut msg = format!(
        "Your examination result:\n\n\
         National ID: {}\n\
         Name: {}\n\
         Stage: {}\n\
         Grade: {}\n\
         Education dept: {}\n\
         School: {}\n\
         Notes: {}\n",
        result.national_id,
        result.name,
        result.stage,
        result.grade_level,
        result.education_dept,
        result.school_name,
        result.notes,
    );

    msg.push_str("\nMain subjects:\n");
    for subject in &result.main_subjects {
        msg.push_str(&subject_line(subject));
    }

    msg.push_str("\nAdditional subjects:\n");
    for subject in &result.additional_subjects {
        msg.push_str(&subject_line(subject));
    }

    msg.push_str(&format!(
        "\nTotal: {} / {}\n",
        fmt_score(result.total_score),
        fmt_score(result.total_out_of)
    ));
    msg.push_str(&format!("Percentage: {}%", fmt_score(result.percentage)));

    msg
}

fn subject_line(subject: &SubjectScore) -> String {
    format!(
        "{}: {} / {}\n",
        subject.name,
        fmt_score(subject.score),
        fmt_score(subject.out_of)
    )
}

/// Render a score without a trailing ".0" for integral values
fn fmt_score(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::Metadata;

    fn sample_result() -> ResultDoc {
        ResultDoc {
            _id: None,
            metadata: Metadata::default(),
            national_id: "12345".to_string(),
            name: "Aya".to_string(),
            stage: "secondary".to_string(),
            grade_level: "3".to_string(),
            education_dept: "East".to_string(),
            school_name: "X".to_string(),
            notes: "none".to_string(),
            main_subjects: vec![
                SubjectScore {
                    name: "Arabic".to_string(),
                    score: 76.5,
                    out_of: 80.0,
                },
                SubjectScore {
                    name: "Math".to_string(),
                    score: 95.0,
                    out_of: 100.0,
                },
            ],
            additional_subjects: vec![SubjectScore {
                name: "Religion".to_string(),
                score: 18.0,
                out_of: 20.0,
            }],
            total_score: 380.0,
            total_out_of: 400.0,
            percentage: 95.0,
        }
    }

    #[test]
    fn test_layout_contains_totals_and_identity() {
        let text = format_result(&sample_result());

        assert!(text.contains("National ID: 12345"));
        assert!(text.contains("Name: Aya"));
        assert!(text.contains("Total: 380 / 400"));
        assert!(text.contains("Percentage: 95%"));
    }

    #[test]
    fn test_subjects_render_in_stored_order() {
        let text = format_result(&sample_result());

        let arabic = text.find("Arabic: 76.5 / 80").unwrap();
        let math = text.find("Math: 95 / 100").unwrap();
        let religion = text.find("Religion: 18 / 20").unwrap();

        assert!(arabic < math);
        assert!(math < religion);

        let main_header = text.find("Main subjects:").unwrap();
        let additional_header = text.find("Additional subjects:").unwrap();
        assert!(main_header < arabic);
        assert!(math < additional_header);
        assert!(additional_header < religion);
    }

    #[test]
    fn test_fractional_scores_keep_precision() {
        assert_eq!(fmt_score(76.5), "76.5");
        assert_eq!(fmt_score(95.0), "95");
        assert_eq!(fmt_score(0.0), "0");
    }
}

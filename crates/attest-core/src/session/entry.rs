//! Conversation log entries and uploaded file records.

use serde::{Deserialize, Serialize};

/// A file successfully uploaded and processed by the extraction endpoint.
///
/// Created per successful upload and associated with the entry being
/// composed at upload time; never retroactively attached to a past entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Server-assigned storage name.
    pub filename: String,
    /// The name the file had on the user's machine.
    pub original_name: String,
    pub mimetype: String,
    pub size: u64,
    /// Textual content the extraction service pulled out of the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_content: Option<String>,
    /// Optional server-side analysis of the file content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
}

/// One answered question in the conversation log.
///
/// Entries are appended in strict chronological order and never mutated.
/// The full ordered sequence is the sole input to the next
/// step-advancement call; the client trusts no server-held cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEntry {
    pub question: String,
    pub answer: String,
    pub section: String,
    pub data_point: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<UploadedFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_serializes_camel_case_and_skips_empty_attachments() {
        let entry = ConversationEntry {
            question: "Since when are you certified?".to_string(),
            answer: "Certified organic since 2019".to_string(),
            section: "Certification History".to_string(),
            data_point: "certification_date".to_string(),
            attachments: Vec::new(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["dataPoint"], "certification_date");
        assert!(json.get("attachments").is_none());
    }

    #[test]
    fn uploaded_file_round_trips_optional_fields() {
        let raw = r#"{
            "filename": "a1b2.pdf",
            "originalName": "certificate.pdf",
            "mimetype": "application/pdf",
            "size": 1024,
            "extractedContent": "Organic certificate issued 2019"
        }"#;

        let file: UploadedFile = serde_json::from_str(raw).unwrap();
        assert_eq!(file.original_name, "certificate.pdf");
        assert!(file.extracted_content.is_some());
        assert!(file.analysis.is_none());
    }
}

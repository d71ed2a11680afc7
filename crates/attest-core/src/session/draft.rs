//! The answer being composed for the currently open question.

use crate::error::{AttestError, Result};
use crate::protocol::AnswerEnhancement;
use crate::session::UploadedFile;

/// Draft state for the open question: answer text, files uploaded while
/// composing, the side list of extracted snippets, and at most one
/// pending advisory enhancement.
///
/// Extracted text is never auto-inserted into the answer; pulling a
/// snippet into the text is an explicit call to [`insert_extracted`],
/// so a hand-typed answer cannot be silently corrupted.
///
/// [`insert_extracted`]: AnswerDraft::insert_extracted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerDraft {
    text: String,
    attachments: Vec<UploadedFile>,
    extracted: Vec<String>,
    enhancement: Option<AnswerEnhancement>,
}

impl AnswerDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replaces the draft text with user input.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn attachments(&self) -> &[UploadedFile] {
        &self.attachments
    }

    /// Extracted-content snippets available for explicit insertion.
    pub fn extracted(&self) -> &[String] {
        &self.extracted
    }

    /// Records a successfully uploaded file against this draft.
    ///
    /// Any extracted content is added to the side list only; the draft
    /// text is left untouched.
    pub fn record_upload(&mut self, file: UploadedFile) {
        if let Some(content) = &file.extracted_content {
            if !content.trim().is_empty() {
                self.extracted.push(content.clone());
            }
        }
        self.attachments.push(file);
    }

    /// Appends the extracted snippet at `index` to the draft text.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when the index is out of range.
    pub fn insert_extracted(&mut self, index: usize) -> Result<()> {
        let snippet = self.extracted.get(index).ok_or_else(|| {
            AttestError::validation(format!("No extracted content at index {}", index))
        })?;

        if self.text.trim().is_empty() {
            self.text = snippet.clone();
        } else {
            self.text = format!("{}\n{}", self.text, snippet);
        }
        Ok(())
    }

    pub fn enhancement(&self) -> Option<&AnswerEnhancement> {
        self.enhancement.as_ref()
    }

    /// Stores the latest advisory enhancement, replacing any previous one.
    pub fn set_enhancement(&mut self, enhancement: AnswerEnhancement) {
        self.enhancement = Some(enhancement);
    }

    /// Applies the pending enhancement: overwrites the draft text with
    /// `enhanced_answer` and discards the enhancement (one-shot).
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when there is no pending enhancement
    /// or it carries no rewritten answer.
    pub fn apply_enhancement(&mut self) -> Result<()> {
        let enhancement = self
            .enhancement
            .take()
            .ok_or_else(|| AttestError::validation("No enhancement to apply"))?;

        match enhancement.enhanced_answer {
            Some(enhanced) => {
                self.text = enhanced;
                Ok(())
            }
            None => Err(AttestError::validation(
                "Enhancement carries no rewritten answer",
            )),
        }
    }

    /// Discards the pending enhancement without touching the draft text.
    pub fn dismiss_enhancement(&mut self) {
        self.enhancement = None;
    }

    /// True when there is nothing to submit: no text and no attachments.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.attachments.is_empty()
    }

    /// Consumes the draft for submission, resetting it for the next
    /// question. The pending enhancement, if any, is discarded.
    pub fn take(&mut self) -> (String, Vec<UploadedFile>) {
        let taken = std::mem::take(self);
        (taken.text, taken.attachments)
    }
}

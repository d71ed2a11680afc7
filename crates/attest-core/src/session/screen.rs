//! Screen state for the guided intake flow.

use serde::{Deserialize, Serialize};
use strum::Display;

/// The screen the intake session is currently showing.
///
/// The flow is `CategorySelect` -> `Conversational` -> `Result`; the only
/// way back to `CategorySelect` is an explicit restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Screen {
    /// Initial screen: the user picks a category and subcategory.
    CategorySelect,
    /// The question/answer loop.
    Conversational,
    /// Terminal screen: intake complete, report pending or available.
    Result,
}

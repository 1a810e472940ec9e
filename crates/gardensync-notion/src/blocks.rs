//! Remote block schema and validation
//!
//! The backend exposes the session page's contents in the remote store's
//! native block representation. This module gives that representation an
//! explicit schema and validates it on ingest: everything downstream of
//! the read boundary sees only [`Task`] values, never duck-typed block
//! shapes.

use anyhow::{Context, Result};
use serde::Deserialize;

use gardensync_core::domain::{Task, TaskId};

/// Block type tag carried by to-do blocks
const TODO_BLOCK_TYPE: &str = "to_do";

/// One block from the remote page, as the backend serves it
///
/// Only `to_do` blocks become tasks; other block types (headings,
/// paragraphs, dividers) are skipped at the read boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteBlock {
    /// Remote store's block id; becomes the task id
    #[serde(default)]
    pub id: String,
    /// Block type tag
    #[serde(rename = "type", default)]
    pub block_type: String,
    /// Payload present on `to_do` blocks
    #[serde(default)]
    pub to_do: Option<TodoPayload>,
    /// Nesting depth the backend derives from block children
    #[serde(default)]
    pub indent: u32,
}

/// The to-do payload of a `to_do` block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoPayload {
    /// Title fragments; concatenated in order
    #[serde(default)]
    pub rich_text: Vec<RichTextFragment>,
    /// Completion state
    #[serde(default)]
    pub checked: bool,
}

/// One fragment of a block's rich text
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RichTextFragment {
    /// Plain-text rendering of the fragment
    #[serde(default)]
    pub plain_text: String,
}

/// Maps a validated block into a task
///
/// # Returns
/// `Ok(None)` for block types that are not to-dos; `Ok(Some(task))` for a
/// well-formed to-do block.
///
/// # Errors
/// Returns an error for a to-do block that is structurally invalid
/// (blank id, missing payload); callers skip such blocks with a warning
/// rather than aborting the whole snapshot.
pub fn task_from_block(block: &RemoteBlock) -> Result<Option<Task>> {
    if block.block_type != TODO_BLOCK_TYPE {
        return Ok(None);
    }

    let id = TaskId::try_from(block.id.clone())
        .context("to_do block carries a blank id")?;
    let payload = block
        .to_do
        .as_ref()
        .context("to_do block is missing its payload")?;

    let title: String = payload
        .rich_text
        .iter()
        .map(|fragment| fragment.plain_text.as_str())
        .collect();

    Ok(Some(Task {
        id,
        title,
        completed: payload.checked,
        indent: block.indent,
    }))
}

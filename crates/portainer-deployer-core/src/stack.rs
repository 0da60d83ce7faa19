// crates/portainer-deployer-core/src/stack.rs
// ============================================================================
// Module: Stack Records
// Description: Remote stack records and their fixed-width table rendering.
// Purpose: Present stack listings consistently for every selector.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! [`Stack`] mirrors the subset of the Portainer stack JSON the CLI displays.
//! Tables are a header row followed by one row per stack, in the columns
//! `Id`, `Endpoint Id`, `Name`, `Creation` and `Last Updated`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Timestamp layout for the creation and update columns.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[month]-[day]-[year repr:last_two] [hour]:[minute]");

// ============================================================================
// SECTION: Records
// ============================================================================

/// Stack record as returned by `GET /api/stacks`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stack {
    /// Remote stack identifier.
    pub id: u64,
    /// Endpoint the stack is deployed into.
    pub endpoint_id: u64,
    /// Stack name.
    pub name: String,
    /// Creation time in epoch seconds.
    #[serde(default)]
    pub creation_date: i64,
    /// User that created the stack.
    #[serde(default)]
    pub created_by: String,
    /// Last update time in epoch seconds.
    #[serde(default)]
    pub update_date: i64,
    /// User that last updated the stack.
    #[serde(default)]
    pub updated_by: String,
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders the table header row.
#[must_use]
pub fn render_header() -> String {
    format_columns("Id", "Endpoint Id", "Name", "Creation", "Last Updated")
}

/// Renders one table row for `stack`.
#[must_use]
pub fn render_row(stack: &Stack) -> String {
    let created = format!("{} by {}", format_timestamp(stack.creation_date), stack.created_by);
    let updated = format!("{} by {}", format_timestamp(stack.update_date), stack.updated_by);
    format_columns(
        &stack.id.to_string(),
        &stack.endpoint_id.to_string(),
        &stack.name,
        &created,
        &updated,
    )
}

/// Formats epoch seconds as `MM-DD-YY HH:MM` in UTC.
///
/// Out-of-range values are rendered as the raw number.
#[must_use]
pub fn format_timestamp(epoch_seconds: i64) -> String {
    OffsetDateTime::from_unix_timestamp(epoch_seconds)
        .ok()
        .and_then(|moment| moment.format(TIMESTAMP_FORMAT).ok())
        .unwrap_or_else(|| epoch_seconds.to_string())
}

/// Lays out the five table columns.
fn format_columns(id: &str, endpoint: &str, name: &str, created: &str, updated: &str) -> String {
    let line = format!("{id:<5} {endpoint:<12} {name:<30} {created:<30} {updated:<30}");
    line.trim_end().to_string()
}

//! Outcome of fire-and-forget tool actions

use serde::Serialize;
use tracing::debug;

/// Whether a detached tool was handed to the OS
///
/// `ok` means the process was started, not that the viewer or editor
/// finished what it was asked to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn success() -> Self {
        debug!("ActionResult::success: called");
        Self { ok: true, error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        debug!("ActionResult::failure: called");
        Self {
            ok: false,
            error: Some(error.into()),
        }
    }
}

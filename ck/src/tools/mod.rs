//! External citation tools
//!
//! The bridge shells out to `cite2md`, `cite2pdf`, `cite2bib`, `rg-sources`
//! and `draft2keys`. Query calls wait for the tool and classify failures as
//! [`ToolError`]s; action calls start the tool detached and return an
//! [`ActionResult`] instead of failing.

mod action;
mod bridge;
mod environment;
mod error;
mod runner;

pub use action::ActionResult;
pub use bridge::{ToolBridge, ToolPrograms};
pub use environment::{PAPERS_DIR_ENV, ToolEnvironment};
pub use error::ToolError;
pub use runner::{CommandOutput, CommandRunner, Invocation, ProcessRunner};

//! An embeddable command console for inspecting a process's managed memory
//! state, live or post-mortem.
//!
//! This crate provides the interpreter at the heart of such a console: input
//! lines are split on `;`, each sub-command is resolved against a registry of
//! command factories (with two free-text commands carved out of the general
//! parser), executed against the shared [`ExecutionContext`], and contained so
//! that a failing inspection never ends the session. Output flows through the
//! pluggable [`Console`] channel, which also powers clickable command
//! shortcuts backed by automatically reclaimed temporary aliases.
//!
//! The layers that actually read process or dump memory are not part of this
//! crate: embedders implement [`target::TargetInspector`] and install it with
//! [`ExecutionContext::set_target`]. Without one, inspection commands fail
//! with an invalid-operation error while the session keeps running.
//!
//! Example
//! ```
//! use dumpsh::console::BufferConsole;
//! use dumpsh::ExecutionContext;
//!
//! let (console, record) = BufferConsole::with_handle();
//! let mut context = ExecutionContext::new(Box::new(console));
//! context.execute_command(".newalias big !hq count size > 4096; .aliases");
//! assert!(record.borrow().output.contains("big -> !hq count size > 4096"));
//! ```

pub mod alias;
pub mod command;
pub mod commands;
pub mod console;
pub mod context;
pub mod error;
mod query;
pub mod target;

pub use alias::AliasTable;
pub use console::{BufferConsole, Console, TermConsole};
pub use context::{ExecutionContext, SessionConfig};
pub use error::SessionError;

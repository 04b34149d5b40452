use crate::alias::AliasTable;
use crate::command::{CommandFactory, ExecutableCommand};
use crate::commands::{self, HeapQuery, NewAlias};
use crate::console::Console;
use crate::error::{SessionError, error_category};
use crate::target::{SymbolCache, TargetInspector};
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, debug_span, trace};

/// Leading token that switches to free-text heap-query capture.
pub const HEAP_QUERY_COMMAND: &str = "!hq";
/// Leading token that switches to free-text alias-definition capture.
pub const CREATE_ALIAS_COMMAND: &str = ".newalias";
/// Leading token marking the whole sub-command as a comment.
const COMMENT_MARKER: &str = "#";
/// How deep alias expansion may re-enter the dispatcher before it is cut off.
const MAX_EXPANSION_DEPTH: usize = 32;

const NO_TARGET: &str = "no process or dump is loaded";

/// Session-wide toggles consumed by the dispatcher and the link writer.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Render clickable command links; when off, links degrade to plain text.
    pub hyperlinks: bool,
    /// Outstanding-temporary-alias count above which the dispatcher emits an
    /// advisory warning after a command. Advisory only, nothing is reclaimed
    /// early.
    pub temporary_alias_warning_threshold: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hyperlinks: true,
            temporary_alias_warning_threshold: 100,
        }
    }
}

/// The shared, mutable session state passed to every command, and the host of
/// the dispatch loop itself.
///
/// Exactly one context exists per session. Commands read and mutate it freely;
/// it outlives any single command and is finalized once, releasing the console.
pub struct ExecutionContext {
    /// Persistent and temporary aliases.
    pub aliases: AliasTable,
    /// Memoized symbol resolutions.
    pub symbols: SymbolCache,
    /// Pending `(name, body)` query macros added by `.define`.
    pub defines: Vec<(String, String)>,
    /// Id of the inspected process, when attached to a live one.
    pub process_id: Option<u32>,
    /// Path of the loaded dump file, when post-mortem.
    pub dump_path: Option<PathBuf>,
    /// OS id of the thread subsequent commands operate on.
    pub current_thread: Option<u64>,
    pub config: SessionConfig,
    /// Set by `q`; the REPL observes it after each input line.
    pub should_exit: bool,
    target: Option<Box<dyn TargetInspector>>,
    console: Box<dyn Console>,
    registry: Vec<Box<dyn CommandFactory>>,
    expansion_depth: usize,
    closed: bool,
}

impl ExecutionContext {
    /// Create a session over the given console with the default command set.
    pub fn new(console: Box<dyn Console>) -> Self {
        Self::with_registry(console, commands::default_registry())
    }

    /// Create a session with a custom set of command factories.
    pub fn with_registry(console: Box<dyn Console>, registry: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            aliases: AliasTable::new(),
            symbols: SymbolCache::new(),
            defines: Vec::new(),
            process_id: None,
            dump_path: None,
            current_thread: None,
            config: SessionConfig::default(),
            should_exit: false,
            target: None,
            console,
            registry,
            expansion_depth: 0,
            closed: false,
        }
    }

    /// Install the inspector for the attached process or loaded dump.
    pub fn set_target(&mut self, target: Box<dyn TargetInspector>) {
        self.target = Some(target);
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    /// The current target, or an invalid-operation failure when nothing is
    /// attached. Commands bubble this up with `?` and the dispatch boundary
    /// reports it like any other execution failure.
    pub fn target(&self) -> Result<&dyn TargetInspector, SessionError> {
        self.target
            .as_deref()
            .ok_or_else(|| SessionError::InvalidOperation(NO_TARGET.to_string()))
    }

    /// Resolve a code address through the session symbol cache.
    pub fn resolve_symbol(&mut self, address: u64) -> Result<Option<String>> {
        let target = self
            .target
            .as_deref()
            .ok_or_else(|| SessionError::InvalidOperation(NO_TARGET.to_string()))?;
        self.symbols.resolve(target, address)
    }

    /// Names of every registered command, in resolution order.
    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.iter().map(|factory| factory.name()).collect()
    }

    // --- output convenience API ---------------------------------------------

    pub fn write(&mut self, text: &str) {
        self.console.write(text);
    }

    pub fn write_line(&mut self, text: &str) {
        self.console.write_line(text);
    }

    pub fn write_error(&mut self, text: &str) {
        self.console.write_error(text);
    }

    pub fn write_warning(&mut self, text: &str) {
        self.console.write_warning(text);
    }

    pub fn write_info(&mut self, text: &str) {
        self.console.write_info(text);
    }

    /// Render `display` as a clickable shortcut for `command_text`.
    ///
    /// When link rendering is on, `command_text` is registered as a temporary
    /// alias and the display text is followed by the alias name in brackets;
    /// typing that name runs the command. When off, only the display text is
    /// rendered. Temporary aliases live until the end of the current top-level
    /// command.
    pub fn write_link(&mut self, display: &str, command_text: &str) {
        if self.config.hyperlinks {
            let alias = self.aliases.add_temporary(command_text);
            self.console.write_link(&format!("{display} [{alias}]"));
        } else {
            self.console.write(display);
        }
    }

    // --- dispatch -----------------------------------------------------------

    /// Execute one raw input line.
    ///
    /// The line is split on `;` into top-level commands; blank segments are
    /// discarded, the rest run left to right. A failure in one segment never
    /// prevents the following segments from running.
    pub fn execute_command(&mut self, input_line: &str) {
        debug!(input = input_line, "dispatching");
        for segment in input_line.split(';') {
            if segment.trim().is_empty() {
                continue;
            }
            self.dispatch_segment(segment, true);
        }
    }

    /// Re-enter the dispatcher from inside a command (alias execution).
    ///
    /// Resolution and containment work exactly as at the top level, but
    /// temporary-alias cleanup and the end-of-command notification are left to
    /// the enclosing top-level command. Depth is capped so a self-referential
    /// alias fails instead of overflowing the stack.
    pub fn execute_nested(&mut self, input_line: &str) -> Result<()> {
        if self.expansion_depth >= MAX_EXPANSION_DEPTH {
            return Err(SessionError::InvalidOperation(
                "alias expansion nested too deeply".to_string(),
            )
            .into());
        }
        self.expansion_depth += 1;
        for segment in input_line.split(';') {
            if segment.trim().is_empty() {
                continue;
            }
            self.dispatch_segment(segment, false);
        }
        self.expansion_depth -= 1;
        Ok(())
    }

    fn dispatch_segment(&mut self, line: &str, top_level: bool) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            return;
        }
        if tokens[0] != COMMENT_MARKER {
            match self.resolve(&tokens) {
                Some(command) => {
                    let span = debug_span!("command", name = tokens[0]);
                    let _guard = span.enter();
                    match command.execute(self) {
                        Ok(()) => {}
                        Err(err) => {
                            debug!(error = ?err, "command failed");
                            self.console
                                .write_error(&format!("{}: {:#}", error_category(&err), err));
                            self.console.write_error(
                                "the session may be in an inconsistent state; continue with caution",
                            );
                        }
                    }
                    if top_level
                        && self.config.hyperlinks
                        && self.aliases.temporary_len() > self.config.temporary_alias_warning_threshold
                    {
                        self.console.write_warning(&format!(
                            "{} temporary aliases are outstanding; `.dml off` stops minting them",
                            self.aliases.temporary_len()
                        ));
                    }
                }
                None => trace!(name = tokens[0], "no command matched"),
            }
        }
        if top_level {
            self.aliases.remove_temporary();
            self.console.command_ended();
        }
    }

    /// Turn a token list into a command instance.
    ///
    /// The two free-text commands are carved out before the general parser so
    /// flag-looking substrings in their trailing text are never misread as
    /// flags; everything else walks the factory registry in order.
    fn resolve(&self, tokens: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        let (name, args) = (tokens[0], &tokens[1..]);
        if name == HEAP_QUERY_COMMAND && !args.is_empty() {
            return Some(Box::new(HeapQuery::from_tokens(args[0], &args[1..])));
        }
        if name == CREATE_ALIAS_COMMAND && !args.is_empty() {
            return Some(Box::new(NewAlias::from_tokens(args[0], &args[1..])));
        }
        for factory in &self.registry {
            if let Some(command) = factory.try_create(self, name, args) {
                return Some(command);
            }
        }
        None
    }

    /// Finalize the session, releasing the console. Idempotent; also runs on
    /// drop so the console is released exactly once however the session ends.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.console.teardown();
        }
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        self.close();
    }
}

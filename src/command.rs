use crate::context::ExecutionContext;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};

/// Object-safe capability implemented by every command the console can run.
///
/// Side effects and failure modes are unconstrained: commands reach into live
/// process or dump memory and may fail in any way. The dispatch loop contains
/// whatever comes back, so implementations are free to use `?` liberally.
pub trait ExecutableCommand {
    /// Executes the command against the shared session context.
    fn execute(self: Box<Self>, context: &mut ExecutionContext) -> Result<()>;
}

/// Factory that tries to create a command from its leading token and the
/// remaining whitespace-separated arguments.
///
/// Returns `None` when the factory doesn't recognize `name`. Factories get a
/// read-only view of the context so resolution can consult session state (the
/// alias-execution factory looks names up in the alias table).
pub trait CommandFactory {
    /// Name the factory resolves, for listings.
    fn name(&self) -> &'static str;

    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(
        &self,
        context: &ExecutionContext,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;
}

/// Flag-style commands known to the console at compile time.
///
/// These are parsed with the [`argh`] crate (`FromArgs`); the free-text
/// commands (`!hq`, `.newalias`) bypass this path entirely and implement
/// [`ExecutableCommand`] directly.
pub(crate) trait ConsoleCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "!threads" or ".dml".
    fn name() -> &'static str;

    /// Executes the command using the shared session context.
    fn execute(self, context: &mut ExecutionContext) -> Result<()>;
}

impl<T: ConsoleCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, context: &mut ExecutionContext) -> Result<()> {
        ConsoleCommand::execute(*self, context)
    }
}

/// Stand-in produced when argh bails out of parsing (malformed flags or an
/// explicit help request): running it prints the usage text the parser
/// generated and nothing else. No error reaches the containment layer, which
/// keeps parse failures on the deliberate fail-quiet path.
pub(crate) struct ParserMessage {
    pub output: String,
}

impl ExecutableCommand for ParserMessage {
    fn execute(self: Box<Self>, context: &mut ExecutionContext) -> Result<()> {
        context.write_line(self.output.trim_end());
        Ok(())
    }
}

/// Factory for any [`ConsoleCommand`], keyed by its static name.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T: ConsoleCommand + 'static> CommandFactory for Factory<T> {
    fn name(&self) -> &'static str {
        T::name()
    }

    fn try_create(
        &self,
        _context: &ExecutionContext,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name != T::name() {
            return None;
        }
        Some(match T::from_args(&[name], args) {
            Ok(command) => Box::new(command),
            Err(EarlyExit { output, .. }) => Box::new(ParserMessage { output }),
        })
    }
}

use crate::command::{CommandFactory, ConsoleCommand, ExecutableCommand, Factory};
use crate::context::{CREATE_ALIAS_COMMAND, ExecutionContext, HEAP_QUERY_COMMAND};
use crate::error::SessionError;
use crate::query::{Query, expand_defines};
use crate::target::HeapObject;
use anyhow::Result;
use argh::FromArgs;
use regex::Regex;
use std::collections::BTreeMap;

/// The command set a fresh session starts with, in resolution order.
///
/// The alias-execution factory is last so a persistent alias can never shadow
/// a real command. The two free-text commands (`!hq`, `.newalias`) are carved
/// out by the dispatcher before this registry is consulted and therefore do
/// not appear here.
pub fn default_registry() -> Vec<Box<dyn CommandFactory>> {
    vec![
        Box::new(Factory::<Threads>::default()),
        Box::new(Factory::<SwitchThread>::default()),
        Box::new(Factory::<DumpObject>::default()),
        Box::new(Factory::<DumpHeap>::default()),
        Box::new(Factory::<Symbol>::default()),
        Box::new(Factory::<ListAliases>::default()),
        Box::new(Factory::<RemoveAlias>::default()),
        Box::new(Factory::<Define>::default()),
        Box::new(Factory::<ListDefines>::default()),
        Box::new(Factory::<Undefine>::default()),
        Box::new(Factory::<Dml>::default()),
        Box::new(Factory::<TargetInfo>::default()),
        Box::new(Factory::<Help>::default()),
        Box::new(Factory::<Quit>::default()),
        Box::new(AliasFactory),
    ]
}

/// Parse a hex address, with or without a `0x` prefix.
pub(crate) fn parse_address(text: &str) -> Result<u64, SessionError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(digits, 16)
        .map_err(|_| SessionError::InvalidArgument(format!("`{text}` is not a valid address")))
}

// --- free-text commands -----------------------------------------------------

/// Heap query, `!hq <format> <query…>`.
///
/// Built directly by the dispatcher from raw tokens, never by argh: the query
/// text is free-form and may contain anything, including flag-looking tokens.
pub struct HeapQuery {
    format: String,
    query: Vec<String>,
}

impl HeapQuery {
    pub(crate) fn from_tokens(format: &str, query: &[&str]) -> Self {
        Self {
            format: format.to_string(),
            query: query.iter().map(|token| token.to_string()).collect(),
        }
    }
}

impl ExecutableCommand for HeapQuery {
    fn execute(self: Box<Self>, context: &mut ExecutionContext) -> Result<()> {
        let expanded = expand_defines(&self.query, &context.defines);
        let query = Query::parse(&expanded)?;
        let objects = context.target()?.heap_objects()?;
        let selected: Vec<HeapObject> = objects
            .into_iter()
            .filter(|object| query.matches(object))
            .collect();

        match self.format.as_str() {
            "text" => {
                for object in &selected {
                    context.write_link(
                        &format!(
                            "0x{:x} {:>8} {}",
                            object.address, object.size, object.type_name
                        ),
                        &format!("!do 0x{:x}", object.address),
                    );
                    context.write_line("");
                }
                context.write_line(&format!("{} objects", selected.len()));
            }
            "json" => {
                let rendered = serde_json::to_string_pretty(&selected)?;
                context.write_line(&rendered);
            }
            "count" => context.write_line(&selected.len().to_string()),
            other => {
                return Err(SessionError::InvalidArgument(format!(
                    "unknown heap query format `{other}`; expected text, json or count"
                ))
                .into());
            }
        }
        Ok(())
    }
}

/// Persistent alias creation, `.newalias <name> <command…>`.
///
/// Like [`HeapQuery`], built directly from raw tokens so the alias body is
/// captured verbatim.
pub struct NewAlias {
    name: String,
    text: String,
}

impl NewAlias {
    pub(crate) fn from_tokens(name: &str, text: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            text: text.join(" "),
        }
    }
}

impl ExecutableCommand for NewAlias {
    fn execute(self: Box<Self>, context: &mut ExecutionContext) -> Result<()> {
        let NewAlias { name, text } = *self;
        context.aliases.set(&name, text)?;
        Ok(())
    }
}

// --- alias execution --------------------------------------------------------

/// Resolves a leading token against the alias table and re-dispatches its
/// expansion, with any extra tokens appended. This is how both persistent
/// aliases and the `a<N>` link shortcuts run.
pub struct AliasFactory;

impl CommandFactory for AliasFactory {
    fn name(&self) -> &'static str {
        "<alias>"
    }

    fn try_create(
        &self,
        context: &ExecutionContext,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        let expansion = context.aliases.get(name)?;
        let mut text = expansion.to_string();
        if !args.is_empty() {
            text.push(' ');
            text.push_str(&args.join(" "));
        }
        Some(Box::new(ExecuteAlias { text }))
    }
}

struct ExecuteAlias {
    text: String,
}

impl ExecutableCommand for ExecuteAlias {
    fn execute(self: Box<Self>, context: &mut ExecutionContext) -> Result<()> {
        context.execute_nested(&self.text)
    }
}

// --- flag-style commands ----------------------------------------------------

#[derive(FromArgs)]
/// List the managed threads of the current target.
pub struct Threads {}

impl ConsoleCommand for Threads {
    fn name() -> &'static str {
        "!threads"
    }

    fn execute(self, context: &mut ExecutionContext) -> Result<()> {
        let threads = context.target()?.threads()?;
        if threads.is_empty() {
            context.write_line("no managed threads");
            return Ok(());
        }
        for thread in &threads {
            let marker = if context.current_thread == Some(thread.os_id) {
                "*"
            } else {
                " "
            };
            let name = thread.name.as_deref().unwrap_or("<unnamed>");
            context.write_link(
                &format!(
                    "{marker} {:>4} osid {} {name}",
                    thread.managed_id, thread.os_id
                ),
                &format!("~ {}", thread.os_id),
            );
            context.write_line("");
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Show or switch the thread subsequent commands operate on.
pub struct SwitchThread {
    /// OS thread id to switch to; prints the current selection when omitted.
    #[argh(positional)]
    pub thread_id: Option<u64>,
}

impl ConsoleCommand for SwitchThread {
    fn name() -> &'static str {
        "~"
    }

    fn execute(self, context: &mut ExecutionContext) -> Result<()> {
        match self.thread_id {
            None => match context.current_thread {
                Some(id) => context.write_line(&format!("current thread: osid {id}")),
                None => context.write_line("no thread selected"),
            },
            Some(id) => {
                let known = context.target()?.threads()?.iter().any(|t| t.os_id == id);
                if !known {
                    return Err(
                        SessionError::InvalidArgument(format!("no thread with OS id {id}")).into(),
                    );
                }
                context.current_thread = Some(id);
            }
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Dump the heap object at an address.
pub struct DumpObject {
    /// object address, hex, with or without a 0x prefix.
    #[argh(positional)]
    pub address: String,
}

impl ConsoleCommand for DumpObject {
    fn name() -> &'static str {
        "!do"
    }

    fn execute(self, context: &mut ExecutionContext) -> Result<()> {
        let address = parse_address(&self.address)?;
        let object = context.target()?.object_at(address)?.ok_or_else(|| {
            SessionError::InvalidArgument(format!("0x{address:x} is not a live heap object"))
        })?;

        context.write_line(&format!("address: 0x{:x}", object.address));
        context.write_line(&format!("type:    {}", object.type_name));
        context.write_line(&format!("size:    {} bytes", object.size));
        if !object.references.is_empty() {
            context.write_line("references:");
            for reference in &object.references {
                let label = match context.target()?.object_at(*reference)? {
                    Some(referenced) => referenced.type_name,
                    None => "<free>".to_string(),
                };
                context.write_link(
                    &format!("  0x{reference:x} {label}"),
                    &format!("!do 0x{reference:x}"),
                );
                context.write_line("");
            }
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Walk the managed heap, optionally filtered by type.
pub struct DumpHeap {
    /// only show objects whose type name matches this regular expression.
    #[argh(option, long = "type")]
    pub type_filter: Option<String>,

    /// aggregate counts and sizes per type instead of listing every object.
    #[argh(switch)]
    pub stat: bool,
}

impl ConsoleCommand for DumpHeap {
    fn name() -> &'static str {
        "!dumpheap"
    }

    fn execute(self, context: &mut ExecutionContext) -> Result<()> {
        let filter = match &self.type_filter {
            Some(pattern) => Some(Regex::new(pattern).map_err(|err| {
                SessionError::InvalidArgument(format!("bad type pattern `{pattern}`: {err}"))
            })?),
            None => None,
        };
        let objects = context.target()?.heap_objects()?;
        let selected: Vec<&HeapObject> = objects
            .iter()
            .filter(|object| {
                filter
                    .as_ref()
                    .map_or(true, |re| re.is_match(&object.type_name))
            })
            .collect();

        if self.stat {
            let mut by_type: BTreeMap<&str, (usize, u64)> = BTreeMap::new();
            for object in &selected {
                let entry = by_type.entry(object.type_name.as_str()).or_insert((0, 0));
                entry.0 += 1;
                entry.1 += object.size;
            }
            let mut rows: Vec<_> = by_type.into_iter().collect();
            rows.sort_by(|a, b| b.1.1.cmp(&a.1.1));

            context.write_line(&format!("{:>8} {:>12}  type", "count", "total"));
            for (type_name, (count, total)) in rows {
                context.write_line(&format!("{count:>8} {total:>12}  {type_name}"));
            }
        } else {
            for object in &selected {
                context.write_link(
                    &format!(
                        "0x{:x} {:>8} {}",
                        object.address, object.size, object.type_name
                    ),
                    &format!("!do 0x{:x}", object.address),
                );
                context.write_line("");
            }
        }
        context.write_line(&format!("{} objects", selected.len()));
        Ok(())
    }
}

#[derive(FromArgs)]
/// Resolve a code address to a symbol name.
pub struct Symbol {
    /// address to resolve, hex.
    #[argh(positional)]
    pub address: String,
}

impl ConsoleCommand for Symbol {
    fn name() -> &'static str {
        "!sym"
    }

    fn execute(self, context: &mut ExecutionContext) -> Result<()> {
        let address = parse_address(&self.address)?;
        match context.resolve_symbol(address)? {
            Some(symbol) => context.write_line(&format!("0x{address:x} = {symbol}")),
            None => context.write_line(&format!("0x{address:x}: no matching symbol")),
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// List persistent aliases, and any temporaries still outstanding.
pub struct ListAliases {}

impl ConsoleCommand for ListAliases {
    fn name() -> &'static str {
        ".aliases"
    }

    fn execute(self, context: &mut ExecutionContext) -> Result<()> {
        let persistent: Vec<(String, String)> = context
            .aliases
            .persistent_entries()
            .into_iter()
            .map(|(name, expansion)| (name.to_string(), expansion.to_string()))
            .collect();
        if persistent.is_empty() {
            context.write_line("no aliases defined");
        } else {
            for (name, expansion) in &persistent {
                context.write_line(&format!("{name} -> {expansion}"));
            }
        }

        let temporary: Vec<(String, String)> = context
            .aliases
            .temporary_entries()
            .into_iter()
            .map(|(name, expansion)| (name.to_string(), expansion.to_string()))
            .collect();
        if !temporary.is_empty() {
            context.write_info(&format!("{} temporary aliases outstanding", temporary.len()));
            for (name, expansion) in &temporary {
                context.write_line(&format!("{name} -> {expansion}"));
            }
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Remove a persistent alias.
pub struct RemoveAlias {
    /// alias name to remove.
    #[argh(positional)]
    pub name: String,
}

impl ConsoleCommand for RemoveAlias {
    fn name() -> &'static str {
        ".rmalias"
    }

    fn execute(self, context: &mut ExecutionContext) -> Result<()> {
        if context.aliases.remove(&self.name) {
            Ok(())
        } else {
            Err(SessionError::InvalidArgument(format!(
                "no persistent alias named `{}`",
                self.name
            ))
            .into())
        }
    }
}

#[derive(FromArgs)]
/// Add a named macro usable inside heap queries.
pub struct Define {
    /// macro name.
    #[argh(positional)]
    pub name: String,

    /// replacement text substituted into queries.
    #[argh(positional, greedy)]
    pub body: Vec<String>,
}

impl ConsoleCommand for Define {
    fn name() -> &'static str {
        ".define"
    }

    fn execute(self, context: &mut ExecutionContext) -> Result<()> {
        if self.body.is_empty() {
            return Err(SessionError::InvalidArgument(
                "a define needs replacement text".to_string(),
            )
            .into());
        }
        let body = self.body.join(" ");
        match context.defines.iter().position(|(name, _)| *name == self.name) {
            Some(index) => context.defines[index].1 = body,
            None => context.defines.push((self.name, body)),
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// List the named query macros.
pub struct ListDefines {}

impl ConsoleCommand for ListDefines {
    fn name() -> &'static str {
        ".defines"
    }

    fn execute(self, context: &mut ExecutionContext) -> Result<()> {
        let defines = context.defines.clone();
        if defines.is_empty() {
            context.write_line("no defines");
        } else {
            for (name, body) in &defines {
                context.write_line(&format!("{name} = {body}"));
            }
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Remove a named query macro.
pub struct Undefine {
    /// macro name to remove.
    #[argh(positional)]
    pub name: String,
}

impl ConsoleCommand for Undefine {
    fn name() -> &'static str {
        ".undefine"
    }

    fn execute(self, context: &mut ExecutionContext) -> Result<()> {
        let before = context.defines.len();
        context.defines.retain(|(name, _)| *name != self.name);
        if context.defines.len() == before {
            return Err(
                SessionError::InvalidArgument(format!("no define named `{}`", self.name)).into(),
            );
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Show or toggle clickable command links in output.
pub struct Dml {
    /// either `on` or `off`; prints the current setting when omitted.
    #[argh(positional)]
    pub mode: Option<String>,
}

impl ConsoleCommand for Dml {
    fn name() -> &'static str {
        ".dml"
    }

    fn execute(self, context: &mut ExecutionContext) -> Result<()> {
        match self.mode.as_deref() {
            None => {
                let state = if context.config.hyperlinks { "on" } else { "off" };
                context.write_line(&format!("hyperlinks are {state}"));
            }
            Some("on") => context.config.hyperlinks = true,
            Some("off") => context.config.hyperlinks = false,
            Some(other) => {
                return Err(SessionError::InvalidArgument(format!(
                    "expected `on` or `off`, got `{other}`"
                ))
                .into());
            }
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Show what process or dump this session is attached to.
pub struct TargetInfo {}

impl ConsoleCommand for TargetInfo {
    fn name() -> &'static str {
        ".target"
    }

    fn execute(self, context: &mut ExecutionContext) -> Result<()> {
        if !context.has_target() {
            context.write_line("no process or dump is loaded");
            return Ok(());
        }
        let description = context.target()?.description();
        context.write_line(&format!("target:  {description}"));
        if let Some(pid) = context.process_id {
            context.write_line(&format!("process: {pid}"));
        }
        if let Some(path) = context.dump_path.clone() {
            context.write_line(&format!("dump:    {}", path.display()));
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// List every command this console understands.
pub struct Help {}

impl ConsoleCommand for Help {
    fn name() -> &'static str {
        ".help"
    }

    fn execute(self, context: &mut ExecutionContext) -> Result<()> {
        context.write_line("commands:");
        for name in context.command_names() {
            context.write_line(&format!("  {name}"));
        }
        context.write_line(&format!("  {HEAP_QUERY_COMMAND} <format> <query>..."));
        context.write_line(&format!("  {CREATE_ALIAS_COMMAND} <name> <command>..."));
        context.write_line("append --help to any command for its options");
        Ok(())
    }
}

#[derive(FromArgs)]
/// End the interactive session.
pub struct Quit {}

impl ConsoleCommand for Quit {
    fn name() -> &'static str {
        "q"
    }

    fn execute(self, context: &mut ExecutionContext) -> Result<()> {
        context.should_exit = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{BufferConsole, ConsoleRecord};
    use crate::error::error_category;
    use crate::target::fixtures::FakeTarget;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn context_with_target() -> (ExecutionContext, Rc<RefCell<ConsoleRecord>>) {
        let (console, record) = BufferConsole::with_handle();
        let mut context = ExecutionContext::new(Box::new(console));
        context.set_target(Box::new(FakeTarget::sample()));
        (context, record)
    }

    fn bare_context() -> (ExecutionContext, Rc<RefCell<ConsoleRecord>>) {
        let (console, record) = BufferConsole::with_handle();
        (ExecutionContext::new(Box::new(console)), record)
    }

    #[test]
    fn test_parse_address_accepts_both_prefixes() {
        assert_eq!(parse_address("0x1a").unwrap(), 26);
        assert_eq!(parse_address("1a").unwrap(), 26);
        assert_eq!(parse_address("0XFF").unwrap(), 255);
        assert!(parse_address("zz").is_err());
        assert!(parse_address("").is_err());
    }

    #[test]
    fn test_threads_lists_rows_with_switch_links() {
        let (mut context, record) = context_with_target();
        ConsoleCommand::execute(Threads {}, &mut context).unwrap();

        let output = record.borrow().output.clone();
        assert!(output.contains("main"));
        assert!(output.contains("<unnamed>"));
        // Each row's link shortcut switches to that thread.
        assert_eq!(context.aliases.get("a0"), Some("~ 4097"));
        assert_eq!(context.aliases.get("a1"), Some("~ 4098"));
    }

    #[test]
    fn test_switching_threads_stars_the_selection() {
        let (mut context, record) = context_with_target();
        ConsoleCommand::execute(
            SwitchThread {
                thread_id: Some(4097),
            },
            &mut context,
        )
        .unwrap();
        assert_eq!(context.current_thread, Some(4097));

        ConsoleCommand::execute(Threads {}, &mut context).unwrap();
        let output = record.borrow().output.clone();
        assert!(output.lines().any(|line| line.starts_with('*') && line.contains("main")));
    }

    #[test]
    fn test_switching_to_an_unknown_thread_fails() {
        let (mut context, _) = context_with_target();
        let err = ConsoleCommand::execute(
            SwitchThread {
                thread_id: Some(9999),
            },
            &mut context,
        )
        .unwrap_err();
        assert_eq!(error_category(&err), "invalid argument");
        assert_eq!(context.current_thread, None);
    }

    #[test]
    fn test_inspection_without_a_target_is_an_invalid_operation() {
        let (mut context, _) = bare_context();
        let err = ConsoleCommand::execute(Threads {}, &mut context).unwrap_err();
        assert_eq!(error_category(&err), "invalid operation");
    }

    #[test]
    fn test_dump_object_prints_fields_and_reference_links() {
        let (mut context, record) = context_with_target();
        ConsoleCommand::execute(
            DumpObject {
                address: "0x2000".to_string(),
            },
            &mut context,
        )
        .unwrap();

        let output = record.borrow().output.clone();
        assert!(output.contains("type:    Foo"));
        assert!(output.contains("size:    16 bytes"));
        assert!(output.contains("0x1000 System.String"));
        assert_eq!(context.aliases.get("a0"), Some("!do 0x1000"));
        assert_eq!(context.aliases.get("a1"), Some("!do 0x1040"));
    }

    #[test]
    fn test_dump_object_rejects_dead_addresses() {
        let (mut context, _) = context_with_target();
        let err = ConsoleCommand::execute(
            DumpObject {
                address: "0xdead".to_string(),
            },
            &mut context,
        )
        .unwrap_err();
        assert_eq!(error_category(&err), "invalid argument");
    }

    #[test]
    fn test_dump_heap_stat_aggregates_per_type() {
        let (mut context, record) = context_with_target();
        ConsoleCommand::execute(
            DumpHeap {
                type_filter: None,
                stat: true,
            },
            &mut context,
        )
        .unwrap();

        let output = record.borrow().output.clone();
        assert!(output.lines().any(|l| l.contains("2") && l.contains("72") && l.contains("System.String")));
        assert!(output.contains("4 objects"));
    }

    #[test]
    fn test_dump_heap_type_filter_is_a_regex() {
        let (mut context, record) = context_with_target();
        ConsoleCommand::execute(
            DumpHeap {
                type_filter: Some(r"^System\.".to_string()),
                stat: false,
            },
            &mut context,
        )
        .unwrap();
        assert!(record.borrow().output.contains("3 objects"));
    }

    #[test]
    fn test_dump_heap_rejects_bad_patterns() {
        let (mut context, _) = context_with_target();
        let err = ConsoleCommand::execute(
            DumpHeap {
                type_filter: Some("[unclosed".to_string()),
                stat: false,
            },
            &mut context,
        )
        .unwrap_err();
        assert_eq!(error_category(&err), "invalid argument");
    }

    #[test]
    fn test_sym_resolves_through_the_cache() {
        let (mut context, record) = context_with_target();
        ConsoleCommand::execute(
            Symbol {
                address: "0x5000".to_string(),
            },
            &mut context,
        )
        .unwrap();
        assert!(record.borrow().output.contains("0x5000 = Program.Main"));
        assert_eq!(context.symbols.len(), 1);
    }

    #[test]
    fn test_dml_toggles_link_rendering() {
        let (mut context, record) = bare_context();
        context.execute_command(".dml off");
        assert!(!context.config.hyperlinks);
        context.execute_command(".dml on");
        assert!(context.config.hyperlinks);
        context.execute_command(".dml");
        assert!(record.borrow().output.contains("hyperlinks are on"));

        let err = ConsoleCommand::execute(
            Dml {
                mode: Some("sideways".to_string()),
            },
            &mut context,
        )
        .unwrap_err();
        assert_eq!(error_category(&err), "invalid argument");
    }

    #[test]
    fn test_defines_substitute_into_heap_queries() {
        let (mut context, record) = context_with_target();
        context.execute_command(".define big size > 100");
        context.execute_command("!hq count big");
        // Only the 1024-byte array is bigger than 100 bytes.
        assert_eq!(record.borrow().output, "1\n");
    }

    #[test]
    fn test_redefining_replaces_the_body() {
        let (mut context, record) = bare_context();
        context.execute_command(".define big size > 100");
        context.execute_command(".define big size > 1");
        context.execute_command(".defines");
        assert_eq!(record.borrow().output, "big = size > 1\n");
    }

    #[test]
    fn test_define_without_a_body_is_rejected() {
        let (mut context, record) = bare_context();
        context.execute_command(".define big");
        assert!(record.borrow().errors[0].starts_with("invalid argument:"));
        assert!(context.defines.is_empty());
    }

    #[test]
    fn test_undefine_removes_and_complains_when_missing() {
        let (mut context, record) = bare_context();
        context.execute_command(".define big size > 100");
        context.execute_command(".undefine big");
        assert!(context.defines.is_empty());

        context.execute_command(".undefine big");
        assert!(record.borrow().errors[0].starts_with("invalid argument:"));
    }

    #[test]
    fn test_alias_lifecycle_through_the_dispatcher() {
        let (mut context, record) = bare_context();
        context.execute_command(".newalias foo !threads");
        context.execute_command(".aliases");
        assert!(record.borrow().output.contains("foo -> !threads"));

        context.execute_command(".rmalias foo");
        assert_eq!(context.aliases.get("foo"), None);

        context.execute_command(".rmalias foo");
        assert!(record.borrow().errors[0].starts_with("invalid argument:"));
    }

    #[test]
    fn test_reserved_alias_names_are_reported_with_their_category() {
        let (mut context, record) = bare_context();
        context.execute_command(".newalias a1 !threads");
        let record = record.borrow();
        assert!(record.errors[0].starts_with("reserved alias name:"));
        assert_eq!(context.aliases.get("a1"), None);
    }

    #[test]
    fn test_alias_invocation_appends_extra_arguments() {
        let (mut context, record) = context_with_target();
        context.execute_command(".newalias hqc !hq count");
        context.execute_command("hqc type == Foo");
        assert_eq!(record.borrow().output, "1\n");
    }

    #[test]
    fn test_help_lists_the_whole_surface() {
        let (mut context, record) = bare_context();
        context.execute_command(".help");
        let output = record.borrow().output.clone();
        assert!(output.contains("!threads"));
        assert!(output.contains("!dumpheap"));
        assert!(output.contains("!hq"));
        assert!(output.contains(".newalias"));
    }

    #[test]
    fn test_quit_sets_the_exit_flag() {
        let (mut context, _) = bare_context();
        context.execute_command("q");
        assert!(context.should_exit);
    }

    #[test]
    fn test_target_info_reports_attachment() {
        let (mut context, record) = bare_context();
        context.execute_command(".target");
        assert!(record.borrow().output.contains("no process or dump"));

        context.set_target(Box::new(FakeTarget::sample()));
        context.dump_path = Some("/tmp/app.dmp".into());
        context.execute_command(".target");
        let output = record.borrow().output.clone();
        assert!(output.contains("fake target"));
        assert!(output.contains("/tmp/app.dmp"));
    }
}

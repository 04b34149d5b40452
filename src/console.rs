use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Output channel the session writes through.
///
/// The context holds a reference it does not construct: the binary plugs in
/// [`TermConsole`], embedders and tests plug in [`BufferConsole`] or their own
/// implementation. All operations are synchronous and infallible from the
/// caller's perspective.
pub trait Console {
    /// Plain command output, no terminator appended.
    fn write(&mut self, text: &str);

    /// Command output followed by a line terminator.
    fn write_line(&mut self, text: &str);

    /// Error-severity output.
    fn write_error(&mut self, text: &str);

    /// Warning-severity output.
    fn write_warning(&mut self, text: &str);

    /// Informational output.
    fn write_info(&mut self, text: &str);

    /// Render an already-formatted clickable link.
    fn write_link(&mut self, rendered: &str);

    /// Called once per dispatched sub-command, success or failure.
    fn command_ended(&mut self);

    /// Release whatever the channel holds. Called exactly once at session
    /// teardown.
    fn teardown(&mut self) {}
}

/// Stdout/stderr-backed console used by the interactive binary.
#[derive(Default)]
pub struct TermConsole;

impl TermConsole {
    pub fn new() -> Self {
        TermConsole
    }
}

impl Console for TermConsole {
    fn write(&mut self, text: &str) {
        print!("{text}");
    }

    fn write_line(&mut self, text: &str) {
        println!("{text}");
    }

    fn write_error(&mut self, text: &str) {
        eprintln!("error: {text}");
    }

    fn write_warning(&mut self, text: &str) {
        eprintln!("warning: {text}");
    }

    fn write_info(&mut self, text: &str) {
        println!("info: {text}");
    }

    fn write_link(&mut self, rendered: &str) {
        print!("{rendered}");
    }

    fn command_ended(&mut self) {
        let _ = std::io::stdout().flush();
    }

    fn teardown(&mut self) {
        let _ = std::io::stdout().flush();
    }
}

/// Everything a [`BufferConsole`] has been asked to render, by channel.
#[derive(Debug, Default)]
pub struct ConsoleRecord {
    /// Concatenation of `write`, `write_line` and `write_link` payloads.
    pub output: String,
    /// One entry per `write_error` call.
    pub errors: Vec<String>,
    /// One entry per `write_warning` call.
    pub warnings: Vec<String>,
    /// One entry per `write_info` call.
    pub infos: Vec<String>,
    /// The rendered text of each `write_link` call.
    pub links: Vec<String>,
    /// Number of `command_ended` notifications received.
    pub commands_ended: usize,
    /// Number of `teardown` calls received.
    pub teardowns: usize,
}

/// Memory-backed console for embedding and tests.
///
/// The session owns the console, so the record is shared out through an
/// `Rc<RefCell<..>>` handle that stays readable after the session took the
/// console over.
pub struct BufferConsole {
    record: Rc<RefCell<ConsoleRecord>>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self {
            record: Rc::new(RefCell::new(ConsoleRecord::default())),
        }
    }

    /// Convenience: create a console and return (console, record_handle).
    pub fn with_handle() -> (Self, Rc<RefCell<ConsoleRecord>>) {
        let console = BufferConsole::new();
        let handle = console.record.clone();
        (console, handle)
    }
}

impl Default for BufferConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for BufferConsole {
    fn write(&mut self, text: &str) {
        self.record.borrow_mut().output.push_str(text);
    }

    fn write_line(&mut self, text: &str) {
        let mut record = self.record.borrow_mut();
        record.output.push_str(text);
        record.output.push('\n');
    }

    fn write_error(&mut self, text: &str) {
        self.record.borrow_mut().errors.push(text.to_string());
    }

    fn write_warning(&mut self, text: &str) {
        self.record.borrow_mut().warnings.push(text.to_string());
    }

    fn write_info(&mut self, text: &str) {
        self.record.borrow_mut().infos.push(text.to_string());
    }

    fn write_link(&mut self, rendered: &str) {
        let mut record = self.record.borrow_mut();
        record.output.push_str(rendered);
        record.links.push(rendered.to_string());
    }

    fn command_ended(&mut self) {
        self.record.borrow_mut().commands_ended += 1;
    }

    fn teardown(&mut self) {
        self.record.borrow_mut().teardowns += 1;
    }
}

//! `dumpsh` binary entry point: a rustyline REPL around the session context.

use dumpsh::console::TermConsole;
use dumpsh::context::ExecutionContext;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let mut context = ExecutionContext::new(Box::new(TermConsole::new()));
    let mut editor = DefaultEditor::new()?;

    println!("dumpsh managed-memory console. `.help` lists commands, `q` quits.");
    loop {
        let prompt = match context.current_thread {
            Some(id) => format!("{id}> "),
            None => "> ".to_string(),
        };
        match editor.readline(&prompt) {
            Ok(line) => {
                editor.add_history_entry(line.as_str())?;
                context.execute_command(&line);
                if context.should_exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("input error: {err}");
                break;
            }
        }
    }
    context.close();
    Ok(())
}

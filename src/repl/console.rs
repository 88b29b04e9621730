//! The interactive REPL loop: reads a line via [`super::prompt::Prompt`],
//! parses it with [`super::statement::parse_statement`] and dispatches it
//! against an open [`crate::table::Table`].
//!
//! Grounded on the teacher's `repl/console.rs`, rewritten to fix its
//! terminal-escape plumbing (the original called `?` inside functions that
//! didn't return `Result`) and narrowed to this core's statement set.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Once;

use crossterm::{
    cursor, execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use tracing::{error, info};

use super::{buffer, prompt, statement, status};
use crate::errors::Error;
use crate::table::{InsertResult, Table};

static INIT: Once = Once::new();

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

const BANNER: &str = r#"
Enter ".exit" to quit, ".btree" to inspect the tree, ".constants" for layout sizes.
"#;

/// Opens the database at `path` and runs the REPL until `.exit` or EOF.
pub fn start(path: &Path) -> Result<(), Error> {
    let mut table = Table::db_open(path)?;
    info!(path = %path.display(), "starting REPL session");

    terminal::enable_raw_mode()?;
    execute!(io::stdout(), cursor::EnableBlinking)?;

    INIT.call_once(|| {
        std::panic::set_hook(Box::new(|_| {
            let _ = terminal::disable_raw_mode();
        }));
    });

    let mut console = Console::new(&mut table);
    let result = console.run();

    terminal::disable_raw_mode()?;

    match table.db_close() {
        Ok(()) => info!("closed database"),
        Err(e) => error!("failed to close database cleanly: {e}"),
    }

    result
}

struct Console<'a> {
    table: &'a mut Table,
    prompt: prompt::Prompt,
    status: status::StatusBar,
}

impl<'a> Console<'a> {
    fn new(table: &'a mut Table) -> Self {
        Console {
            table,
            prompt: prompt::Prompt::new(),
            status: status::StatusBar::new(),
        }
    }

    fn run(&mut self) -> Result<(), Error> {
        echo(format!("{} {}\n", NAME, VERSION))?;
        echo_lines(BANNER.to_string())?;

        let mut continue_line = false;
        let mut buffer = buffer::Buffer::new();

        loop {
            if !continue_line {
                buffer.clear();
                self.prompt.start_prompt()?;
            }
            buffer.newline();
            continue_line = false;

            self.status.update(
                Some(self.prompt.x),
                Some(self.prompt.y),
                Some(buffer.len_total()),
            );
            self.status.draw()?;

            match self.prompt.readline(&mut buffer, &mut self.status) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(()),
                Err(e) => return Err(e.into()),
            }

            let input = buffer.build();
            if input.trim().is_empty() {
                continue;
            }
            self.prompt.append_line(&input);

            match statement::parse_statement(&input) {
                Ok(statement::Statement::Exit) => {
                    echo("\nBye\n".into())?;
                    return Ok(());
                }
                Ok(statement::Statement::Select) => match self.table.execute_select() {
                    Ok(rows) => {
                        let mut out = String::new();
                        for row in &rows {
                            out.push_str(&format!("({}, {}, {})\n", row.id, row.username, row.email));
                        }
                        out.push_str("Executed.\n");
                        echo_lines(out)?;
                    }
                    Err(e) => echo_error(format!("{}\n", e))?,
                },
                Ok(statement::Statement::Insert(record)) => match self.table.execute_insert(record) {
                    Ok(InsertResult::Success) => echo("Executed.\n".into())?,
                    Ok(InsertResult::DuplicateKey) => echo_error("Error: Duplicate key.\n".into())?,
                    Ok(InsertResult::TableFull) => echo_error("Error: Table full.\n".into())?,
                    Err(e) => echo_error(format!("{}\n", e))?,
                },
                Ok(statement::Statement::PrintBTree) => match self.table.print_leaf(0) {
                    Ok(out) => echo_lines(out)?,
                    Err(e) => echo_error(format!("{}\n", e))?,
                },
                Ok(statement::Statement::PrintConstants) => {
                    echo_lines(Table::print_constants())?
                }
                Err(e) => {
                    echo_error(format!("{}\n", e))?;
                    continue_line = false;
                }
            }
        }
    }
}

pub fn echo(s: String) -> io::Result<()> {
    let y = scroll_maybe(2)?;
    execute!(
        io::stdout(),
        cursor::MoveTo(0, y + 1),
        terminal::Clear(terminal::ClearType::UntilNewLine),
        Print(s)
    )?;
    io::stdout().flush()
}

pub fn echo_error(s: String) -> io::Result<()> {
    let y = scroll_maybe(2)?;
    execute!(
        io::stdout(),
        cursor::MoveTo(0, y + 1),
        terminal::Clear(terminal::ClearType::UntilNewLine),
        SetForegroundColor(Color::Red),
        Print(s),
        ResetColor,
    )?;
    io::stdout().flush()
}

pub fn echo_lines(s: String) -> io::Result<()> {
    for line in s.lines() {
        let y = scroll_maybe(2)?;
        execute!(
            io::stdout(),
            cursor::MoveTo(0, y + 1),
            terminal::Clear(terminal::ClearType::UntilNewLine),
            Print(line)
        )?;
    }
    io::stdout().flush()
}

pub fn echo_line(s: String) -> io::Result<()> {
    echo(s)
}

/// Scrolls the terminal up if printing `reserved_lines` more lines would
/// run past the bottom of the screen, returning the (possibly adjusted)
/// current row.
pub fn scroll_maybe(reserved_lines: u16) -> io::Result<u16> {
    let (_, y) = cursor::position()?;
    let (_, height) = terminal::size()?;
    let dest = y + reserved_lines;
    if dest >= height {
        let to_scroll = (dest - height).max(1);
        execute!(io::stdout(), terminal::ScrollUp(to_scroll))?;
        return Ok(y.saturating_sub(to_scroll));
    }
    Ok(y)
}

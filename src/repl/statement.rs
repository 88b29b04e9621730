//! Parses a line of REPL input into a [`Statement`].
//!
//! Scoped to this core's two data statements (`insert`, `select`) plus the
//! meta-commands used to inspect the database. Grounded on the teacher's
//! `sql/statement.rs` shape, but the statement set is narrowed to match
//! what the storage layer actually supports.

use crate::errors::Error;
use crate::record::Record;

#[derive(Debug, PartialEq)]
pub enum Statement {
    Insert(Record),
    Select,
    Exit,
    PrintBTree,
    PrintConstants,
}

/// Parses one line of input. Lines starting with `.` are meta-commands;
/// anything else is tried as a data statement.
pub fn parse_statement(line: &str) -> Result<Statement, Error> {
    let line = line.trim();

    if let Some(meta) = line.strip_prefix('.') {
        return parse_meta_command(meta);
    }

    let mut words = line.split_whitespace();
    match words.next() {
        Some("insert") => parse_insert(words),
        Some("select") => {
            if words.next().is_some() {
                return Err(Error::Syntax("select takes no arguments".into()));
            }
            Ok(Statement::Select)
        }
        Some(other) => Err(Error::Syntax(format!("unrecognized keyword at start of '{other}'"))),
        None => Err(Error::Syntax("empty statement".into())),
    }
}

fn parse_meta_command(meta: &str) -> Result<Statement, Error> {
    match meta {
        "exit" => Ok(Statement::Exit),
        "btree" => Ok(Statement::PrintBTree),
        "constants" => Ok(Statement::PrintConstants),
        other => Err(Error::Syntax(format!("unrecognized command '.{other}'"))),
    }
}

fn parse_insert<'a>(mut words: impl Iterator<Item = &'a str>) -> Result<Statement, Error> {
    let id = words
        .next()
        .ok_or_else(|| Error::Syntax("insert needs id, username, email".into()))?;
    let username = words
        .next()
        .ok_or_else(|| Error::Syntax("insert needs id, username, email".into()))?;
    let email = words
        .next()
        .ok_or_else(|| Error::Syntax("insert needs id, username, email".into()))?;
    if words.next().is_some() {
        return Err(Error::Syntax("insert takes exactly 3 arguments".into()));
    }

    let id: u32 = id
        .parse()
        .map_err(|_| Error::Syntax(format!("id must be a non-negative integer, got '{id}'")))?;

    Ok(Statement::Insert(Record::new(id, username, email)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_insert() {
        let stmt = parse_statement("insert 1 user1 person1@example.com").unwrap();
        assert_eq!(
            stmt,
            Statement::Insert(Record::new(1, "user1", "person1@example.com").unwrap())
        );
    }

    #[test]
    fn parses_select() {
        assert_eq!(parse_statement("select").unwrap(), Statement::Select);
    }

    #[test]
    fn parses_meta_commands() {
        assert_eq!(parse_statement(".exit").unwrap(), Statement::Exit);
        assert_eq!(parse_statement(".btree").unwrap(), Statement::PrintBTree);
        assert_eq!(parse_statement(".constants").unwrap(), Statement::PrintConstants);
    }

    #[test]
    fn rejects_negative_id() {
        let err = parse_statement("insert -1 user1 person1@example.com").unwrap_err();
        assert!(matches!(err, Error::Syntax(_)));
    }

    #[test]
    fn rejects_unknown_meta_command() {
        assert!(parse_statement(".nonsense").is_err());
    }

    #[test]
    fn rejects_wrong_insert_arity() {
        assert!(parse_statement("insert 1 user1").is_err());
    }
}

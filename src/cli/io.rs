//! JSON I/O handling for CLI
//!
//! - Input: one JSON query document from a file or stdin
//! - Output: one JSON line on stdout, `{"result": ...}` or
//!   `{"error": ..., "code": ...}`

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read a query document from `file`, or all of stdin when `None`
pub fn read_query(file: Option<&Path>) -> CliResult<Value> {
    let content = match file {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().lock().read_to_string(&mut buf)?;
            buf
        }
    };
    parse_query(&content)
}

fn parse_query(content: &str) -> CliResult<Value> {
    if content.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }
    Ok(serde_json::from_str(content)?)
}

/// Write a success line to stdout
pub fn write_result<T: Serialize>(result: &T) -> CliResult<()> {
    write_line(&serde_json::json!({ "result": result }))
}

/// Write an error line to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_line(&serde_json::json!({
        "error": message,
        "code": code
    }))
}

fn write_line(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

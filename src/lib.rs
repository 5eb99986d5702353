//! Nebula is a small statically-typed imperative toy language with a
//! tree-walk interpreter. Source code flows through three stages: the
//! [`scanner`](scanner) turns a source string into a flat token sequence,
//! the [`parser`](parser) turns the tokens into an abstract syntax tree and
//! a scope arena, and the [`interpreter`](interpreter) walks the tree to
//! produce a final [`Value`](value::Value).
//!
//! The language has four primitive types (`int`, `float`, `char`, `bool`),
//! lexical scoping through `begin ... end` blocks, `if`/`else` conditionals,
//! `while` loops, and `print`/`println` statements. Every statement is an
//! expression: a program's result is the value of its last statement.
//!
//! ```text
//! let int ctr = 0;
//! while (ctr != 10)
//!     ctr = (ctr + 1);
//! end
//! ctr;
//! ```
//!
//! There is no operator precedence: binary operators consume exactly the
//! operand that follows them, so chains associate left and parentheses group
//! explicitly.
//!
//! Scanning reports malformed literals as a [`ScanError`](error::ScanError),
//! parsing reports structural problems (unclosed blocks, missing operands,
//! invalid assignment targets) as a [`ParseError`](error::ParseError), and
//! evaluation reports semantic problems (type mismatches, unknown symbols,
//! reads of uninitialized variables, non-boolean conditions) as a
//! [`RuntimeError`](error::RuntimeError). Any of them ends the run and
//! surfaces as the single diagnostic of [`Error`](error::Error).
//!
//! Variables live in a scope arena owned by the parsed
//! [`Program`](parser::Program): each declaration creates a typed cell, and
//! every reference addresses it by scope and slot id, so an assignment is
//! visible to every holder of the cell. Dropping the program releases all of
//! it, on success and failure alike.

use std::fs;
use std::io::Write;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

pub mod block;
pub mod error;
pub mod interpreter;
pub mod node;
pub mod parser;
pub mod scanner;
pub mod symtable;
pub mod token;
pub mod value;

use error::Error;
use interpreter::Interpreter;
use parser::Parser;
use scanner::Scanner;
use value::Value;

/// The interpreter façade: feed it source strings, get final values or
/// diagnostics. `print` output goes to the writer it was created with.
pub struct Nebula<W: Write> {
    interpreter: Interpreter<W>,
}

impl<W: Write> Nebula<W> {
    pub fn new(out: W) -> Self {
        Nebula {
            interpreter: Interpreter::new(out),
        }
    }

    /// Runs a source string through the full pipeline and returns the
    /// program's result.
    pub fn run(&mut self, source: &str) -> Result<Value, Error> {
        let tokens = Scanner::new(source).scan_tokens()?;
        let program = Parser::new(tokens).parse()?;
        let value = self.interpreter.interpret(program)?;

        Ok(value)
    }

    /// Reads a source file and runs it.
    pub fn run_file(&mut self, path: &str) -> Result<Value, Error> {
        let source = fs::read_to_string(path).map_err(|_| Error::Source {
            path: path.to_string(),
        })?;

        self.run(&source)
    }

    /// Runs an interactive prompt. Each line is a fresh source string; the
    /// session survives errors, and history persists across sessions.
    pub fn run_prompt(&mut self) {
        let mut editor = DefaultEditor::new().expect("failed to initialize the line editor");
        let history = home::home_dir().map(|dir| dir.join(".nebula_history"));
        if let Some(path) = &history {
            let _ = editor.load_history(path);
        }

        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let _ = editor.add_history_entry(&line);

                    match self.run(&line) {
                        Ok(value) if !value.is_null() => println!("{value}"),
                        Ok(_) => {}
                        Err(error) => eprintln!("nebula error: {error}"),
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(_) => break,
            }
        }

        if let Some(path) = &history {
            let _ = editor.save_history(path);
        }
    }
}

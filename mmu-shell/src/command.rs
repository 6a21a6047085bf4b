//! Command line tokenizer and parser.

use mmu::{DataType, Pid};

use crate::error::{ShellError, ShellResult};

/// What `print` shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintTarget {
    /// The variable table of every process.
    Mmu,
    /// The global page table.
    Page,
    /// Live pids.
    Processes,
    /// Values of one variable, written `<pid>:<name>`.
    Variable { pid: Pid, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create {
        text_size: u32,
        data_size: u32,
    },
    Allocate {
        pid: Pid,
        name: String,
        data_type: DataType,
        count: u32,
    },
    Set {
        pid: Pid,
        name: String,
        offset: u32,
        values: Vec<String>,
    },
    Print(PrintTarget),
    Free {
        pid: Pid,
        name: String,
    },
    Terminate {
        pid: Pid,
    },
    Exit,
}

const CREATE_USAGE: &str = "create <text_size> <data_size>";
const ALLOCATE_USAGE: &str = "allocate <PID> <var_name> <data_type> <number_of_elements>";
const SET_USAGE: &str = "set <PID> <var_name> <offset> <value_0> <value_1> ... <value_N>";
const PRINT_USAGE: &str = "print <mmu|page|processes|PID:var_name>";
const FREE_USAGE: &str = "free <PID> <var_name>";
const TERMINATE_USAGE: &str = "terminate <PID>";

/// Split `text` on `delimiter`; a double-quoted run is one token, quotes removed.
pub fn split(text: &str, delimiter: char) -> Vec<String> {
    enum State {
        None,
        InWord,
        InString,
    }

    let mut state = State::None;
    let mut token = String::new();
    let mut tokens = Vec::new();
    for c in text.chars() {
        match state {
            State::None => {
                if c != delimiter {
                    token.clear();
                    if c == '"' {
                        state = State::InString;
                    } else {
                        state = State::InWord;
                        token.push(c);
                    }
                }
            }
            State::InWord => {
                if c == delimiter {
                    tokens.push(std::mem::take(&mut token));
                    state = State::None;
                } else {
                    token.push(c);
                }
            }
            State::InString => {
                if c == '"' {
                    tokens.push(std::mem::take(&mut token));
                    state = State::None;
                } else {
                    token.push(c);
                }
            }
        }
    }
    if !matches!(state, State::None) {
        tokens.push(token);
    }
    tokens
}

fn number(token: &str) -> ShellResult<u32> {
    token
        .parse()
        .map_err(|_| ShellError::Parse(token.to_string()))
}

impl Command {
    /// Parse one tokenized line. `Ok(None)` for a blank line.
    pub fn parse(tokens: &[String]) -> ShellResult<Option<Self>> {
        let (head, args) = match tokens.split_first() {
            Some(split) => split,
            None => return Ok(None),
        };
        let command = match head.as_str() {
            "create" => match args {
                [text, data] => Self::Create {
                    text_size: number(text)?,
                    data_size: number(data)?,
                },
                _ => return Err(ShellError::Usage(CREATE_USAGE)),
            },
            "allocate" => match args {
                [pid, name, data_type, count] => Self::Allocate {
                    pid: number(pid)?,
                    name: name.clone(),
                    data_type: data_type
                        .parse()
                        .map_err(|_| ShellError::Parse(data_type.clone()))?,
                    count: number(count)?,
                },
                _ => return Err(ShellError::Usage(ALLOCATE_USAGE)),
            },
            "set" => match args {
                [pid, name, offset, values @ ..] if !values.is_empty() => Self::Set {
                    pid: number(pid)?,
                    name: name.clone(),
                    offset: number(offset)?,
                    values: values.to_vec(),
                },
                _ => return Err(ShellError::Usage(SET_USAGE)),
            },
            "print" => match args {
                [object] => Self::Print(Self::print_target(object)?),
                _ => return Err(ShellError::Usage(PRINT_USAGE)),
            },
            "free" => match args {
                [pid, name] => Self::Free {
                    pid: number(pid)?,
                    name: name.clone(),
                },
                _ => return Err(ShellError::Usage(FREE_USAGE)),
            },
            "terminate" => match args {
                [pid] => Self::Terminate { pid: number(pid)? },
                _ => return Err(ShellError::Usage(TERMINATE_USAGE)),
            },
            "exit" => Self::Exit,
            _ => return Err(ShellError::UnknownCommand),
        };
        Ok(Some(command))
    }

    fn print_target(object: &str) -> ShellResult<PrintTarget> {
        let target = match object {
            "mmu" => PrintTarget::Mmu,
            "page" => PrintTarget::Page,
            "processes" | "process" => PrintTarget::Processes,
            _ => match object.split_once(':') {
                Some((pid, name)) if !name.is_empty() => PrintTarget::Variable {
                    pid: number(pid)?,
                    name: name.to_string(),
                },
                _ => return Err(ShellError::Usage(PRINT_USAGE)),
            },
        };
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(line: &str) -> ShellResult<Option<Command>> {
        Command::parse(&split(line, ' '))
    }

    #[test]
    fn split_on_spaces_and_quotes() {
        assert_eq!(split("  set 1024  x 0 ", ' '), ["set", "1024", "x", "0"]);
        assert_eq!(
            split("set 1024 name 0 \"hello world\" z", ' '),
            ["set", "1024", "name", "0", "hello world", "z"]
        );
        assert_eq!(split("\"unterminated", ' '), ["unterminated"]);
        assert!(split("", ' ').is_empty());
    }

    #[test]
    fn parse_commands() {
        assert_eq!(
            parse("create 2048 1024").unwrap(),
            Some(Command::Create {
                text_size: 2048,
                data_size: 1024
            })
        );
        assert_eq!(
            parse("allocate 1024 x int 10").unwrap(),
            Some(Command::Allocate {
                pid: 1024,
                name: "x".to_string(),
                data_type: DataType::Int,
                count: 10,
            })
        );
        assert_eq!(
            parse("set 1024 x 2 7 8").unwrap(),
            Some(Command::Set {
                pid: 1024,
                name: "x".to_string(),
                offset: 2,
                values: vec!["7".to_string(), "8".to_string()],
            })
        );
        assert_eq!(
            parse("print 1024:x").unwrap(),
            Some(Command::Print(PrintTarget::Variable {
                pid: 1024,
                name: "x".to_string()
            }))
        );
        assert_eq!(
            parse("print processes").unwrap(),
            Some(Command::Print(PrintTarget::Processes))
        );
        assert_eq!(parse("exit").unwrap(), Some(Command::Exit));
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(parse("launch"), Err(ShellError::UnknownCommand)));
        assert!(matches!(parse("create 10"), Err(ShellError::Usage(_))));
        assert!(matches!(parse("set 1024 x 0"), Err(ShellError::Usage(_))));
        assert!(matches!(parse("allocate 1024 x pointer 1"), Err(ShellError::Parse(_))));
        assert!(matches!(parse("free abc x"), Err(ShellError::Parse(_))));
        assert!(matches!(parse("print 1024:"), Err(ShellError::Usage(_))));
    }
}

//! Table-driven prompting.
//!
//! A form is a slice of [`FieldSpec`]s. The runner asks each field in order,
//! skips fields whose `when` predicate rejects the answers so far, and keeps
//! re-asking a field until its input validates.

use std::io::{BufRead, Write};
use task_tracker_core::config::Palette;
use task_tracker_core::error::AppError;
use task_tracker_core::model::parse_due_date;
use time::Date;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text; `required` holds the message shown when left blank.
    Text { required: Option<&'static str> },
    Confirm { default: bool },
    /// One of `choices`, by name or 1-based number; blank picks `default`.
    Choice {
        choices: Vec<&'static str>,
        default: usize,
    },
    /// A 1-based position in a list of `len` items.
    Index { len: usize },
    Date,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub message: String,
    pub kind: FieldKind,
    /// Ask this field only when the predicate accepts the earlier answers.
    pub when: Option<fn(&Answers) -> bool>,
}

impl FieldSpec {
    pub fn new(name: &'static str, message: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name,
            message: message.into(),
            kind,
            when: None,
        }
    }

    pub fn when(mut self, predicate: fn(&Answers) -> bool) -> Self {
        self.when = Some(predicate);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    Flag(bool),
    Choice(&'static str),
    Index(usize),
    Date(Date),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Answers {
    values: Vec<(&'static str, Answer)>,
}

impl Answers {
    pub fn get(&self, name: &str) -> Option<&Answer> {
        self.values
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, answer)| answer)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Answer::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(Answer::Flag(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn choice(&self, name: &str) -> Option<&'static str> {
        match self.get(name) {
            Some(Answer::Choice(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn index(&self, name: &str) -> Option<usize> {
        match self.get(name) {
            Some(Answer::Index(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn date(&self, name: &str) -> Option<Date> {
        match self.get(name) {
            Some(Answer::Date(value)) => Some(*value),
            _ => None,
        }
    }

    fn push(&mut self, name: &'static str, answer: Answer) {
        self.values.push((name, answer));
    }
}

/// Checks raw input against a field kind.
pub fn validate(kind: &FieldKind, raw: &str) -> Result<Answer, String> {
    let trimmed = raw.trim();
    match kind {
        FieldKind::Text { required } => match required {
            Some(message) if trimmed.is_empty() => Err((*message).to_string()),
            _ => Ok(Answer::Text(trimmed.to_string())),
        },
        FieldKind::Confirm { default } => match trimmed.to_ascii_lowercase().as_str() {
            "" => Ok(Answer::Flag(*default)),
            "y" | "yes" => Ok(Answer::Flag(true)),
            "n" | "no" => Ok(Answer::Flag(false)),
            _ => Err("Please answer y or n".to_string()),
        },
        FieldKind::Choice { choices, default } => {
            if trimmed.is_empty() {
                return choices
                    .get(*default)
                    .copied()
                    .map(Answer::Choice)
                    .ok_or_else(|| "No default choice".to_string());
            }
            if let Ok(number) = trimmed.parse::<usize>()
                && let Some(choice) = number.checked_sub(1).and_then(|index| choices.get(index))
            {
                return Ok(Answer::Choice(*choice));
            }
            choices
                .iter()
                .find(|choice| choice.eq_ignore_ascii_case(trimmed))
                .copied()
                .map(Answer::Choice)
                .ok_or_else(|| format!("Please choose one of: {}", choices.join(", ")))
        }
        FieldKind::Index { len } => match trimmed.parse::<usize>() {
            Ok(number) if (1..=*len).contains(&number) => Ok(Answer::Index(number)),
            _ => Err("Please enter a valid task number".to_string()),
        },
        FieldKind::Date => parse_due_date(trimmed)
            .map(Answer::Date)
            .map_err(|err| err.message().to_string()),
    }
}

fn hint(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Confirm { default: true } => " (Y/n)".to_string(),
        FieldKind::Confirm { default: false } => " (y/N)".to_string(),
        FieldKind::Choice { choices, default } => {
            let default = choices.get(*default).copied().unwrap_or_default();
            format!(" ({}) [{}]", choices.join("/"), default)
        }
        _ => String::new(),
    }
}

fn io_error(err: std::io::Error) -> AppError {
    AppError::io(err.to_string())
}

const NOT_TEXT_MESSAGE: &str = "Input must be valid UTF-8 text";

/// Reads one line without its terminator; `None` at end of input.
///
/// A line that is not UTF-8 comes back as `Some(Err(message))` so the
/// caller can re-ask instead of giving up on the stream.
pub fn read_line<R: BufRead>(input: &mut R) -> Result<Option<Result<String, String>>, AppError> {
    let mut raw = Vec::new();
    let bytes = input.read_until(b'\n', &mut raw).map_err(io_error)?;
    if bytes == 0 {
        return Ok(None);
    }
    while matches!(raw.last(), Some(b'\n' | b'\r')) {
        raw.pop();
    }
    Ok(Some(
        String::from_utf8(raw).map_err(|_| NOT_TEXT_MESSAGE.to_string()),
    ))
}

/// Runs a form. Returns `None` when input ends before every field is answered.
pub fn run_fields<R: BufRead, W: Write>(
    fields: &[FieldSpec],
    input: &mut R,
    output: &mut W,
    palette: &Palette,
) -> Result<Option<Answers>, AppError> {
    let mut answers = Answers::default();

    for field in fields {
        if let Some(when) = field.when
            && !when(&answers)
        {
            continue;
        }

        loop {
            write!(
                output,
                "{} {}{} ",
                palette.paint(palette.success, "?"),
                field.message,
                palette.mutedize(&hint(&field.kind))
            )
            .map_err(io_error)?;
            output.flush().map_err(io_error)?;

            let Some(line) = read_line(input)? else {
                return Ok(None);
            };

            match line.and_then(|line| validate(&field.kind, &line)) {
                Ok(answer) => {
                    answers.push(field.name, answer);
                    break;
                }
                Err(message) => {
                    writeln!(output, "{}", palette.paint(palette.error, &format!(">> {message}")))
                        .map_err(io_error)?;
                }
            }
        }
    }

    Ok(Some(answers))
}

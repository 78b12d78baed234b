//! Immutable field contracts.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::field::{Field, FieldRole, FieldType};
use crate::error::{Error, Result};
use crate::record::Record;

/// An ordered, validated declaration of an agent's input and output fields
/// plus the natural-language instruction shown to it.
///
/// Field names are unique, so input and output sets are disjoint. The field
/// list cannot be changed after construction; only the instruction text can
/// be replaced, which produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldContract {
    fields: Vec<Field>,
    instructions: String,
}

impl FieldContract {
    /// Validates `fields` and attaches the default instruction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a name is empty, repeated, or
    /// not an identifier (`[A-Za-z_][A-Za-z0-9_]*`).
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if field.name.trim().is_empty() {
                return Err(Error::configuration("field names cannot be empty"));
            }
            if !is_identifier(&field.name) {
                return Err(Error::configuration(format!(
                    "field name `{}` is not an identifier",
                    field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Error::configuration(format!(
                    "field `{}` is declared more than once",
                    field.name
                )));
            }
        }
        let instructions = default_instructions(&fields);
        Ok(Self {
            fields,
            instructions,
        })
    }

    /// Returns a copy with different instructions.
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Instruction text.
    #[must_use]
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// All fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Input fields in declaration order.
    pub fn input_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_input())
    }

    /// Output fields in declaration order.
    pub fn output_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_output())
    }

    /// Input field names in declaration order.
    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.input_fields().map(|f| f.name.as_str())
    }

    /// Output field names in declaration order.
    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.output_fields().map(|f| f.name.as_str())
    }

    /// Checks that `record` supplies every input field with a value of the
    /// declared type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContractViolation`] naming the first offending field.
    pub fn check_inputs(&self, agent: &str, record: &Record) -> Result<()> {
        for field in self.input_fields() {
            let value = record.get(&field.name).ok_or_else(|| {
                Error::contract(agent, format!("missing input field `{}`", field.name))
            })?;
            if field.ty.coerce(value).is_none() {
                return Err(Error::contract(
                    agent,
                    format!(
                        "input field `{}` expects {}, got {value}",
                        field.name, field.ty
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Coerces every declared output in `record` to its declared type.
    /// Undeclared keys (such as a `reasoning` trace) are kept as-is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContractViolation`] if an output is missing or not
    /// coercible to its type.
    pub fn conform_outputs(&self, agent: &str, mut record: Record) -> Result<Record> {
        for field in self.output_fields() {
            let value = record.get(&field.name).ok_or_else(|| {
                Error::contract(agent, format!("missing output field `{}`", field.name))
            })?;
            let coerced = field.ty.coerce(value).ok_or_else(|| {
                Error::contract(
                    agent,
                    format!(
                        "output field `{}` expects {}, got {value}",
                        field.name, field.ty
                    ),
                )
            })?;
            record.insert(field.name.clone(), coerced);
        }
        Ok(record)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Instruction derived purely from the field names:
/// "Given the fields `a`, `b`, produce the fields `c`."
#[must_use]
pub fn default_instructions(fields: &[Field]) -> String {
    let list = |role: FieldRole| {
        fields
            .iter()
            .filter(|f| f.role == role)
            .map(|f| format!("`{}`", f.name))
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "Given the fields {}, produce the fields {}.",
        list(FieldRole::Input),
        list(FieldRole::Output)
    )
}

impl fmt::Display for FieldContract {
    /// Compact form: `question, context -> ready`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let render = |fields: Vec<&Field>| {
            fields
                .iter()
                .map(|field| match field.ty {
                    FieldType::Str => field.name.clone(),
                    ty => format!("{}: {ty}", field.name),
                })
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "{} -> {}",
            render(self.input_fields().collect()),
            render(self.output_fields().collect())
        )
    }
}

impl FromStr for FieldContract {
    type Err = Error;

    /// Parses the compact form `"question, unit -> answer: float"`.
    ///
    /// Each side is a comma-separated list of `name` or `name: type`.
    /// Untyped fields are strings. Commas inside brackets belong to the type.
    fn from_str(s: &str) -> Result<Self> {
        let (inputs, outputs) = s.split_once("->").ok_or_else(|| {
            Error::configuration(format!("signature `{s}` is missing `->`"))
        })?;
        if outputs.contains("->") {
            return Err(Error::configuration(format!(
                "signature `{s}` has more than one `->`"
            )));
        }

        let inputs = parse_side(inputs, FieldRole::Input)?;
        let outputs = parse_side(outputs, FieldRole::Output)?;
        if outputs.is_empty() {
            return Err(Error::configuration(format!(
                "signature `{s}` declares no output fields"
            )));
        }

        Self::new(inputs.into_iter().chain(outputs).collect())
    }
}

fn parse_side(side: &str, role: FieldRole) -> Result<Vec<Field>> {
    split_top_level(side)
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (name, ty) = match item.split_once(':') {
                Some((name, ty)) => {
                    let parsed = FieldType::parse(ty).ok_or_else(|| {
                        Error::configuration(format!(
                            "unknown type `{}` for field `{}`",
                            ty.trim(),
                            name.trim()
                        ))
                    })?;
                    (name.trim(), parsed)
                }
                None => (item, FieldType::Str),
            };
            Ok(match role {
                FieldRole::Input => Field::input(name, ty),
                FieldRole::Output => Field::output(name, ty),
            })
        })
        .collect()
}

fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

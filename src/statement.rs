//! Named-placeholder SQL rendering.
//!
//! Templates reference parameters as `:name`. Rendering is a single,
//! non-recursive substitution pass: text produced by a substitution is never
//! scanned again.
//!
//! String values are wrapped in single quotes without escaping embedded
//! quotes. Source values are trusted identifiers and free text from the
//! extract; callers feeding untrusted text must sanitize it first.

use indexmap::IndexMap;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// How a parameter value is written into the statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
        }
    }
}

impl std::str::FromStr for ParamKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" | "str" => Ok(ParamKind::String),
            "number" | "num" => Ok(ParamKind::Number),
            other => Err(format!("Unknown parameter kind: '{}'", other)),
        }
    }
}

/// A typed parameter value. `value` is `None` when the source had no value.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub kind: ParamKind,
    pub value: Option<String>,
}

impl Param {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            kind: ParamKind::String,
            value: Some(value.into()),
        }
    }

    pub fn number(value: impl Into<String>) -> Self {
        Self {
            kind: ParamKind::Number,
            value: Some(value.into()),
        }
    }

    pub fn null(kind: ParamKind) -> Self {
        Self { kind, value: None }
    }
}

/// Parameter mapping, keyed by placeholder name without the leading colon
pub type Params = IndexMap<String, Param>;

/// SQL text plus the parameters it is rendered with
#[derive(Debug, Clone, PartialEq)]
pub struct StatementTemplate {
    pub sql: &'static str,
    pub params: Params,
}

impl StatementTemplate {
    pub fn new(sql: &'static str) -> Self {
        Self {
            sql,
            params: Params::new(),
        }
    }

    pub fn bind(mut self, name: &str, param: Param) -> Self {
        self.params.insert(name.to_string(), param);
        self
    }

    pub fn render(&self) -> Result<String, RenderError> {
        render(self.sql, &self.params)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A referenced parameter exists but carries no value
    NullValue { name: String },
    /// A number parameter whose text is not a decimal numeral
    InvalidNumber { name: String, value: String },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NullValue { name } => {
                write!(f, "Parameter ':{}' has no value", name)
            }
            RenderError::InvalidNumber { name, value } => {
                write!(f, "Parameter ':{}' is not a number: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for RenderError {}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r":[A-Za-z_][A-Za-z0-9_]*").expect("placeholder pattern is valid")
    })
}

fn number_regex() -> &'static Regex {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    NUMBER.get_or_init(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("number pattern is valid"))
}

/// Render `template`, substituting every `:name` token found in `params`.
///
/// Tokens without a matching parameter are left untouched.
///
/// # Example
/// ```
/// use sqlseed::statement::{render, Param, Params};
///
/// let mut params = Params::new();
/// params.insert("name".to_string(), Param::string("Esportes"));
/// params.insert("bigId".to_string(), Param::number("7"));
///
/// let sql = render("INSERT INTO t (big_id, name) VALUES (:bigId, :name);", &params).unwrap();
/// assert_eq!(sql, "INSERT INTO t (big_id, name) VALUES (7, 'Esportes');");
/// ```
pub fn render(template: &str, params: &Params) -> Result<String, RenderError> {
    let mut rendered = String::with_capacity(template.len() + 64);
    let mut last = 0;

    for token in placeholder_regex().find_iter(template) {
        rendered.push_str(&template[last..token.start()]);
        last = token.end();

        let name = &token.as_str()[1..];
        let param = match params.get(name) {
            Some(param) => param,
            None => {
                rendered.push_str(token.as_str());
                continue;
            }
        };

        let value = param.value.as_deref().ok_or_else(|| RenderError::NullValue {
            name: name.to_string(),
        })?;

        match param.kind {
            ParamKind::String => {
                rendered.push('\'');
                rendered.push_str(value);
                rendered.push('\'');
            }
            ParamKind::Number => {
                if !number_regex().is_match(value) {
                    return Err(RenderError::InvalidNumber {
                        name: name.to_string(),
                        value: value.to_string(),
                    });
                }
                rendered.push_str(value);
            }
        }
    }

    rendered.push_str(&template[last..]);
    Ok(rendered)
}

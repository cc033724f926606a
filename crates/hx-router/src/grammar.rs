//! Route-string grammar.
//!
//! Two separator tokens are recognised: `@` (function separator) and `=>`
//! (template separator). The first `@` is consumed before the first `=>`, so
//! `f@a=>b` always yields function `f`. Separators after the one consumed at
//! each stage are kept as literal text.

use serde::{Deserialize, Serialize};

/// Placeholder function name meaning "no function bound".
pub const NO_FUNCTION: &str = "()";

/// A parsed route: the typed form of a route string or structured entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    #[serde(default)]
    pub rpc_function: Option<String>,
    #[serde(default)]
    pub rpc_path: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    At,
    Arrow,
}

impl Token<'_> {
    fn source(&self) -> &str {
        match self {
            Token::Text(s) => s,
            Token::At => "@",
            Token::Arrow => "=>",
        }
    }
}

fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut i = 0;
    let bytes = input.as_bytes();

    while i < bytes.len() {
        let sep = if bytes[i] == b'@' {
            Some((Token::At, 1))
        } else if bytes[i..].starts_with(b"=>") {
            Some((Token::Arrow, 2))
        } else {
            None
        };

        match sep {
            Some((token, len)) => {
                if start < i {
                    tokens.push(Token::Text(&input[start..i]));
                }
                tokens.push(token);
                i += len;
                start = i;
            }
            None => i += 1,
        }
    }

    if start < input.len() {
        tokens.push(Token::Text(&input[start..]));
    }
    tokens
}

/// Join tokens back into text, trimmed; empty text means absent.
fn text_of(tokens: &[Token<'_>]) -> Option<String> {
    let joined: String = tokens.iter().map(Token::source).collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl RouteSpec {
    /// Parse a compact route string.
    pub fn parse(input: &str) -> Self {
        let tokens = tokenize(input);

        let (function, rest) = match tokens.iter().position(|t| *t == Token::At) {
            Some(at) => (text_of(&tokens[..at]), &tokens[at + 1..]),
            None => (None, &tokens[..]),
        };

        let (path, template) = match rest.iter().position(|t| *t == Token::Arrow) {
            Some(arrow) => (text_of(&rest[..arrow]), text_of(&rest[arrow + 1..])),
            None => (text_of(rest), None),
        };

        Self {
            rpc_function: function,
            rpc_path: path,
            template,
        }
        .normalized()
    }

    /// Apply the placeholder rule and drop empty fields.
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            rpc_function: clean(self.rpc_function).filter(|f| f != NO_FUNCTION),
            rpc_path: clean(self.rpc_path),
            template: clean(self.template),
        }
    }
}

impl std::str::FromStr for RouteSpec {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl std::fmt::Display for RouteSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}",
            self.rpc_function.as_deref().unwrap_or(NO_FUNCTION),
            self.rpc_path.as_deref().unwrap_or("")
        )?;
        if let Some(template) = &self.template {
            write!(f, "=>{}", template)?;
        }
        Ok(())
    }
}

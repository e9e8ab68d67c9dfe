//! Structural type descriptions for declared inputs.
//!
//! The grammar follows the `type-check` notation handler authors already
//! write: `String`, `Maybe Number`, `String | Number`, `[String]`,
//! `(Number, String)`, `{id: Number, tags: [String], ...}` and `*`.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TypeParseError(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    Any,
    Named(String),
    Maybe(Box<TypeSpec>),
    Union(Vec<TypeSpec>),
    Array(Box<TypeSpec>),
    Tuple(Vec<TypeSpec>),
    /// Object shape; `open` admits keys beyond the listed ones.
    Fields { fields: Vec<(String, TypeSpec)>, open: bool },
}

impl TypeSpec {
    pub fn parse(description: &str) -> Result<Self, TypeParseError> {
        let tokens = tokenize(description)?;
        let mut parser = Parser { tokens, pos: 0 };
        let spec = parser.union()?;
        match parser.peek() {
            None => Ok(spec),
            Some(token) => Err(TypeParseError(format!("unexpected `{}`", token.text()))),
        }
    }

    /// Checks a value; `None` stands for a missing value (`Undefined`).
    pub fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            TypeSpec::Any => true,
            TypeSpec::Named(name) => type_name(value) == name.as_str(),
            TypeSpec::Maybe(inner) => {
                matches!(value, None | Some(Value::Null)) || inner.matches(value)
            }
            TypeSpec::Union(options) => options.iter().any(|option| option.matches(value)),
            TypeSpec::Array(element) => match value {
                Some(Value::Array(items)) => items.iter().all(|item| element.matches(Some(item))),
                _ => false,
            },
            TypeSpec::Tuple(positions) => match value {
                Some(Value::Array(items)) => {
                    items.len() == positions.len()
                        && positions
                            .iter()
                            .zip(items)
                            .all(|(spec, item)| spec.matches(Some(item)))
                }
                _ => false,
            },
            TypeSpec::Fields { fields, open } => match value {
                Some(Value::Object(object)) => {
                    let listed = fields.iter().all(|(key, spec)| spec.matches(object.get(key)));
                    listed
                        && (*open
                            || object
                                .keys()
                                .all(|key| fields.iter().any(|(name, _)| name == key)))
                }
                _ => false,
            },
        }
    }
}

/// Convenience wrapper: parse `description` and check `value` against it.
pub fn type_check(description: &str, value: &Value) -> Result<bool, TypeParseError> {
    Ok(TypeSpec::parse(description)?.matches(Some(value)))
}

fn type_name(value: Option<&Value>) -> &'static str {
    match value {
        None => "Undefined",
        Some(Value::Null) => "Null",
        Some(Value::Bool(_)) => "Boolean",
        Some(Value::Number(_)) => "Number",
        Some(Value::String(_)) => "String",
        Some(Value::Array(_)) => "Array",
        Some(Value::Object(_)) => "Object",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Symbol(char),
    Ellipsis,
}

impl Token {
    fn text(&self) -> String {
        match self {
            Token::Ident(name) => name.clone(),
            Token::Symbol(symbol) => symbol.to_string(),
            Token::Ellipsis => "...".to_string(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, TypeParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '*' | '|' | '[' | ']' | '(' | ')' | '{' | '}' | ',' | ':' => {
                tokens.push(Token::Symbol(c))
            }
            '.' => {
                if input[start..].starts_with("...") {
                    chars.next();
                    chars.next();
                    tokens.push(Token::Ellipsis);
                } else {
                    return Err(TypeParseError(format!("unexpected `.` at {start}")));
                }
            }
            c if c.is_alphanumeric() || c == '_' || c == '$' => {
                let mut end = start + c.len_utf8();
                while let Some(&(idx, next)) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' || next == '$' {
                        end = idx + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(input[start..end].to_string()));
            }
            other => return Err(TypeParseError(format!("unexpected `{other}` at {start}"))),
        }
    }
    if tokens.is_empty() {
        return Err(TypeParseError("empty type description".to_string()));
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, symbol: char) -> bool {
        if self.peek() == Some(&Token::Symbol(symbol)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, symbol: char) -> Result<(), TypeParseError> {
        if self.eat(symbol) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected `{symbol}`")))
        }
    }

    fn unexpected(&self, what: &str) -> TypeParseError {
        match self.peek() {
            Some(token) => TypeParseError(format!("{what}, found `{}`", token.text())),
            None => TypeParseError(format!("{what}, found end of input")),
        }
    }

    fn union(&mut self) -> Result<TypeSpec, TypeParseError> {
        let mut options = vec![self.maybe()?];
        while self.eat('|') {
            options.push(self.maybe()?);
        }
        Ok(if options.len() == 1 {
            options.remove(0)
        } else {
            TypeSpec::Union(options)
        })
    }

    fn maybe(&mut self) -> Result<TypeSpec, TypeParseError> {
        if self.peek() == Some(&Token::Ident("Maybe".to_string())) {
            self.pos += 1;
            return Ok(TypeSpec::Maybe(Box::new(self.primary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<TypeSpec, TypeParseError> {
        match self.advance() {
            Some(Token::Symbol('*')) => Ok(TypeSpec::Any),
            Some(Token::Ident(name)) => Ok(TypeSpec::Named(name)),
            Some(Token::Symbol('[')) => {
                let element = self.union()?;
                self.expect(']')?;
                Ok(TypeSpec::Array(Box::new(element)))
            }
            Some(Token::Symbol('(')) => {
                let mut positions = vec![self.union()?];
                while self.eat(',') {
                    positions.push(self.union()?);
                }
                self.expect(')')?;
                Ok(TypeSpec::Tuple(positions))
            }
            Some(Token::Symbol('{')) => self.fields(),
            Some(token) => Err(TypeParseError(format!("unexpected `{}`", token.text()))),
            None => Err(TypeParseError("unexpected end of input".to_string())),
        }
    }

    // Opening brace already consumed
    fn fields(&mut self) -> Result<TypeSpec, TypeParseError> {
        let mut fields = Vec::new();
        let mut open = false;
        if self.eat('}') {
            return Ok(TypeSpec::Fields { fields, open });
        }
        loop {
            match self.advance() {
                Some(Token::Ellipsis) => {
                    open = true;
                    self.expect('}')?;
                    return Ok(TypeSpec::Fields { fields, open });
                }
                Some(Token::Ident(key)) => {
                    self.expect(':')?;
                    fields.push((key, self.union()?));
                }
                Some(token) => {
                    return Err(TypeParseError(format!(
                        "expected field name, found `{}`",
                        token.text()
                    )))
                }
                None => return Err(TypeParseError("unterminated object shape".to_string())),
            }
            if self.eat('}') {
                return Ok(TypeSpec::Fields { fields, open });
            }
            self.expect(',')?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(description: &str, value: Value) -> bool {
        type_check(description, &value).expect("type description should parse")
    }

    #[test]
    fn primitive_names() {
        assert!(check("String", json!("a")));
        assert!(check("Number", json!(1.5)));
        assert!(check("Boolean", json!(false)));
        assert!(check("Object", json!({})));
        assert!(check("Array", json!([])));
        assert!(check("Null", json!(null)));
        assert!(!check("Number", json!("1")));
        assert!(!check("Object", json!([])));
        assert!(!check("Date", json!("2020-01-01")));
    }

    #[test]
    fn wildcard_maybe_and_unions() {
        assert!(check("*", json!({"anything": 1})));
        assert!(check("Maybe String", json!(null)));
        assert!(check("Maybe String", json!("x")));
        assert!(!check("Maybe String", json!(3)));
        assert!(check("String | Number", json!(3)));
        assert!(!check("String | Number", json!(true)));
    }

    #[test]
    fn arrays_and_tuples() {
        assert!(check("[Number]", json!([1, 2, 3])));
        assert!(!check("[Number]", json!([1, "2"])));
        assert!(check("(Number, String)", json!([1, "a"])));
        assert!(!check("(Number, String)", json!([1, "a", 2])));
    }

    #[test]
    fn object_shapes() {
        assert!(check("{id: Number, tags: [String]}", json!({"id": 1, "tags": ["a"]})));
        assert!(!check("{id: Number}", json!({"id": 1, "extra": true})));
        assert!(check("{id: Number, ...}", json!({"id": 1, "extra": true})));
        assert!(!check("{id: Number, name: String}", json!({"id": 1})));
        assert!(check("{id: Number, name: Maybe String}", json!({"id": 1})));
    }

    #[test]
    fn malformed_descriptions_are_rejected() {
        assert!(TypeSpec::parse("").is_err());
        assert!(TypeSpec::parse("[String").is_err());
        assert!(TypeSpec::parse("{id Number}").is_err());
        assert!(TypeSpec::parse("String Number").is_err());
        assert!(TypeSpec::parse("String.").is_err());
    }
}

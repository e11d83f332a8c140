//! Parser for the schema DSL.
//!
//! ```text
//! type Person struct {
//!     Name    String
//!     Age     optional Int
//!     Friends optional [String]
//! }
//! ```
//!
//! Supported definitions: `struct` (with `representation map|tuple`),
//! `enum { | A | B }`, list `[T]`, map `{K:V}` and named copies of the
//! prelude kinds (`type Id String`). `#` starts a line comment.

use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::schema::{
    EnumType, ListType, MapType, StructField, StructRepr, StructType, TypeBody, TypeDef, TypeExpr,
    TypeSystem,
};

/// Parses schema text into a validated [`TypeSystem`].
pub fn load_schema(text: &str) -> SchemaResult<TypeSystem> {
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        system: TypeSystem::new(),
    };
    parser.parse_schema()?;
    parser.system.validate()?;
    debug!(
        "Loaded schema with {} definitions",
        parser.system.definitions().count()
    );
    Ok(parser.system)
}

/// Parses schema text from raw bytes, which must be UTF-8.
pub fn load_schema_bytes(bytes: &[u8]) -> SchemaResult<TypeSystem> {
    match std::str::from_utf8(bytes) {
        Ok(text) => load_schema(text),
        Err(e) => {
            let (line, column) = position_of(&bytes[..e.valid_up_to()]);
            Err(SchemaError::Parse {
                line,
                column,
                message: "schema text is not valid UTF-8".into(),
            })
        }
    }
}

fn position_of(prefix: &[u8]) -> (usize, usize) {
    let text = String::from_utf8_lossy(prefix);
    let line = text.matches('\n').count() + 1;
    let column = text.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, column)
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Pipe,
    Eof,
}

impl Tok {
    fn describe(&self) -> String {
        match self {
            Tok::Ident(s) => format!("`{s}`"),
            Tok::LBrace => "`{`".into(),
            Tok::RBrace => "`}`".into(),
            Tok::LBracket => "`[`".into(),
            Tok::RBracket => "`]`".into(),
            Tok::Colon => "`:`".into(),
            Tok::Pipe => "`|`".into(),
            Tok::Eof => "end of input".into(),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    line: usize,
    column: usize,
}

fn tokenize(text: &str) -> SchemaResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let (mut line, mut column) = (1, 1);

    while let Some(&c) = chars.peek() {
        let (start_line, start_column) = (line, column);
        let simple = match c {
            '{' => Some(Tok::LBrace),
            '}' => Some(Tok::RBrace),
            '[' => Some(Tok::LBracket),
            ']' => Some(Tok::RBracket),
            ':' => Some(Tok::Colon),
            '|' => Some(Tok::Pipe),
            _ => None,
        };
        if let Some(tok) = simple {
            chars.next();
            column += 1;
            tokens.push(Token {
                tok,
                line: start_line,
                column: start_column,
            });
            continue;
        }

        if c == '\n' {
            chars.next();
            line += 1;
            column = 1;
        } else if c.is_whitespace() {
            chars.next();
            column += 1;
        } else if c == '#' {
            while let Some(&c) = chars.peek() {
                if c == '\n' {
                    break;
                }
                chars.next();
            }
        } else if c.is_ascii_alphabetic() || c == '_' {
            let mut ident = String::new();
            while let Some(&c) = chars.peek() {
                if !(c.is_ascii_alphanumeric() || c == '_') {
                    break;
                }
                ident.push(c);
                chars.next();
                column += 1;
            }
            tokens.push(Token {
                tok: Tok::Ident(ident),
                line: start_line,
                column: start_column,
            });
        } else {
            return Err(SchemaError::Parse {
                line,
                column,
                message: format!("unexpected character `{c}`"),
            });
        }
    }

    tokens.push(Token {
        tok: Tok::Eof,
        line,
        column,
    });
    Ok(tokens)
}

/// Deepest allowed nesting of inline list and map types.
const MAX_NESTING: usize = 64;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    system: TypeSystem,
}

impl Parser {
    fn peek(&self) -> &Tok {
        &self.tokens[self.pos].tok
    }

    fn next(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if token.tok != Tok::Eof {
            self.pos += 1;
        }
        token
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> SchemaError {
        SchemaError::Parse {
            line: token.line,
            column: token.column,
            message: message.into(),
        }
    }

    fn expect(&mut self, want: Tok) -> SchemaResult<()> {
        let token = self.next();
        if token.tok == want {
            Ok(())
        } else {
            Err(self.error_at(
                &token,
                format!("expected {}, found {}", want.describe(), token.tok.describe()),
            ))
        }
    }

    fn ident(&mut self) -> SchemaResult<String> {
        let token = self.next();
        match &token.tok {
            Tok::Ident(s) => Ok(s.clone()),
            other => Err(self.error_at(
                &token,
                format!("expected identifier, found {}", other.describe()),
            )),
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Tok::Ident(s) if s == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_schema(&mut self) -> SchemaResult<()> {
        while *self.peek() != Tok::Eof {
            let token = self.next();
            if token.tok != Tok::Ident("type".into()) {
                return Err(self.error_at(
                    &token,
                    format!("expected `type`, found {}", token.tok.describe()),
                ));
            }
            let name = self.ident()?;
            let body = self.parse_body(&name)?;
            self.system.insert(TypeDef { name, body })?;
        }
        Ok(())
    }

    fn parse_body(&mut self, name: &str) -> SchemaResult<TypeBody> {
        match self.peek().clone() {
            Tok::Ident(kw) if kw == "struct" => {
                self.pos += 1;
                self.parse_struct()
            }
            Tok::Ident(kw) if kw == "enum" => {
                self.pos += 1;
                self.parse_enum()
            }
            Tok::LBracket => {
                self.pos += 1;
                let (value, value_nullable) = self.parse_list_tail()?;
                Ok(TypeBody::List(ListType {
                    value,
                    value_nullable,
                }))
            }
            Tok::LBrace => {
                self.pos += 1;
                let (key, value, value_nullable) = self.parse_map_tail()?;
                Ok(TypeBody::Map(MapType {
                    key,
                    value,
                    value_nullable,
                }))
            }
            Tok::Ident(kind) => {
                let token = self.next();
                match kind.as_str() {
                    "Bool" => Ok(TypeBody::Bool),
                    "String" => Ok(TypeBody::String),
                    "Bytes" => Ok(TypeBody::Bytes),
                    "Int" => Ok(TypeBody::Int),
                    "Float" => Ok(TypeBody::Float),
                    "Any" => Ok(TypeBody::Any),
                    other => Err(self.error_at(
                        &token,
                        format!("`{name}` must be a struct, enum, list, map or kind; found `{other}`"),
                    )),
                }
            }
            _ => {
                let token = self.next();
                Err(self.error_at(
                    &token,
                    format!("expected a type body for `{name}`, found {}", token.tok.describe()),
                ))
            }
        }
    }

    fn parse_struct(&mut self) -> SchemaResult<TypeBody> {
        self.expect(Tok::LBrace)?;
        let mut fields = Vec::new();
        while *self.peek() != Tok::RBrace {
            let name = self.ident()?;
            let mut optional = false;
            let mut nullable = false;
            loop {
                if self.eat_keyword("optional") {
                    optional = true;
                } else if self.eat_keyword("nullable") {
                    nullable = true;
                } else {
                    break;
                }
            }
            let ty = self.parse_expr()?;
            fields.push(StructField {
                name,
                ty,
                optional,
                nullable,
            });
        }
        self.expect(Tok::RBrace)?;

        let representation = if self.eat_keyword("representation") {
            let token = self.next();
            match &token.tok {
                Tok::Ident(s) if s == "map" => StructRepr::Map,
                Tok::Ident(s) if s == "tuple" => StructRepr::Tuple,
                other => {
                    return Err(self.error_at(
                        &token,
                        format!("unsupported struct representation {}", other.describe()),
                    ));
                }
            }
        } else {
            StructRepr::Map
        };

        Ok(TypeBody::Struct(StructType {
            fields,
            representation,
        }))
    }

    fn parse_enum(&mut self) -> SchemaResult<TypeBody> {
        self.expect(Tok::LBrace)?;
        let mut members = Vec::new();
        while *self.peek() != Tok::RBrace {
            self.expect(Tok::Pipe)?;
            members.push(self.ident()?);
        }
        self.expect(Tok::RBrace)?;
        Ok(TypeBody::Enum(EnumType { members }))
    }

    fn parse_expr(&mut self) -> SchemaResult<TypeExpr> {
        match self.peek() {
            Tok::LBracket => {
                self.pos += 1;
                let (value, nullable) = self.parse_list_tail()?;
                Ok(TypeExpr::List {
                    value: Box::new(value),
                    nullable,
                })
            }
            Tok::LBrace => {
                self.pos += 1;
                let (key, value, nullable) = self.parse_map_tail()?;
                Ok(TypeExpr::Map {
                    key,
                    value: Box::new(value),
                    nullable,
                })
            }
            _ => Ok(TypeExpr::Named(self.ident()?)),
        }
    }

    /// Runs `f` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> SchemaResult<T>) -> SchemaResult<T> {
        if self.depth >= MAX_NESTING {
            let token = &self.tokens[self.pos.saturating_sub(1)];
            return Err(self.error_at(
                token,
                format!("types nested more than {MAX_NESTING} levels deep"),
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Parses `[nullable] T ]` after an opening bracket.
    fn parse_list_tail(&mut self) -> SchemaResult<(TypeExpr, bool)> {
        self.nested(|p| {
            let nullable = p.eat_keyword("nullable");
            let value = p.parse_expr()?;
            p.expect(Tok::RBracket)?;
            Ok((value, nullable))
        })
    }

    /// Parses `K : [nullable] V }` after an opening brace.
    fn parse_map_tail(&mut self) -> SchemaResult<(String, TypeExpr, bool)> {
        self.nested(|p| {
            let key = p.ident()?;
            p.expect(Tok::Colon)?;
            let nullable = p.eat_keyword("nullable");
            let value = p.parse_expr()?;
            p.expect(Tok::RBrace)?;
            Ok((key, value, nullable))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_tracks_positions() {
        let tokens = tokenize("type A\n  struct {}").unwrap();
        assert_eq!(tokens[2].tok, Tok::Ident("struct".into()));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
        assert_eq!(tokens.last().unwrap().tok, Tok::Eof);
    }

    #[test]
    fn comments_are_skipped() {
        let tokens = tokenize("# header\ntype A Int # trailing").unwrap();
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn stray_character_is_reported() {
        let err = tokenize("type A = Int").unwrap_err();
        match err {
            SchemaError::Parse { line, column, .. } => assert_eq!((line, column), (1, 8)),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn missing_identifier_names_the_token() {
        let err = load_schema("type { }").unwrap_err();
        match err {
            SchemaError::Parse { line, column, message } => {
                assert_eq!((line, column), (1, 6));
                assert_eq!(message, "expected identifier, found `{`");
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn deep_nesting_is_a_parse_error() {
        let text = format!("type A {}String{}", "[".repeat(10_000), "]".repeat(10_000));
        let err = load_schema(&text).unwrap_err();
        match err {
            SchemaError::Parse { line, column, message } => {
                assert_eq!((line, column), (1, 8 + MAX_NESTING));
                assert!(message.contains("nested"), "{message}");
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn nesting_up_to_the_limit_parses() {
        let depth = MAX_NESTING;
        let text = format!("type A {}String{}", "[".repeat(depth), "]".repeat(depth));
        assert!(load_schema(&text).is_ok());
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let err = load_schema_bytes(b"type A \xff").unwrap_err();
        match err {
            SchemaError::Parse { line, column, .. } => assert_eq!((line, column), (1, 8)),
            other => panic!("expected Parse, got {other:?}"),
        }
    }
}

//! Lexer (tokenizer) for script source.
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the
//! parser. Indentation is only significant at the start of a logical line:
//! there each level becomes a [`TokenKind::Tab`], either one `\t` or
//! [`INDENT_WIDTH`] spaces. The first indented line locks the style for the
//! rest of the source.
//!
//! f-string interpolations are lexed by a sub-lexer running over the same
//! character buffer, so their tokens carry positions in the host source.

use super::ast::{SourceLocation, Span};
use crate::error::{Error, ErrorKind};
use crate::interpreter::constants::INDENT_WIDTH;
use crate::numeral;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Reserved words. Anything else shaped like a name is an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Verus,
    Falsus,
    Et,
    Aut,
    Non,
    Si,
    Alioquinsi,
    Alioquin,
    Tempta,
    Praeter,
    Tam,
    Pro,
    Ad,
    Gradus,
    Dum,
    Opus,
    Redi,
    Continua,
    Confringe,
}

impl Keyword {
    pub fn lookup(word: &str) -> Option<Keyword> {
        Some(match word {
            "Verus" => Keyword::Verus,
            "Falsus" => Keyword::Falsus,
            "et" => Keyword::Et,
            "aut" => Keyword::Aut,
            "non" => Keyword::Non,
            "si" => Keyword::Si,
            "alioquinsi" => Keyword::Alioquinsi,
            "alioquin" => Keyword::Alioquin,
            "tempta" => Keyword::Tempta,
            "praeter" => Keyword::Praeter,
            "tam" => Keyword::Tam,
            "pro" => Keyword::Pro,
            "ad" => Keyword::Ad,
            "gradus" => Keyword::Gradus,
            "dum" => Keyword::Dum,
            "opus" => Keyword::Opus,
            "redi" => Keyword::Redi,
            "continua" => Keyword::Continua,
            "confringe" => Keyword::Confringe,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Verus => "Verus",
            Keyword::Falsus => "Falsus",
            Keyword::Et => "et",
            Keyword::Aut => "aut",
            Keyword::Non => "non",
            Keyword::Si => "si",
            Keyword::Alioquinsi => "alioquinsi",
            Keyword::Alioquin => "alioquin",
            Keyword::Tempta => "tempta",
            Keyword::Praeter => "praeter",
            Keyword::Tam => "tam",
            Keyword::Pro => "pro",
            Keyword::Ad => "ad",
            Keyword::Gradus => "gradus",
            Keyword::Dum => "dum",
            Keyword::Opus => "opus",
            Keyword::Redi => "redi",
            Keyword::Continua => "continua",
            Keyword::Confringe => "confringe",
        }
    }
}

/// Piece of a string literal token.
#[derive(Debug, Clone, PartialEq)]
pub enum StrPiece {
    Text(String),
    /// Tokens of one `{...}` interpolation, terminated by `Eof`.
    Interp(Vec<Token>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    Numeral(f64),
    Str(Vec<StrPiece>),

    Identifier(String),
    Keyword(Keyword),

    // Arithmetic
    Plus,  // +
    Minus, // -
    Star,  // *
    Slash, // /
    Caret, // ^

    // Comparison
    EqEq,  // ==
    NotEq, // !=
    Lt,    // <
    Le,    // <=
    Gt,    // >
    Ge,    // >=

    // Assignment
    Eq,      // =
    PlusEq,  // +=
    MinusEq, // -=
    StarEq,  // *=
    SlashEq, // /=

    /// `->` or `=>`
    Arrow,

    // Punctuation
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }
    Colon,    // :
    Comma,    // ,
    Dot,      // .

    /// One indentation level at the start of a line.
    Tab,
    /// `\n` or `;`
    Newline,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(n) => write!(f, "int literal {}", n),
            TokenKind::Float(n) => write!(f, "float literal {}", n),
            TokenKind::Numeral(n) => write!(f, "numeral {}", numeral::encode(*n)),
            TokenKind::Str(_) => write!(f, "string literal"),
            TokenKind::Identifier(s) => write!(f, "identifier '{}'", s),
            TokenKind::Keyword(k) => write!(f, "'{}'", k.as_str()),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Caret => write!(f, "'^'"),
            TokenKind::EqEq => write!(f, "'=='"),
            TokenKind::NotEq => write!(f, "'!='"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::Le => write!(f, "'<='"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::Ge => write!(f, "'>='"),
            TokenKind::Eq => write!(f, "'='"),
            TokenKind::PlusEq => write!(f, "'+='"),
            TokenKind::MinusEq => write!(f, "'-='"),
            TokenKind::StarEq => write!(f, "'*='"),
            TokenKind::SlashEq => write!(f, "'/='"),
            TokenKind::Arrow => write!(f, "'=>'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Tab => write!(f, "indentation"),
            TokenKind::Newline => write!(f, "newline"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TabStyle {
    Unset,
    Space,
    Tab,
}

/// Lexer for script source
pub struct Lexer {
    input: Rc<[char]>,
    /// Exclusive upper bound of the scanned range.
    end: usize,
    position: usize,
    line: usize,
    column: usize,
    file: Rc<str>,
    tab_style: TabStyle,
    start_of_statement: bool,
    /// `Tab` tokens emitted on the current line.
    depth: usize,
    /// Depth of the last line that held a token.
    block_depth: usize,
}

impl Lexer {
    pub fn new(input: &str, file: impl Into<Rc<str>>) -> Self {
        let input: Rc<[char]> = input.chars().collect();
        Self {
            end: input.len(),
            input,
            position: 0,
            line: 1,
            column: 1,
            file: file.into(),
            tab_style: TabStyle::Unset,
            start_of_statement: true,
            depth: 0,
            block_depth: 0,
        }
    }

    /// Lexer over `[start, end)` of this lexer's buffer, in expression mode.
    fn sub_lexer(&self, start: SourceLocation, end: usize) -> Lexer {
        Lexer {
            input: self.input.clone(),
            end,
            position: start.index,
            line: start.line,
            column: start.column,
            file: self.file.clone(),
            tab_style: self.tab_style,
            start_of_statement: false,
            depth: 0,
            block_depth: 0,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, Error> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek() {
            match ch {
                ' ' | '\t' => self.indentation(&mut tokens)?,
                '\r' => {
                    self.advance();
                }
                '#' => self.comment(&mut tokens),
                '\n' | ';' => {
                    let loc = self.current_location();
                    self.advance();
                    tokens.push(Token::new(TokenKind::Newline, self.span_from(loc)));
                    self.start_of_statement = true;
                    self.depth = 0;
                }
                '"' | '\'' if tokens.last().is_some_and(is_f_prefix) => {
                    // `f` names the next string as an f-string, blanks between allowed
                    let loc = tokens.pop().map_or(self.current_location(), |t| t.span.start);
                    self.advance();
                    tokens.push(self.string_literal(ch, loc, true)?);
                    self.start_of_statement = false;
                }
                _ => {
                    if self.start_of_statement {
                        self.block_depth = self.depth;
                    }
                    tokens.push(self.next_token()?);
                    self.start_of_statement = false;
                }
            }
        }

        let loc = self.current_location();
        tokens.push(Token::new(TokenKind::Eof, Span::new(loc, loc)));
        debug!(file = %self.file, count = tokens.len(), "tokenized source");
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, Error> {
        let loc = self.current_location();
        let Some(ch) = self.advance() else {
            return Err(self.error(ErrorKind::IllegalChar, "Unexpected end of file", loc));
        };

        let kind = match ch {
            '"' | '\'' => return self.string_literal(ch, loc, false),
            '0'..='9' => return Ok(self.number_literal(loc)),
            c if numeral::is_numeral_char(c) => return self.numeral_or_identifier(loc),
            'a'..='z' | 'A'..='Z' | '_' => return self.identifier_or_keyword(loc),

            '+' => self.with_eq(TokenKind::Plus, TokenKind::PlusEq),
            '*' => self.with_eq(TokenKind::Star, TokenKind::StarEq),
            '/' => self.with_eq(TokenKind::Slash, TokenKind::SlashEq),
            '<' => self.with_eq(TokenKind::Lt, TokenKind::Le),
            '>' => self.with_eq(TokenKind::Gt, TokenKind::Ge),
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    self.with_eq(TokenKind::Minus, TokenKind::MinusEq)
                }
            }
            '=' => {
                if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    self.with_eq(TokenKind::Eq, TokenKind::EqEq)
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    return Err(self.error(ErrorKind::ExpectedItem, "'=' (after '!')", loc));
                }
            }
            '^' => TokenKind::Caret,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,

            _ => {
                return Err(self.error(ErrorKind::IllegalChar, format!("'{}'", ch), loc));
            }
        };

        Ok(Token::new(kind, self.span_from(loc)))
    }

    /// Picks `long` when the next character is `=`.
    fn with_eq(&mut self, short: TokenKind, long: TokenKind) -> TokenKind {
        if self.peek() == Some('=') {
            self.advance();
            long
        } else {
            short
        }
    }

    /// Emits `Tab` tokens for leading indentation; other blanks are skipped.
    fn indentation(&mut self, tokens: &mut Vec<Token>) -> Result<(), Error> {
        if !self.start_of_statement {
            self.advance();
            return Ok(());
        }

        let loc = self.current_location();
        if self.peek() == Some('\t') {
            if self.tab_style == TabStyle::Space {
                return Err(self.error(ErrorKind::Indent, "Inconsistent indentation", loc));
            }
            self.advance();
            self.tab_style = TabStyle::Tab;
            self.depth += 1;
            tokens.push(Token::new(TokenKind::Tab, self.span_from(loc)));
            return Ok(());
        }

        let mut run = 0;
        while self.peek_ahead(run) == Some(' ') {
            run += 1;
        }
        // Trailing blanks on an otherwise empty line carry no indentation.
        // A run shorter than one level is only stray below top-level code.
        if (run < INDENT_WIDTH && self.block_depth == 0)
            || matches!(
                self.peek_ahead(run),
                None | Some('\n') | Some('\r') | Some(';') | Some('#')
            )
        {
            for _ in 0..run {
                self.advance();
            }
            return Ok(());
        }

        if self.tab_style == TabStyle::Tab {
            return Err(self.error(ErrorKind::Indent, "Inconsistent indentation", loc));
        }
        if run % INDENT_WIDTH != 0 {
            for _ in 0..run {
                self.advance();
            }
            return Err(self.error(ErrorKind::Indent, "Improper indentation", loc));
        }

        self.tab_style = TabStyle::Space;
        for _ in 0..run / INDENT_WIDTH {
            let start = self.current_location();
            for _ in 0..INDENT_WIDTH {
                self.advance();
            }
            self.depth += 1;
            tokens.push(Token::new(TokenKind::Tab, self.span_from(start)));
        }
        Ok(())
    }

    /// Skips a `#` comment. A comment on its own line also takes its line
    /// terminator and any indentation emitted before it.
    fn comment(&mut self, tokens: &mut Vec<Token>) {
        while let Some(ch) = self.peek() {
            if ch == '\n' || ch == ';' {
                break;
            }
            self.advance();
        }

        if self.start_of_statement {
            while tokens.last().is_some_and(|t| t.kind == TokenKind::Tab) {
                tokens.pop();
            }
            self.advance();
            self.depth = 0;
        }
    }

    fn number_literal(&mut self, loc: SourceLocation) -> Token {
        let mut text = String::new();
        text.push(self.input[loc.index]);
        let mut dot_count = 0;

        while let Some(ch) = self.peek() {
            if ch == '.' {
                if dot_count == 1 {
                    break;
                }
                dot_count += 1;
            } else if !ch.is_ascii_digit() {
                break;
            }
            text.push(ch);
            self.advance();
        }

        let kind = match text.parse::<i64>() {
            Ok(n) if dot_count == 0 => TokenKind::Int(n),
            _ => TokenKind::Float(text.parse::<f64>().unwrap_or(f64::INFINITY)),
        };
        Token::new(kind, self.span_from(loc))
    }

    /// A run of numeral letters is a numeral unless it runs straight into
    /// more identifier characters, in which case it is the head of a name.
    fn numeral_or_identifier(&mut self, loc: SourceLocation) -> Result<Token, Error> {
        let mut run = 0;
        while self.peek_ahead(run).is_some_and(is_identifier_char) {
            run += 1;
        }
        let all_numeral = (0..run)
            .filter_map(|i| self.peek_ahead(i))
            .all(numeral::is_numeral_char);
        if !all_numeral {
            return self.identifier_or_keyword(loc);
        }

        for _ in 0..run {
            self.advance();
        }

        // Fraction part: a dot, numeral letters, then no identifier character.
        if self.peek() == Some('.') && self.peek_ahead(1).is_some_and(numeral::is_numeral_char) {
            let mut frac = 1;
            while self.peek_ahead(frac).is_some_and(numeral::is_numeral_char) {
                frac += 1;
            }
            if !self.peek_ahead(frac).is_some_and(is_identifier_char) {
                for _ in 0..frac {
                    self.advance();
                }
            }
        }

        let text: String = self.input[loc.index..self.position].iter().collect();
        match numeral::decode(&text) {
            Some(value) => Ok(Token::new(TokenKind::Numeral(value), self.span_from(loc))),
            None => Err(Error::new(
                ErrorKind::InvalidNumeral,
                format!("{} is not a valid numeral", text),
                self.span_from(loc),
                self.file.clone(),
            )),
        }
    }

    /// Reads the rest of a name whose first character is already consumed.
    fn identifier_or_keyword(&mut self, loc: SourceLocation) -> Result<Token, Error> {
        while self.peek().is_some_and(is_identifier_char) {
            self.advance();
        }
        let word: String = self.input[loc.index..self.position].iter().collect();
        let kind = match Keyword::lookup(&word) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier(word),
        };
        Ok(Token::new(kind, self.span_from(loc)))
    }

    /// Reads a string body after its opening `quote`.
    fn string_literal(
        &mut self,
        quote: char,
        loc: SourceLocation,
        fstring: bool,
    ) -> Result<Token, Error> {
        let mut pieces = Vec::new();
        let mut text = String::new();

        loop {
            let Some(ch) = self.peek() else {
                return Err(self.error(ErrorKind::IllegalChar, "Unexpected end to string", loc));
            };
            match ch {
                c if c == quote => {
                    self.advance();
                    break;
                }
                '\n' => {
                    return Err(self.error(ErrorKind::IllegalChar, "Unexpected end to string", loc));
                }
                '\\' => {
                    self.advance();
                    let Some(escaped) = self.advance() else {
                        return Err(self.error(
                            ErrorKind::IllegalChar,
                            "Unexpected end to string",
                            loc,
                        ));
                    };
                    text.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                }
                '{' if fstring => {
                    if !text.is_empty() {
                        pieces.push(StrPiece::Text(std::mem::take(&mut text)));
                    }
                    self.advance();
                    pieces.push(StrPiece::Interp(self.interpolation()?));
                }
                _ => {
                    text.push(ch);
                    self.advance();
                }
            }
        }

        if !text.is_empty() {
            pieces.push(StrPiece::Text(text));
        }
        Ok(Token::new(TokenKind::Str(pieces), self.span_from(loc)))
    }

    /// Lexes the body of `{...}`; the opening brace is already consumed.
    fn interpolation(&mut self) -> Result<Vec<Token>, Error> {
        let inner_start = self.current_location();
        loop {
            match self.peek() {
                Some('}') => break,
                None | Some('{') | Some('\n') => {
                    return Err(self.error(ErrorKind::ExpectedItem, "Expected '}'", inner_start));
                }
                Some(_) => {
                    self.advance();
                }
            }
        }

        let tokens = self.sub_lexer(inner_start, self.position).tokenize()?;
        if tokens.iter().any(|t| matches!(t.kind, TokenKind::Str(_))) {
            return Err(self.error(ErrorKind::IllegalChar, "Unexpected string", inner_start));
        }
        self.advance();
        Ok(tokens)
    }

    // ===== Helper methods =====

    fn error(&self, kind: ErrorKind, message: impl Into<String>, loc: SourceLocation) -> Error {
        Error::new(kind, message, self.span_from(loc), self.file.clone())
    }

    fn span_from(&self, start: SourceLocation) -> Span {
        Span::new(start, self.current_location())
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.position, self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.peek_ahead(0)
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        let index = self.position + n;
        if index < self.end {
            self.input.get(index).copied()
        } else {
            None
        }
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }
}

fn is_f_prefix(token: &Token) -> bool {
    matches!(&token.kind, TokenKind::Identifier(name) if name == "f")
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Lexes `text`, naming it `file` in error positions.
pub fn tokenize(file: &str, text: &str) -> Result<Vec<Token>, Error> {
    Lexer::new(text, file).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize("<test>", src)
            .expect("lexing failed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn lex_error(src: &str) -> Error {
        tokenize("<test>", src).expect_err("lexing should fail")
    }

    #[rstest]
    #[case("42", TokenKind::Int(42))]
    #[case("3.5", TokenKind::Float(3.5))]
    #[case("IV", TokenKind::Numeral(4.0))]
    #[case("I.V", TokenKind::Numeral(1.5))]
    #[case("name", TokenKind::Identifier("name".into()))]
    #[case("Ixyz", TokenKind::Identifier("Ixyz".into()))]
    #[case("Verus", TokenKind::Keyword(Keyword::Verus))]
    #[case("alioquinsi", TokenKind::Keyword(Keyword::Alioquinsi))]
    #[case("->", TokenKind::Arrow)]
    #[case("=>", TokenKind::Arrow)]
    #[case("-=", TokenKind::MinusEq)]
    #[case("!=", TokenKind::NotEq)]
    #[case("<=", TokenKind::Le)]
    #[case("^", TokenKind::Caret)]
    fn single_tokens(#[case] src: &str, #[case] expected: TokenKind) {
        let tokens = tokenize("<test>", src).unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, expected);
        assert_eq!(tokens[0].span.start.index, 0);
        assert_eq!(tokens[0].span.end.index, src.chars().count());
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn second_dot_ends_a_number() {
        let kinds = kinds("1.2.3");
        assert_eq!(kinds[0], TokenKind::Float(1.2));
        assert_eq!(kinds[1], TokenKind::Dot);
        assert_eq!(kinds[2], TokenKind::Int(3));
    }

    #[test]
    fn numeral_followed_by_operator() {
        assert_eq!(
            kinds("X+I"),
            vec![
                TokenKind::Numeral(10.0),
                TokenKind::Plus,
                TokenKind::Numeral(1.0),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn invalid_numeral() {
        let err = lex_error("IIII");
        assert_eq!(err.kind, ErrorKind::InvalidNumeral);
        assert_eq!(err.message, "IIII is not a valid numeral");
    }

    #[test]
    fn leading_spaces_become_tabs() {
        assert_eq!(
            kinds("si x:\n        y"),
            vec![
                TokenKind::Keyword(Keyword::Si),
                TokenKind::Identifier("x".into()),
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Tab,
                TokenKind::Tab,
                TokenKind::Identifier("y".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn inner_spaces_are_ignored() {
        assert_eq!(
            kinds("a  =   1"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Eq,
                TokenKind::Int(1),
                TokenKind::Eof
            ]
        );
    }

    #[rstest]
    #[case("x\n      y", "Improper indentation")]
    #[case("x\n    y\n\tz", "Inconsistent indentation")]
    #[case("x\n\ty\n    z", "Inconsistent indentation")]
    #[case("si a:\n    b\n  c", "Improper indentation")]
    #[case("si a:\n    b\n\n # note\n c", "Improper indentation")]
    fn indentation_errors(#[case] src: &str, #[case] message: &str) {
        let err = lex_error(src);
        assert_eq!(err.kind, ErrorKind::Indent);
        assert_eq!(err.message, message);
    }

    #[test]
    fn semicolon_is_a_newline() {
        assert_eq!(
            kinds("a;b"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Newline,
                TokenKind::Identifier("b".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn whole_line_comment_takes_its_newline() {
        assert_eq!(
            kinds("# note\n    # indented note\na"),
            vec![TokenKind::Identifier("a".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn trailing_comment_keeps_the_newline() {
        assert_eq!(
            kinds("a # note\nb"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Newline,
                TokenKind::Identifier("b".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn carriage_returns_are_ignored() {
        assert_eq!(
            kinds("a\r\nb"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Newline,
                TokenKind::Identifier("b".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#""a\nb\qc""#)[0],
            TokenKind::Str(vec![StrPiece::Text("a\nbqc".into())])
        );
        assert_eq!(
            kinds("'single'")[0],
            TokenKind::Str(vec![StrPiece::Text("single".into())])
        );
    }

    #[test]
    fn unterminated_string() {
        let err = lex_error("\"abc");
        assert_eq!(err.kind, ErrorKind::IllegalChar);
        assert_eq!(err.message, "Unexpected end to string");
        assert_eq!(lex_error("\"ab\ncd\"").message, "Unexpected end to string");
    }

    #[test]
    fn fstring_interpolation_is_sub_lexed() {
        let tokens = tokenize("<test>", "f\"x = {x + 1}!\"").unwrap();
        let TokenKind::Str(pieces) = &tokens[0].kind else {
            panic!("expected string token, got {:?}", tokens[0].kind);
        };
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0], StrPiece::Text("x = ".into()));
        let StrPiece::Interp(inner) = &pieces[1] else {
            panic!("expected interpolation");
        };
        let inner_kinds: Vec<_> = inner.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            inner_kinds,
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Plus,
                TokenKind::Int(1),
                TokenKind::Eof
            ]
        );
        // positions map into the host source
        assert_eq!(inner[0].span.start.index, 7);
        assert_eq!(pieces[2], StrPiece::Text("!".into()));
    }

    #[test]
    fn f_before_a_string_makes_it_an_fstring() {
        let tokens = tokenize("<test>", "f  \"{x}\"").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].span.start.index, 0);
        let TokenKind::Str(pieces) = &tokens[0].kind else {
            panic!("expected string token, got {:?}", tokens[0].kind);
        };
        assert!(matches!(pieces[..], [StrPiece::Interp(_)]));
    }

    #[test]
    fn f_on_the_previous_line_stays_a_name() {
        let kinds = kinds("f\n\"{x}\"");
        assert_eq!(kinds[0], TokenKind::Identifier("f".into()));
        assert_eq!(kinds[1], TokenKind::Newline);
        assert_eq!(kinds[2], TokenKind::Str(vec![StrPiece::Text("{x}".into())]));
    }

    #[test]
    fn stray_spaces_at_top_level_are_skipped() {
        assert_eq!(
            kinds("a\n  b\nsi c:\n    d\ne"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Newline,
                TokenKind::Identifier("b".into()),
                TokenKind::Newline,
                TokenKind::Keyword(Keyword::Si),
                TokenKind::Identifier("c".into()),
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Tab,
                TokenKind::Identifier("d".into()),
                TokenKind::Newline,
                TokenKind::Identifier("e".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[rstest]
    #[case("f\"{x\"", ErrorKind::ExpectedItem, "Expected '}'")]
    #[case("f\"{a{b}}\"", ErrorKind::ExpectedItem, "Expected '}'")]
    #[case("f\"{'s'}\"", ErrorKind::IllegalChar, "Unexpected string")]
    fn bad_interpolations(#[case] src: &str, #[case] kind: ErrorKind, #[case] message: &str) {
        let err = lex_error(src);
        assert_eq!(err.kind, kind);
        assert_eq!(err.message, message);
    }

    #[test]
    fn bang_needs_equals() {
        let err = lex_error("a ! b");
        assert_eq!(err.kind, ErrorKind::ExpectedItem);
        assert_eq!(err.message, "'=' (after '!')");
    }

    #[test]
    fn illegal_character() {
        let err = lex_error("a $ b");
        assert_eq!(err.kind, ErrorKind::IllegalChar);
        assert_eq!(err.message, "'$'");
        assert_eq!(err.span.start.column, 3);
    }

    proptest! {
        #[test]
        fn identifiers_lex_as_one_token(name in "[a-z_][a-z0-9_]{0,12}") {
            prop_assume!(Keyword::lookup(&name).is_none());
            let tokens = tokenize("<test>", &name).unwrap();
            prop_assert_eq!(tokens.len(), 2);
            prop_assert_eq!(&tokens[0].kind, &TokenKind::Identifier(name.clone()));
            prop_assert_eq!(tokens[0].span.end.index, name.len());
        }

        #[test]
        fn integers_lex_as_one_token(n in 0i64..1_000_000_000) {
            let src = n.to_string();
            let tokens = tokenize("<test>", &src).unwrap();
            prop_assert_eq!(tokens.len(), 2);
            prop_assert_eq!(&tokens[0].kind, &TokenKind::Int(n));
            prop_assert_eq!(tokens[0].span.end.index, src.len());
        }

        #[test]
        fn numerals_lex_as_one_token(n in 1u64..=numeral::MAX_NUMERAL) {
            let src = numeral::encode_integer(n);
            let tokens = tokenize("<test>", &src).unwrap();
            prop_assert_eq!(tokens.len(), 2);
            prop_assert_eq!(&tokens[0].kind, &TokenKind::Numeral(n as f64));
        }
    }
}

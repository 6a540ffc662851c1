use miette::SourceSpan;

use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
    pub slice: &'a str,
    pub offset: usize,
    pub kind: TokenKind,
}

impl Token<'_> {
    pub fn span(&self) -> SourceSpan {
        (self.offset, self.slice.len()).into()
    }
}

impl<'a> std::fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slice)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LeftParen,
    RightParen,
    Comma,
    EqualEqual,
    And,
    Or,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    String,
    Ident,
    Number,
    True,
    False,
    Other,
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_letter(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '_')
}

/// Splits the whole source into tokens, stopping at the first lexical error.
///
/// Empty or whitespace-only input gives an empty vector.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, ParseError> {
    Lexer::new(source)
        .inspect(|token| {
            if let Ok(token) = token {
                log::trace!("token {:?} {:?} at {}", token.kind, token.slice, token.offset);
            }
        })
        .collect()
}

#[derive(Debug)]
pub struct Lexer<'a> {
    rest: &'a str,
    byte: usize,
    peeked: Option<Result<Token<'a>, ParseError>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            rest: input,
            byte: 0,
            peeked: None,
        }
    }

    pub fn peek(&mut self) -> Option<&Result<Token<'a>, ParseError>> {
        if self.peeked.is_some() {
            return self.peeked.as_ref();
        }

        self.peeked = self.next();
        self.peeked.as_ref()
    }

    fn skip(&mut self, bytes: usize) {
        self.byte += bytes;
        self.rest = &self.rest[bytes..];
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(next) = self.peeked.take() {
            return Some(next);
        }

        loop {
            let mut chars = self.rest.chars();
            let c = chars.next()?;
            let offset = self.byte;
            let c_onwards = self.rest;
            self.rest = chars.as_str();
            self.byte += c.len_utf8();

            enum Started {
                Ident,
                Number,
                String,
                Equal,
                Other,
            }

            let make_token = |kind: TokenKind| {
                Some(Ok(Token {
                    slice: &c_onwards[..c.len_utf8()],
                    offset,
                    kind,
                }))
            };

            let started = match c {
                c if is_space(c) => continue,
                '(' => return make_token(TokenKind::LeftParen),
                ')' => return make_token(TokenKind::RightParen),
                ',' => return make_token(TokenKind::Comma),
                '=' => Started::Equal,
                '"' => Started::String,
                '0'..='9' => Started::Number,
                c if is_letter(c) => Started::Ident,
                _ => Started::Other,
            };

            match started {
                Started::Ident => {
                    let end = c_onwards
                        .find(|c: char| !is_letter(c))
                        .unwrap_or(c_onwards.len());
                    let literal = &c_onwards[..end];
                    self.skip(literal.len() - c.len_utf8());

                    let kind = match literal {
                        "true" => TokenKind::True,
                        "false" => TokenKind::False,
                        _ => TokenKind::Ident,
                    };

                    return Some(Ok(Token {
                        slice: literal,
                        offset,
                        kind,
                    }));
                }
                Started::Number => {
                    let end = c_onwards
                        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                        .unwrap_or(c_onwards.len());
                    let literal = &c_onwards[..end];
                    self.skip(literal.len() - c.len_utf8());

                    let kind = match literal.parse::<f64>() {
                        Ok(_) => TokenKind::Number,
                        Err(_) => TokenKind::Other,
                    };

                    return Some(Ok(Token {
                        slice: literal,
                        offset,
                        kind,
                    }));
                }
                Started::Equal => {
                    if !self.rest.starts_with('=') {
                        return Some(Err(ParseError::UnexpectedCharacter {
                            position: offset + 1,
                            span: (offset, c.len_utf8()).into(),
                        }));
                    }
                    self.skip(1);
                    return Some(Ok(Token {
                        slice: &c_onwards[..2],
                        offset,
                        kind: TokenKind::EqualEqual,
                    }));
                }
                Started::String => {
                    // `\"` and `\\` never close the literal
                    let mut escaped = false;
                    let mut close = None;
                    for (i, ch) in self.rest.char_indices() {
                        if escaped {
                            escaped = false;
                            continue;
                        }
                        match ch {
                            '\\' => escaped = true,
                            '"' => {
                                close = Some(i);
                                break;
                            }
                            _ => {}
                        }
                    }

                    match close {
                        Some(end) => {
                            let literal = &c_onwards[..end + 1 + 1];
                            self.skip(end + 1);
                            return Some(Ok(Token {
                                slice: literal,
                                offset,
                                kind: TokenKind::String,
                            }));
                        }
                        None => {
                            let err = ParseError::UnterminatedString {
                                span: (offset, c_onwards.len()).into(),
                            };
                            self.skip(self.rest.len());
                            return Some(Err(err));
                        }
                    }
                }
                Started::Other => {
                    let end = c_onwards
                        .find(|c: char| {
                            is_space(c) || is_letter(c) || matches!(c, '(' | ')' | '"' | ',')
                        })
                        .unwrap_or(c_onwards.len());
                    let literal = &c_onwards[..end];
                    self.skip(literal.len() - c.len_utf8());

                    let kind = match literal {
                        "&&" => TokenKind::And,
                        "||" => TokenKind::Or,
                        "<" => TokenKind::Less,
                        "<=" => TokenKind::LessEqual,
                        ">" => TokenKind::Greater,
                        ">=" => TokenKind::GreaterEqual,
                        _ if literal.parse::<f64>().is_ok() => TokenKind::Number,
                        _ => TokenKind::Other,
                    };

                    return Some(Ok(Token {
                        slice: literal,
                        offset,
                        kind,
                    }));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<(&str, TokenKind)> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|token| (token.slice, token.kind))
            .collect()
    }

    #[test]
    fn test_parentheses() {
        let input = "( )";
        let mut lexer = Lexer::new(input);

        let expected_tokens = vec![
            Token {
                slice: "(",
                offset: 0,
                kind: TokenKind::LeftParen,
            },
            Token {
                slice: ")",
                offset: 2,
                kind: TokenKind::RightParen,
            },
        ];

        for expected_token in expected_tokens.into_iter() {
            assert_eq!(lexer.next().unwrap().unwrap(), expected_token);
        }
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_identifiers_and_keywords() {
        let input = "true flag_one false";
        let mut lexer = Lexer::new(input);

        let expected_tokens = vec![
            Token {
                slice: "true",
                offset: 0,
                kind: TokenKind::True,
            },
            Token {
                slice: "flag_one",
                offset: 5,
                kind: TokenKind::Ident,
            },
            Token {
                slice: "false",
                offset: 14,
                kind: TokenKind::False,
            },
        ];

        for expected_token in expected_tokens.into_iter() {
            assert_eq!(lexer.next().unwrap().unwrap(), expected_token);
        }
    }

    #[test]
    fn test_identifiers_stop_at_digits() {
        assert_eq!(
            kinds("abc123"),
            vec![("abc", TokenKind::Ident), ("123", TokenKind::Number)]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 3.14 -100 .5"),
            vec![
                ("42", TokenKind::Number),
                ("3.14", TokenKind::Number),
                ("-100", TokenKind::Number),
                (".5", TokenKind::Number),
            ]
        );
        assert_eq!(kinds("1..2"), vec![("1..2", TokenKind::Other)]);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("&& || == < <= > >="),
            vec![
                ("&&", TokenKind::And),
                ("||", TokenKind::Or),
                ("==", TokenKind::EqualEqual),
                ("<", TokenKind::Less),
                ("<=", TokenKind::LessEqual),
                (">", TokenKind::Greater),
                (">=", TokenKind::GreaterEqual),
            ]
        );
    }

    #[test]
    fn test_double_equal_needs_no_spaces() {
        assert_eq!(
            kinds("a==b"),
            vec![
                ("a", TokenKind::Ident),
                ("==", TokenKind::EqualEqual),
                ("b", TokenKind::Ident),
            ]
        );
    }

    #[test]
    fn test_single_equal() {
        let err = tokenize("a = b").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedCharacter {
                position: 3,
                span: (2, 1).into(),
            }
        );
        assert!(matches!(
            tokenize("a =").unwrap_err(),
            ParseError::UnexpectedCharacter { .. }
        ));
    }

    #[test]
    fn test_strings() {
        let input = r#""hello" "wo\"rld" "back\\""#;
        let mut lexer = Lexer::new(input);

        let expected_tokens = vec![
            Token {
                slice: "\"hello\"",
                offset: 0,
                kind: TokenKind::String,
            },
            Token {
                slice: r#""wo\"rld""#,
                offset: 8,
                kind: TokenKind::String,
            },
            Token {
                slice: r#""back\\""#,
                offset: 18,
                kind: TokenKind::String,
            },
        ];

        for expected_token in expected_tokens.into_iter() {
            assert_eq!(lexer.next().unwrap().unwrap(), expected_token);
        }
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            tokenize(r#"x "never closed"#).unwrap_err(),
            ParseError::UnterminatedString {
                span: (2, 13).into()
            }
        );
        assert!(matches!(
            tokenize(r#""escaped at the end\""#).unwrap_err(),
            ParseError::UnterminatedString { .. }
        ));
    }

    #[test]
    fn test_call_arguments() {
        assert_eq!(
            kinds("twoOpOr(false,f(1, 2))"),
            vec![
                ("twoOpOr", TokenKind::Ident),
                ("(", TokenKind::LeftParen),
                ("false", TokenKind::False),
                (",", TokenKind::Comma),
                ("f", TokenKind::Ident),
                ("(", TokenKind::LeftParen),
                ("1", TokenKind::Number),
                (",", TokenKind::Comma),
                ("2", TokenKind::Number),
                (")", TokenKind::RightParen),
                (")", TokenKind::RightParen),
            ]
        );
    }

    #[test]
    fn test_catch_all_runs() {
        assert_eq!(
            kinds("a !== b <=10"),
            vec![
                ("a", TokenKind::Ident),
                ("!==", TokenKind::Other),
                ("b", TokenKind::Ident),
                ("<=10", TokenKind::Other),
            ]
        );
    }

    #[test]
    fn test_blank_input() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize(" \t\r\n").unwrap().is_empty());
    }

    #[test]
    fn test_peek() {
        let mut lexer = Lexer::new("x y");
        assert_eq!(lexer.peek().unwrap().as_ref().unwrap().slice, "x");
        assert_eq!(lexer.next().unwrap().unwrap().slice, "x");
        assert_eq!(lexer.next().unwrap().unwrap().slice, "y");
    }
}

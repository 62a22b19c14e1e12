use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Number(value) => format!("number {value}"),
            Token::Ident(name) => format!("name '{name}'"),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::Percent => "'%'".to_string(),
            Token::Caret => "'^'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
        }
    }
}

/// A token plus the byte offset it started at.
pub(crate) type Spanned = (usize, Token);

pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, ParseError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let ch = bytes[pos];
        let start = pos;
        match ch {
            b' ' | b'\t' | b'\r' | b'\n' => {
                pos += 1;
                continue;
            }
            b'+' => tokens.push((start, Token::Plus)),
            b'-' => tokens.push((start, Token::Minus)),
            b'*' => {
                if bytes.get(pos + 1) == Some(&b'*') {
                    pos += 1;
                    tokens.push((start, Token::Caret));
                } else {
                    tokens.push((start, Token::Star));
                }
            }
            b'/' => tokens.push((start, Token::Slash)),
            b'%' => tokens.push((start, Token::Percent)),
            b'^' => tokens.push((start, Token::Caret)),
            b'(' => tokens.push((start, Token::LParen)),
            b')' => tokens.push((start, Token::RParen)),
            b',' => tokens.push((start, Token::Comma)),
            b'0'..=b'9' | b'.' => {
                let end = scan_number(bytes, pos);
                let text = &source[start..end];
                let value = text.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                    text: text.to_string(),
                    offset: start,
                })?;
                tokens.push((start, Token::Number(value)));
                pos = end;
                continue;
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                let end = scan_ident(bytes, pos);
                tokens.push((start, Token::Ident(source[start..end].to_string())));
                pos = end;
                continue;
            }
            _ => {
                let ch = source[start..].chars().next().unwrap_or('\u{fffd}');
                return Err(ParseError::UnexpectedChar { ch, offset: start });
            }
        }
        pos += 1;
    }

    Ok(tokens)
}

fn scan_number(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == b'.') {
        pos += 1;
    }
    // Only swallow an exponent when digits follow it, so `2e` stays `2` then `e`.
    if pos < bytes.len() && matches!(bytes[pos], b'e' | b'E') {
        let mut lookahead = pos + 1;
        if lookahead < bytes.len() && matches!(bytes[lookahead], b'+' | b'-') {
            lookahead += 1;
        }
        if lookahead < bytes.len() && bytes[lookahead].is_ascii_digit() {
            pos = lookahead;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
        }
    }
    pos
}

fn scan_ident(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() {
        let ch = bytes[pos];
        let continues_segment = ch.is_ascii_alphanumeric() || ch == b'_';
        let qualifier_dot = ch == b'.'
            && bytes
                .get(pos + 1)
                .is_some_and(|next| next.is_ascii_alphabetic() || *next == b'_');
        if continues_segment || qualifier_dot {
            pos += 1;
        } else {
            break;
        }
    }
    pos
}

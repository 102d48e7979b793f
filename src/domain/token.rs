//! Tokenizer for the brace-delimited tree format.
//!
//! ```text
//! { is_it_alive? { is_it_a_plant? { tree } { flower } } { "cat" } }
//! ```
//!
//! Braces are structural. A value runs from its first non-whitespace
//! character up to the last non-whitespace character before the next brace
//! or the end of input, so interior whitespace belongs to the value. One
//! leading and one trailing double quote are stripped; there is no escaping.

/// Lexical event with the byte offset where it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    OpenBrace { offset: usize },
    CloseBrace { offset: usize },
    Value { text: &'a str, offset: usize },
    EndOfInput { offset: usize },
}

impl Token<'_> {
    pub fn offset(&self) -> usize {
        match *self {
            Token::OpenBrace { offset }
            | Token::CloseBrace { offset }
            | Token::Value { offset, .. }
            | Token::EndOfInput { offset } => offset,
        }
    }
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// Removes exactly one leading and one trailing double quote, if present.
pub fn strip_quotes(raw: &str) -> &str {
    let s = raw.strip_prefix('"').unwrap_or(raw);
    s.strip_suffix('"').unwrap_or(s)
}

/// Single-pass, left-to-right scanner over an input buffer.
///
/// Yields `EndOfInput` exactly once, then `None`.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            done: false,
        }
    }

    /// Next token; the end of input always produces `EndOfInput`.
    pub fn next_token(&mut self) -> Token<'a> {
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() && is_space(bytes[self.pos]) {
            self.pos += 1;
        }
        let start = self.pos;
        match bytes.get(start) {
            None => Token::EndOfInput { offset: start },
            Some(b'{') => {
                self.pos += 1;
                Token::OpenBrace { offset: start }
            }
            Some(b'}') => {
                self.pos += 1;
                Token::CloseBrace { offset: start }
            }
            Some(_) => {
                let mut end = start;
                while self.pos < bytes.len() && !matches!(bytes[self.pos], b'{' | b'}') {
                    self.pos += 1;
                    if !is_space(bytes[self.pos - 1]) {
                        end = self.pos;
                    }
                }
                // Braces and ASCII whitespace are single bytes, so both ends
                // sit on char boundaries.
                Token::Value {
                    text: strip_quotes(&self.input[start..end]),
                    offset: start,
                }
            }
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let token = self.next_token();
        if matches!(token, Token::EndOfInput { .. }) {
            self.done = true;
        }
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn values(input: &str) -> Vec<&str> {
        Tokenizer::new(input)
            .filter_map(|t| match t {
                Token::Value { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn given_leaf_then_emits_brace_value_brace_end() {
        let tokens: Vec<_> = Tokenizer::new("{ cat }").collect();
        assert_eq!(
            tokens,
            vec![
                Token::OpenBrace { offset: 0 },
                Token::Value { text: "cat", offset: 2 },
                Token::CloseBrace { offset: 6 },
                Token::EndOfInput { offset: 7 },
            ]
        );
    }

    #[rstest]
    #[case("{\"cat\"}", "cat")]
    #[case("{ \"cat\" }", "cat")]
    #[case("{ \"\"cat\"\" }", "\"cat\"")]
    #[case("{ \"cat }", "cat")]
    #[case("{ ca\"t }", "ca\"t")]
    fn given_quotes_then_strips_one_pair(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(values(input), vec![expected]);
    }

    #[rstest]
    #[case("{cat}")]
    #[case("{   cat\n}")]
    #[case("\n\t{\r\n cat \r\n}\n")]
    fn given_whitespace_around_value_then_trimmed(#[case] input: &str) {
        assert_eq!(values(input), vec!["cat"]);
    }

    #[test]
    fn given_interior_whitespace_then_kept_in_value() {
        assert_eq!(values("{ does it  fly? { bird } }"), vec!["does it  fly?", "bird"]);
    }

    #[test]
    fn given_value_at_end_of_input_then_flushed() {
        let tokens: Vec<_> = Tokenizer::new("{ cat").collect();
        assert_eq!(tokens[1], Token::Value { text: "cat", offset: 2 });
        assert_eq!(tokens[2], Token::EndOfInput { offset: 5 });
    }

    #[test]
    fn given_multibyte_text_then_value_intact() {
        assert_eq!(values("{ ¿está vivo? }"), vec!["¿está vivo?"]);
    }

    #[test]
    fn given_exhausted_tokenizer_then_end_once() {
        let mut tokenizer = Tokenizer::new("");
        assert_eq!(tokenizer.next(), Some(Token::EndOfInput { offset: 0 }));
        assert_eq!(tokenizer.next(), None);
    }
}

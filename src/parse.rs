//! Parser combinator engine that the assembly grammar is built from.
//!
//! Every parser is a pure transformation over an immutable [`Input`]
//! position. A step either succeeds with a value and the advanced input, or
//! fails with a position-tagged [`ParseError`]. Failed steps short-circuit:
//! no combinator resumes a failed state except [`possibly`] and
//! [`look_ahead`].

use std::fmt;
use std::rc::Rc;

use regex::Regex;

/// Cursor into the source being parsed. Copied, never mutated in place.
#[derive(Clone, Copy, Debug)]
pub struct Input<'s> {
    src: &'s str,
    at: usize,
}

impl<'s> Input<'s> {
    pub fn new(src: &'s str) -> Self {
        Input { src, at: 0 }
    }

    /// Byte offset from the start of the source.
    pub fn at(&self) -> usize {
        self.at
    }

    /// Unconsumed remainder of the source.
    pub fn rest(&self) -> &'s str {
        &self.src[self.at..]
    }

    pub fn is_done(&self) -> bool {
        self.at >= self.src.len()
    }

    fn advance(self, n: usize) -> Self {
        Input {
            src: self.src,
            at: self.at + n,
        }
    }

    /// Short snippet of the remainder, for error messages.
    fn snippet(&self) -> &'s str {
        let rest = self.rest();
        match rest.char_indices().nth(15) {
            Some((idx, _)) => &rest[..idx],
            None => rest,
        }
    }
}

/// Failure at a known offset. Converted to a diagnostic at the API boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub at: usize,
    pub message: String,
}

impl ParseError {
    fn new(at: usize, message: impl Into<String>) -> Self {
        ParseError {
            at,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at offset {})", self.message, self.at)
    }
}

impl std::error::Error for ParseError {}

/// Result of applying one parser: the parsed value and the advanced input.
pub type Step<'s, T> = Result<(T, Input<'s>), ParseError>;

/// A composable parser producing `T`.
///
/// Cheap to clone; combinators hold their sub-parsers behind an [`Rc`].
pub struct Parser<T> {
    apply: Rc<dyn for<'s> Fn(Input<'s>) -> Step<'s, T>>,
}

impl<T> Clone for Parser<T> {
    fn clone(&self) -> Self {
        Parser {
            apply: Rc::clone(&self.apply),
        }
    }
}

impl<T: 'static> Parser<T> {
    pub fn new(apply: impl for<'s> Fn(Input<'s>) -> Step<'s, T> + 'static) -> Self {
        Parser {
            apply: Rc::new(apply),
        }
    }

    /// Apply this parser at the given position.
    pub fn parse<'s>(&self, input: Input<'s>) -> Step<'s, T> {
        (self.apply)(input)
    }

    /// Parse a complete source string. Strict: any unconsumed remainder is a
    /// syntax error naming the leftover input.
    pub fn run(&self, src: &str) -> Result<T, ParseError> {
        let (value, rest) = self.parse(Input::new(src))?;
        if !rest.is_done() {
            return Err(ParseError::new(
                rest.at(),
                format!("syntax error: unexpected input `{}`", rest.snippet()),
            ));
        }
        Ok(value)
    }

    /// Map the successful result, leaving errors untouched.
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> Parser<U> {
        Parser::new(move |input| {
            let (value, rest) = self.parse(input)?;
            Ok((f(value), rest))
        })
    }

    /// Monadic bind: choose the next parser from the previous result.
    ///
    /// Chains of `and_then` thread the state forward one sub-parser at a
    /// time and abort on the first error.
    pub fn and_then<U: 'static>(self, f: impl Fn(T) -> Parser<U> + 'static) -> Parser<U> {
        Parser::new(move |input| {
            let (value, rest) = self.parse(input)?;
            f(value).parse(rest)
        })
    }

    /// Replace this parser's error message, keeping the failure offset.
    pub fn expected(self, what: impl Into<String>) -> Parser<T> {
        let what = what.into();
        Parser::new(move |input| {
            self.parse(input)
                .map_err(|e| ParseError::new(e.at, format!("expected {what}")))
        })
    }
}

/// Match an exact string.
pub fn literal(s: impl Into<String>) -> Parser<String> {
    let s = s.into();
    Parser::new(move |input: Input| {
        let rest = input.rest();
        if rest.is_empty() {
            return Err(ParseError::new(
                input.at(),
                format!("tried to match `{s}` but got end of input"),
            ));
        }
        if rest.starts_with(s.as_str()) {
            let len = s.len();
            Ok((s.clone(), input.advance(len)))
        } else {
            Err(ParseError::new(
                input.at(),
                format!("tried to match `{}` but got `{}`", s, input.snippet()),
            ))
        }
    })
}

/// Match a single exact character.
pub fn symbol(c: char) -> Parser<char> {
    Parser::new(move |input: Input| match input.rest().chars().next() {
        Some(found) if found == c => Ok((c, input.advance(c.len_utf8()))),
        Some(found) => Err(ParseError::new(
            input.at(),
            format!("expected `{c}`, got `{found}`"),
        )),
        None => Err(ParseError::new(
            input.at(),
            format!("expected `{c}`, but got end of input"),
        )),
    })
}

/// Match a regex at the current position. The pattern must be anchored with
/// `^` so it cannot skip ahead in the input.
pub fn matching(re: &'static Regex, what: &'static str) -> Parser<String> {
    debug_assert!(re.as_str().starts_with('^'));
    Parser::new(move |input: Input| {
        let rest = input.rest();
        if rest.is_empty() {
            return Err(ParseError::new(
                input.at(),
                format!("expected {what}, got end of input"),
            ));
        }
        match re.find(rest) {
            Some(m) if !m.as_str().is_empty() => {
                Ok((m.as_str().to_string(), input.advance(m.end())))
            }
            _ => Err(ParseError::new(input.at(), format!("expected {what}"))),
        }
    })
}

/// Apply every parser in order, collecting all results. Aborts on the first
/// error.
pub fn sequence<T: 'static>(parsers: Vec<Parser<T>>) -> Parser<Vec<T>> {
    Parser::new(move |input| {
        let mut results = Vec::with_capacity(parsers.len());
        let mut rest = input;
        for p in &parsers {
            let (value, next) = p.parse(rest)?;
            results.push(value);
            rest = next;
        }
        Ok((results, rest))
    })
}

/// Try each alternative in order, returning the first success.
pub fn choice<T: 'static>(parsers: Vec<Parser<T>>) -> Parser<T> {
    Parser::new(move |input: Input| {
        for p in &parsers {
            if let Ok(step) = p.parse(input) {
                return Ok(step);
            }
        }
        Err(ParseError::new(
            input.at(),
            "no alternative matched".to_string(),
        ))
    })
}

/// Repeat a parser until it fails, succeeding with zero or more results.
pub fn many<T: 'static>(parser: Parser<T>) -> Parser<Vec<T>> {
    Parser::new(move |input| {
        let mut results = Vec::new();
        let mut rest = input;
        while let Ok((value, next)) = parser.parse(rest) {
            results.push(value);
            rest = next;
        }
        Ok((results, rest))
    })
}

/// Like [`many`], but at least one repetition must match.
pub fn many1<T: 'static>(parser: Parser<T>) -> Parser<Vec<T>> {
    let repeated = many(parser);
    Parser::new(move |input: Input| {
        let (results, rest) = repeated.parse(input)?;
        if results.is_empty() {
            return Err(ParseError::new(
                input.at(),
                "expected at least one match".to_string(),
            ));
        }
        Ok((results, rest))
    })
}

/// Values separated by a delimiter. Zero values is a success. A separator
/// with no value after it is left unconsumed.
pub fn sep_by<S: 'static, T: 'static>(separator: Parser<S>, item: Parser<T>) -> Parser<Vec<T>> {
    Parser::new(move |input| {
        let mut results = Vec::new();
        let Ok((value, mut rest)) = item.parse(input) else {
            return Ok((results, input));
        };
        results.push(value);
        loop {
            // Commit to the separator only once the next value parses.
            let Ok((_, after_sep)) = separator.parse(rest) else {
                break;
            };
            let Ok((value, next)) = item.parse(after_sep) else {
                break;
            };
            results.push(value);
            rest = next;
        }
        Ok((results, rest))
    })
}

/// Like [`sep_by`], but at least one value must match.
pub fn sep_by1<S: 'static, T: 'static>(separator: Parser<S>, item: Parser<T>) -> Parser<Vec<T>> {
    let listed = sep_by(separator, item);
    Parser::new(move |input: Input| {
        let (results, rest) = listed.parse(input)?;
        if results.is_empty() {
            return Err(ParseError::new(
                input.at(),
                "expected at least one value".to_string(),
            ));
        }
        Ok((results, rest))
    })
}

/// Content wrapped by a left and right delimiter; only the content survives.
pub fn between<L: 'static, R: 'static, T: 'static>(
    left: Parser<L>,
    right: Parser<R>,
    content: Parser<T>,
) -> Parser<T> {
    Parser::new(move |input| {
        let (_, rest) = left.parse(input)?;
        let (value, rest) = content.parse(rest)?;
        let (_, rest) = right.parse(rest)?;
        Ok((value, rest))
    })
}

/// Defer parser construction so recursive grammars can refer to themselves.
pub fn lazy<T: 'static>(thunk: impl Fn() -> Parser<T> + 'static) -> Parser<T> {
    Parser::new(move |input| thunk().parse(input))
}

/// Turn failure into a `None` success without consuming input.
pub fn possibly<T: 'static>(parser: Parser<T>) -> Parser<Option<T>> {
    Parser::new(move |input| match parser.parse(input) {
        Ok((value, rest)) => Ok((Some(value), rest)),
        Err(_) => Ok((None, input)),
    })
}

/// Match without advancing the cursor.
pub fn look_ahead<T: 'static>(parser: Parser<T>) -> Parser<T> {
    Parser::new(move |input| {
        let (value, _) = parser.parse(input)?;
        Ok((value, input))
    })
}

/// Always fail with the given message.
pub fn fail<T: 'static>(message: impl Into<String>) -> Parser<T> {
    let message = message.into();
    Parser::new(move |input: Input| Err(ParseError::new(input.at(), message.clone())))
}

/// Always succeed with the given value, consuming nothing.
pub fn succeed<T: Clone + 'static>(value: T) -> Parser<T> {
    Parser::new(move |input| Ok((value.clone(), input)))
}

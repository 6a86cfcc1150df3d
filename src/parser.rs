use std::{fmt, hash::Hash};

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use chumsky::{error::SimpleReason, prelude::*, Stream};

use crate::{
    lexer::lexer,
    operation::OpType,
    predicate::Predicate,
    syntax::*,
};

const FIELDS: &[&str] = &["type", "category", "cat", "account", "acc", "tag", "comment"];

/// One problem found in a filter query, located in the query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub span: Span,
    pub message: String,
    pub label: String,
}

/// A filter query that could not be parsed.
///
/// Displaying it renders every diagnostic against the query text, pointing at
/// the offending token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    text: String,
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    fn new<I: IntoIterator<Item = Diagnostic>>(text: &str, diagnostics: I) -> Self {
        let len = text.chars().count();
        let diagnostics = diagnostics
            .into_iter()
            .map(|d| {
                let start = d.span.start.min(len);
                let end = d.span.end.min(len).max(start);
                Diagnostic {
                    span: start..end,
                    ..d
                }
            })
            .collect();

        Self {
            text: text.to_string(),
            diagnostics,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn report(&self, colored: bool) -> String {
        let mut out: Vec<u8> = vec![];

        for d in &self.diagnostics {
            let report = Report::build(ReportKind::Error, (), d.span.start)
                .with_config(Config::default().with_color(colored))
                .with_message(&d.message)
                .with_label(
                    Label::new(d.span.clone())
                        .with_message(&d.label)
                        .with_color(Color::Red),
                )
                .finish();

            if report.write(Source::from(&self.text), &mut out).is_err() {
                out.extend(format!("{} at {:?}\n", d.message, d.span).into_bytes());
            }
        }

        String::from_utf8_lossy(&out).into_owned()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.report(false))
    }
}

impl std::error::Error for ParseError {}

fn describe<I: fmt::Display>(token: Option<&I>) -> String {
    match token {
        Some(t) => format!("`{}`", t),
        None => "end of input".to_string(),
    }
}

fn diagnostic<I: fmt::Display + Hash + Eq>(e: Simple<I>) -> Diagnostic {
    match e.reason() {
        SimpleReason::Custom(msg) => Diagnostic {
            span: e.span(),
            message: msg.clone(),
            label: "here".to_string(),
        },
        SimpleReason::Unclosed { span, delimiter } => Diagnostic {
            span: span.clone(),
            message: format!("Unclosed delimiter `{}`", delimiter),
            label: format!("must be closed before {}", describe(e.found())),
        },
        SimpleReason::Unexpected => {
            let mut expected: Vec<String> = e
                .expected()
                .map(|t| describe(t.as_ref()))
                .collect();
            expected.sort();

            let wanted = match (e.label(), expected.is_empty()) {
                (Some(label), _) => format!(", expected {}", label),
                (None, false) => format!(", expected one of {}", expected.join(", ")),
                (None, true) => String::new(),
            };

            Diagnostic {
                span: e.span(),
                message: format!("Unexpected {}{}", describe(e.found()), wanted),
                label: format!("unexpected {}", describe(e.found())),
            }
        }
    }
}

fn word(w: &'static str) -> impl Parser<Token, Token, Error = Simple<Token>> + Clone {
    just(Token::identifier(w))
}

fn and_op() -> impl Parser<Token, Token, Error = Simple<Token>> + Clone {
    word("and").or(just(Token::Operator('&')))
}

fn or_op() -> impl Parser<Token, Token, Error = Simple<Token>> + Clone {
    word("or").or(just(Token::Operator('|')))
}

fn not_op() -> impl Parser<Token, Token, Error = Simple<Token>> + Clone {
    word("not").or(just(Token::Operator('!')))
}

fn keyword() -> impl Parser<Token, Predicate, Error = Simple<Token>> + Clone {
    word("any")
        .to(Predicate::Any)
        .or(word("uncategorized").to(Predicate::Uncategorized))
}

fn value() -> impl Parser<Token, Spanned<String>, Error = Simple<Token>> + Clone {
    filter_map(|span: Span, token: Token| match token.get_text() {
        Some(text) => Ok((text.to_string(), span)),
        None => Err(Simple::expected_input_found(span, vec![], Some(token))),
    })
    .labelled("a word or a quoted string")
}

fn field_predicate(key: &str, (value, span): Spanned<String>) -> Result<Predicate, Simple<Token>> {
    match key {
        "type" => match OpType::from_str(&value) {
            Some(t) if t != OpType::Deleted => Ok(Predicate::Type(t)),
            _ => Err(Simple::custom(
                span,
                format!(
                    "Unknown operation type `{}`, expected one of income, expense, transfer, adjustment",
                    value
                ),
            )),
        },
        "category" | "cat" => Ok(Predicate::Category(value)),
        "account" | "acc" => Ok(Predicate::Account(value)),
        "tag" => Ok(Predicate::Tag(value)),
        "comment" => Ok(Predicate::Comment(value)),
        _ => Err(Simple::custom(span, format!("Unknown filter field `{}`", key))),
    }
}

fn field() -> impl Parser<Token, Predicate, Error = Simple<Token>> + Clone {
    let key = filter_map(|span: Span, token: Token| match token {
        Token::Identifier(k) if FIELDS.contains(&k.as_str()) => Ok(k),
        t => Err(Simple::expected_input_found(span, vec![], Some(t))),
    })
    .labelled("a filter term");

    key.then_ignore(just(Token::Separator(':')))
        .then(value())
        .try_map(|(key, value), _| field_predicate(&key, value))
}

fn join(first: Predicate, rest: Vec<Predicate>, node: fn(Vec<Predicate>) -> Predicate) -> Predicate {
    if rest.is_empty() {
        first
    } else {
        let mut items = vec![first];
        items.extend(rest);
        node(items)
    }
}

pub fn parser() -> impl Parser<Token, Predicate, Error = Simple<Token>> {
    recursive(|expr| {
        let group = expr.delimited_by(
            just(Token::Separator('(')),
            just(Token::Separator(')')),
        );

        let atom = keyword().or(field()).or(group);

        let unary = not_op()
            .repeated()
            .then(atom)
            .foldr(|_, p| Predicate::not(p));

        let conjunction = unary
            .clone()
            .then(and_op().ignore_then(unary).repeated())
            .map(|(first, rest)| join(first, rest, Predicate::And));

        conjunction
            .clone()
            .then(or_op().ignore_then(conjunction).repeated())
            .map(|(first, rest)| join(first, rest, Predicate::Or))
    })
    .then_ignore(end())
}

/// Parses a filter query. Blank input selects everything.
pub fn parse_string(input: &str) -> Result<Predicate, ParseError> {
    if input.trim().is_empty() {
        return Ok(Predicate::Any);
    }

    let tokens = lexer()
        .parse(input)
        .map_err(|errs| ParseError::new(input, errs.into_iter().map(diagnostic)))?;

    let len = input.chars().count();
    let stream = Stream::from_iter(len..len + 1, tokens.into_iter());

    parser()
        .parse(stream)
        .map_err(|errs| ParseError::new(input, errs.into_iter().map(diagnostic)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_parse_field() -> Result<()> {
        assert_eq!(parse_string("type:expense")?, Predicate::Type(OpType::Expense));
        assert_eq!(parse_string("cat:Food")?, Predicate::category("Food"));
        assert_eq!(
            parse_string(r#"category:"Food & Drinks""#)?,
            Predicate::category("Food & Drinks")
        );
        assert_eq!(parse_string("acc:bank")?, Predicate::account("bank"));
        assert_eq!(parse_string("comment:\"a b\"")?, Predicate::comment("a b"));
        assert_eq!(parse_string("uncategorized")?, Predicate::Uncategorized);
        assert_eq!(parse_string("  ")?, Predicate::Any);

        Ok(())
    }

    #[test]
    fn test_parse_precedence() -> Result<()> {
        assert_eq!(
            parse_string("tag:a or tag:b and not tag:c")?,
            Predicate::Or(vec![
                Predicate::tag("a"),
                Predicate::And(vec![
                    Predicate::tag("b"),
                    Predicate::not(Predicate::tag("c")),
                ]),
            ])
        );

        assert_eq!(
            parse_string("!(tag:a | tag:b) & any & uncategorized")?,
            Predicate::And(vec![
                Predicate::not(Predicate::Or(vec![Predicate::tag("a"), Predicate::tag("b")])),
                Predicate::Any,
                Predicate::Uncategorized,
            ])
        );

        Ok(())
    }

    #[test]
    fn test_parse_double_negation() -> Result<()> {
        assert_eq!(
            parse_string("not not tag:x")?,
            Predicate::not(Predicate::not(Predicate::tag("x")))
        );

        Ok(())
    }

    #[test]
    fn test_display_round_trip() -> Result<()> {
        let p = Predicate::Or(vec![
            Predicate::And(vec![
                Predicate::Type(OpType::Transfer),
                Predicate::account("my bank"),
            ]),
            Predicate::not(Predicate::tag("and")),
            Predicate::comment("x:y"),
        ]);

        assert_eq!(parse_string(&p.to_string())?, p);

        Ok(())
    }

    #[test]
    fn test_display_round_trip_escapes() -> Result<()> {
        for p in [
            Predicate::comment(r"C:\Users"),
            Predicate::comment("a\tb"),
            Predicate::comment("line\r\nbreak"),
            Predicate::tag("6\" pipe"),
            Predicate::account(r#"\"quoted\""#),
            Predicate::tag(r"plain\word"),
        ] {
            assert_eq!(parse_string(&p.to_string())?, p);
        }

        assert_eq!(
            Predicate::comment("C:\\Users").to_string(),
            r#"comment:"C:\\Users""#
        );
        assert_eq!(parse_string(r#"tag:"6\" pipe""#)?, Predicate::tag("6\" pipe"));

        Ok(())
    }

    #[test]
    fn test_unknown_type_points_at_value() {
        let err = parse_string("type:food").unwrap_err();

        assert_eq!(err.text(), "type:food");
        assert_eq!(err.diagnostics()[0].span, 5..9);
        assert!(err.diagnostics()[0].message.contains("Unknown operation type `food`"));

        let rendered = err.to_string();
        assert!(rendered.contains("Unknown operation type"));
        assert!(rendered.contains("type:food"));
    }

    #[test]
    fn test_unclosed_group() {
        let err = parse_string("tag:a and (tag:b").unwrap_err();

        assert!(!err.diagnostics().is_empty());
        assert!(err
            .diagnostics()
            .iter()
            .any(|d| d.message.contains("end of input")));
    }

    #[test]
    fn test_missing_value() {
        let err = parse_string("tag:)").unwrap_err();

        assert_eq!(err.diagnostics()[0].span, 4..5);
        assert!(err.diagnostics()[0].message.starts_with("Unexpected `)`"));
    }

    #[test]
    fn test_lexer_errors_are_wrapped() {
        let err = parse_string("comment:\"unterminated").unwrap_err();

        assert!(!err.diagnostics().is_empty());
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_bare_word_is_rejected() {
        let err = parse_string("food").unwrap_err();

        assert_eq!(err.diagnostics()[0].span, 0..4);
        assert!(err.diagnostics()[0].message.starts_with("Unexpected `food`"));
    }
}

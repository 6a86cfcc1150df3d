use chumsky::prelude::*;

use crate::syntax::*;

fn separator() -> impl Parser<char, Token, Error = Simple<char>> + Clone {
    one_of(":()").map(Token::Separator)
}

fn operator() -> impl Parser<char, Token, Error = Simple<char>> + Clone {
    one_of("!&|").map(Token::Operator)
}

/// `\\`, `\"`, `\n`, `\r` and `\t` inside a quoted string.
fn escape() -> impl Parser<char, char, Error = Simple<char>> + Clone {
    just('\\').ignore_then(
        just('\\')
            .or(just('"'))
            .or(just('n').to('\n'))
            .or(just('r').to('\r'))
            .or(just('t').to('\t')),
    )
}

fn string() -> impl Parser<char, Token, Error = Simple<char>> + Clone {
    just('"')
        .ignore_then(filter(|c: &char| *c != '"' && *c != '\\').or(escape()).repeated())
        .then_ignore(just('"'))
        .collect::<String>()
        .map(Token::String)
        .labelled("quoted string")
}

fn identifier() -> impl Parser<char, Token, Error = Simple<char>> + Clone {
    filter(|c: &char| !c.is_whitespace() && !RESERVED.contains(*c))
        .repeated()
        .at_least(1)
        .collect::<String>()
        .map(Token::Identifier)
        .labelled("word")
}

pub fn lexer() -> impl Parser<char, Vec<Spanned<Token>>, Error = Simple<char>> {
    let token = string().or(separator()).or(operator()).or(identifier());

    token
        .map_with_span(|tok, span| (tok, span))
        .padded()
        .repeated()
        .then_ignore(end())
}

pub type Span = std::ops::Range<usize>;
pub type Spanned<T> = (T, Span);

/// Characters that end a bare word in a filter query.
pub const RESERVED: &str = ":()\"!&|";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Identifier(String),
    String(String),
    /// `:`, `(` or `)`
    Separator(char),
    /// `!`, `&` or `|`
    Operator(char),
}

impl Token {
    pub fn identifier<T: Into<String>>(id: T) -> Self {
        Self::Identifier(id.into())
    }

    pub fn string<T: Into<String>>(s: T) -> Self {
        Self::String(s.into())
    }

    pub fn get_text(&self) -> Option<&str> {
        match self {
            Token::Identifier(s) | Token::String(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for Token {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Token::Identifier(id) => write!(f, "{}", id),
            Token::String(s) => write!(f, "{:?}", s),
            Token::Separator(c) | Token::Operator(c) => write!(f, "{}", c),
        }
    }
}

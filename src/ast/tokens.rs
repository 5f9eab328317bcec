use rust_decimal::Decimal;

use crate::types::{FloatTy, IntTy};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Integer literal with its inferred or suffixed type
    ///
    /// Unsuffixed literals take the narrowest of `Int32`, `Int64`, `UInt64`
    /// that can hold the value. `L` forces `Int64`, `U` forces `UInt32`,
    /// `UL` forces `UInt64`.
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 42L
    /// 3000000000UL
    /// ```
    Integer { value: u64, ty: IntTy },

    /// Floating-point literal
    ///
    /// Defaults to `Double`; the `F` suffix selects `Single`.
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// 1.5e10
    /// 2.5F
    /// ```
    Float { value: f64, ty: FloatTy },

    /// Decimal literal (`M` suffix), parsed without floating-point rounding
    ///
    /// # Examples
    /// ```text
    /// 19.99M
    /// ```
    Decimal(Decimal),

    /// String literal enclosed in double quotes
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// "item #1"
    /// ```
    String(String),

    /// Character literal enclosed in single quotes (exactly one character)
    ///
    /// # Examples
    /// ```text
    /// 'a'
    /// '\n'
    /// ```
    Char(char),

    /// Boolean values
    Boolean(bool),

    /// Null literal
    Null,

    /// Positional substitution value reference
    ///
    /// # Examples
    /// ```text
    /// @0
    /// @1
    /// ```
    Placeholder(usize),

    // Identifiers and keywords
    /// Parameter, member, or type name
    ///
    /// Must start with a letter or underscore, followed by letters, digits,
    /// or underscores.
    Identifier(String),

    /// `new` keyword introducing an anonymous record projection
    ///
    /// # Examples
    /// ```text
    /// new(it.Name, it.Price * 2 alias Doubled)
    /// ```
    New,

    /// `is` type-test operator keyword
    Is,

    /// `as` conversion operator keyword
    As,

    /// `alias` keyword naming a projection field
    Alias,

    /// `iif` keyword, the function form of the conditional operator
    ///
    /// # Examples
    /// ```text
    /// iif(it.Count > 0, "some", "none")
    /// ```
    Iif,

    /// Logical AND (word form)
    And,

    /// Logical OR (word form)
    Or,

    /// Logical negation (word form)
    Not,

    // Operators
    /// Conditional test (`?`)
    Question,

    /// Conditional separator (`:`)
    Colon,

    /// Logical OR (`||`)
    BarBar,

    /// Logical AND (`&&`)
    AmpAmp,

    /// Bitwise OR
    Bar,

    /// Bitwise XOR
    Caret,

    /// Bitwise AND
    Amp,

    /// Equality (`==`)
    EqEq,

    /// Single `=`, accepted as equality
    Eq,

    /// Inequality (`!=` or `<>`)
    NotEq,

    /// Less than
    Lt,

    /// Greater than
    Gt,

    /// Less than or equal
    LtEq,

    /// Greater than or equal
    GtEq,

    /// Addition or string concatenation
    Plus,

    /// Subtraction or unary negation
    Minus,

    /// Multiplication
    Star,

    /// Division
    Slash,

    /// Modulo
    Percent,

    /// Logical negation (`!`)
    Exclamation,

    // Delimiters
    /// Left parenthesis for grouping, calls, and conversions
    LParen,

    /// Right parenthesis
    RParen,

    /// Left bracket for indexers
    LBracket,

    /// Right bracket
    RBracket,

    /// Dot for member access
    Dot,

    /// Comma for separating arguments, projection fields, and orderings
    Comma,

    /// End of input
    Eof,
}

/// A token together with the character offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub pos: usize,
}

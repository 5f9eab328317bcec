/// Binary operators, grouped by precedence family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Logical
    Or,
    And,

    // Bitwise
    BitOr,
    BitXor,
    BitAnd,

    // Equality
    Equal,
    NotEqual,

    // Relational
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,

    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinOp {
    /// Source-level spelling, for diagnostics.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::BitAnd => "&",
            BinOp::Equal => "==",
            BinOp::NotEqual => "!=",
            BinOp::LessThan => "<",
            BinOp::GreaterThan => ">",
            BinOp::LessEqual => "<=",
            BinOp::GreaterEqual => ">=",
            BinOp::Add => "+",
            BinOp::Subtract => "-",
            BinOp::Multiply => "*",
            BinOp::Divide => "/",
            BinOp::Modulo => "%",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Negate,
    Not,
}

/// Type-test mode: `is` produces a boolean, `as` a checked conversion that
/// yields null instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestMode {
    Is,
    As,
}

/// Sequence operators recognized on collection-typed receivers.
///
/// The predicate/selector-taking forms open a sub-query scope with a fresh
/// iteration variable; `Contains`, `Take`, and `Skip` take a plain argument
/// evaluated in the enclosing scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqOp {
    Where,
    Any,
    All,
    Select,
    OrderBy,
    OrderByDescending,
    GroupBy,
    First,
    FirstOrDefault,
    Count,
    Sum,
    Min,
    Max,
    Average,
    Contains,
    Take,
    Skip,
}

impl SeqOp {
    /// Maps a method name to its sequence operator, if it is one.
    pub fn from_name(name: &str) -> Option<SeqOp> {
        match name {
            "Where" => Some(SeqOp::Where),
            "Any" => Some(SeqOp::Any),
            "All" => Some(SeqOp::All),
            "Select" => Some(SeqOp::Select),
            "OrderBy" => Some(SeqOp::OrderBy),
            "OrderByDescending" => Some(SeqOp::OrderByDescending),
            "GroupBy" => Some(SeqOp::GroupBy),
            "First" => Some(SeqOp::First),
            "FirstOrDefault" => Some(SeqOp::FirstOrDefault),
            "Count" => Some(SeqOp::Count),
            "Sum" => Some(SeqOp::Sum),
            "Min" => Some(SeqOp::Min),
            "Max" => Some(SeqOp::Max),
            "Average" => Some(SeqOp::Average),
            "Contains" => Some(SeqOp::Contains),
            "Take" => Some(SeqOp::Take),
            "Skip" => Some(SeqOp::Skip),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SeqOp::Where => "Where",
            SeqOp::Any => "Any",
            SeqOp::All => "All",
            SeqOp::Select => "Select",
            SeqOp::OrderBy => "OrderBy",
            SeqOp::OrderByDescending => "OrderByDescending",
            SeqOp::GroupBy => "GroupBy",
            SeqOp::First => "First",
            SeqOp::FirstOrDefault => "FirstOrDefault",
            SeqOp::Count => "Count",
            SeqOp::Sum => "Sum",
            SeqOp::Min => "Min",
            SeqOp::Max => "Max",
            SeqOp::Average => "Average",
            SeqOp::Contains => "Contains",
            SeqOp::Take => "Take",
            SeqOp::Skip => "Skip",
        }
    }

    /// True for operators whose argument is parsed inside a new scope frame
    /// with an implicit iteration variable.
    pub fn opens_scope(&self) -> bool {
        !matches!(self, SeqOp::Contains | SeqOp::Take | SeqOp::Skip)
    }
}

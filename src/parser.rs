use std::mem;
use std::sync::Arc;

use crate::ast::operators::{BinOp, SeqOp, TestMode, UnOp};
use crate::ast::{Expr, Ordering, Parameter, ParsedLambda, ParsedOrdering, SpannedToken, Token};
use crate::lexer::{LexError, Lexer};
use crate::overload::{self, ResolveFailure, explicit_allowed, implicit_cost};
use crate::registry::{
    MethodDescriptor, TypeDef, TypeRegistry, TypeResolution, record_shape, string_methods,
};
use crate::types::{FloatTy, IntTy, Ty};
use crate::value::Value;

/// A parse or bind failure. Every variant carries the character offset of
/// the offending token; all are terminal for the current parse call.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Malformed token, unexpected token, unterminated literal, or
    /// trailing input.
    Syntax { message: String, pos: usize },

    /// Name not resolvable in any visible scope, member set, or
    /// allow-listed type.
    UnknownIdentifier { name: String, pos: usize },

    /// Named type exists but is outside the allow-list for this parse.
    DisallowedType { name: String, pos: usize },

    /// Operator operands, conditional branches, or an expected result type
    /// with no valid conversion.
    TypeMismatch { message: String, pos: usize },

    /// Overload resolution found no applicable candidate.
    NoApplicableMethod { name: String, pos: usize },

    /// Overload resolution found more than one equally good candidate.
    AmbiguousMatch { name: String, pos: usize },

    /// No candidate signature accepts this argument count.
    ArgumentCountMismatch { name: String, pos: usize },
}

impl ParseError {
    /// Character offset the error points at.
    pub fn position(&self) -> usize {
        match self {
            ParseError::Syntax { pos, .. }
            | ParseError::UnknownIdentifier { pos, .. }
            | ParseError::DisallowedType { pos, .. }
            | ParseError::TypeMismatch { pos, .. }
            | ParseError::NoApplicableMethod { pos, .. }
            | ParseError::AmbiguousMatch { pos, .. }
            | ParseError::ArgumentCountMismatch { pos, .. } => *pos,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Syntax { message, pos } => {
                write!(f, "Syntax error at position {}: {}", pos, message)
            }
            ParseError::UnknownIdentifier { name, pos } => {
                write!(f, "Unknown identifier '{}' at position {}", name, pos)
            }
            ParseError::DisallowedType { name, pos } => {
                write!(f, "Type '{}' is not accessible at position {}", name, pos)
            }
            ParseError::TypeMismatch { message, pos } => {
                write!(f, "Type mismatch at position {}: {}", pos, message)
            }
            ParseError::NoApplicableMethod { name, pos } => {
                write!(f, "No applicable overload for '{}' at position {}", name, pos)
            }
            ParseError::AmbiguousMatch { name, pos } => {
                write!(f, "Ambiguous match for '{}' at position {}", name, pos)
            }
            ParseError::ArgumentCountMismatch { name, pos } => {
                write!(f, "Wrong number of arguments to '{}' at position {}", name, pos)
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError::Syntax {
            message: e.message,
            pos: e.pos,
        }
    }
}

/// One binding frame: names introduced by the parameter list or by a
/// sub-query scope, each with its static type and evaluation slot.
struct ScopeFrame {
    bindings: Vec<(String, Ty, usize)>,
}

impl ScopeFrame {
    fn new() -> Self {
        ScopeFrame { bindings: Vec::new() }
    }

    fn bind(&mut self, name: impl Into<String>, ty: Ty, slot: usize) {
        self.bindings.push((name.into(), ty, slot));
    }
}

const NUMERIC_OPERAND_TYPES: &[Ty] = &[
    Ty::Int(IntTy::I32),
    Ty::Int(IntTy::U32),
    Ty::Int(IntTy::I64),
    Ty::Int(IntTy::U64),
    Ty::Float(FloatTy::F32),
    Ty::Float(FloatTy::F64),
    Ty::Decimal,
];

const INTEGRAL_OPERAND_TYPES: &[Ty] = &[
    Ty::Int(IntTy::I32),
    Ty::Int(IntTy::U32),
    Ty::Int(IntTy::I64),
    Ty::Int(IntTy::U64),
];

/// The single-pass parser and binder.
///
/// State is the current token, the scope stack, and the registry reference;
/// every grammar rule both consumes tokens and emits a typed node. Scope
/// frames pushed for sub-query arguments are popped on every exit path,
/// including failures.
pub struct Parser<'r> {
    lexer: Lexer,
    registry: &'r TypeRegistry,
    values: Vec<Value>,
    current: SpannedToken,
    scopes: Vec<ScopeFrame>,
    params: Vec<Parameter>,
    slot_count: usize,
    depth: usize,
}

impl<'r> Parser<'r> {
    /// Creates a parser over `lexer` with the given declared parameters and
    /// positional substitution values.
    ///
    /// A parameter with an empty name is bound as the implicit `it`.
    pub fn new(
        mut lexer: Lexer,
        registry: &'r TypeRegistry,
        params: Vec<Parameter>,
        values: Vec<Value>,
    ) -> Result<Self, ParseError> {
        let current = lexer.next_token()?;
        let mut frame = ScopeFrame::new();
        for (slot, param) in params.iter().enumerate() {
            let name = if param.name.is_empty() { "it" } else { &param.name };
            frame.bind(name, param.ty.clone(), slot);
        }
        let slot_count = params.len();
        Ok(Parser {
            lexer,
            registry,
            values,
            current,
            scopes: vec![frame],
            params,
            slot_count,
            depth: 0,
        })
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// Total evaluation slots used: parameters plus iteration variables.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn pos(&self) -> usize {
        self.current.pos
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current.token) == mem::discriminant(token)
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return Err(self.syntax(
                format!("expected {:?}, got {:?}", expected, self.current.token),
                self.pos(),
            ));
        }
        self.advance()
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        let name = match &self.current.token {
            Token::Identifier(n) => n.clone(),
            t => {
                return Err(self.syntax(format!("expected identifier, got {:?}", t), self.pos()));
            }
        };
        self.advance()?;
        Ok(name)
    }

    fn syntax(&self, message: String, pos: usize) -> ParseError {
        ParseError::Syntax { message, pos }
    }

    fn type_mismatch(&self, message: String, pos: usize) -> ParseError {
        ParseError::TypeMismatch { message, pos }
    }

    /// Parses a complete expression, optionally converting the root to an
    /// expected result type, and requires the whole input to be consumed.
    pub fn parse(&mut self, result: Option<&Ty>) -> Result<Expr, ParseError> {
        let pos = self.pos();
        let expr = self.parse_expression()?;
        if !self.check(&Token::Eof) {
            return Err(self.syntax("unexpected trailing input".to_string(), self.pos()));
        }
        match result {
            Some(target) => self.coerce(expr, target, pos),
            None => Ok(expr),
        }
    }

    /// Parses a comma-separated ordering list in the top-level scope.
    ///
    /// Each selector may be followed by `asc`/`ascending` or
    /// `desc`/`descending`; the default is ascending.
    pub fn parse_ordering(&mut self) -> Result<Vec<Ordering>, ParseError> {
        let mut orderings = Vec::new();
        loop {
            let pos = self.pos();
            let selector = self.parse_expression()?;
            if !selector.ty().is_orderable() {
                return Err(self.type_mismatch(
                    format!("type '{}' cannot be used as a sort key", selector.ty().name()),
                    pos,
                ));
            }
            let ascending = match &self.current.token {
                Token::Identifier(word) if word == "asc" || word == "ascending" => {
                    self.advance()?;
                    true
                }
                Token::Identifier(word) if word == "desc" || word == "descending" => {
                    self.advance()?;
                    false
                }
                _ => true,
            };
            orderings.push(Ordering {
                selector,
                ascending,
            });
            if self.check(&Token::Comma) {
                self.advance()?;
            } else {
                break;
            }
        }
        if !self.check(&Token::Eof) {
            return Err(self.syntax("unexpected trailing input".to_string(), self.pos()));
        }
        Ok(orderings)
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_conditional()
    }

    // ?: is right-associative
    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let pos = self.pos();
        let test = self.parse_logical_or()?;
        if self.check(&Token::Question) {
            self.advance()?;
            let then = self.parse_conditional()?;
            self.expect(Token::Colon)?;
            let otherwise = self.parse_conditional()?;
            return self.bind_conditional(test, then, otherwise, pos);
        }
        Ok(test)
    }

    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_logical_and()?;
        while self.check(&Token::BarBar) || self.check(&Token::Or) {
            let pos = self.pos();
            self.advance()?;
            let right = self.parse_logical_and()?;
            left = self.bind_logical(BinOp::Or, left, right, pos)?;
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_bit_or()?;
        while self.check(&Token::AmpAmp) || self.check(&Token::And) {
            let pos = self.pos();
            self.advance()?;
            let right = self.parse_bit_or()?;
            left = self.bind_logical(BinOp::And, left, right, pos)?;
        }
        Ok(left)
    }

    fn parse_bit_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_bit_xor()?;
        while self.check(&Token::Bar) {
            let pos = self.pos();
            self.advance()?;
            let right = self.parse_bit_xor()?;
            left = self.bind_numeric(BinOp::BitOr, left, right, pos, true)?;
        }
        Ok(left)
    }

    fn parse_bit_xor(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_bit_and()?;
        while self.check(&Token::Caret) {
            let pos = self.pos();
            self.advance()?;
            let right = self.parse_bit_and()?;
            left = self.bind_numeric(BinOp::BitXor, left, right, pos, true)?;
        }
        Ok(left)
    }

    fn parse_bit_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;
        while self.check(&Token::Amp) {
            let pos = self.pos();
            self.advance()?;
            let right = self.parse_equality()?;
            left = self.bind_numeric(BinOp::BitAnd, left, right, pos, true)?;
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match &self.current.token {
                Token::EqEq | Token::Eq => BinOp::Equal,
                Token::NotEq => BinOp::NotEqual,
                _ => break,
            };
            let pos = self.pos();
            self.advance()?;
            let right = self.parse_relational()?;
            left = self.bind_equality(op, left, right, pos)?;
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            match &self.current.token {
                Token::Is => {
                    self.advance()?;
                    let target = self.parse_type_target()?;
                    left = Expr::TypeTest {
                        expr: Box::new(left),
                        target,
                        mode: TestMode::Is,
                    };
                }
                Token::As => {
                    let pos = self.pos();
                    self.advance()?;
                    let target = self.parse_type_target()?;
                    let from = left.ty();
                    if !explicit_allowed(&from, &target) {
                        return Err(self.type_mismatch(
                            format!(
                                "no conversion from '{}' to '{}'",
                                from.name(),
                                target.name()
                            ),
                            pos,
                        ));
                    }
                    left = Expr::TypeTest {
                        expr: Box::new(left),
                        target,
                        mode: TestMode::As,
                    };
                }
                Token::Lt | Token::Gt | Token::LtEq | Token::GtEq => {
                    let op = match &self.current.token {
                        Token::Lt => BinOp::LessThan,
                        Token::Gt => BinOp::GreaterThan,
                        Token::LtEq => BinOp::LessEqual,
                        _ => BinOp::GreaterEqual,
                    };
                    let pos = self.pos();
                    self.advance()?;
                    let right = self.parse_additive()?;
                    left = self.bind_relational(op, left, right, pos)?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match &self.current.token {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Subtract,
                _ => break,
            };
            let pos = self.pos();
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = self.bind_additive(op, left, right, pos)?;
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match &self.current.token {
                Token::Star => BinOp::Multiply,
                Token::Slash => BinOp::Divide,
                Token::Percent => BinOp::Modulo,
                _ => break,
            };
            let pos = self.pos();
            self.advance()?;
            let right = self.parse_unary()?;
            left = self.bind_numeric(op, left, right, pos, false)?;
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match &self.current.token {
            Token::Minus => {
                let pos = self.pos();
                self.advance()?;
                let operand = self.parse_unary()?;
                self.bind_negate(operand, pos)
            }
            Token::Exclamation | Token::Not => {
                let pos = self.pos();
                self.advance()?;
                let operand = self.parse_unary()?;
                let operand = self.require_bool(operand, pos)?;
                Ok(Expr::Unary {
                    op: UnOp::Not,
                    operand: Box::new(operand),
                    ty: Ty::Bool,
                })
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.check(&Token::Dot) {
                self.advance()?;
                let pos = self.pos();
                let name = self.expect_identifier()?;
                if self.check(&Token::LParen) {
                    expr = self.bind_method_call(expr, name, pos)?;
                } else {
                    expr = self.bind_member(expr, name, pos)?;
                }
            } else if self.check(&Token::LBracket) {
                let pos = self.pos();
                self.advance()?;
                let index = self.parse_expression()?;
                self.expect(Token::RBracket)?;
                expr = self.bind_index(expr, index, pos)?;
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let pos = self.pos();
        match mem::replace(&mut self.current.token, Token::Eof) {
            Token::Integer { value, ty } => {
                self.advance()?;
                let literal = match ty {
                    IntTy::U64 => Value::UInt(value),
                    _ => Value::Int(value as i64),
                };
                Ok(Expr::Literal {
                    value: literal,
                    ty: Ty::Int(ty),
                })
            }
            Token::Float { value, ty } => {
                self.advance()?;
                Ok(Expr::Literal {
                    value: Value::Float(value),
                    ty: Ty::Float(ty),
                })
            }
            Token::Decimal(d) => {
                self.advance()?;
                Ok(Expr::Literal {
                    value: Value::Decimal(d),
                    ty: Ty::Decimal,
                })
            }
            Token::String(s) => {
                self.advance()?;
                Ok(Expr::Literal {
                    value: Value::Str(s),
                    ty: Ty::Str,
                })
            }
            Token::Char(c) => {
                self.advance()?;
                Ok(Expr::Literal {
                    value: Value::Char(c),
                    ty: Ty::Char,
                })
            }
            Token::Boolean(b) => {
                self.advance()?;
                Ok(Expr::Literal {
                    value: Value::Bool(b),
                    ty: Ty::Bool,
                })
            }
            Token::Null => {
                self.advance()?;
                Ok(Expr::Literal {
                    value: Value::Null,
                    ty: Ty::Null,
                })
            }
            Token::Placeholder(index) => {
                self.advance()?;
                match self.values.get(index) {
                    Some(value) => Ok(Expr::Literal {
                        value: value.clone(),
                        ty: value.ty(),
                    }),
                    None => Err(ParseError::UnknownIdentifier {
                        name: format!("@{}", index),
                        pos,
                    }),
                }
            }
            Token::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Token::Iif => {
                self.advance()?;
                self.expect(Token::LParen)?;
                let test = self.parse_expression()?;
                self.expect(Token::Comma)?;
                let then = self.parse_expression()?;
                self.expect(Token::Comma)?;
                let otherwise = self.parse_expression()?;
                self.expect(Token::RParen)?;
                self.bind_conditional(test, then, otherwise, pos)
            }
            Token::New => {
                self.advance()?;
                self.parse_new()
            }
            Token::Identifier(name) => {
                self.advance()?;
                self.parse_identifier(name, pos)
            }
            token => Err(self.syntax(
                format!("unexpected token in expression: {:?}", token),
                pos,
            )),
        }
    }

    // ------------------------------------------------------------------
    // Identifier and type-name resolution
    // ------------------------------------------------------------------

    fn lookup(&self, name: &str) -> Option<(Ty, usize)> {
        for frame in self.scopes.iter().rev() {
            if let Some((_, ty, slot)) = frame.bindings.iter().rev().find(|(n, _, _)| n == name) {
                return Some((ty.clone(), *slot));
            }
        }
        None
    }

    /// Resolves a bare identifier: scope frames innermost-first, then a
    /// member or query call applied to an in-scope `it`, then an
    /// allow-listed (possibly dotted) type name, and lastly a deferred
    /// lookup when `it` is dynamic.
    fn parse_identifier(&mut self, name: String, pos: usize) -> Result<Expr, ParseError> {
        if let Some((ty, slot)) = self.lookup(&name) {
            return Ok(Expr::Var { name, slot, ty });
        }

        // A bare name can be a member or sequence call on the implicit
        // parameter: `Price > 5` reads as `it.Price > 5`.
        if let Some((it_ty, slot)) = self.lookup("it") {
            let it_var = Expr::Var {
                name: "it".to_string(),
                slot,
                ty: it_ty.clone(),
            };
            if self.check(&Token::LParen) {
                match &it_ty {
                    Ty::List(_) if SeqOp::from_name(&name).is_some() => {
                        return self.bind_method_call(it_var, name, pos);
                    }
                    Ty::Str if string_methods().iter().any(|m| m.name == name) => {
                        return self.bind_method_call(it_var, name, pos);
                    }
                    _ => {}
                }
            } else {
                match &it_ty {
                    Ty::Object(desc) if desc.property(&name).is_some() => {
                        return self.bind_member(it_var, name, pos);
                    }
                    Ty::Record(shape) if shape.field_index(&name).is_some() => {
                        return self.bind_member(it_var, name, pos);
                    }
                    Ty::Str if name == "Length" => {
                        return self.bind_member(it_var, name, pos);
                    }
                    // A dynamic `it` defers unknown bare names, but only
                    // after the registry has had its chance below.
                    _ => {}
                }
            }
        }

        if let Some((it_ty @ (Ty::Map | Ty::Dynamic), slot)) = self.lookup("it")
            && !self.check(&Token::LParen)
            && matches!(self.registry.resolve(&name), TypeResolution::Unknown)
        {
            return Ok(Expr::DynamicMember {
                base: Box::new(Expr::Var {
                    name: "it".to_string(),
                    slot,
                    ty: it_ty,
                }),
                name,
            });
        }

        let def = self.resolve_type_name(name, pos)?;
        self.parse_type_reference(def, pos)
    }

    /// Extends an unresolved name with dotted segments until it matches the
    /// registry; the shortest allow-listed match wins.
    fn resolve_type_name(&mut self, first: String, pos: usize) -> Result<TypeDef, ParseError> {
        let mut qualified = first;
        loop {
            match self.registry.resolve(&qualified) {
                TypeResolution::Allowed(def) => return Ok(def),
                TypeResolution::Declared => {
                    return Err(ParseError::DisallowedType {
                        name: qualified,
                        pos,
                    });
                }
                TypeResolution::Unknown => {
                    if self.check(&Token::Dot) {
                        let saved = self.lexer.offset();
                        let next = self.lexer.next_token()?;
                        if let Token::Identifier(part) = next.token {
                            qualified.push('.');
                            qualified.push_str(&part);
                            // step past the consumed dot and segment
                            self.advance()?;
                            continue;
                        }
                        self.lexer.seek(saved);
                    }
                    return Err(ParseError::UnknownIdentifier {
                        name: qualified,
                        pos,
                    });
                }
            }
        }
    }

    /// A resolved type name in expression position: a conversion call or a
    /// static (enum) member access.
    fn parse_type_reference(&mut self, def: TypeDef, pos: usize) -> Result<Expr, ParseError> {
        let type_name = def.as_ty().name();
        if self.check(&Token::LParen) {
            let mut args = self.parse_argument_list()?;
            if args.len() != 1 {
                return Err(ParseError::ArgumentCountMismatch {
                    name: type_name,
                    pos,
                });
            }
            let arg = args.remove(0);
            let target = def.as_ty();
            let from = arg.ty();
            if !explicit_allowed(&from, &target) {
                return Err(self.type_mismatch(
                    format!("no conversion from '{}' to '{}'", from.name(), target.name()),
                    pos,
                ));
            }
            return Ok(Expr::Convert {
                expr: Box::new(arg),
                ty: target,
            });
        }
        if self.check(&Token::Dot) {
            self.advance()?;
            let member_pos = self.pos();
            let member = self.expect_identifier()?;
            return match &def {
                TypeDef::Enum(e) => match e.member(&member) {
                    Some(value) => Ok(Expr::Literal {
                        value: Value::Enum {
                            ty: e.clone(),
                            value,
                        },
                        ty: Ty::Enum(e.clone()),
                    }),
                    None => Err(ParseError::UnknownIdentifier {
                        name: format!("{}.{}", e.name, member),
                        pos: member_pos,
                    }),
                },
                _ => Err(ParseError::UnknownIdentifier {
                    name: format!("{}.{}", type_name, member),
                    pos: member_pos,
                }),
            };
        }
        Err(self.syntax(
            format!("type name '{}' is not a valid expression here", type_name),
            pos,
        ))
    }

    /// The target of `is`/`as`: an allow-listed, possibly dotted type name.
    fn parse_type_target(&mut self) -> Result<Ty, ParseError> {
        let pos = self.pos();
        let first = self.expect_identifier()?;
        let def = self.resolve_type_name(first, pos)?;
        Ok(def.as_ty())
    }

    // ------------------------------------------------------------------
    // Member, call, and index binding
    // ------------------------------------------------------------------

    fn bind_member(&mut self, base: Expr, name: String, pos: usize) -> Result<Expr, ParseError> {
        match base.ty() {
            Ty::Record(shape) => match shape.field_ty(&name) {
                Some(ty) => Ok(Expr::Property {
                    base: Box::new(base),
                    name,
                    ty: ty.clone(),
                }),
                None => Err(ParseError::UnknownIdentifier { name, pos }),
            },
            Ty::Object(desc) => match desc.property(&name) {
                Some(p) => Ok(Expr::Property {
                    base: Box::new(base),
                    name,
                    ty: p.ty.clone(),
                }),
                None => Err(ParseError::UnknownIdentifier { name, pos }),
            },
            Ty::Str if name == "Length" => Ok(Expr::Property {
                base: Box::new(base),
                name,
                ty: Ty::Int(IntTy::I32),
            }),
            // Deferred lookup over a string-keyed bag or an already-dynamic
            // value; misses yield null at evaluation time.
            Ty::Map | Ty::Dynamic => Ok(Expr::DynamicMember {
                base: Box::new(base),
                name,
            }),
            _ => Err(ParseError::UnknownIdentifier { name, pos }),
        }
    }

    fn bind_method_call(
        &mut self,
        base: Expr,
        name: String,
        pos: usize,
    ) -> Result<Expr, ParseError> {
        match base.ty() {
            Ty::List(elem) => match SeqOp::from_name(&name) {
                Some(op) => self.parse_sequence_op(base, op, *elem, pos),
                None => Err(ParseError::UnknownIdentifier { name, pos }),
            },
            Ty::Str => {
                let candidates: Vec<Arc<MethodDescriptor>> = string_methods()
                    .iter()
                    .filter(|m| m.name == name)
                    .cloned()
                    .collect();
                if candidates.is_empty() {
                    return Err(ParseError::UnknownIdentifier { name, pos });
                }
                let args = self.parse_argument_list()?;
                let arg_tys: Vec<Ty> = args.iter().map(Expr::ty).collect();
                let sigs: Vec<&[Ty]> = candidates.iter().map(|m| m.params.as_slice()).collect();
                match overload::resolve(&sigs, &arg_tys) {
                    Ok(index) => {
                        let method = candidates[index].clone();
                        let args = args
                            .into_iter()
                            .zip(method.params.iter())
                            .map(|(arg, param)| self.convert_to(arg, param))
                            .collect();
                        Ok(Expr::Call {
                            base: Box::new(base),
                            method,
                            args,
                        })
                    }
                    Err(ResolveFailure::Ambiguous) => {
                        Err(ParseError::AmbiguousMatch { name, pos })
                    }
                    Err(ResolveFailure::NoMatch) => {
                        Err(ParseError::NoApplicableMethod { name, pos })
                    }
                    Err(ResolveFailure::ArityMismatch) => {
                        Err(ParseError::ArgumentCountMismatch { name, pos })
                    }
                }
            }
            Ty::Map | Ty::Dynamic => Err(self.type_mismatch(
                format!("cannot call method '{}' on a dynamic value", name),
                pos,
            )),
            _ => Err(ParseError::UnknownIdentifier { name, pos }),
        }
    }

    fn bind_index(&mut self, base: Expr, index: Expr, pos: usize) -> Result<Expr, ParseError> {
        let base_ty = base.ty();
        let index_ty = index.ty();
        let element = match &base_ty {
            Ty::List(elem) => {
                if !(index_ty.is_integral() || index_ty == Ty::Dynamic) {
                    return Err(self.type_mismatch(
                        format!("list index must be integral, found '{}'", index_ty.name()),
                        pos,
                    ));
                }
                (**elem).clone()
            }
            Ty::Str => {
                if !(index_ty.is_integral() || index_ty == Ty::Dynamic) {
                    return Err(self.type_mismatch(
                        format!("string index must be integral, found '{}'", index_ty.name()),
                        pos,
                    ));
                }
                Ty::Char
            }
            Ty::Map => {
                if !matches!(index_ty, Ty::Str | Ty::Dynamic) {
                    return Err(self.type_mismatch(
                        format!("map key must be a string, found '{}'", index_ty.name()),
                        pos,
                    ));
                }
                Ty::Dynamic
            }
            Ty::Dynamic => Ty::Dynamic,
            other => {
                return Err(self.type_mismatch(
                    format!("type '{}' is not indexable", other.name()),
                    pos,
                ));
            }
        };
        Ok(Expr::Index {
            base: Box::new(base),
            index: Box::new(index),
            ty: element,
        })
    }

    /// Parses `( expr, expr, ... )` without opening a scope.
    fn parse_argument_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if self.check(&Token::RParen) {
            self.advance()?;
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if self.check(&Token::Comma) {
                self.advance()?;
                continue;
            }
            break;
        }
        self.expect(Token::RParen)?;
        Ok(args)
    }

    // ------------------------------------------------------------------
    // Sub-query scopes
    // ------------------------------------------------------------------

    /// Runs `f` with a fresh scope frame binding the implicit iteration
    /// variable under `it` and `it_<depth>`. The frame is popped on every
    /// exit path.
    fn with_subquery_scope<T>(
        &mut self,
        elem: Ty,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<(T, usize), ParseError> {
        let slot = self.slot_count;
        self.slot_count += 1;
        self.depth += 1;
        let mut frame = ScopeFrame::new();
        frame.bind("it", elem.clone(), slot);
        frame.bind(format!("it_{}", self.depth), elem, slot);
        self.scopes.push(frame);
        let result = f(self);
        self.scopes.pop();
        self.depth -= 1;
        result.map(|value| (value, slot))
    }

    fn parse_sequence_op(
        &mut self,
        source: Expr,
        op: SeqOp,
        elem: Ty,
        pos: usize,
    ) -> Result<Expr, ParseError> {
        self.expect(Token::LParen)?;

        if !op.opens_scope() {
            let arg_pos = self.pos();
            let arg = self.parse_expression()?;
            self.expect(Token::RParen)?;
            let (arg, ty) = match op {
                SeqOp::Contains => (self.coerce(arg, &elem, arg_pos)?, Ty::Bool),
                _ => (
                    self.coerce(arg, &Ty::Int(IntTy::I32), arg_pos)?,
                    Ty::List(Box::new(elem)),
                ),
            };
            return Ok(Expr::Subquery {
                op,
                source: Box::new(source),
                var_slot: None,
                body: Some(Box::new(arg)),
                ty,
            });
        }

        if self.check(&Token::RParen) {
            self.advance()?;
            let ty = self.parameterless_result(op, &elem, pos)?;
            return Ok(Expr::Subquery {
                op,
                source: Box::new(source),
                var_slot: None,
                body: None,
                ty,
            });
        }

        let ((body, body_pos), slot) = self.with_subquery_scope(elem.clone(), |parser| {
            let body_pos = parser.pos();
            let body = parser.parse_expression()?;
            Ok((body, body_pos))
        })?;
        if self.check(&Token::Comma) {
            return Err(ParseError::ArgumentCountMismatch {
                name: op.name().to_string(),
                pos,
            });
        }
        self.expect(Token::RParen)?;

        let (body, ty) = self.bind_sequence_body(op, body, &elem, body_pos)?;
        Ok(Expr::Subquery {
            op,
            source: Box::new(source),
            var_slot: Some(slot),
            body: Some(Box::new(body)),
            ty,
        })
    }

    fn bind_sequence_body(
        &mut self,
        op: SeqOp,
        body: Expr,
        elem: &Ty,
        pos: usize,
    ) -> Result<(Expr, Ty), ParseError> {
        match op {
            SeqOp::Where => {
                let body = self.require_bool(body, pos)?;
                Ok((body, Ty::List(Box::new(elem.clone()))))
            }
            SeqOp::Any | SeqOp::All => {
                let body = self.require_bool(body, pos)?;
                Ok((body, Ty::Bool))
            }
            SeqOp::First | SeqOp::FirstOrDefault => {
                let body = self.require_bool(body, pos)?;
                Ok((body, elem.clone()))
            }
            SeqOp::Count => {
                let body = self.require_bool(body, pos)?;
                Ok((body, Ty::Int(IntTy::I32)))
            }
            SeqOp::Select => {
                let ty = Ty::List(Box::new(body.ty()));
                Ok((body, ty))
            }
            SeqOp::OrderBy | SeqOp::OrderByDescending => {
                self.require_orderable(&body, pos)?;
                Ok((body, Ty::List(Box::new(elem.clone()))))
            }
            SeqOp::GroupBy => {
                self.require_orderable(&body, pos)?;
                let shape = record_shape(vec![
                    ("Key".to_string(), body.ty()),
                    ("Items".to_string(), Ty::List(Box::new(elem.clone()))),
                ]);
                Ok((body, Ty::List(Box::new(Ty::Record(shape)))))
            }
            SeqOp::Sum => {
                let ty = self.require_numeric(&body, pos)?;
                Ok((body, ty))
            }
            SeqOp::Min | SeqOp::Max => {
                self.require_orderable(&body, pos)?;
                let ty = body.ty();
                Ok((body, ty))
            }
            SeqOp::Average => {
                self.require_numeric(&body, pos)?;
                let ty = match body.ty() {
                    Ty::Decimal => Ty::Decimal,
                    Ty::Dynamic => Ty::Dynamic,
                    _ => Ty::Float(FloatTy::F64),
                };
                Ok((body, ty))
            }
            SeqOp::Contains | SeqOp::Take | SeqOp::Skip => unreachable!(),
        }
    }

    fn parameterless_result(
        &mut self,
        op: SeqOp,
        elem: &Ty,
        pos: usize,
    ) -> Result<Ty, ParseError> {
        match op {
            SeqOp::Any => Ok(Ty::Bool),
            SeqOp::First | SeqOp::FirstOrDefault => Ok(elem.clone()),
            SeqOp::Count => Ok(Ty::Int(IntTy::I32)),
            SeqOp::Sum => {
                if !(elem.is_numeric() || *elem == Ty::Dynamic) {
                    return Err(self.type_mismatch(
                        format!("cannot sum elements of type '{}'", elem.name()),
                        pos,
                    ));
                }
                Ok(elem.clone())
            }
            SeqOp::Min | SeqOp::Max => {
                if !elem.is_orderable() {
                    return Err(self.type_mismatch(
                        format!("elements of type '{}' have no ordering", elem.name()),
                        pos,
                    ));
                }
                Ok(elem.clone())
            }
            SeqOp::Average => {
                if !(elem.is_numeric() || *elem == Ty::Dynamic) {
                    return Err(self.type_mismatch(
                        format!("cannot average elements of type '{}'", elem.name()),
                        pos,
                    ));
                }
                Ok(match elem {
                    Ty::Decimal => Ty::Decimal,
                    Ty::Dynamic => Ty::Dynamic,
                    _ => Ty::Float(FloatTy::F64),
                })
            }
            _ => Err(ParseError::ArgumentCountMismatch {
                name: op.name().to_string(),
                pos,
            }),
        }
    }

    // ------------------------------------------------------------------
    // Projections
    // ------------------------------------------------------------------

    fn parse_new(&mut self) -> Result<Expr, ParseError> {
        self.expect(Token::LParen)?;
        let mut fields: Vec<(String, Ty)> = Vec::new();
        let mut inits: Vec<Expr> = Vec::new();
        loop {
            let field_pos = self.pos();
            let init = self.parse_expression()?;
            let name = if self.check(&Token::Alias) {
                self.advance()?;
                self.expect_identifier()?
            } else {
                match default_field_name(&init) {
                    Some(name) => name,
                    None => {
                        return Err(self.syntax(
                            "projection field has no derivable name; add 'alias <name>'"
                                .to_string(),
                            field_pos,
                        ));
                    }
                }
            };
            if fields.iter().any(|(n, _)| *n == name) {
                return Err(self.syntax(
                    format!("duplicate projection field '{}'", name),
                    field_pos,
                ));
            }
            fields.push((name, init.ty()));
            inits.push(init);
            if self.check(&Token::Comma) {
                self.advance()?;
                continue;
            }
            break;
        }
        self.expect(Token::RParen)?;
        let shape = record_shape(fields);
        Ok(Expr::New {
            shape,
            fields: inits,
        })
    }

    // ------------------------------------------------------------------
    // Operator binding
    // ------------------------------------------------------------------

    fn require_bool(&self, expr: Expr, pos: usize) -> Result<Expr, ParseError> {
        match expr.ty() {
            Ty::Bool => Ok(expr),
            Ty::Dynamic => Ok(Expr::Convert {
                expr: Box::new(expr),
                ty: Ty::Bool,
            }),
            other => Err(self.type_mismatch(
                format!("expected a boolean expression, found '{}'", other.name()),
                pos,
            )),
        }
    }

    fn require_orderable(&self, expr: &Expr, pos: usize) -> Result<(), ParseError> {
        let ty = expr.ty();
        if ty.is_orderable() {
            Ok(())
        } else {
            Err(self.type_mismatch(
                format!("type '{}' has no ordering", ty.name()),
                pos,
            ))
        }
    }

    fn require_numeric(&self, expr: &Expr, pos: usize) -> Result<Ty, ParseError> {
        let ty = expr.ty();
        if ty.is_numeric() || ty == Ty::Dynamic {
            Ok(ty)
        } else {
            Err(self.type_mismatch(
                format!("expected a numeric expression, found '{}'", ty.name()),
                pos,
            ))
        }
    }

    /// Wraps in a conversion node unless the types already match.
    fn convert_to(&self, expr: Expr, target: &Ty) -> Expr {
        if expr.ty() == *target {
            expr
        } else {
            Expr::Convert {
                expr: Box::new(expr),
                ty: target.clone(),
            }
        }
    }

    /// Implicit coercion for result types, predicate arguments, and call
    /// arguments outside overload resolution. Dynamic sources are admitted
    /// and checked at evaluation time.
    fn coerce(&self, expr: Expr, target: &Ty, pos: usize) -> Result<Expr, ParseError> {
        let from = expr.ty();
        if from == *target || *target == Ty::Dynamic {
            return Ok(expr);
        }
        if from == Ty::Dynamic || implicit_cost(&from, target).is_some() {
            return Ok(self.convert_to(expr, target));
        }
        Err(self.type_mismatch(
            format!("expected '{}', found '{}'", target.name(), from.name()),
            pos,
        ))
    }

    fn bind_logical(
        &mut self,
        op: BinOp,
        left: Expr,
        right: Expr,
        pos: usize,
    ) -> Result<Expr, ParseError> {
        let left = self.require_bool(left, pos)?;
        let right = self.require_bool(right, pos)?;
        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty: Ty::Bool,
        })
    }

    fn bind_numeric(
        &mut self,
        op: BinOp,
        left: Expr,
        right: Expr,
        pos: usize,
        integral_only: bool,
    ) -> Result<Expr, ParseError> {
        let (lty, rty) = (left.ty(), right.ty());
        if lty == Ty::Dynamic || rty == Ty::Dynamic {
            return Ok(Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                ty: Ty::Dynamic,
            });
        }
        let operand_types: &[Ty] = if integral_only {
            INTEGRAL_OPERAND_TYPES
        } else {
            NUMERIC_OPERAND_TYPES
        };
        let sig_store: Vec<[Ty; 2]> = operand_types
            .iter()
            .map(|t| [t.clone(), t.clone()])
            .collect();
        let sigs: Vec<&[Ty]> = sig_store.iter().map(|s| s.as_slice()).collect();
        match overload::resolve(&sigs, &[lty.clone(), rty.clone()]) {
            Ok(index) => {
                let target = sig_store[index][0].clone();
                Ok(Expr::Binary {
                    op,
                    left: Box::new(self.convert_to(left, &target)),
                    right: Box::new(self.convert_to(right, &target)),
                    ty: target,
                })
            }
            Err(ResolveFailure::Ambiguous) => Err(ParseError::AmbiguousMatch {
                name: op.symbol().to_string(),
                pos,
            }),
            Err(_) => Err(self.type_mismatch(
                format!(
                    "operator '{}' cannot be applied to operands of type '{}' and '{}'",
                    op.symbol(),
                    lty.name(),
                    rty.name()
                ),
                pos,
            )),
        }
    }

    fn bind_additive(
        &mut self,
        op: BinOp,
        left: Expr,
        right: Expr,
        pos: usize,
    ) -> Result<Expr, ParseError> {
        let (lty, rty) = (left.ty(), right.ty());
        if op == BinOp::Add && (lty == Ty::Str || rty == Ty::Str) {
            if lty == Ty::Dynamic || rty == Ty::Dynamic {
                return Ok(Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    ty: Ty::Dynamic,
                });
            }
            if lty == Ty::Str && rty == Ty::Str {
                return Ok(Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    ty: Ty::Str,
                });
            }
            return Err(self.type_mismatch(
                format!(
                    "cannot concatenate '{}' and '{}'",
                    lty.name(),
                    rty.name()
                ),
                pos,
            ));
        }
        self.bind_numeric(op, left, right, pos, false)
    }

    /// Candidate signatures for equality and relational operators over the
    /// given operand types: the numeric pairs plus same-type pairs for the
    /// directly comparable kinds.
    fn comparison_signatures(&self, lty: &Ty, rty: &Ty, equality: bool) -> Vec<[Ty; 2]> {
        let mut sigs: Vec<[Ty; 2]> = NUMERIC_OPERAND_TYPES
            .iter()
            .map(|t| [t.clone(), t.clone()])
            .collect();
        for ty in [lty, rty] {
            match ty {
                Ty::Enum(_) => sigs.push([ty.clone(), ty.clone()]),
                Ty::Str | Ty::Char => sigs.push([ty.clone(), ty.clone()]),
                Ty::Bool if equality => sigs.push([ty.clone(), ty.clone()]),
                _ => {}
            }
        }
        sigs.dedup();
        sigs
    }

    fn bind_equality(
        &mut self,
        op: BinOp,
        left: Expr,
        right: Expr,
        pos: usize,
    ) -> Result<Expr, ParseError> {
        let (lty, rty) = (left.ty(), right.ty());
        if lty == Ty::Dynamic || rty == Ty::Dynamic {
            return Ok(Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                ty: Ty::Bool,
            });
        }
        if let (Ty::Enum(a), Ty::Enum(b)) = (&lty, &rty)
            && a.name != b.name
        {
            return Err(self.type_mismatch(
                format!("cannot compare enum '{}' with enum '{}'", a.name, b.name),
                pos,
            ));
        }
        // null compares against any reference-typed operand
        if lty == Ty::Null || rty == Ty::Null {
            let other = if lty == Ty::Null { &rty } else { &lty };
            if other.is_reference() {
                return Ok(Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    ty: Ty::Bool,
                });
            }
            return Err(self.type_mismatch(
                format!("cannot compare '{}' against null", other.name()),
                pos,
            ));
        }
        if lty == rty
            && matches!(
                lty,
                Ty::Str | Ty::Char | Ty::Bool | Ty::Object(_) | Ty::Record(_)
            )
        {
            return Ok(Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                ty: Ty::Bool,
            });
        }
        let sig_store = self.comparison_signatures(&lty, &rty, true);
        let sigs: Vec<&[Ty]> = sig_store.iter().map(|s| s.as_slice()).collect();
        match overload::resolve(&sigs, &[lty.clone(), rty.clone()]) {
            Ok(index) => {
                let target = sig_store[index][0].clone();
                Ok(Expr::Binary {
                    op,
                    left: Box::new(self.convert_to(left, &target)),
                    right: Box::new(self.convert_to(right, &target)),
                    ty: Ty::Bool,
                })
            }
            Err(ResolveFailure::Ambiguous) => Err(ParseError::AmbiguousMatch {
                name: op.symbol().to_string(),
                pos,
            }),
            Err(_) => Err(self.type_mismatch(
                format!(
                    "operator '{}' cannot be applied to operands of type '{}' and '{}'",
                    op.symbol(),
                    lty.name(),
                    rty.name()
                ),
                pos,
            )),
        }
    }

    fn bind_relational(
        &mut self,
        op: BinOp,
        left: Expr,
        right: Expr,
        pos: usize,
    ) -> Result<Expr, ParseError> {
        let (lty, rty) = (left.ty(), right.ty());
        if lty == Ty::Dynamic || rty == Ty::Dynamic {
            return Ok(Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                ty: Ty::Bool,
            });
        }
        if let (Ty::Enum(a), Ty::Enum(b)) = (&lty, &rty)
            && a.name != b.name
        {
            return Err(self.type_mismatch(
                format!("cannot compare enum '{}' with enum '{}'", a.name, b.name),
                pos,
            ));
        }
        if lty == rty && matches!(lty, Ty::Str | Ty::Char) {
            return Ok(Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                ty: Ty::Bool,
            });
        }
        let sig_store = self.comparison_signatures(&lty, &rty, false);
        let sigs: Vec<&[Ty]> = sig_store.iter().map(|s| s.as_slice()).collect();
        match overload::resolve(&sigs, &[lty.clone(), rty.clone()]) {
            Ok(index) => {
                let target = sig_store[index][0].clone();
                Ok(Expr::Binary {
                    op,
                    left: Box::new(self.convert_to(left, &target)),
                    right: Box::new(self.convert_to(right, &target)),
                    ty: Ty::Bool,
                })
            }
            Err(ResolveFailure::Ambiguous) => Err(ParseError::AmbiguousMatch {
                name: op.symbol().to_string(),
                pos,
            }),
            Err(_) => Err(self.type_mismatch(
                format!(
                    "operator '{}' cannot be applied to operands of type '{}' and '{}'",
                    op.symbol(),
                    lty.name(),
                    rty.name()
                ),
                pos,
            )),
        }
    }

    fn bind_negate(&mut self, operand: Expr, pos: usize) -> Result<Expr, ParseError> {
        let ty = operand.ty();
        if ty == Ty::Dynamic {
            return Ok(Expr::Unary {
                op: UnOp::Negate,
                operand: Box::new(operand),
                ty: Ty::Dynamic,
            });
        }
        if ty == Ty::Int(IntTy::U64) || !ty.is_numeric() {
            return Err(self.type_mismatch(
                format!("operator '-' cannot be applied to type '{}'", ty.name()),
                pos,
            ));
        }
        let sig_store: Vec<[Ty; 1]> = [
            Ty::Int(IntTy::I32),
            Ty::Int(IntTy::I64),
            Ty::Float(FloatTy::F32),
            Ty::Float(FloatTy::F64),
            Ty::Decimal,
        ]
        .into_iter()
        .map(|t| [t])
        .collect();
        let sigs: Vec<&[Ty]> = sig_store.iter().map(|s| s.as_slice()).collect();
        match overload::resolve(&sigs, &[ty.clone()]) {
            Ok(index) => {
                let target = sig_store[index][0].clone();
                Ok(Expr::Unary {
                    op: UnOp::Negate,
                    operand: Box::new(self.convert_to(operand, &target)),
                    ty: target,
                })
            }
            Err(_) => Err(self.type_mismatch(
                format!("operator '-' cannot be applied to type '{}'", ty.name()),
                pos,
            )),
        }
    }

    fn bind_conditional(
        &mut self,
        test: Expr,
        then: Expr,
        otherwise: Expr,
        pos: usize,
    ) -> Result<Expr, ParseError> {
        let test = self.require_bool(test, pos)?;
        let (tty, oty) = (then.ty(), otherwise.ty());
        if tty == oty {
            let ty = tty;
            return Ok(Expr::Conditional {
                test: Box::new(test),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
                ty,
            });
        }
        if tty == Ty::Dynamic || oty == Ty::Dynamic {
            return Ok(Expr::Conditional {
                test: Box::new(test),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
                ty: Ty::Dynamic,
            });
        }
        if tty == Ty::Null && oty.is_reference() {
            let ty = oty;
            return Ok(Expr::Conditional {
                test: Box::new(test),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
                ty,
            });
        }
        if oty == Ty::Null && tty.is_reference() {
            let ty = tty;
            return Ok(Expr::Conditional {
                test: Box::new(test),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
                ty,
            });
        }
        // Pick the branch type the other branch converts into; prefer the
        // cheaper direction, and reject a tie as irreconcilable.
        let to_otherwise = implicit_cost(&tty, &oty);
        let to_then = implicit_cost(&oty, &tty);
        let ty = match (to_then, to_otherwise) {
            (Some(a), Some(b)) if a < b => tty.clone(),
            (Some(a), Some(b)) if b < a => oty.clone(),
            (Some(_), None) => tty.clone(),
            (None, Some(_)) => oty.clone(),
            _ => {
                return Err(self.type_mismatch(
                    format!(
                        "conditional branches have incompatible types '{}' and '{}'",
                        tty.name(),
                        oty.name()
                    ),
                    pos,
                ));
            }
        };
        let then = self.convert_to(then, &ty);
        let otherwise = self.convert_to(otherwise, &ty);
        Ok(Expr::Conditional {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
            ty,
        })
    }
}

fn default_field_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Property { name, .. } | Expr::DynamicMember { name, .. } => Some(name.clone()),
        Expr::Var { name, .. } => Some(name.clone()),
        _ => None,
    }
}

/// Parses an expression into a tree packaged with its parameter list.
///
/// `result` optionally converts the root to an expected type; `values` are
/// the positional substitution values reachable as `@0`, `@1`, ...
pub fn parse_lambda(
    text: &str,
    registry: &TypeRegistry,
    params: Vec<Parameter>,
    result: Option<Ty>,
    values: Vec<Value>,
) -> Result<ParsedLambda, ParseError> {
    let lexer = Lexer::new(text);
    let mut parser = Parser::new(lexer, registry, params, values)?;
    let body = parser.parse(result.as_ref())?;
    Ok(ParsedLambda {
        params: parser.params().to_vec(),
        body,
        slot_count: parser.slot_count(),
    })
}

/// Parses a boolean predicate over a single implicit `it` parameter.
pub fn parse_predicate(
    text: &str,
    registry: &TypeRegistry,
    it: Ty,
) -> Result<ParsedLambda, ParseError> {
    parse_lambda(text, registry, vec![Parameter::it(it)], Some(Ty::Bool), Vec::new())
}

/// Parses an ordering list over a single implicit `it` parameter.
pub fn parse_ordering(
    text: &str,
    registry: &TypeRegistry,
    it: Ty,
) -> Result<ParsedOrdering, ParseError> {
    let lexer = Lexer::new(text);
    let mut parser = Parser::new(lexer, registry, vec![Parameter::it(it)], Vec::new())?;
    let orderings = parser.parse_ordering()?;
    Ok(ParsedOrdering {
        params: parser.params().to_vec(),
        orderings,
        slot_count: parser.slot_count(),
    })
}

// AST (Abstract Syntax Tree) definitions for the Python parser

/// Source location information for error reporting and line anchoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOperator {
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    FloorDiv,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
}

impl BinOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOperator::Add => "+",
            BinOperator::Sub => "-",
            BinOperator::Mult => "*",
            BinOperator::MatMult => "@",
            BinOperator::Div => "/",
            BinOperator::FloorDiv => "//",
            BinOperator::Mod => "%",
            BinOperator::Pow => "**",
            BinOperator::LShift => "<<",
            BinOperator::RShift => ">>",
            BinOperator::BitOr => "|",
            BinOperator::BitXor => "^",
            BinOperator::BitAnd => "&",
        }
    }
}

/// Boolean operators (`and` / `or`), which Python keeps n-ary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOperator {
    And,
    Or,
}

impl BoolOperator {
    pub fn keyword(self) -> &'static str {
        match self {
            BoolOperator::And => "and",
            BoolOperator::Or => "or",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,    // not x
    Invert, // ~x
    UAdd,   // +x
    USub,   // -x
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Not => "not ",
            UnaryOperator::Invert => "~",
            UnaryOperator::UAdd => "+",
            UnaryOperator::USub => "-",
        }
    }
}

/// Comparison operators; a chain like `a < b <= c` keeps one per link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOperator {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

impl CmpOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOperator::Eq => "==",
            CmpOperator::NotEq => "!=",
            CmpOperator::Lt => "<",
            CmpOperator::LtE => "<=",
            CmpOperator::Gt => ">",
            CmpOperator::GtE => ">=",
            CmpOperator::Is => "is",
            CmpOperator::IsNot => "is not",
            CmpOperator::In => "in",
            CmpOperator::NotIn => "not in",
        }
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Decimal digits of the value, already normalized (`0x10` is stored as `16`)
    Int(String),
    Float(f64),
    /// Imaginary part of a `1.5j` style literal
    Imaginary(f64),
    /// `u_prefix` remembers a leading `u'...'`, which `unparse` writes back
    Str { value: String, u_prefix: bool },
    Bytes(Vec<u8>),
    True,
    False,
    None,
    Ellipsis,
}

/// Piece of an f-string. Adjacent literals are always merged.
#[derive(Debug, Clone, PartialEq)]
pub enum FStringPart {
    Literal(String),
    Field(FormattedValue),
}

/// `{value!conversion:format_spec}` replacement field
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedValue {
    pub value: Box<Expr>,
    /// `s`, `r` or `a`
    pub conversion: Option<char>,
    pub format_spec: Option<Vec<FStringPart>>,
}

/// Keyword argument in a call or class header. `arg` is `None` for `**mapping`.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub arg: Option<String>,
    pub value: Expr,
}

/// Entry of a dict display. `key` is `None` for `**mapping` unpacking.
#[derive(Debug, Clone, PartialEq)]
pub struct DictEntry {
    pub key: Option<Expr>,
    pub value: Expr,
}

/// One `for ... in ... if ...` clause of a comprehension
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub target: Expr,
    pub iter: Expr,
    pub ifs: Vec<Expr>,
    pub is_async: bool,
}

/// Function or lambda parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub annotation: Option<Expr>,
    pub default: Option<Expr>,
}

impl Param {
    pub fn named(name: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            annotation: None,
            default: None,
        }
    }
}

/// Parameter list of a `def` or `lambda`, split the way Python splits it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parameters {
    /// Parameters before a `/`
    pub posonly: Vec<Param>,
    /// Regular positional-or-keyword parameters
    pub args: Vec<Param>,
    pub vararg: Option<Param>,
    /// Parameters after `*` or `*args`
    pub kwonly: Vec<Param>,
    pub kwarg: Option<Param>,
}

impl Parameters {
    pub fn is_empty(&self) -> bool {
        self.posonly.is_empty()
            && self.args.is_empty()
            && self.vararg.is_none()
            && self.kwonly.is_empty()
            && self.kwarg.is_none()
    }
}

/// Expression nodes
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name(String),
    Constant(Constant),
    /// f-string, including any plain literals concatenated with it
    FormattedString(Vec<FStringPart>),
    BoolOp {
        op: BoolOperator,
        values: Vec<Expr>,
    },
    NamedExpr {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    BinOp {
        left: Box<Expr>,
        op: BinOperator,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    Lambda {
        params: Box<Parameters>,
        body: Box<Expr>,
    },
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Dict(Vec<DictEntry>),
    Set(Vec<Expr>),
    ListComp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    SetComp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    DictComp {
        key: Box<Expr>,
        value: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    GeneratorExp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    Await(Box<Expr>),
    Yield(Option<Box<Expr>>),
    YieldFrom(Box<Expr>),
    Compare {
        left: Box<Expr>,
        ops: Vec<CmpOperator>,
        comparators: Vec<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        slice: Box<Expr>,
    },
    Starred(Box<Expr>),
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
}

impl Expr {
    pub fn name(id: impl Into<String>) -> Self {
        Expr::Name(id.into())
    }

    pub fn int(value: u64) -> Self {
        Expr::Constant(Constant::Int(value.to_string()))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Constant(Constant::Str {
            value: value.into(),
            u_prefix: false,
        })
    }

    pub fn is_call(&self) -> bool {
        matches!(self, Expr::Call { .. })
    }

    /// Noun phrase used in "cannot assign to ..." style errors
    pub fn describe(&self) -> &'static str {
        match self {
            Expr::Name(_) => "name",
            Expr::Constant(Constant::True)
            | Expr::Constant(Constant::False)
            | Expr::Constant(Constant::None) => "constant",
            Expr::Constant(Constant::Ellipsis) => "ellipsis",
            Expr::Constant(_) | Expr::FormattedString(_) => "literal",
            Expr::BoolOp { .. } | Expr::BinOp { .. } | Expr::UnaryOp { .. } => "expression",
            Expr::NamedExpr { .. } => "named expression",
            Expr::Lambda { .. } => "lambda",
            Expr::IfExp { .. } => "conditional expression",
            Expr::Dict(_) => "dict literal",
            Expr::Set(_) => "set display",
            Expr::ListComp { .. } => "list comprehension",
            Expr::SetComp { .. } => "set comprehension",
            Expr::DictComp { .. } => "dict comprehension",
            Expr::GeneratorExp { .. } => "generator expression",
            Expr::Await(_) => "await expression",
            Expr::Yield(_) | Expr::YieldFrom(_) => "yield expression",
            Expr::Compare { .. } => "comparison",
            Expr::Call { .. } => "function call",
            Expr::Attribute { .. } => "attribute",
            Expr::Subscript { .. } => "subscript",
            Expr::Starred(_) => "starred",
            Expr::List(_) => "list",
            Expr::Tuple(_) => "tuple",
            Expr::Slice { .. } => "slice",
        }
    }
}

/// Name imported by `import` / `from ... import`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub name: String,
    pub asname: Option<String>,
}

/// Context manager of a `with` statement
#[derive(Debug, Clone, PartialEq)]
pub struct WithItem {
    pub context_expr: Expr,
    pub optional_vars: Option<Expr>,
}

/// `except` clause of a `try` statement
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    pub exception: Option<Expr>,
    pub name: Option<String>,
    pub body: Vec<Stmt>,
    pub location: SourceLocation,
}

/// One `case` block of a `match` statement
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCase {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Vec<Stmt>,
    pub location: SourceLocation,
}

/// Structural patterns of `case` clauses
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// Literal or dotted-name pattern, compared with `==`
    Value(Expr),
    /// `None`, `True` or `False`, compared with `is`
    Singleton(Constant),
    /// `[a, b]`, `(a, *rest)` or a bare `a, b`
    Sequence(Vec<Pattern>),
    Mapping {
        keys: Vec<Expr>,
        patterns: Vec<Pattern>,
        rest: Option<String>,
    },
    Class {
        cls: Expr,
        patterns: Vec<Pattern>,
        kwd_attrs: Vec<String>,
        kwd_patterns: Vec<Pattern>,
    },
    /// `*name` inside a sequence; `None` for `*_`
    Star(Option<String>),
    Capture(String),
    /// `_`
    Wildcard,
    As {
        pattern: Box<Pattern>,
        name: String,
    },
    Or(Vec<Pattern>),
}

/// Statement nodes
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    FunctionDef {
        name: String,
        params: Parameters,
        body: Vec<Stmt>,
        decorators: Vec<Expr>,
        returns: Option<Expr>,
        is_async: bool,
        location: SourceLocation,
    },
    ClassDef {
        name: String,
        bases: Vec<Expr>,
        keywords: Vec<Keyword>,
        body: Vec<Stmt>,
        decorators: Vec<Expr>,
        location: SourceLocation,
    },
    Return {
        value: Option<Expr>,
        location: SourceLocation,
    },
    Delete {
        targets: Vec<Expr>,
        location: SourceLocation,
    },
    Assign {
        targets: Vec<Expr>,
        value: Expr,
        location: SourceLocation,
    },
    AugAssign {
        target: Expr,
        op: BinOperator,
        value: Expr,
        location: SourceLocation,
    },
    AnnAssign {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
        location: SourceLocation,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        is_async: bool,
        location: SourceLocation,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        location: SourceLocation,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        location: SourceLocation,
    },
    With {
        items: Vec<WithItem>,
        body: Vec<Stmt>,
        is_async: bool,
        location: SourceLocation,
    },
    Raise {
        exc: Option<Expr>,
        cause: Option<Expr>,
        location: SourceLocation,
    },
    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Stmt>,
        finalbody: Vec<Stmt>,
        is_star: bool,
        location: SourceLocation,
    },
    Assert {
        test: Expr,
        msg: Option<Expr>,
        location: SourceLocation,
    },
    Match {
        subject: Expr,
        cases: Vec<MatchCase>,
        location: SourceLocation,
    },
    Import {
        names: Vec<Alias>,
        location: SourceLocation,
    },
    ImportFrom {
        module: Option<String>,
        names: Vec<Alias>,
        level: usize,
        location: SourceLocation,
    },
    Global {
        names: Vec<String>,
        location: SourceLocation,
    },
    Nonlocal {
        names: Vec<String>,
        location: SourceLocation,
    },
    Expr {
        value: Expr,
        location: SourceLocation,
    },
    Pass {
        location: SourceLocation,
    },
    Break {
        location: SourceLocation,
    },
    Continue {
        location: SourceLocation,
    },
}

impl Stmt {
    /// Get the source location of this statement
    pub fn location(&self) -> &SourceLocation {
        match self {
            Stmt::FunctionDef { location, .. } => location,
            Stmt::ClassDef { location, .. } => location,
            Stmt::Return { location, .. } => location,
            Stmt::Delete { location, .. } => location,
            Stmt::Assign { location, .. } => location,
            Stmt::AugAssign { location, .. } => location,
            Stmt::AnnAssign { location, .. } => location,
            Stmt::For { location, .. } => location,
            Stmt::While { location, .. } => location,
            Stmt::If { location, .. } => location,
            Stmt::With { location, .. } => location,
            Stmt::Raise { location, .. } => location,
            Stmt::Try { location, .. } => location,
            Stmt::Assert { location, .. } => location,
            Stmt::Match { location, .. } => location,
            Stmt::Import { location, .. } => location,
            Stmt::ImportFrom { location, .. } => location,
            Stmt::Global { location, .. } => location,
            Stmt::Nonlocal { location, .. } => location,
            Stmt::Expr { location, .. } => location,
            Stmt::Pass { location } => location,
            Stmt::Break { location } => location,
            Stmt::Continue { location } => location,
        }
    }

    pub fn line(&self) -> usize {
        self.location().line
    }

    /// Nested statement sequences in source order (bodies, handlers, case
    /// blocks, else and finally blocks). Simple statements have none.
    pub fn child_blocks(&self) -> Vec<&[Stmt]> {
        match self {
            Stmt::FunctionDef { body, .. }
            | Stmt::ClassDef { body, .. }
            | Stmt::With { body, .. } => vec![body.as_slice()],
            Stmt::For { body, orelse, .. }
            | Stmt::While { body, orelse, .. }
            | Stmt::If { body, orelse, .. } => vec![body.as_slice(), orelse.as_slice()],
            Stmt::Try {
                body,
                handlers,
                orelse,
                finalbody,
                ..
            } => {
                let mut blocks = vec![body.as_slice()];
                blocks.extend(handlers.iter().map(|h| h.body.as_slice()));
                blocks.push(orelse.as_slice());
                blocks.push(finalbody.as_slice());
                blocks
            }
            Stmt::Match { cases, .. } => cases.iter().map(|c| c.body.as_slice()).collect(),
            _ => Vec::new(),
        }
    }
}

/// Top-level module structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    pub body: Vec<Stmt>,
}

impl Module {
    pub fn new() -> Self {
        Module::default()
    }

    /// Total number of statements, nested ones included
    pub fn statement_count(&self) -> usize {
        fn count(block: &[Stmt]) -> usize {
            block
                .iter()
                .map(|stmt| 1 + stmt.child_blocks().into_iter().map(count).sum::<usize>())
                .sum()
        }
        count(&self.body)
    }
}

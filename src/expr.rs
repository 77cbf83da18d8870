use std::fmt;

use serde::Serialize;

/// Comparison operator of a `Condition`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Operator {
    #[strum(serialize = "=")]
    #[serde(rename = "=")]
    Eq,
    #[strum(serialize = "!=")]
    #[serde(rename = "!=")]
    Ne,
    #[strum(serialize = "<")]
    #[serde(rename = "<")]
    Lt,
    #[strum(serialize = "<=")]
    #[serde(rename = "<=")]
    Le,
    #[strum(serialize = ">")]
    #[serde(rename = ">")]
    Gt,
    #[strum(serialize = ">=")]
    #[serde(rename = ">=")]
    Ge,
}

/// A value on the right hand side of a condition or inside an `IN` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Literal {
    /// Quoted string, quotes stripped. There are no escapes, so a string holding both
    /// `'` and `"` cannot be written as query text; `Display` then emits text that does
    /// not parse back.
    Str(String),
    /// Decimal integer, kept as written.
    Number(String),
    /// Bare value such as `hello-world` or `foo-bar+123`.
    Identifier(String),
}

impl Literal {
    pub fn as_str(&self) -> &str {
        match self {
            Literal::Str(s) | Literal::Number(s) | Literal::Identifier(s) => s,
        }
    }

    /// Parses a `Number` literal. `None` for other literals or values outside `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Literal::Number(n) => n.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) if s.contains('\'') => write!(f, "\"{}\"", s),
            Literal::Str(s) => write!(f, "'{}'", s),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Identifier(i) => write!(f, "{}", i),
        }
    }
}

/// Syntax tree of a filter query.
///
/// `And` and `Or` are strictly binary. Chains of the same connective nest to the left,
/// so `a AND b AND c` is `And(And(a, b), c)`. Dropping, `Display`, `tree`, `depth` and
/// `conditions` walk the tree without recursion; the derived `Clone`, `PartialEq`,
/// `Debug` and `Serialize` impls do recurse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expr {
    Condition {
        field: String,
        operator: Operator,
        value: Literal,
    },
    /// `field IN (...)`, or `field NOT IN (...)` when `negated`.
    Membership {
        field: String,
        negated: bool,
        values: Vec<Literal>,
    },
    And {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Or {
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn condition(field: impl Into<String>, operator: Operator, value: Literal) -> Self {
        Expr::Condition { field: field.into(), operator, value }
    }

    pub fn membership(field: impl Into<String>, negated: bool, values: Vec<Literal>) -> Self {
        Expr::Membership { field: field.into(), negated, values }
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::And { left: Box::new(left), right: Box::new(right) }
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Or { left: Box::new(left), right: Box::new(right) }
    }

    /// Leaf conditions in left-to-right order.
    pub fn conditions(&self) -> Vec<&Expr> {
        let mut leaves = Vec::new();
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            match expr {
                Expr::And { left, right } | Expr::Or { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
                leaf => leaves.push(leaf),
            }
        }
        leaves
    }

    /// Number of levels in the tree, 1 for a single condition.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((expr, level)) = stack.pop() {
            deepest = deepest.max(level);
            if let Expr::And { left, right } | Expr::Or { left, right } = expr {
                stack.push((right.as_ref(), level + 1));
                stack.push((left.as_ref(), level + 1));
            }
        }
        deepest
    }

    /// Indented, one node per line view of the tree.
    pub fn tree(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self, 0)];
        while let Some((expr, indent)) = stack.pop() {
            let prefix = "  ".repeat(indent);
            match expr {
                Expr::Condition { field, operator, value } => {
                    out.push_str(&format!("{prefix}Condition {field} {operator} {value}\n"));
                }
                Expr::Membership { field, negated, values } => {
                    let keyword = if *negated { "NOT IN" } else { "IN" };
                    let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                    out.push_str(&format!("{prefix}Membership {field} {keyword} [{}]\n", values.join(", ")));
                }
                Expr::And { left, right } | Expr::Or { left, right } => {
                    let name = if matches!(expr, Expr::And { .. }) { "And" } else { "Or" };
                    out.push_str(&format!("{prefix}{name}\n"));
                    stack.push((right.as_ref(), indent + 1));
                    stack.push((left.as_ref(), indent + 1));
                }
            }
        }
        out
    }

    /// Binding strength used to decide where `Display` needs parentheses.
    fn precedence(&self) -> u8 {
        match self {
            Expr::Or { .. } => 0,
            Expr::And { .. } => 1,
            _ => 2,
        }
    }

    /// Moves the children of a combinator onto `stack`, leaving empty leaves behind.
    fn take_children(&mut self, stack: &mut Vec<Expr>) {
        if let Expr::And { left, right } | Expr::Or { left, right } = self {
            stack.push(std::mem::replace(left.as_mut(), Expr::empty_leaf()));
            stack.push(std::mem::replace(right.as_mut(), Expr::empty_leaf()));
        }
    }

    fn empty_leaf() -> Self {
        Expr::Membership { field: String::new(), negated: false, values: Vec::new() }
    }
}

/// Left-nested chains are as deep as they are long, so children are dropped from a
/// heap stack instead of recursively.
impl Drop for Expr {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        self.take_children(&mut stack);
        while let Some(mut expr) = stack.pop() {
            expr.take_children(&mut stack);
        }
    }
}

/// Piece of pending output while rendering an `Expr`.
enum Step<'a> {
    /// Expression with the precedence of its parent and whether it is a right operand.
    Operand(&'a Expr, u8, bool),
    Text(&'static str),
}

/// Renders the expression as query text that parses back to the same tree.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![Step::Operand(self, 0, false)];
        while let Some(step) = stack.pop() {
            let (expr, parent, right_side) = match step {
                Step::Text(text) => {
                    f.write_str(text)?;
                    continue
                }
                Step::Operand(expr, parent, right_side) => (expr, parent, right_side),
            };

            let own = expr.precedence();
            // a right-nested chain has to keep its parentheses to parse back to the same tree
            if own < parent || (right_side && own == parent) {
                f.write_str("(")?;
                stack.push(Step::Text(")"));
            }

            match expr {
                Expr::Condition { field, operator, value } => write!(f, "{} {} {}", field, operator, value)?,
                Expr::Membership { field, negated, values } => {
                    let keyword = if *negated { "NOT IN" } else { "IN" };
                    let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                    write!(f, "{} {} ({})", field, keyword, values.join(", "))?;
                }
                Expr::And { left, right } => {
                    stack.push(Step::Operand(right, own, true));
                    stack.push(Step::Text(" AND "));
                    stack.push(Step::Operand(left, own, false));
                }
                Expr::Or { left, right } => {
                    stack.push(Step::Operand(right, own, true));
                    stack.push(Step::Text(" OR "));
                    stack.push(Step::Operand(left, own, false));
                }
            }
        }
        Ok(())
    }
}

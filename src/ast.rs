use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoParamKind {
    ClearTransforms, // #
    PopTransform,    // <
    Dot,             // d
    Path,            // P
    Break,           // ;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixStatementKind {
    Rgb,       // C
    Hsl,       // H
    Cmyk,      // K
    Cursor,    // p
    Translate, // t
    Rotate,    // r
    Scale,     // S
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixExpressionKind {
    Negate, // n
    Not,    // N
    And,    // &
    Or,     // |
    Iff,    // I
    Xor,    // X
    Sin,    // s
    Cos,    // o
    Tan,    // T (expression context)
    Sec,    // E
    Csc,    // O
    Cot,    // Y
    Invert, // !
    Floor,  // _
    Ceil,   // `
    Square, // "
    Sqrt,   // \
    Assign, // a
    Call,   // q
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixKind {
    Add,    // +
    Sub,    // -
    Mul,    // *
    Div,    // /
    Mod,    // %
    Pow,    // ^
    IntDiv, // ~
    Gt,     // >
    Ge,     // g
    Eq,     // =
    Ne,     // x
}

/// A single tagged AST node. One variant per family in the node taxonomy;
/// replaces a class hierarchy with `isinstance` discrimination with a match
/// on `kind`.
#[derive(Debug, Clone)]
pub enum Node {
    Literal(f64),
    NoParam(NoParamKind),
    PrefixStatement(PrefixStatementKind, Option<Box<Node>>),
    PrefixExpression(PrefixExpressionKind, Option<Box<Node>>),
    Infix(InfixKind, Box<Node>, Option<Box<Node>>),
    Continuation(Vec<Node>),
    /// Generic statement container; also used for the implicit program root.
    Block(Vec<Node>),
    /// Parenthesized expression form `(...)`.
    BlockExpr(Option<Box<Node>>),
    Loop(Option<Box<Node>>, Vec<Node>),        // L
    Conditional(Option<Box<Node>>, Vec<Node>), // i
    Lambda(Vec<Node>),                         // @
    Function(Option<Box<Node>>, Vec<Node>),    // {
    /// Reducers only ever receive one structural child: the parenthesized
    /// group that follows the reducer letter. That child is typically a
    /// `BlockExpr` wrapping a `Continuation`, whose tuple elements are what
    /// actually get folded (see `interp::eval_reducer_operands`). Modeled as
    /// a single overwritable slot, not a `Vec`, so that the fold-then-retip
    /// step in `Parser::collapse_from` stays idempotent here the same way it
    /// is for `BlockExpr`/`PrefixExpression` — a `Vec` would see that retip
    /// as a second `push` and silently double its body.
    AnyReducer(Option<Box<Node>>), // T (statement context)
    AllReducer(Option<Box<Node>>), // A
    SumReducer(Option<Box<Node>>), // U
}

impl Node {
    /// True for node kinds a bare `)` can close directly (rule 4 of the
    /// parser): only the literal parenthesized form. Matches the original's
    /// `isinstance(value, BlockExpression)` check exactly — `Any`/`All`/
    /// `SumReducer` are a sibling family there (`BlockOperation`, the same
    /// base the loop/conditional/function block types use), so a `)`
    /// never searches for them directly. They are still closed correctly:
    /// the literal `(` that always follows the reducer letter in valid
    /// source is what the search finds and collapses, and that collapse
    /// folds straight into the reducer sitting below it on the stack.
    pub fn opens_block_expression_scope(&self) -> bool {
        matches!(self, Node::BlockExpr(_))
    }

    /// True for node kinds that yield a value — eligible as an operand of
    /// the `,` continuation operator. Statement-shaped nodes (no-param,
    /// prefix statement, the block-statement families) are not.
    pub fn is_expression_like(&self) -> bool {
        matches!(
            self,
            Node::Literal(_)
                | Node::PrefixExpression(_, _)
                | Node::Infix(_, _, _)
                | Node::Continuation(_)
                | Node::BlockExpr(_)
                | Node::AnyReducer(_)
                | Node::AllReducer(_)
                | Node::SumReducer(_)
        )
    }

    /// Appends `child` into this node's next open slot, mirroring each
    /// family's `push()` rule from the source interpreter.
    pub fn push(&mut self, child: Node, position: usize) -> Result<(), ParseError> {
        match self {
            Node::Literal(_) => Err(ParseError::new(
                position,
                "cannot push an expression onto a literal",
            )),
            Node::NoParam(_) => Err(ParseError::new(
                position,
                "no-param statement takes no operand",
            )),
            Node::PrefixStatement(_, body) | Node::PrefixExpression(_, body) => {
                *body = Some(Box::new(child));
                Ok(())
            }
            Node::Infix(_, _, right) => {
                *right = Some(Box::new(child));
                Ok(())
            }
            Node::Continuation(items) => {
                if let Node::Continuation(inner) = child {
                    *items = inner;
                } else {
                    items.push(child);
                }
                Ok(())
            }
            Node::Block(body) | Node::Lambda(body) => {
                body.push(child);
                Ok(())
            }
            Node::BlockExpr(body)
            | Node::AnyReducer(body)
            | Node::AllReducer(body)
            | Node::SumReducer(body) => {
                *body = Some(Box::new(child));
                Ok(())
            }
            Node::Loop(first, body) | Node::Conditional(first, body) | Node::Function(first, body) => {
                if first.is_none() {
                    *first = Some(Box::new(child));
                } else {
                    body.push(child);
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuation_push_flattens_nested_continuation() {
        let mut outer = Node::Continuation(vec![Node::Literal(1.0)]);
        let inner = Node::Continuation(vec![Node::Literal(2.0), Node::Literal(3.0)]);
        outer.push(inner, 0).unwrap();
        match outer {
            Node::Continuation(items) => assert_eq!(items.len(), 2),
            _ => panic!("expected continuation"),
        }
    }

    #[test]
    fn first_expr_block_fills_header_before_body() {
        let mut loop_node = Node::Loop(None, vec![]);
        loop_node.push(Node::Literal(3.0), 0).unwrap();
        loop_node.push(Node::NoParam(NoParamKind::Dot), 0).unwrap();
        match loop_node {
            Node::Loop(first, body) => {
                assert!(matches!(*first.unwrap(), Node::Literal(n) if n == 3.0));
                assert_eq!(body.len(), 1);
            }
            _ => panic!("expected loop"),
        }
    }

    #[test]
    fn push_onto_literal_is_an_error() {
        let mut lit = Node::Literal(1.0);
        assert!(lit.push(Node::Literal(2.0), 0).is_err());
    }
}

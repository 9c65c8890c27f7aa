use crate::ast::{InfixKind, Node, NoParamKind, PrefixExpressionKind, PrefixStatementKind};
use crate::error::ParseError;
use crate::trace;

const NUMBERS: &str = ".0123456789";
const BLOCK_END: char = ')';
const BLOCK_STATEMENTS: &str = "Li@{";
/// Block-expression introducers other than `T`, which is disambiguated
/// separately (see `classify_t`).
const BLOCK_EXPRESSIONS: &str = "(AU";
const SINGLE_OPERATIONS: &str = "#<dP;";
const PREFIX_STATEMENTS: &str = "CHKptrS";
/// Prefix-expression introducers other than `T`.
const PREFIX_EXPRESSIONS: &str = "nN&|IXsoEOY_`\"!\\aq";
const INFIX_EXPRESSIONS: &str = "+-*/^%~>g=x";
const CONTINUATION: char = ',';
const WHITESPACE: &str = " \n\r\t";

/// Single-pass, two-stack parser: a block stack of in-progress statement
/// containers and an expression stack of in-progress expression nodes.
pub struct Parser {
    buffer: String,
    blocks: Vec<Node>,
    expressions: Vec<Node>,
    position: usize,
    /// Count of `(` seen without a matching `)` yet. `collapse_from`'s
    /// finish()-time flush folds a dangling `BlockExpr` the same way a real
    /// close would, so node shape alone can't tell "closed" from "never
    /// closed" apart — this counter is the one signal that can.
    open_parens: usize,
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            buffer: String::new(),
            blocks: vec![Node::Block(Vec::new())],
            expressions: Vec::new(),
            position: 0,
            open_parens: 0,
        }
    }

    pub fn parse(source: &str) -> Result<Node, ParseError> {
        let mut parser = Parser::new();
        for ch in source.chars() {
            parser.position += 1;
            parser.step(ch)?;
        }
        parser.finish()
    }

    fn err(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.position, message.into())
    }

    fn step(&mut self, ch: char) -> Result<(), ParseError> {
        if !NUMBERS.contains(ch) && !self.buffer.is_empty() {
            let value: f64 = self
                .buffer
                .parse()
                .map_err(|_| self.err(format!("invalid numeric literal `{}`", self.buffer)))?;
            trace!("flushing literal {}", value);
            self.push_to_tip(Node::Literal(value))?;
            self.buffer.clear();
        }

        if NUMBERS.contains(ch) {
            if ch == '.' && self.buffer.contains('.') {
                return Err(self.err("numeric literal has more than one `.`"));
            }
            self.buffer.push(ch);
            return Ok(());
        }

        if ch == CONTINUATION {
            let e = self
                .expressions
                .pop()
                .ok_or_else(|| self.err("continuation with no preceding expression"))?;
            if !e.is_expression_like() {
                return Err(self.err("continuation against a non-expressive value"));
            }
            let items = match e {
                Node::Continuation(items) => items,
                other => vec![other],
            };
            self.push_to_tip(Node::Continuation(items))?;
            return Ok(());
        }

        if ch == BLOCK_END {
            if let Some(index) = self
                .expressions
                .iter()
                .enumerate()
                .rev()
                .find(|(_, n)| n.opens_block_expression_scope())
                .map(|(i, _)| i)
            {
                let collapsed = self
                    .collapse_from(index)
                    .expect("index was found within bounds");
                self.open_parens -= 1;
                self.push_to_tip(collapsed)?;
                return Ok(());
            }

            if !self.expressions.is_empty() {
                if let Some(collapsed) = self.collapse_from(0) {
                    self.push_to_block(collapsed)?;
                }
            }
            self.close_innermost_block()?;
            return Ok(());
        }

        if WHITESPACE.contains(ch) {
            if !self.expressions.is_empty() {
                let mut e = self.expressions.pop().unwrap();
                if matches!(e, Node::Continuation(_)) && !self.expressions.is_empty() {
                    let top = self.expressions.len() - 1;
                    self.expressions[top].push(e, self.position)?;
                    e = self.expressions.pop().unwrap();
                }
                if let Some(top) = self.expressions.last_mut() {
                    top.push(e, self.position)?;
                } else {
                    self.push_to_block(e)?;
                }
            }
            return Ok(());
        }

        if SINGLE_OPERATIONS.contains(ch) || PREFIX_STATEMENTS.contains(ch) {
            if !self.expressions.is_empty() {
                if let Some(collapsed) = self.collapse_from(0) {
                    self.push_to_block(collapsed)?;
                }
            }
            let node = self.statement_node(ch)?;
            self.push_to_tip(node)?;
            return Ok(());
        }

        if ch == 'T' {
            let node = if self.expressions.is_empty() {
                Node::AnyReducer(None)
            } else {
                Node::PrefixExpression(PrefixExpressionKind::Tan, None)
            };
            self.push_to_tip(node)?;
            return Ok(());
        }

        if PREFIX_EXPRESSIONS.contains(ch) {
            self.push_to_tip(self.prefix_expression_node(ch)?)?;
            return Ok(());
        }

        if INFIX_EXPRESSIONS.contains(ch) {
            let left = self
                .expressions
                .pop()
                .ok_or_else(|| self.err("infix operation in invalid location"))?;
            let kind = self.infix_kind(ch)?;
            self.push_to_tip(Node::Infix(kind, Box::new(left), None))?;
            return Ok(());
        }

        if BLOCK_STATEMENTS.contains(ch) {
            if !self.expressions.is_empty() {
                if let Some(collapsed) = self.collapse_from(0) {
                    self.push_to_block(collapsed)?;
                }
            }
            self.blocks.push(self.block_statement_node(ch)?);
            return Ok(());
        }

        if BLOCK_EXPRESSIONS.contains(ch) {
            let node = self.block_expression_node(ch)?;
            self.push_to_tip(node)?;
            return Ok(());
        }

        Err(self.err(format!("unrecognized character `{}`", ch)))
    }

    fn finish(mut self) -> Result<Node, ParseError> {
        if !self.buffer.is_empty() {
            let value: f64 = self
                .buffer
                .parse()
                .map_err(|_| self.err(format!("invalid numeric literal `{}`", self.buffer)))?;
            self.push_to_tip(Node::Literal(value))?;
            self.buffer.clear();
        }
        // A program may legally end on a bare expression with no trailing
        // flush trigger (whitespace, `)`, or the start of the next
        // statement) — flush it to the enclosing block the same way those
        // triggers would, rather than treating it as unterminated input.
        // But a `(` that never met its `)` must still error: the flush
        // below folds a dangling `BlockExpr` exactly the way a real close
        // would, so completed-node shape can't tell the two apart — only
        // `open_parens` can.
        if self.open_parens > 0 {
            return Err(self.err("unclosed `(` detected at end of program"));
        }
        if !self.expressions.is_empty() {
            if let Some(collapsed) = self.collapse_from(0) {
                self.push_to_block(collapsed)?;
            }
        }
        let body = self
            .blocks
            .pop()
            .ok_or_else(|| self.err("no root block present"))?;
        if !self.blocks.is_empty() {
            return Err(self.err("unclosed blocks detected at end of program"));
        }
        Ok(body)
    }

    /// Pushes `node` onto the tip of the expression stack. Mirrors the
    /// source's `push_to_tip`: a literal fast-path merges directly into an
    /// open continuation; otherwise the node is appended as a new,
    /// not-yet-connected entry — it is wired to its parent later, by
    /// `collapse_from`.
    fn push_to_tip(&mut self, node: Node) -> Result<(), ParseError> {
        if let Some(tip) = self.expressions.last_mut() {
            if matches!(tip, Node::Literal(_)) {
                return Err(self.err("cannot push an expression onto a literal"));
            }
            if matches!(node, Node::Literal(_)) {
                if let Node::Continuation(_) = tip {
                    tip.push(node, self.position)?;
                    return Ok(());
                }
            }
        }
        self.expressions.push(node);
        Ok(())
    }

    /// Flushes any pending expression stack onto the current block, then
    /// pushes `node` as well.
    fn push_to_block(&mut self, node: Node) -> Result<(), ParseError> {
        if !self.expressions.is_empty() {
            if let Some(collapsed) = self.collapse_from(0) {
                self.push_to_block(collapsed)?;
            }
        }
        self.blocks
            .last_mut()
            .expect("root block always present")
            .push(node, self.position)
    }

    /// Pops the expression stack down to (and including) `index`, folding
    /// each popped entry into whatever is now below it on the *whole*
    /// stack (not just above `index` — an entry below `index`, such as a
    /// prefix operator awaiting this very scope as its operand, legitimately
    /// gets wired up here too), and returns the last entry popped (the one
    /// that was at `index`), now fully populated. The caller re-pushes that
    /// return value via `push_to_tip`; when it was also just folded into an
    /// entry below `index`, that entry ends up holding the same value twice
    /// — harmless, since every node's `push` is an idempotent overwrite or
    /// append of that exact value. Returns `None` if nothing was at `index`.
    fn collapse_from(&mut self, index: usize) -> Option<Node> {
        if self.expressions.len() <= index {
            return None;
        }
        let mut last = None;
        while self.expressions.len() > index {
            let e = self.expressions.pop().unwrap();
            if let Some(top) = self.expressions.last_mut() {
                top.push(e.clone(), self.position)
                    .expect("fold target is never a literal");
            }
            last = Some(e);
        }
        last
    }

    /// Closes the innermost entry on the block stack, attaching any pending
    /// expression to it first and wiring the closed block into its parent.
    fn close_innermost_block(&mut self) -> Result<(), ParseError> {
        if self.blocks.len() <= 1 {
            return Err(self.err("end of block detected outside of block"));
        }
        let mut block = self.blocks.pop().unwrap();
        if !self.expressions.is_empty() {
            if let Some(collapsed) = self.collapse_from(0) {
                block.push(collapsed, self.position)?;
            }
        }
        self.blocks
            .last_mut()
            .unwrap()
            .push(block, self.position)?;
        Ok(())
    }

    fn statement_node(&self, ch: char) -> Result<Node, ParseError> {
        Ok(match ch {
            '#' => Node::NoParam(NoParamKind::ClearTransforms),
            '<' => Node::NoParam(NoParamKind::PopTransform),
            'd' => Node::NoParam(NoParamKind::Dot),
            'P' => Node::NoParam(NoParamKind::Path),
            ';' => Node::NoParam(NoParamKind::Break),
            'C' => Node::PrefixStatement(PrefixStatementKind::Rgb, None),
            'H' => Node::PrefixStatement(PrefixStatementKind::Hsl, None),
            'K' => Node::PrefixStatement(PrefixStatementKind::Cmyk, None),
            'p' => Node::PrefixStatement(PrefixStatementKind::Cursor, None),
            't' => Node::PrefixStatement(PrefixStatementKind::Translate, None),
            'r' => Node::PrefixStatement(PrefixStatementKind::Rotate, None),
            'S' => Node::PrefixStatement(PrefixStatementKind::Scale, None),
            _ => return Err(self.err(format!("`{}` is not a statement character", ch))),
        })
    }

    fn prefix_expression_node(&self, ch: char) -> Result<Node, ParseError> {
        use PrefixExpressionKind::*;
        let kind = match ch {
            'n' => Negate,
            'N' => Not,
            '&' => And,
            '|' => Or,
            'I' => Iff,
            'X' => Xor,
            's' => Sin,
            'o' => Cos,
            'E' => Sec,
            'O' => Csc,
            'Y' => Cot,
            '_' => Floor,
            '`' => Ceil,
            '"' => Square,
            '\\' => Sqrt,
            '!' => Invert,
            'a' => Assign,
            'q' => Call,
            _ => return Err(self.err(format!("`{}` is not a prefix expression character", ch))),
        };
        Ok(Node::PrefixExpression(kind, None))
    }

    fn infix_kind(&self, ch: char) -> Result<InfixKind, ParseError> {
        use InfixKind::*;
        Ok(match ch {
            '+' => Add,
            '-' => Sub,
            '*' => Mul,
            '/' => Div,
            '%' => Mod,
            '^' => Pow,
            '~' => IntDiv,
            '>' => Gt,
            'g' => Ge,
            '=' => Eq,
            'x' => Ne,
            _ => return Err(self.err(format!("`{}` is not an infix character", ch))),
        })
    }

    fn block_statement_node(&self, ch: char) -> Result<Node, ParseError> {
        Ok(match ch {
            'L' => Node::Loop(None, Vec::new()),
            'i' => Node::Conditional(None, Vec::new()),
            '@' => Node::Lambda(Vec::new()),
            '{' => Node::Function(None, Vec::new()),
            _ => return Err(self.err(format!("`{}` is not a block statement character", ch))),
        })
    }

    fn block_expression_node(&mut self, ch: char) -> Result<Node, ParseError> {
        Ok(match ch {
            '(' => {
                self.open_parens += 1;
                Node::BlockExpr(None)
            }
            'A' => Node::AllReducer(None),
            'U' => Node::SumReducer(None),
            _ => return Err(self.err(format!("`{}` is not a block expression character", ch))),
        })
    }
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Node {
        Parser::parse(src).unwrap()
    }

    #[test]
    fn literal_flush_produces_one_node() {
        // A bare digit run with nothing to attach to becomes its own
        // (no-op) statement via the whitespace soft-terminator rule (§4.3
        // rule 5); `d` then parses as the following, unrelated statement.
        let root = parse("123 d");
        match root {
            Node::Block(body) => {
                assert_eq!(body.len(), 2);
                assert!(matches!(body[0], Node::Literal(n) if n == 123.0));
                assert!(matches!(body[1], Node::NoParam(NoParamKind::Dot)));
            }
            _ => panic!("expected block"),
        }
    }

    #[test]
    fn continuation_flattens() {
        let root = parse("1,2,3 d");
        match root {
            Node::Block(body) => {
                assert_eq!(body.len(), 2);
                match &body[0] {
                    Node::Continuation(items) => assert_eq!(items.len(), 3),
                    other => panic!("unexpected first statement {:?}", other),
                }
                assert!(matches!(body[1], Node::NoParam(NoParamKind::Dot)));
            }
            _ => panic!("expected block"),
        }
    }

    #[test]
    fn balanced_blocks_parse() {
        assert!(Parser::parse("L 3 d )").is_ok());
        assert!(Parser::parse("i 0 d )").is_ok());
        assert!(Parser::parse("{0 p(0,0) d) q(0)").is_ok());
    }

    #[test]
    fn unbalanced_close_is_an_error() {
        assert!(Parser::parse("5 )").is_err());
    }

    #[test]
    fn unclosed_paren_is_an_error() {
        // Missing the final `)` — must not be swallowed by the same
        // leniency that flushes a legitimately-closed trailing expression.
        assert!(Parser::parse("q(0").is_err());
    }

    #[test]
    fn t_in_statement_position_is_any_reducer() {
        let root = Parser::parse("T(1,0)d").unwrap();
        match root {
            Node::Block(body) => {
                assert!(matches!(body[0], Node::AnyReducer(_)));
            }
            _ => panic!("expected block"),
        }
    }

    #[test]
    fn t_in_expression_position_is_tangent() {
        let root = Parser::parse("a(0,2T(1))d").unwrap();
        // `a(0, T(1))` — T appears as an operand of `,`, so the expression
        // stack is non-empty when it is read: tangent, not any-reducer.
        match root {
            Node::Block(body) => match &body[0] {
                Node::PrefixExpression(PrefixExpressionKind::Assign, _) => {}
                other => panic!("unexpected first statement {:?}", other),
            },
            _ => panic!("expected block"),
        }
    }

    #[test]
    fn reducer_closes_with_paren() {
        assert!(Parser::parse("U(1,2,3)d").is_ok());
    }

    #[test]
    fn trailing_bare_expression_is_flushed_at_end_of_input() {
        // "q(0)" with nothing after it has no whitespace/`)` to trigger a
        // flush to the block; finish() must flush it anyway.
        assert!(Parser::parse("{0 p(0,0) d) q(0)").is_ok());
    }
}

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{InfixKind, Node, NoParamKind, PrefixExpressionKind, PrefixStatementKind};
use crate::canvas::{hsl_to_rgb, Canvas, Color};
use crate::error::{EvalError, EvalResult, RuntimeError};
use crate::trace;
use crate::value::Value;

/// The mutable runtime environment of one program run: a variable table, a
/// function table, and the drawing canvas. Negative variable ids are
/// reserved for positional call arguments.
pub struct Context<C: Canvas> {
    pub vars: HashMap<i64, Value>,
    pub funcs: HashMap<i64, Rc<Vec<Node>>>,
    counter: i64,
    pub canvas: C,
}

impl<C: Canvas> Context<C> {
    pub fn new(canvas: C) -> Self {
        Context {
            vars: HashMap::new(),
            funcs: HashMap::new(),
            counter: 0,
            canvas,
        }
    }

    /// Fresh id for an anonymous lambda, skipping any id already in use.
    fn next_id(&mut self) -> i64 {
        let mut c = self.counter;
        self.counter += 1;
        while self.vars.contains_key(&c) || self.funcs.contains_key(&c) {
            c = self.counter;
            self.counter += 1;
        }
        c
    }
}

fn num(v: &Value) -> Result<f64, EvalError> {
    v.as_number().map_err(EvalError::from)
}

/// Runs a fully parsed program to completion against `ctx`.
pub fn run<C: Canvas>(root: &Node, ctx: &mut Context<C>) -> Result<(), RuntimeError> {
    let body = match root {
        Node::Block(body) => body,
        _ => return Err(RuntimeError::NotAnExpression),
    };
    exec_block(body, ctx).map_err(EvalError::into_runtime)
}

fn exec_block<C: Canvas>(body: &[Node], ctx: &mut Context<C>) -> EvalResult<()> {
    for stmt in body {
        exec_statement(stmt, ctx)?;
    }
    Ok(())
}

/// Executes one statement, discarding any value it produces (statements
/// that are really expressions — a bare assignment or reducer used at
/// statement position — simply have their value dropped, matching the
/// source's `BlockOperation.run`).
fn exec_statement<C: Canvas>(node: &Node, ctx: &mut Context<C>) -> EvalResult<()> {
    match node {
        Node::NoParam(kind) => exec_no_param(*kind, ctx),
        Node::PrefixStatement(kind, body) => exec_prefix_statement(*kind, body, ctx),
        Node::Loop(first, body) => exec_loop(first, body, ctx),
        Node::Conditional(first, body) => exec_conditional(first, body, ctx),
        Node::Lambda(body) => {
            let id = ctx.next_id();
            trace!("registering lambda at id {}", id);
            ctx.funcs.insert(id, Rc::new(body.clone()));
            Ok(())
        }
        Node::Function(first, body) => exec_function(first, body, ctx),
        Node::Block(body) => exec_block(body, ctx),
        Node::Literal(_)
        | Node::PrefixExpression(_, _)
        | Node::Infix(_, _, _)
        | Node::Continuation(_)
        | Node::BlockExpr(_)
        | Node::AnyReducer(_)
        | Node::AllReducer(_)
        | Node::SumReducer(_) => {
            eval_expr(node, ctx)?;
            Ok(())
        }
    }
}

fn exec_no_param<C: Canvas>(kind: NoParamKind, ctx: &mut Context<C>) -> EvalResult<()> {
    match kind {
        NoParamKind::ClearTransforms => ctx.canvas.clear_transforms(),
        NoParamKind::PopTransform => ctx.canvas.pop_transform(),
        NoParamKind::Dot => ctx.canvas.dot(),
        NoParamKind::Path => ctx.canvas.line(),
        NoParamKind::Break => return Err(EvalError::Break),
    }
    Ok(())
}

fn exec_prefix_statement<C: Canvas>(
    kind: PrefixStatementKind,
    body: &Option<Box<Node>>,
    ctx: &mut Context<C>,
) -> EvalResult<()> {
    let body_node = body
        .as_ref()
        .ok_or(EvalError::Runtime(RuntimeError::MissingOperand))?;
    let value = eval_expr(body_node, ctx)?;
    match kind {
        PrefixStatementKind::Rgb => {
            let t = value.expect_tuple_len(&[3, 4]).map_err(EvalError::from)?;
            let color = if t.len() == 4 {
                Color::rgba(
                    num(&t[0])? / 255.0,
                    num(&t[1])? / 255.0,
                    num(&t[2])? / 255.0,
                    num(&t[3])? / 255.0,
                )
            } else {
                Color::rgb(num(&t[0])? / 255.0, num(&t[1])? / 255.0, num(&t[2])? / 255.0)
            };
            ctx.canvas.set_color(color);
        }
        PrefixStatementKind::Hsl => {
            let t = value.expect_tuple_len(&[3, 4]).map_err(EvalError::from)?;
            let (r, g, b) = hsl_to_rgb(num(&t[0])?, num(&t[1])? / 255.0, num(&t[2])? / 255.0);
            let color = if t.len() == 4 {
                Color::rgba(r, g, b, num(&t[3])? / 255.0)
            } else {
                Color::rgb(r, g, b)
            };
            ctx.canvas.set_color(color);
        }
        PrefixStatementKind::Cmyk => {
            let t = value.expect_tuple_len(&[4]).map_err(EvalError::from)?;
            ctx.canvas
                .set_color(Color::cmyk(num(&t[0])?, num(&t[1])?, num(&t[2])?, num(&t[3])?));
        }
        PrefixStatementKind::Cursor => {
            let t = value.expect_tuple_len(&[2]).map_err(EvalError::from)?;
            ctx.canvas.set_cursor(num(&t[0])?, num(&t[1])?);
        }
        PrefixStatementKind::Translate => {
            let t = value.expect_tuple_len(&[2]).map_err(EvalError::from)?;
            ctx.canvas.translate(num(&t[0])?, num(&t[1])?);
        }
        PrefixStatementKind::Rotate => {
            ctx.canvas.rotate(num(&value)?);
        }
        PrefixStatementKind::Scale => {
            let t = value.expect_tuple_len(&[2]).map_err(EvalError::from)?;
            ctx.canvas.scale(num(&t[0])?, num(&t[1])?);
        }
    }
    Ok(())
}

/// Negative loop counts execute zero times rather than erroring, resolving
/// the Open Question in spec.md §9 the same way the source behaves.
fn exec_loop<C: Canvas>(
    first: &Option<Box<Node>>,
    body: &[Node],
    ctx: &mut Context<C>,
) -> EvalResult<()> {
    let header = first
        .as_ref()
        .ok_or(EvalError::Runtime(RuntimeError::MissingOperand))?;
    let count = num(&eval_expr(header, ctx)?)?;
    if count < 0.0 {
        return Ok(());
    }
    for _ in 0..(count as u64) {
        match exec_block(body, ctx) {
            Ok(()) => {}
            Err(EvalError::Break) => break,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn exec_conditional<C: Canvas>(
    first: &Option<Box<Node>>,
    body: &[Node],
    ctx: &mut Context<C>,
) -> EvalResult<()> {
    let header = first
        .as_ref()
        .ok_or(EvalError::Runtime(RuntimeError::MissingOperand))?;
    if eval_expr(header, ctx)?.is_truthy() {
        exec_block(body, ctx)?;
    }
    Ok(())
}

fn exec_function<C: Canvas>(
    first: &Option<Box<Node>>,
    body: &[Node],
    ctx: &mut Context<C>,
) -> EvalResult<()> {
    let header = first
        .as_ref()
        .ok_or(EvalError::Runtime(RuntimeError::MissingOperand))?;
    let id = num(&eval_expr(header, ctx)?)? as i64;
    if ctx.funcs.contains_key(&id) {
        return Err(EvalError::Runtime(RuntimeError::Redefinition(id)));
    }
    ctx.funcs.insert(id, Rc::new(body.to_vec()));
    Ok(())
}

/// Evaluates an expression-shaped node to a `Value`.
fn eval_expr<C: Canvas>(node: &Node, ctx: &mut Context<C>) -> EvalResult<Value> {
    match node {
        Node::Literal(n) => Ok(Value::Number(*n)),
        Node::Continuation(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(eval_expr(item, ctx)?);
            }
            Ok(Value::Tuple(values))
        }
        Node::BlockExpr(body) => match body {
            Some(b) => eval_expr(b, ctx),
            None => Ok(Value::ZERO),
        },
        Node::AnyReducer(body) => {
            for v in eval_reducer_operands(body, ctx)? {
                if v.is_truthy() {
                    return Ok(v);
                }
            }
            Ok(Value::ZERO)
        }
        Node::AllReducer(body) => {
            for v in eval_reducer_operands(body, ctx)? {
                if !v.is_truthy() {
                    return Ok(Value::bool(false));
                }
            }
            Ok(Value::bool(true))
        }
        Node::SumReducer(body) => {
            let mut sum = 0.0;
            for v in eval_reducer_operands(body, ctx)? {
                sum += v.as_number().map_err(|_| EvalError::Runtime(RuntimeError::InvalidSum))?;
            }
            Ok(Value::Number(sum))
        }
        Node::Infix(kind, left, right) => eval_infix(*kind, left, right, ctx),
        Node::PrefixExpression(kind, body) => eval_prefix_expression(*kind, body, ctx),
        Node::NoParam(_)
        | Node::PrefixStatement(_, _)
        | Node::Block(_)
        | Node::Loop(_, _)
        | Node::Conditional(_, _)
        | Node::Lambda(_)
        | Node::Function(_, _) => Err(EvalError::Runtime(RuntimeError::NotAnExpression)),
    }
}

/// `T`/`A`/`U` reduce over the elements of their single parenthesized
/// operand: a tuple contributes each of its elements, a bare scalar
/// contributes itself.
fn eval_reducer_operands<C: Canvas>(
    body: &Option<Box<Node>>,
    ctx: &mut Context<C>,
) -> EvalResult<Vec<Value>> {
    let body_node = body
        .as_ref()
        .ok_or(EvalError::Runtime(RuntimeError::MissingOperand))?;
    Ok(match eval_expr(body_node, ctx)? {
        Value::Tuple(items) => items,
        scalar @ Value::Number(_) => vec![scalar],
    })
}

/// Evaluates a reducer/call-body member: expressions yield their value,
/// statements run for effect and contribute zero.
fn eval_statement_value<C: Canvas>(node: &Node, ctx: &mut Context<C>) -> EvalResult<Value> {
    if node.is_expression_like() {
        eval_expr(node, ctx)
    } else {
        exec_statement(node, ctx)?;
        Ok(Value::ZERO)
    }
}

fn eval_infix<C: Canvas>(
    kind: InfixKind,
    left: &Node,
    right: &Option<Box<Node>>,
    ctx: &mut Context<C>,
) -> EvalResult<Value> {
    let right = right
        .as_ref()
        .ok_or(EvalError::Runtime(RuntimeError::MissingOperand))?;
    let l = num(&eval_expr(left, ctx)?)?;
    let r = num(&eval_expr(right, ctx)?)?;
    Ok(match kind {
        InfixKind::Add => Value::Number(l + r),
        InfixKind::Sub => Value::Number(l - r),
        InfixKind::Mul => Value::Number(l * r),
        InfixKind::Div => Value::Number(l / r),
        InfixKind::Mod => Value::Number(l.rem_euclid(r)),
        InfixKind::Pow => Value::Number(l.powf(r)),
        InfixKind::IntDiv => Value::Number((l / r).floor()),
        InfixKind::Gt => Value::bool(l > r),
        InfixKind::Ge => Value::bool(l >= r),
        InfixKind::Eq => Value::bool(l == r),
        InfixKind::Ne => Value::bool(l != r),
    })
}

fn eval_prefix_expression<C: Canvas>(
    kind: PrefixExpressionKind,
    body: &Option<Box<Node>>,
    ctx: &mut Context<C>,
) -> EvalResult<Value> {
    use PrefixExpressionKind::*;
    let body_node = body
        .as_ref()
        .ok_or(EvalError::Runtime(RuntimeError::MissingOperand))?;
    match kind {
        Negate => Ok(Value::Number(-num(&eval_expr(body_node, ctx)?)?)),
        Not => Ok(Value::bool(num(&eval_expr(body_node, ctx)?)? == 0.0)),
        And => eval_and(body_node, ctx),
        Or => eval_or(body_node, ctx),
        Iff => eval_iff(body_node, ctx),
        Xor => eval_xor(body_node, ctx),
        Sin => Ok(Value::Number(num(&eval_expr(body_node, ctx)?)?.sin())),
        Cos => Ok(Value::Number(num(&eval_expr(body_node, ctx)?)?.cos())),
        Tan => Ok(Value::Number(num(&eval_expr(body_node, ctx)?)?.tan())),
        Sec => Ok(Value::Number(1.0 / num(&eval_expr(body_node, ctx)?)?.cos())),
        Csc => Ok(Value::Number(1.0 / num(&eval_expr(body_node, ctx)?)?.sin())),
        Cot => Ok(Value::Number(1.0 / num(&eval_expr(body_node, ctx)?)?.tan())),
        Invert => eval_invert(body_node, ctx),
        Floor => Ok(Value::Number(num(&eval_expr(body_node, ctx)?)?.floor())),
        Ceil => Ok(Value::Number(num(&eval_expr(body_node, ctx)?)?.ceil())),
        Square => {
            let n = num(&eval_expr(body_node, ctx)?)?;
            Ok(Value::Number(n * n))
        }
        Sqrt => eval_sqrt(body_node, ctx),
        Assign => eval_assign(body_node, ctx),
        Call => eval_call(body_node, ctx),
    }
}

/// `&` — short-circuits by reading the unevaluated left/right AST children
/// straight out of the continuation rather than evaluating the whole tuple
/// up front.
fn eval_and<C: Canvas>(body: &Node, ctx: &mut Context<C>) -> EvalResult<Value> {
    let items = expect_continuation_children(body, &[2])?;
    let left = eval_expr(&items[0], ctx)?;
    if !left.is_truthy() {
        return Ok(Value::ZERO);
    }
    eval_expr(&items[1], ctx)
}

fn eval_or<C: Canvas>(body: &Node, ctx: &mut Context<C>) -> EvalResult<Value> {
    let items = expect_continuation_children(body, &[2])?;
    let left = eval_expr(&items[0], ctx)?;
    if left.is_truthy() {
        return Ok(left);
    }
    eval_expr(&items[1], ctx)
}

fn eval_iff<C: Canvas>(body: &Node, ctx: &mut Context<C>) -> EvalResult<Value> {
    let items = expect_continuation_children(body, &[3])?;
    if eval_expr(&items[0], ctx)?.is_truthy() {
        eval_expr(&items[1], ctx)
    } else {
        eval_expr(&items[2], ctx)
    }
}

fn eval_xor<C: Canvas>(body: &Node, ctx: &mut Context<C>) -> EvalResult<Value> {
    let value = eval_expr(body, ctx)?;
    let t = value.expect_tuple_len(&[2]).map_err(EvalError::from)?;
    Ok(Value::bool(t[0].is_truthy() != t[1].is_truthy()))
}

/// Finds the `,`-built tuple of unevaluated children behind a short-circuit
/// operator's operand, looking through any parenthesized `(...)` wrapper —
/// `&(0, e)` parses its operand as a `BlockExpr` around the `Continuation`,
/// not the bare `Continuation` the source's `expect_continuation` decorator
/// assumes, so this unwraps before matching.
fn expect_continuation_children<'a>(
    mut body: &'a Node,
    lengths: &[usize],
) -> Result<&'a [Node], EvalError> {
    loop {
        match body {
            Node::Continuation(items) if lengths.contains(&items.len()) => return Ok(items),
            Node::Continuation(items) => {
                return Err(EvalError::Runtime(RuntimeError::TupleArity {
                    expected: lengths
                        .iter()
                        .map(|n| n.to_string())
                        .collect::<Vec<_>>()
                        .join(" or "),
                    got: items.len(),
                }))
            }
            Node::BlockExpr(Some(inner)) => body = inner,
            _ => return Err(EvalError::Runtime(RuntimeError::ExpectedTuple)),
        }
    }
}

/// `!` inverts a trigonometric prefix expression by inspecting its child's
/// kind directly, matching the source's `isinstance` dispatch.
fn eval_invert<C: Canvas>(body: &Node, ctx: &mut Context<C>) -> EvalResult<Value> {
    use PrefixExpressionKind::*;
    let (kind, inner) = match body {
        Node::PrefixExpression(kind @ (Sin | Cos | Tan | Sec | Csc | Cot), inner) => {
            (*kind, inner)
        }
        _ => return Err(EvalError::Runtime(RuntimeError::UnsupportedInversion)),
    };
    let inner_node = inner
        .as_ref()
        .ok_or(EvalError::Runtime(RuntimeError::MissingOperand))?;
    let n = num(&eval_expr(inner_node, ctx)?)?;
    Ok(Value::Number(match kind {
        Sin => n.asin(),
        Cos => n.acos(),
        Tan => n.atan(),
        Sec => (1.0 / n).acos(),
        Csc => (1.0 / n).asin(),
        Cot => (1.0 / n).atan(),
        _ => unreachable!("matched only trigonometric kinds above"),
    }))
}

fn eval_sqrt<C: Canvas>(body: &Node, ctx: &mut Context<C>) -> EvalResult<Value> {
    match eval_expr(body, ctx)? {
        Value::Tuple(items) if items.len() == 2 => {
            let base = num(&items[0])?;
            let degree = num(&items[1])?;
            Ok(Value::Number(base.powf(1.0 / degree)))
        }
        Value::Tuple(items) => Err(EvalError::Runtime(RuntimeError::TupleArity {
            expected: "2".into(),
            got: items.len(),
        })),
        Value::Number(n) => Ok(Value::Number(n.sqrt())),
    }
}

/// `a` — assigns when its operand is a 2-tuple `(id, value)`, else reads
/// the operand as an id and looks it up (0 if absent).
fn eval_assign<C: Canvas>(body: &Node, ctx: &mut Context<C>) -> EvalResult<Value> {
    match eval_expr(body, ctx)? {
        Value::Tuple(items) if items.len() == 2 => {
            let id = num(&items[0])? as i64;
            let value = items[1].clone();
            ctx.vars.insert(id, value.clone());
            Ok(value)
        }
        Value::Tuple(items) => Err(EvalError::Runtime(RuntimeError::TupleArity {
            expected: "2".into(),
            got: items.len(),
        })),
        Value::Number(n) => {
            let id = n as i64;
            Ok(ctx.vars.get(&id).cloned().unwrap_or(Value::ZERO))
        }
    }
}

/// `q` — calls a user-defined function. Arguments bind to negative variable
/// ids in reverse positional order: the *last* argument lands at -1, the
/// second-to-last at -2, and so on, mirroring `operations.py`'s
/// `enumerate(reversed(args))` walk. They are not restored after return.
fn eval_call<C: Canvas>(body: &Node, ctx: &mut Context<C>) -> EvalResult<Value> {
    let (fid, args) = match eval_expr(body, ctx)? {
        Value::Tuple(items) => {
            if items.is_empty() {
                return Err(EvalError::Runtime(RuntimeError::ExpectedTuple));
            }
            let fid = num(&items[0])? as i64;
            (fid, items[1..].to_vec())
        }
        Value::Number(n) => (n as i64, Vec::new()),
    };
    let func_body = ctx
        .funcs
        .get(&fid)
        .cloned()
        .ok_or(EvalError::Runtime(RuntimeError::UndefinedFunction(fid)))?;
    for (idx, arg) in args.into_iter().rev().enumerate() {
        ctx.vars.insert(-(idx as i64 + 1), arg);
    }
    exec_call_body(&func_body, ctx)
}

fn exec_call_body<C: Canvas>(body: &[Node], ctx: &mut Context<C>) -> EvalResult<Value> {
    let mut result = Value::ZERO;
    for stmt in body {
        result = eval_statement_value(stmt, ctx)?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::recording::RecordingCanvas;
    use crate::parser::Parser;

    fn run_source(src: &str) -> Context<RecordingCanvas> {
        let root = Parser::parse(src).unwrap();
        let mut ctx = Context::new(RecordingCanvas::new());
        run(&root, &mut ctx).unwrap();
        ctx
    }

    #[test]
    fn arithmetic_round_trip() {
        // n n 5 d — negate twice, then draw; dot lands at the cursor
        // default (0,0) regardless, so probe via assignment instead.
        let ctx = run_source("a(0,n(n(5)))d");
        assert_eq!(ctx.vars.get(&0), Some(&Value::Number(5.0)));
    }

    #[test]
    fn short_circuit_and_skips_right_side() {
        // a(1, e) as the right side would assign var 1 if evaluated.
        let ctx = run_source("&(0,a(1,9))d");
        assert!(!ctx.vars.contains_key(&1));
    }

    #[test]
    fn short_circuit_or_skips_right_side() {
        let ctx = run_source("|(5,a(1,9))d");
        assert!(!ctx.vars.contains_key(&1));
    }

    #[test]
    fn call_binds_positional_args_reverse() {
        // Reads use `0-1`/`0-2`/`0-3` rather than a bare negative literal —
        // `NUMBERS` has no sign character, so `-` is always the `Sub`
        // infix op, never part of a literal. Each statement is closed with
        // its own `;` rather than bare whitespace: the parser's `)` handler
        // only ever searches for the nearest still-open *paren* scope, so
        // once one has already closed and been handed back to its parent
        // for a following operator to consume, a bare space only unwinds
        // one level of that hand-back — not enough to fully settle a
        // doubly-nested `a(id,a(0-n))` before the next statement starts.
        // `;` forces a full collapse before the next character is read.
        let ctx = run_source("{0 a(9,a(0-1)); a(10,a(0-2)); a(11,a(0-3)); ) q(0,7,8,9)");
        assert_eq!(ctx.vars.get(&9), Some(&Value::Number(9.0)));
        assert_eq!(ctx.vars.get(&10), Some(&Value::Number(8.0)));
        assert_eq!(ctx.vars.get(&11), Some(&Value::Number(7.0)));
    }

    #[test]
    fn reducer_agreement() {
        // Each reducer heads its own block statement rather than appearing
        // as a call argument — `L`/`i` force a full collapse of the
        // expression stack before opening, so each header starts clean
        // (see `call_binds_positional_args_reverse` for why a reducer
        // nested inside another paren group doesn't close reliably).
        let ctx = run_source("L U(1,2,3) d ) i A(1,1,1) d ) i T(0,0,5) d )");
        assert_eq!(ctx.canvas.dots.len(), 8);
    }

    #[test]
    fn transform_merge_and_pop() {
        let mut ctx = run_source("p(0,0)d t(5,0) p(0,0) d t(5,0) d");
        assert_eq!(ctx.canvas.dots.len(), 3);
        ctx.canvas.pop_transform();
        assert!(ctx.canvas.transforms.is_empty());
    }

    #[test]
    fn scenario_literal_plus_dot() {
        // `+` pops its left operand from the current tip at the moment it
        // is read (§4.3 rule 8); a bare `1 2+d` has no expression slot left
        // for `+`'s right operand (`d` is a statement, not an expression),
        // so the sum must be parenthesized to have somewhere to go. This
        // nests it as the cursor's x component, with `0` as y, matching
        // spec.md §8 scenario 1's claimed result (a dot at (3, 0)).
        let ctx = run_source("p((1+2),0)d");
        assert_eq!(ctx.canvas.dots, vec![(3.0, 0.0)]);
    }

    #[test]
    fn scenario_red_dot_at_cursor() {
        let ctx = run_source("C(255,0,0) p(10,20) d");
        assert_eq!(ctx.canvas.dots, vec![(10.0, 20.0)]);
        assert_eq!(ctx.canvas.color, Some(Color::rgb(1.0, 0.0, 0.0)));
    }

    #[test]
    fn rgb_channels_are_normalized_to_cairos_unit_range() {
        // A mid-range color must not clamp every channel to white — each
        // component is divided by 255 before it ever reaches `Color`.
        let ctx = run_source("C(100,150,200) d");
        let color = ctx.canvas.color.unwrap();
        assert!((color.r - 100.0 / 255.0).abs() < 1e-9);
        assert!((color.g - 150.0 / 255.0).abs() < 1e-9);
        assert!((color.b - 200.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    fn hsl_scenario_bright_cyan_green() {
        // spec.md §8 scenario 6: H(0,255,127) is bright cyan-green, not the
        // garbage `hsl_to_rgb` produces when fed raw, un-normalized s/l.
        let ctx = run_source("H(150,255,127) d");
        let color = ctx.canvas.color.unwrap();
        assert!(color.r < 0.1);
        assert!(color.g > 0.9);
        assert!(color.b > 0.4 && color.b < 0.6);
    }

    #[test]
    fn mod_is_floored_like_python() {
        // `%` on a negative left operand must floor like Python's, not
        // truncate like Rust's `%` — matches `~` below it, already floored.
        let mut ctx: Context<RecordingCanvas> = Context::new(RecordingCanvas::new());
        let left = Node::Literal(-1.0);
        let right = Some(Box::new(Node::Literal(3.0)));
        let result = eval_infix(InfixKind::Mod, &left, &right, &mut ctx).unwrap();
        assert_eq!(result, Value::Number(2.0));
    }

    #[test]
    fn scenario_defined_function_called() {
        let ctx = run_source("{0 p(0,0) d) q(0)");
        assert_eq!(ctx.canvas.dots, vec![(0.0, 0.0)]);
    }

    #[test]
    fn scenario_loop_advances_origin() {
        let ctx = run_source("L 3 p(0,0) d t(5,0) )");
        assert_eq!(ctx.canvas.dots, vec![(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)]);
    }

    #[test]
    fn scenario_conditional_false_draws_nothing() {
        let ctx = run_source("i 0 d )");
        assert!(ctx.canvas.dots.is_empty());
    }

    #[test]
    fn break_inside_loop_does_not_bubble() {
        let ctx = run_source("L 5 d ; )");
        assert_eq!(ctx.canvas.dots.len(), 1);
    }

    #[test]
    fn break_outside_loop_is_a_runtime_error() {
        let root = Parser::parse(";").unwrap();
        let mut ctx: Context<RecordingCanvas> = Context::new(RecordingCanvas::new());
        assert_eq!(run(&root, &mut ctx), Err(RuntimeError::BreakOutsideLoop));
    }
}

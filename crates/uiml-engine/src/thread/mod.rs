//! The queue-driven statement executor.
//!
//! Statements never recurse on the Rust stack. A compound statement pushes a
//! block, unshifts its parts onto the queue and returns; loops re-enqueue a
//! check marker after every iteration. `break`, `continue`, `return` and
//! exceptions pop the queue until they reach the marker that handles them.

mod eval;

use crate::error::{EngineError, Fault, Flow};
use crate::intrinsics;
use crate::scope::{self, BindingMode, Block, BlockRef};
use crate::value::{Closure, ReadOnlyView, Value};
use crate::{EngineOptions, EvalContext};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use uiml_script::{Declarator, Expr, ForEachLoop, LoopBinding, Pattern, Stmt, StmtKind, SwitchCase};

enum QueueItem {
    Statement(Stmt),
    /// Leaves the innermost block.
    BlockEnd,
    /// Tests a loop condition and schedules the next iteration.
    LoopCheck(Rc<LoopState>),
    /// Runs the update expression of a classic `for`.
    LoopUpdate(Rc<LoopState>),
    /// Binds the next value of a `for..in`/`for..of`.
    ForInOfNext(ForEachState),
    /// Reached when a `try`, `catch` or `finally` part completes.
    TryExit(Rc<RefCell<TryScope>>),
    /// Target of `break` inside a `switch`.
    SwitchEnd,
    /// Marks where a function body ends.
    CallBoundary(CallFrame),
}

struct LoopState {
    condition: Option<Expr>,
    update: Option<Expr>,
    body: Stmt,
}

struct ForEachState {
    each: Arc<ForEachLoop>,
    remaining: VecDeque<Value>,
}

struct CallFrame {
    id: u64,
    /// The parameter block; `return` stores its value here.
    block: BlockRef,
    /// Scope stack depth to restore.
    depth: usize,
}

/// The stages a `try` statement passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TryPhase {
    Try,
    Catch,
    /// `finally` running after normal completion or a pending exit.
    Finally,
    /// `finally` running with a pending error.
    Error,
    PostFinally,
}

/// A non-local exit in flight.
#[derive(Debug)]
enum Exit {
    Break,
    Continue,
    Return(Value),
}

struct TryScope {
    phase: TryPhase,
    catch_param: Option<Pattern>,
    catch_block: Option<Vec<Stmt>>,
    finally_block: Option<Vec<Stmt>>,
    pending_exit: Option<Exit>,
    pending_error: Option<Value>,
}

/// Counters collected while running; useful for tuning, not exact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineDiagnostics {
    pub processed_statements: u64,
    pub max_loop_depth: usize,
    pub max_block_depth: usize,
    pub max_queue_length: usize,
    pub unwinds: u64,
    pub reenqueues: u64,
}

/// Executes statements against a global block and a host context.
///
/// Variables declared at top level persist across [`Thread::execute`] calls,
/// so a code-behind module can run first and event handlers afterwards.
pub struct Thread {
    options: EngineOptions,
    context: EvalContext,
    queue: VecDeque<QueueItem>,
    root: BlockRef,
    /// Blocks entered beyond the root, innermost last.
    scopes: Vec<BlockRef>,
    return_value: Option<Value>,
    next_id: u64,
    loop_depth: usize,
    call_depth: usize,
    steps: u64,
    started: Instant,
    diagnostics: EngineDiagnostics,
}

impl Thread {
    pub fn new(context: EvalContext, options: EngineOptions) -> Self {
        Self {
            options,
            context,
            queue: VecDeque::new(),
            root: Block::root(),
            scopes: Vec::new(),
            return_value: None,
            next_id: 0,
            loop_depth: 0,
            call_depth: 0,
            steps: 0,
            started: Instant::now(),
            diagnostics: EngineDiagnostics::default(),
        }
    }

    /// Runs `statements` to completion and returns the top-level `return` value.
    pub fn execute(&mut self, statements: &[Stmt]) -> Result<Option<Value>, EngineError> {
        log::debug!("executing {} statements", statements.len());
        self.reset_budget();
        self.return_value = None;
        self.hoist(statements);
        self.unshift(statements);
        if let Err(fault) = self.run(None) {
            return Err(self.abort(fault));
        }
        Ok(self.return_value.clone())
    }

    /// Evaluates a single expression in the global block.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, EngineError> {
        self.reset_budget();
        let result = self.eval(expr);
        result.map_err(|fault| self.abort(fault))
    }

    /// Reads a top-level variable.
    pub fn variable(&self, name: &str) -> Option<Value> {
        self.root.borrow().vars.get(name).map(|binding| binding.value.clone())
    }

    pub fn context(&self) -> &EvalContext {
        &self.context
    }

    /// The value of the last top-level `return`.
    pub fn return_value(&self) -> Option<&Value> {
        self.return_value.as_ref()
    }

    pub fn diagnostics(&self) -> &EngineDiagnostics {
        &self.diagnostics
    }

    fn reset_budget(&mut self) {
        self.steps = 0;
        self.started = Instant::now();
    }

    /// Drops all pending work after a fatal error or an uncaught exception.
    fn abort(&mut self, fault: Fault) -> EngineError {
        self.queue.clear();
        self.scopes.clear();
        self.loop_depth = 0;
        self.call_depth = 0;
        match fault {
            Fault::Fatal(error) => error,
            Fault::Throw(value) => EngineError::uncaught(&value),
        }
    }

    fn current(&self) -> BlockRef {
        self.scopes.last().unwrap_or(&self.root).clone()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn open_block(&mut self) {
        let block = Block::child(&self.current());
        self.scopes.push(block);
        self.diagnostics.max_block_depth = self.diagnostics.max_block_depth.max(self.scopes.len());
    }

    fn pop_block(&mut self) {
        self.scopes.pop();
    }

    /// Opens a block and schedules `statements` followed by its end.
    fn push_block(&mut self, statements: &[Stmt]) {
        self.open_block();
        self.hoist(statements);
        self.queue.push_front(QueueItem::BlockEnd);
        self.unshift(statements);
    }

    fn unshift(&mut self, statements: &[Stmt]) {
        for statement in statements.iter().rev() {
            self.queue.push_front(QueueItem::Statement(statement.clone()));
        }
    }

    /// Declares the named function declarations of a block up front.
    fn hoist(&mut self, statements: &[Stmt]) {
        let block = self.current();
        for statement in statements {
            if let StmtKind::Function(function) = &statement.kind {
                if let Some(name) = &function.name {
                    let closure = Value::Function(Rc::new(Closure {
                        function: function.clone(),
                        scope: block.clone(),
                    }));
                    block.borrow_mut().declare(name, closure, false);
                }
            }
        }
    }

    fn enter_loop(&mut self) {
        self.loop_depth += 1;
        self.diagnostics.max_loop_depth = self.diagnostics.max_loop_depth.max(self.loop_depth);
    }

    fn exit_loop(&mut self) {
        self.loop_depth = self.loop_depth.saturating_sub(1);
    }

    /// Counts one unit of work against the budget.
    fn tick(&mut self) -> Flow<()> {
        self.steps += 1;
        self.diagnostics.max_queue_length = self.diagnostics.max_queue_length.max(self.queue.len() + 1);
        let over_steps = self.options.max_steps.is_some_and(|max| self.steps > max);
        let over_time = self
            .options
            .timeout
            .is_some_and(|limit| self.steps % 64 == 0 && self.started.elapsed() > limit);
        if over_steps || over_time {
            log::debug!("engine budget exhausted after {} steps", self.steps);
            return Err(EngineError::Timeout { steps: self.steps }.into());
        }
        Ok(())
    }

    /// Processes queue items until the queue is empty or, for a function
    /// call, until its boundary marker is consumed.
    fn run(&mut self, boundary: Option<u64>) -> Flow<()> {
        while let Some(item) = self.queue.pop_front() {
            self.tick()?;
            match self.process(item) {
                Ok(Some(finished)) if Some(finished) == boundary => return Ok(()),
                Ok(_) => {}
                Err(Fault::Throw(value)) => self.raise(value, boundary)?,
                Err(fatal) => return Err(fatal),
            }
        }
        Ok(())
    }

    /// Returns the call id when a call boundary was consumed.
    fn process(&mut self, item: QueueItem) -> Flow<Option<u64>> {
        match item {
            QueueItem::Statement(statement) => self.execute_statement(&statement)?,
            QueueItem::BlockEnd => self.pop_block(),
            QueueItem::LoopCheck(state) => self.loop_check(state)?,
            QueueItem::LoopUpdate(state) => {
                if let Some(update) = &state.update {
                    self.eval(update)?;
                }
            }
            QueueItem::ForInOfNext(state) => self.for_each_next(state)?,
            QueueItem::TryExit(scope) => self.try_exit(scope)?,
            QueueItem::SwitchEnd => {}
            QueueItem::CallBoundary(frame) => {
                self.scopes.truncate(frame.depth);
                return Ok(Some(frame.id));
            }
        }
        Ok(None)
    }

    fn execute_statement(&mut self, statement: &Stmt) -> Flow<()> {
        self.diagnostics.processed_statements += 1;
        match &statement.kind {
            StmtKind::Empty | StmtKind::Function(_) => {}
            StmtKind::Import(import) => log::debug!("skipping import from '{}'", import.module),
            StmtKind::Expression(expr) => {
                self.eval(expr)?;
            }
            StmtKind::Let(declarators) | StmtKind::Var(declarators) => self.declare(declarators, BindingMode::Let)?,
            StmtKind::Const(declarators) => self.declare(declarators, BindingMode::Const)?,
            StmtKind::Block(statements) => self.push_block(statements),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval(condition)?.truthy() {
                    self.queue.push_front(QueueItem::Statement(then_branch.clone()));
                } else if let Some(else_branch) = else_branch {
                    self.queue.push_front(QueueItem::Statement(else_branch.clone()));
                }
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Undefined,
                };
                self.unwind(Exit::Return(value))?;
            }
            StmtKind::Break => self.unwind(Exit::Break)?,
            StmtKind::Continue => self.unwind(Exit::Continue)?,
            StmtKind::While { condition, body } => {
                let state = self.loop_state(Some(condition.clone()), None, body);
                self.enter_loop();
                self.queue.push_front(QueueItem::LoopCheck(state));
            }
            StmtKind::DoWhile { body, condition } => {
                let state = self.loop_state(Some(condition.clone()), None, body);
                self.enter_loop();
                self.queue.push_front(QueueItem::LoopCheck(state));
                self.queue.push_front(QueueItem::Statement(body.clone()));
            }
            StmtKind::For {
                init,
                condition,
                update,
                body,
            } => {
                let state = self.loop_state(condition.clone(), update.clone(), body);
                self.open_block();
                self.enter_loop();
                self.queue.push_front(QueueItem::BlockEnd);
                self.queue.push_front(QueueItem::LoopCheck(state));
                if let Some(init) = init {
                    self.queue.push_front(QueueItem::Statement(init.clone()));
                }
            }
            StmtKind::ForIn(each) => {
                let source = self.eval(&each.source)?;
                let keys = intrinsics::enumerate_keys(&source);
                self.start_for_each(each, keys);
            }
            StmtKind::ForOf(each) => {
                let source = self.eval(&each.source)?;
                let items = intrinsics::iterate(&source).ok_or_else(|| EngineError::IteratorExpected {
                    found: describe(&source),
                    span: each.source.span,
                })?;
                self.start_for_each(each, items);
            }
            StmtKind::Throw(expr) => return Err(Fault::Throw(self.eval(expr)?)),
            StmtKind::Try {
                block,
                catch_param,
                catch_block,
                finally_block,
            } => {
                let scope = TryScope {
                    phase: TryPhase::Try,
                    catch_param: catch_param.clone(),
                    catch_block: catch_block.clone(),
                    finally_block: finally_block.clone(),
                    pending_exit: None,
                    pending_error: None,
                };
                self.queue.push_front(QueueItem::TryExit(Rc::new(RefCell::new(scope))));
                self.push_block(block);
            }
            StmtKind::Switch { discriminant, cases } => self.switch(discriminant, cases)?,
        }
        Ok(())
    }

    fn declare(&mut self, declarators: &[Declarator], mode: BindingMode) -> Flow<()> {
        for declarator in declarators {
            let value = match &declarator.init {
                Some(init) => self.eval(init)?,
                None => Value::Undefined,
            };
            self.bind_pattern(&declarator.target, value, mode)?;
        }
        Ok(())
    }

    fn loop_state(&mut self, condition: Option<Expr>, update: Option<Expr>, body: &Stmt) -> Rc<LoopState> {
        Rc::new(LoopState {
            condition,
            update,
            body: body.clone(),
        })
    }

    fn loop_check(&mut self, state: Rc<LoopState>) -> Flow<()> {
        let proceed = match &state.condition {
            Some(condition) => self.eval(condition)?.truthy(),
            None => true,
        };
        if !proceed {
            self.exit_loop();
            return Ok(());
        }
        self.diagnostics.reenqueues += 1;
        self.queue.push_front(QueueItem::LoopCheck(state.clone()));
        if state.update.is_some() {
            self.queue.push_front(QueueItem::LoopUpdate(state.clone()));
        }
        self.queue.push_front(QueueItem::Statement(state.body.clone()));
        Ok(())
    }

    fn start_for_each(&mut self, each: &Arc<ForEachLoop>, values: Vec<Value>) {
        let state = ForEachState {
            each: each.clone(),
            remaining: values.into(),
        };
        self.enter_loop();
        self.queue.push_front(QueueItem::ForInOfNext(state));
    }

    fn for_each_next(&mut self, mut state: ForEachState) -> Flow<()> {
        let Some(value) = state.remaining.pop_front() else {
            self.exit_loop();
            return Ok(());
        };
        let each = state.each.clone();
        self.diagnostics.reenqueues += 1;
        self.open_block();
        self.queue.push_front(QueueItem::ForInOfNext(state));
        self.queue.push_front(QueueItem::BlockEnd);
        self.queue.push_front(QueueItem::Statement(each.body.clone()));
        let mode = match each.binding {
            LoopBinding::None => BindingMode::None,
            LoopBinding::Let => BindingMode::Let,
            LoopBinding::Const => BindingMode::Const,
        };
        self.bind_pattern(&each.target, value, mode)
    }

    fn switch(&mut self, discriminant: &Expr, cases: &[SwitchCase]) -> Flow<()> {
        let value = self.eval(discriminant)?;
        let mut start = None;
        for (index, case) in cases.iter().enumerate() {
            if let Some(test) = &case.test {
                if value.strict_equals(&self.eval(test)?) {
                    start = Some(index);
                    break;
                }
            }
        }
        let Some(start) = start.or_else(|| cases.iter().position(|case| case.test.is_none())) else {
            return Ok(());
        };
        let body: Vec<Stmt> = cases[start..].iter().flat_map(|case| case.body.iter().cloned()).collect();
        self.queue.push_front(QueueItem::SwitchEnd);
        self.push_block(&body);
        Ok(())
    }

    /// Moves a `try` statement to its next phase once a part completes.
    fn try_exit(&mut self, scope: Rc<RefCell<TryScope>>) -> Flow<()> {
        let phase = scope.borrow().phase;
        match phase {
            TryPhase::Try | TryPhase::Catch => {
                let finally_block = scope.borrow().finally_block.clone();
                if let Some(finally_block) = finally_block {
                    scope.borrow_mut().phase = TryPhase::Finally;
                    self.queue.push_front(QueueItem::TryExit(scope));
                    self.push_block(&finally_block);
                }
                Ok(())
            }
            TryPhase::Finally | TryPhase::Error => {
                let (error, exit) = {
                    let mut scope = scope.borrow_mut();
                    scope.phase = TryPhase::PostFinally;
                    (scope.pending_error.take(), scope.pending_exit.take())
                };
                if let Some(error) = error {
                    return Err(Fault::Throw(error));
                }
                if let Some(exit) = exit {
                    return self.unwind(exit);
                }
                Ok(())
            }
            TryPhase::PostFinally => Ok(()),
        }
    }

    /// Pops the queue until the marker that handles `exit`.
    fn unwind(&mut self, exit: Exit) -> Flow<()> {
        self.diagnostics.unwinds += 1;
        while let Some(item) = self.queue.pop_front() {
            match item {
                QueueItem::Statement(_) => {}
                QueueItem::BlockEnd => self.pop_block(),
                QueueItem::TryExit(scope) => {
                    let finally_block = {
                        let scope = scope.borrow();
                        match scope.phase {
                            TryPhase::Try | TryPhase::Catch => scope.finally_block.clone(),
                            _ => None,
                        }
                    };
                    if let Some(finally_block) = finally_block {
                        {
                            let mut scope = scope.borrow_mut();
                            scope.phase = TryPhase::Finally;
                            scope.pending_exit = Some(exit);
                        }
                        self.queue.push_front(QueueItem::TryExit(scope));
                        self.push_block(&finally_block);
                        return Ok(());
                    }
                }
                QueueItem::LoopUpdate(state) => match exit {
                    Exit::Continue => {
                        self.queue.push_front(QueueItem::LoopUpdate(state));
                        return Ok(());
                    }
                    Exit::Break | Exit::Return(_) => {}
                },
                QueueItem::LoopCheck(state) => {
                    if matches!(exit, Exit::Continue) {
                        self.queue.push_front(QueueItem::LoopCheck(state));
                        return Ok(());
                    }
                    self.exit_loop();
                    if matches!(exit, Exit::Break) {
                        return Ok(());
                    }
                }
                QueueItem::ForInOfNext(state) => {
                    if matches!(exit, Exit::Continue) {
                        self.queue.push_front(QueueItem::ForInOfNext(state));
                        return Ok(());
                    }
                    self.exit_loop();
                    if matches!(exit, Exit::Break) {
                        return Ok(());
                    }
                }
                QueueItem::SwitchEnd => {
                    if matches!(exit, Exit::Break) {
                        return Ok(());
                    }
                }
                QueueItem::CallBoundary(frame) => {
                    if let Exit::Return(value) = exit {
                        frame.block.borrow_mut().return_value = Some(value);
                    }
                    self.queue.push_front(QueueItem::CallBoundary(frame));
                    return Ok(());
                }
            }
        }
        if let Exit::Return(value) = exit {
            self.return_value = Some(value);
        }
        Ok(())
    }

    /// Pops the queue until a `catch` or `finally` takes `value`.
    ///
    /// Fails with the value when it escapes the function identified by
    /// `boundary` or the whole queue.
    fn raise(&mut self, value: Value, boundary: Option<u64>) -> Flow<()> {
        self.diagnostics.unwinds += 1;
        while let Some(item) = self.queue.pop_front() {
            match item {
                QueueItem::BlockEnd => self.pop_block(),
                QueueItem::LoopCheck(_) | QueueItem::ForInOfNext(_) => self.exit_loop(),
                QueueItem::TryExit(scope) => {
                    let (phase, has_catch, finally_block) = {
                        let scope = scope.borrow();
                        (scope.phase, scope.catch_block.is_some(), scope.finally_block.clone())
                    };
                    if phase == TryPhase::Try && has_catch {
                        let (param, body) = {
                            let mut scope = scope.borrow_mut();
                            scope.phase = TryPhase::Catch;
                            (scope.catch_param.clone(), scope.catch_block.clone().unwrap_or_default())
                        };
                        self.queue.push_front(QueueItem::TryExit(scope));
                        self.push_block(&body);
                        if let Some(param) = param {
                            self.bind_pattern(&param, value, BindingMode::Let)?;
                        }
                        return Ok(());
                    }
                    if let (TryPhase::Try | TryPhase::Catch, Some(finally_block)) = (phase, finally_block) {
                        {
                            let mut scope = scope.borrow_mut();
                            scope.phase = TryPhase::Error;
                            scope.pending_error = Some(value);
                            scope.pending_exit = None;
                        }
                        self.queue.push_front(QueueItem::TryExit(scope));
                        self.push_block(&finally_block);
                        return Ok(());
                    }
                }
                QueueItem::CallBoundary(frame) => {
                    self.scopes.truncate(frame.depth);
                    if Some(frame.id) == boundary {
                        return Err(Fault::Throw(value));
                    }
                }
                QueueItem::Statement(_) | QueueItem::LoopUpdate(_) | QueueItem::SwitchEnd => {}
            }
        }
        Err(Fault::Throw(value))
    }

    fn lookup(&self, name: &str) -> Value {
        if let Some(value) = scope::lookup(&self.current(), name) {
            return value;
        }
        match self.context.globals.get(name) {
            Some(value) if self.context.read_only.contains(name) => {
                ReadOnlyView::wrap(value.clone(), name)
            }
            Some(value) => value.clone(),
            None => intrinsics::builtin_global(name).unwrap_or(Value::Undefined),
        }
    }
}

/// Names a value's kind in error messages.
fn describe(value: &Value) -> String {
    match value {
        Value::Undefined | Value::Null => value.to_string(),
        other => other.type_of().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use uiml_script::{parse_statements, NodeIdGenerator};

    fn thread() -> Thread {
        Thread::new(EvalContext::default(), EngineOptions::default())
    }

    fn run(thread: &mut Thread, source: &str) -> Result<Option<Value>, EngineError> {
        let statements = parse_statements(source, &NodeIdGenerator::new()).unwrap();
        thread.execute(&statements)
    }

    fn number(thread: &Thread, name: &str) -> f64 {
        thread.variable(name).map(|v| v.to_number()).unwrap_or(f64::NAN)
    }

    #[test]
    fn test_loops_and_blocks() {
        let mut t = thread();
        run(
            &mut t,
            "let sum = 0;
             for (let i = 0; i < 5; i++) { if (i === 3) continue; sum += i; }
             let j = 0;
             while (true) { j++; if (j > 4) break; }
             do { j += 10 } while (j < 30)",
        )
        .unwrap();
        assert_eq!(number(&t, "sum"), 7.0);
        assert_eq!(number(&t, "j"), 35.0);
        assert_eq!(t.diagnostics().max_loop_depth, 1);
    }

    #[test]
    fn test_nested_loops_break_inner_only() {
        let mut t = thread();
        run(
            &mut t,
            "let hits = 0;
             for (const a of [1, 2, 3]) {
               for (const b of [1, 2, 3]) { if (b > a) break; hits++; }
             }",
        )
        .unwrap();
        assert_eq!(number(&t, "hits"), 6.0);
        assert_eq!(t.diagnostics().max_loop_depth, 2);
    }

    #[test]
    fn test_switch_fallthrough() {
        let mut t = thread();
        run(
            &mut t,
            "let out = '';
             switch (2) { case 1: out += 'a'; case 2: out += 'b'; case 3: out += 'c'; break; default: out += 'd'; }
             switch (9) { case 1: out += 'x'; break; default: out += 'e'; }",
        )
        .unwrap();
        assert_eq!(t.variable("out"), Some(Value::from("bce")));
    }

    #[test]
    fn test_switch_inside_loops() {
        let mut t = thread();
        run(
            &mut t,
            "let out = '';
             for (const n of [1, 2, 3]) { switch (n) { case 2: break; default: out += n; } out += ';'; }
             let keys = '';
             for (const k in { a: 1, skip: 2, c: 3 }) { switch (k) { case 'skip': continue; } keys += k; }
             let total = 0;
             for (let i = 0; i < 4; i++) { switch (i % 2) { case 0: continue; } total += i; }",
        )
        .unwrap();
        assert_eq!(t.variable("out"), Some(Value::from("1;;3;")));
        assert_eq!(t.variable("keys"), Some(Value::from("ac")));
        assert_eq!(number(&t, "total"), 4.0);
        assert_eq!(t.diagnostics().max_loop_depth, 1);
    }

    #[test]
    fn test_try_finally_return_ordering() {
        let mut t = thread();
        let result = run(&mut t, "let x = 1; try { return x; } finally { x = 2; }").unwrap();
        assert_eq!(result, Some(Value::Number(1.0)));
        assert_eq!(number(&t, "x"), 2.0);

        let mut t = thread();
        run(
            &mut t,
            "let x = 1;
             function f() { try { return x; } finally { x = 2; } }
             let result = f();",
        )
        .unwrap();
        assert_eq!(number(&t, "result"), 1.0);
        assert_eq!(number(&t, "x"), 2.0);
    }

    #[test]
    fn test_catch_and_rethrow_after_finally() {
        let mut t = thread();
        run(
            &mut t,
            "let log = [];
             try { try { throw 'boom'; } finally { log.push('inner'); } }
             catch (e) { log.push(e); }
             try { null.x } catch (e) { log.push(e.name); }",
        )
        .unwrap();
        assert_eq!(t.variable("log").unwrap().to_string(), "inner,boom,TypeError");
    }

    #[test]
    fn test_break_runs_finally() {
        let mut t = thread();
        run(
            &mut t,
            "let n = 0;
             for (let i = 0; i < 10; i++) { try { if (i === 2) break; } finally { n++; } }",
        )
        .unwrap();
        assert_eq!(number(&t, "n"), 3.0);
        assert_eq!(t.queue.len(), 0);
    }

    #[test]
    fn test_infinite_loop_times_out() {
        let options = EngineOptions {
            max_steps: Some(10_000),
            ..EngineOptions::default()
        };
        let mut t = Thread::new(EvalContext::default(), options);
        assert!(matches!(run(&mut t, "while(true);"), Err(EngineError::Timeout { .. })));

        let options = EngineOptions {
            timeout: Some(Duration::from_millis(20)),
            max_steps: None,
            ..EngineOptions::default()
        };
        let mut t = Thread::new(EvalContext::default(), options);
        assert!(matches!(run(&mut t, "for (;;) {}"), Err(EngineError::Timeout { .. })));
    }

    #[test]
    fn test_for_in_and_for_of_sources() {
        let mut t = thread();
        run(
            &mut t,
            "let keys = '';
             for (const k in { a: 1, b: 2 }) keys += k;
             for (const k in null) keys += 'never';
             let chars = [];
             for (const c of 'hi') chars.push(c);",
        )
        .unwrap();
        assert_eq!(t.variable("keys"), Some(Value::from("ab")));
        assert_eq!(t.variable("chars").unwrap().to_string(), "h,i");

        let error = run(&mut t, "for (const x of 42) {}").unwrap_err();
        assert!(matches!(error, EngineError::IteratorExpected { ref found, .. } if found == "number"));
    }

    #[test]
    fn test_const_bindings() {
        let mut t = thread();
        run(&mut t, "let total = 0; for (const v of [1, 2]) { total += v; }").unwrap();
        assert_eq!(number(&t, "total"), 3.0);

        let error = run(&mut t, "for (const v of [1]) { v = 2; }").unwrap_err();
        assert!(matches!(error, EngineError::ConstAssignment { ref name, .. } if name == "v"));
        let error = run(&mut t, "const c = 1; c++;").unwrap_err();
        assert!(matches!(error, EngineError::ConstAssignment { .. }));
    }

    #[test]
    fn test_uncaught_throw() {
        let mut t = thread();
        let error = run(&mut t, "function f() { throw new Error('x'); } f();").unwrap_err();
        assert!(matches!(error, EngineError::Uncaught { .. }));
        // The thread stays usable.
        assert_eq!(run(&mut t, "return 5").unwrap(), Some(Value::Number(5.0)));
    }
}

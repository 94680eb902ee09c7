//! Expression evaluation, calls and bindings.

use super::{CallFrame, QueueItem, Thread};
use crate::error::{range_error, type_error, EngineError, Fault, Flow};
use crate::intrinsics::{self, to_property_key};
use crate::operators;
use crate::scope::{self, BindingMode, Block, BlockRef};
use crate::value::{Closure, Value};
use indexmap::IndexMap;
use num_bigint::BigInt;
use smol_str::SmolStr;
use source_map::Span;
use std::rc::Rc;
use uiml_script::{
    expression_to_pattern, ArrowBody, ArrowFunction, AssignmentOp, BinaryOp, Expr, ExprKind, ObjectProperty, Params,
    Pattern, PropertyKey, UnaryOp, UpdateOp,
};

/// The place an assignment writes to.
enum Reference {
    Name(SmolStr),
    Member(Value, SmolStr),
}

impl Thread {
    pub(super) fn eval(&mut self, expr: &Expr) -> Flow<Value> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(Value::from_literal(literal)),
            ExprKind::Identifier { name } => Ok(self.lookup(name)),
            ExprKind::TemplateLiteral { parts } => {
                let mut text = String::new();
                for part in parts {
                    text.push_str(&self.eval(part)?.to_string());
                }
                Ok(Value::from(text))
            }
            ExprKind::ArrayLiteral { items } => {
                let items = self.eval_list(items)?;
                Ok(Value::array(items))
            }
            ExprKind::ObjectLiteral { properties } => self.eval_object(properties),
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Delete => self.delete(operand),
                op => {
                    let value = self.eval(operand)?;
                    operators::unary(*op, &value)
                }
            },
            ExprKind::Prefix { op, operand } => self.update(*op, operand, true),
            ExprKind::Postfix { op, operand } => self.update(*op, operand, false),
            ExprKind::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let short_circuit = match op {
                    BinaryOp::LogicalAnd => !left.truthy(),
                    BinaryOp::LogicalOr => left.truthy(),
                    BinaryOp::NullCoalesce => !left.is_nullish(),
                    _ => false,
                };
                if short_circuit {
                    return Ok(left);
                }
                let right = self.eval(right)?;
                operators::binary(*op, &left, &right)
            }
            ExprKind::Sequence { expressions, .. } => {
                let mut last = Value::Undefined;
                for expression in expressions {
                    last = self.eval(expression)?;
                }
                Ok(last)
            }
            ExprKind::Conditional {
                condition,
                consequent,
                alternate,
            } => {
                if self.eval(condition)?.truthy() {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
            ExprKind::Call {
                callee,
                arguments,
                optional,
            } => self.eval_call(callee, arguments, *optional, expr.span),
            ExprKind::Member {
                object,
                member,
                optional,
            } => {
                let object = self.eval(object)?;
                if *optional && object.is_nullish() {
                    return Ok(Value::Undefined);
                }
                intrinsics::get_member(&object, member)
            }
            ExprKind::ComputedMember {
                object,
                member,
                optional,
            } => {
                let object = self.eval(object)?;
                if *optional && object.is_nullish() {
                    return Ok(Value::Undefined);
                }
                let key = to_property_key(&self.eval(member)?);
                intrinsics::get_member(&object, &key)
            }
            ExprKind::Spread { .. } => Err(type_error("spread syntax is not allowed here")),
            ExprKind::Assignment { op, target, value } => self.assign(*op, target, value),
            ExprKind::NoArg => Ok(Value::Undefined),
            ExprKind::Arrow(function) => Ok(Value::Function(Rc::new(Closure {
                function: function.clone(),
                scope: self.current(),
            }))),
            ExprKind::New { callee, arguments } => {
                let constructor = self.eval(callee)?;
                let arguments = self.eval_list(arguments)?;
                let result = self.call_value(&constructor, arguments, &callee_name(callee))?;
                Ok(match result {
                    Value::Object(_) | Value::Array(_) => result,
                    _ => Value::object(IndexMap::new()),
                })
            }
            // No event loop: the operand is the result.
            ExprKind::Await { operand } => self.eval(operand),
        }
    }

    /// Evaluates array items or call arguments, expanding spreads.
    fn eval_list(&mut self, items: &[Expr]) -> Flow<Vec<Value>> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            match &item.kind {
                ExprKind::Spread { operand } => {
                    let value = self.eval(operand)?;
                    let spread = intrinsics::iterate(&value)
                        .ok_or_else(|| type_error(format!("{} is not iterable", value.type_of())))?;
                    values.extend(spread);
                }
                _ => values.push(self.eval(item)?),
            }
        }
        Ok(values)
    }

    fn eval_object(&mut self, properties: &[ObjectProperty]) -> Flow<Value> {
        let mut entries = IndexMap::new();
        for property in properties {
            match property {
                ObjectProperty::KeyValue { key, value } => {
                    let key = match key {
                        PropertyKey::Named(name) => name.clone(),
                        PropertyKey::Computed(expr) => to_property_key(&self.eval(expr)?),
                    };
                    let value = self.eval(value)?;
                    entries.insert(key, value);
                }
                ObjectProperty::Shorthand { name, .. } => {
                    entries.insert(name.clone(), self.lookup(name));
                }
                ObjectProperty::Spread(expr) => {
                    let value = self.eval(expr)?;
                    entries.extend(intrinsics::entries(&value));
                }
            }
        }
        Ok(Value::object(entries))
    }

    fn eval_call(&mut self, callee: &Expr, arguments: &[Expr], optional: bool, span: Span) -> Flow<Value> {
        let (receiver, key) = match &callee.kind {
            ExprKind::Member {
                object,
                member,
                optional: member_optional,
            } => {
                let receiver = self.eval(object)?;
                if *member_optional && receiver.is_nullish() {
                    return Ok(Value::Undefined);
                }
                (receiver, member.clone())
            }
            ExprKind::ComputedMember {
                object,
                member,
                optional: member_optional,
            } => {
                let receiver = self.eval(object)?;
                if *member_optional && receiver.is_nullish() {
                    return Ok(Value::Undefined);
                }
                let key = to_property_key(&self.eval(member)?);
                (receiver, key)
            }
            _ => {
                let function = self.eval(callee)?;
                if optional && function.is_nullish() {
                    return Ok(Value::Undefined);
                }
                let arguments = self.eval_list(arguments)?;
                return self.call_value(&function, arguments, &callee_name(callee));
            }
        };

        if intrinsics::has_intrinsic(&receiver, &key) {
            let arguments = self.eval_list(arguments)?;
            let result = intrinsics::call_intrinsic(&receiver, &key, &arguments, span)?;
            return Ok(result.unwrap_or(Value::Undefined));
        }
        let method = intrinsics::get_member(&receiver, &key)?;
        if optional && method.is_nullish() {
            return Ok(Value::Undefined);
        }
        let arguments = self.eval_list(arguments)?;
        self.call_value(&method, arguments, &key)
    }

    /// Calls a function value; `name` is only used in error messages.
    pub(super) fn call_value(&mut self, function: &Value, arguments: Vec<Value>, name: &str) -> Flow<Value> {
        match function {
            Value::Function(closure) => self.call_closure(closure, arguments),
            Value::Native(native) => native.call(&arguments).map_err(Fault::Throw),
            _ => Err(type_error(format!("{name} is not a function"))),
        }
    }

    fn call_closure(&mut self, closure: &Rc<Closure>, arguments: Vec<Value>) -> Flow<Value> {
        if self.call_depth >= self.options.max_call_depth {
            return Err(range_error("maximum call stack size exceeded"));
        }
        self.tick()?;
        let depth = self.scopes.len();
        let block = Block::child(&closure.scope);
        self.scopes.push(block.clone());
        self.diagnostics.max_block_depth = self.diagnostics.max_block_depth.max(self.scopes.len());
        self.call_depth += 1;
        let result = self.run_function(&closure.function, &block, depth, arguments);
        self.call_depth -= 1;
        self.scopes.truncate(depth);
        result
    }

    fn run_function(
        &mut self,
        function: &ArrowFunction,
        block: &BlockRef,
        depth: usize,
        arguments: Vec<Value>,
    ) -> Flow<Value> {
        self.bind_params(&function.params, arguments)?;
        match &function.body {
            ArrowBody::Expression(body) => self.eval(body),
            ArrowBody::Block(statements) => {
                let id = self.next_id();
                self.queue.push_front(QueueItem::CallBoundary(CallFrame {
                    id,
                    block: block.clone(),
                    depth,
                }));
                self.hoist(statements);
                self.unshift(statements);
                self.run(Some(id))?;
                let value = block.borrow_mut().return_value.take();
                Ok(value.unwrap_or(Value::Undefined))
            }
        }
    }

    fn bind_params(&mut self, params: &Params, mut arguments: Vec<Value>) -> Flow<()> {
        let rest = if arguments.len() > params.items.len() {
            arguments.split_off(params.items.len())
        } else {
            Vec::new()
        };
        let mut arguments = arguments.into_iter();
        for param in &params.items {
            let value = arguments.next().unwrap_or(Value::Undefined);
            self.bind_pattern(param, value, BindingMode::Let)?;
        }
        if let Some(rest_param) = &params.rest {
            self.bind_pattern(rest_param, Value::array(rest), BindingMode::Let)?;
        }
        Ok(())
    }

    /// Binds every name of `pattern` from `value`.
    pub(super) fn bind_pattern(&mut self, pattern: &Pattern, value: Value, mode: BindingMode) -> Flow<()> {
        match pattern {
            Pattern::Identifier { name, span } => self.bind_name(name, value, mode, *span),
            Pattern::Array(array) => {
                let mut items = intrinsics::iterate(&value)
                    .ok_or_else(|| type_error(format!("{} is not iterable", value.type_of())))?;
                let rest = if items.len() > array.items.len() {
                    items.split_off(array.items.len())
                } else {
                    Vec::new()
                };
                let mut items = items.into_iter();
                for slot in &array.items {
                    let item = items.next().unwrap_or(Value::Undefined);
                    if let Some(target) = slot {
                        self.bind_pattern(target, item, mode)?;
                    }
                }
                if let Some(rest_target) = &array.rest {
                    self.bind_pattern(rest_target, Value::array(rest), mode)?;
                }
                Ok(())
            }
            Pattern::Object(object) => {
                if value.is_nullish() {
                    return Err(type_error(format!("cannot destructure '{value}'")));
                }
                for property in &object.properties {
                    let item = intrinsics::get_member(&value, &property.key)?;
                    self.bind_pattern(&property.value, item, mode)?;
                }
                if let Some(rest) = &object.rest {
                    let remaining: IndexMap<SmolStr, Value> = intrinsics::entries(&value)
                        .into_iter()
                        .filter(|(key, _)| !object.properties.iter().any(|p| &p.key == key))
                        .collect();
                    self.bind_name(rest, Value::object(remaining), mode, object.span)?;
                }
                Ok(())
            }
        }
    }

    fn bind_name(&mut self, name: &str, value: Value, mode: BindingMode, span: Span) -> Flow<()> {
        match mode {
            BindingMode::Let => self.current().borrow_mut().declare(name, value, false),
            BindingMode::Const => self.current().borrow_mut().declare(name, value, true),
            BindingMode::None => self.assign_name(name, value, span)?,
        }
        Ok(())
    }

    /// Writes an existing variable, a host global, or a new global.
    fn assign_name(&mut self, name: &str, value: Value, span: Span) -> Flow<()> {
        if let Some(block) = scope::resolve(&self.current(), name) {
            let mut block = block.borrow_mut();
            if let Some(binding) = block.vars.get_mut(name) {
                if binding.constant {
                    return Err(EngineError::ConstAssignment {
                        name: SmolStr::new(name),
                        span,
                    }
                    .into());
                }
                binding.value = value;
            }
            return Ok(());
        }
        if self.context.read_only.contains(name) {
            return Err(EngineError::ReadOnly {
                path: name.to_string(),
                span,
            }
            .into());
        }
        if let Some(slot) = self.context.globals.get_mut(name) {
            *slot = value;
            return Ok(());
        }
        self.root.borrow_mut().declare(name, value, false);
        Ok(())
    }

    fn reference(&mut self, target: &Expr) -> Flow<Reference> {
        match &target.kind {
            ExprKind::Identifier { name } => Ok(Reference::Name(name.clone())),
            ExprKind::Member { object, member, .. } => {
                let object = self.eval(object)?;
                Ok(Reference::Member(object, member.clone()))
            }
            ExprKind::ComputedMember { object, member, .. } => {
                let object = self.eval(object)?;
                let key = to_property_key(&self.eval(member)?);
                Ok(Reference::Member(object, key))
            }
            _ => Err(type_error("invalid assignment target")),
        }
    }

    fn load(&self, reference: &Reference) -> Flow<Value> {
        match reference {
            Reference::Name(name) => Ok(self.lookup(name)),
            Reference::Member(object, key) => intrinsics::get_member(object, key),
        }
    }

    fn store(&mut self, reference: &Reference, value: Value, span: Span) -> Flow<()> {
        match reference {
            Reference::Name(name) => self.assign_name(name, value, span),
            Reference::Member(object, key) => intrinsics::set_member(object, key, value, span),
        }
    }

    fn assign(&mut self, op: AssignmentOp, target: &Expr, value: &Expr) -> Flow<Value> {
        let binary = match op {
            AssignmentOp::Assign => {
                if matches!(target.kind, ExprKind::ArrayLiteral { .. } | ExprKind::ObjectLiteral { .. }) {
                    let pattern =
                        expression_to_pattern(target).ok_or_else(|| type_error("invalid destructuring target"))?;
                    let value = self.eval(value)?;
                    self.bind_pattern(&pattern, value.clone(), BindingMode::None)?;
                    return Ok(value);
                }
                let reference = self.reference(target)?;
                let value = self.eval(value)?;
                self.store(&reference, value.clone(), target.span)?;
                return Ok(value);
            }
            AssignmentOp::Compound(binary) => binary,
        };

        let reference = self.reference(target)?;
        let current = self.load(&reference)?;
        let keep = match binary {
            BinaryOp::LogicalAnd => !current.truthy(),
            BinaryOp::LogicalOr => current.truthy(),
            BinaryOp::NullCoalesce => !current.is_nullish(),
            _ => false,
        };
        if keep {
            return Ok(current);
        }
        let right = self.eval(value)?;
        let result = if binary.is_logical() {
            right
        } else {
            operators::binary(binary, &current, &right)?
        };
        self.store(&reference, result.clone(), target.span)?;
        Ok(result)
    }

    /// `++`/`--` in either position.
    fn update(&mut self, op: UpdateOp, operand: &Expr, prefix: bool) -> Flow<Value> {
        let reference = self.reference(operand)?;
        let old = match self.load(&reference)? {
            Value::BigInt(b) => Value::BigInt(b),
            other => Value::Number(other.to_number()),
        };
        let new = match (&old, op) {
            (Value::BigInt(b), UpdateOp::Increment) => Value::BigInt(b + BigInt::from(1)),
            (Value::BigInt(b), UpdateOp::Decrement) => Value::BigInt(b - BigInt::from(1)),
            (value, UpdateOp::Increment) => Value::Number(value.to_number() + 1.0),
            (value, UpdateOp::Decrement) => Value::Number(value.to_number() - 1.0),
        };
        self.store(&reference, new.clone(), operand.span)?;
        Ok(if prefix { new } else { old })
    }

    fn delete(&mut self, operand: &Expr) -> Flow<Value> {
        match &operand.kind {
            ExprKind::Member { .. } | ExprKind::ComputedMember { .. } => {
                let Reference::Member(object, key) = self.reference(operand)? else {
                    return Ok(Value::Bool(true));
                };
                intrinsics::delete_member(&object, &key, operand.span).map(Value::Bool)
            }
            ExprKind::Identifier { name } => {
                let local = scope::resolve(&self.current(), name).is_some();
                if !local && self.context.read_only.contains(name.as_str()) {
                    return Err(EngineError::ReadOnly {
                        path: name.to_string(),
                        span: operand.span,
                    }
                    .into());
                }
                Ok(Value::Bool(false))
            }
            _ => {
                self.eval(operand)?;
                Ok(Value::Bool(true))
            }
        }
    }
}

/// A readable name for the callee in "is not a function" messages.
fn callee_name(callee: &Expr) -> String {
    match &callee.kind {
        ExprKind::Identifier { name } => name.to_string(),
        ExprKind::Member { member, .. } => member.to_string(),
        _ => "expression".to_string(),
    }
}

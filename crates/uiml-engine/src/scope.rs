//! Lexical blocks.

use crate::value::Value;
use indexmap::IndexMap;
use smol_str::SmolStr;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub(crate) type BlockRef = Rc<RefCell<Block>>;

/// How a name gets bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindingMode {
    /// Assign an existing variable.
    None,
    Let,
    Const,
}

#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub value: Value,
    pub constant: bool,
}

/// One level of the block chain.
#[derive(Default)]
pub(crate) struct Block {
    pub vars: IndexMap<SmolStr, Binding>,
    pub parent: Option<BlockRef>,
    /// Set by `return` when this is a function's parameter block.
    pub return_value: Option<Value>,
}

impl Block {
    pub fn root() -> BlockRef {
        Rc::new(RefCell::new(Block::default()))
    }

    pub fn child(parent: &BlockRef) -> BlockRef {
        Rc::new(RefCell::new(Block {
            parent: Some(parent.clone()),
            ..Block::default()
        }))
    }

    /// Declares (or redeclares) a name in this block.
    pub fn declare(&mut self, name: &str, value: Value, constant: bool) {
        self.vars.insert(SmolStr::new(name), Binding { value, constant });
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("vars", &self.vars.keys().collect::<Vec<_>>())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// Finds the block declaring `name`, walking outwards from `block`.
pub(crate) fn resolve(block: &BlockRef, name: &str) -> Option<BlockRef> {
    let mut current = block.clone();
    loop {
        if current.borrow().vars.contains_key(name) {
            return Some(current);
        }
        let parent = current.borrow().parent.clone()?;
        current = parent;
    }
}

/// Reads `name` through the block chain.
pub(crate) fn lookup(block: &BlockRef, name: &str) -> Option<Value> {
    let holder = resolve(block, name)?;
    let value = holder.borrow().vars.get(name).map(|binding| binding.value.clone());
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_shadowing_and_resolution() {
        let root = Block::root();
        root.borrow_mut().declare("a", Value::Number(1.0), false);
        let inner = Block::child(&root);
        inner.borrow_mut().declare("a", Value::Number(2.0), true);

        assert_eq!(lookup(&inner, "a"), Some(Value::Number(2.0)));
        assert_eq!(lookup(&root, "a"), Some(Value::Number(1.0)));
        assert!(Rc::ptr_eq(&resolve(&inner, "a").unwrap(), &inner));
        assert!(lookup(&inner, "missing").is_none());
    }
}

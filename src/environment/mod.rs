use crate::string::IdentName;
use crate::value::{error::RuntimeErrorKind, Value};
use std::sync::{Arc, Mutex};

const LOCK_MSG: &str = "Environment lock should not be poisoned.";

/// Level of the bindings installed by the host before any script runs.
pub const BUILTIN_SCOPE_LEVEL: u32 = 0;
/// Level of a fresh context's own bindings. Never pruned by `leave_scope`.
pub const BASE_SCOPE_LEVEL: u32 = 1;

#[derive(Debug, Clone)]
pub struct Local {
    pub name: IdentName,
    pub scope_level: u32,
    pub value: Value,
}

/// Pending `parar`/`continuar` signals of the innermost running loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopFrame {
    pub broken: bool,
    pub continued: bool,
}

/// Values handed to `retorna` by the innermost running call.
#[derive(Debug, Clone, Default)]
pub struct FunctionFrame {
    pub returns: Vec<Value>,
}

#[derive(Debug)]
struct EnvironmentImpl {
    locals: Vec<Local>,
    scope_level: u32,
    loops: Vec<LoopFrame>,
    functions: Vec<FunctionFrame>,
    parent: Option<Environment>,
}

impl EnvironmentImpl {
    fn new(parent: Option<Environment>, scope_level: u32) -> Self {
        Self {
            locals: Vec::new(),
            scope_level,
            loops: Vec::new(),
            functions: Vec::new(),
            parent,
        }
    }

    /// Newest binding first, so the innermost shadow wins.
    fn position(&self, name: &str) -> Option<usize> {
        self.locals.iter().rposition(|local| local.name == name)
    }
}

/// A context in the scope chain. Cloning shares the same context.
#[derive(Debug, Clone)]
pub struct Environment {
    inner: Arc<Mutex<EnvironmentImpl>>,
}

/// A handle to a resolved binding, used to read or overwrite it in place.
#[derive(Debug, Clone)]
pub struct Binding {
    owner: Environment,
    slot: usize,
}

impl Binding {
    pub fn value(&self) -> Value {
        let inner = self.owner.inner.lock().expect(LOCK_MSG);
        inner
            .locals
            .get(self.slot)
            .map(|local| local.value.clone())
            .unwrap_or_default()
    }

    pub fn set(&self, value: Value) {
        let mut inner = self.owner.inner.lock().expect(LOCK_MSG);
        if let Some(local) = inner.locals.get_mut(self.slot) {
            local.value = value;
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// A root context with no bindings.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(EnvironmentImpl::new(None, BASE_SCOPE_LEVEL))),
        }
    }

    /// A root context whose level 0 holds the built-in library.
    pub fn with_builtins() -> Self {
        let mut environment = Self {
            inner: Arc::new(Mutex::new(EnvironmentImpl::new(None, BUILTIN_SCOPE_LEVEL))),
        };
        crate::native::load(&mut environment).expect("Built-in names should be unique.");
        environment.inner.lock().expect(LOCK_MSG).scope_level = BASE_SCOPE_LEVEL;
        environment
    }

    /// A fresh context whose lookups fall back to `self`.
    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EnvironmentImpl::new(
                Some(self.clone()),
                BASE_SCOPE_LEVEL,
            ))),
        }
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn scope_level(&self) -> u32 {
        self.inner.lock().expect(LOCK_MSG).scope_level
    }
}

// Bindings
impl Environment {
    pub fn define(&mut self, name: &str, value: Value) -> Result<(), RuntimeErrorKind> {
        let mut inner = self.inner.lock().expect(LOCK_MSG);
        let level = inner.scope_level;
        let duplicate = inner
            .locals
            .iter()
            .any(|local| local.scope_level == level && local.name == name);
        if duplicate {
            return Err(RuntimeErrorKind::AlreadyDefined(name.into()));
        }
        tracing::trace!(name, level, "define");
        inner.locals.push(Local {
            name: name.into(),
            scope_level: level,
            value,
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Binding> {
        let parent = {
            let inner = self.inner.lock().expect(LOCK_MSG);
            if let Some(slot) = inner.position(name) {
                return Some(Binding {
                    owner: self.clone(),
                    slot,
                });
            }
            inner.parent.clone()
        };
        parent?.get(name)
    }

    pub fn lookup(&self, name: &str) -> Result<Value, RuntimeErrorKind> {
        self.get(name)
            .map(|binding| binding.value())
            .ok_or_else(|| RuntimeErrorKind::UnknownName(name.into()))
    }

    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), RuntimeErrorKind> {
        let binding = self
            .get(name)
            .ok_or_else(|| RuntimeErrorKind::NotDefined(name.into()))?;
        binding.set(value);
        Ok(())
    }

    /// Bindings of this context at its current scope level, oldest first.
    pub fn locals_at_current_level(&self) -> Vec<(IdentName, Value)> {
        let inner = self.inner.lock().expect(LOCK_MSG);
        inner
            .locals
            .iter()
            .filter(|local| local.scope_level == inner.scope_level)
            .map(|local| (local.name.clone(), local.value.clone()))
            .collect()
    }
}

// Scopes
impl Environment {
    pub fn enter_scope(&mut self) {
        let mut inner = self.inner.lock().expect(LOCK_MSG);
        inner.scope_level += 1;
        tracing::trace!(level = inner.scope_level, "enter scope");
    }

    pub fn leave_scope(&mut self) {
        let mut inner = self.inner.lock().expect(LOCK_MSG);
        let level = inner.scope_level;
        if level > BASE_SCOPE_LEVEL {
            while matches!(inner.locals.last(), Some(local) if local.scope_level == level) {
                inner.locals.pop();
            }
        }
        inner.scope_level = level.saturating_sub(1);
        tracing::trace!(level = inner.scope_level, "leave scope");
    }
}

// Loop and function frames
impl Environment {
    pub fn push_loop(&mut self) {
        self.inner
            .lock()
            .expect(LOCK_MSG)
            .loops
            .push(LoopFrame::default());
    }

    pub fn pop_loop(&mut self) -> Result<LoopFrame, RuntimeErrorKind> {
        let mut inner = self.inner.lock().expect(LOCK_MSG);
        inner.loops.pop().ok_or(RuntimeErrorKind::NoLoopContext)
    }

    pub fn peek_loop(&self) -> Result<LoopFrame, RuntimeErrorKind> {
        let inner = self.inner.lock().expect(LOCK_MSG);
        inner.loops.last().copied().ok_or(RuntimeErrorKind::NoLoopContext)
    }

    pub fn has_loop(&self) -> bool {
        !self.inner.lock().expect(LOCK_MSG).loops.is_empty()
    }

    pub fn mark_break(&mut self) -> Result<(), RuntimeErrorKind> {
        let mut inner = self.inner.lock().expect(LOCK_MSG);
        let frame = inner.loops.last_mut().ok_or(RuntimeErrorKind::NoLoopContext)?;
        frame.broken = true;
        Ok(())
    }

    pub fn mark_continue(&mut self) -> Result<(), RuntimeErrorKind> {
        let mut inner = self.inner.lock().expect(LOCK_MSG);
        let frame = inner.loops.last_mut().ok_or(RuntimeErrorKind::NoLoopContext)?;
        frame.continued = true;
        Ok(())
    }

    pub fn push_function(&mut self) {
        self.inner
            .lock()
            .expect(LOCK_MSG)
            .functions
            .push(FunctionFrame::default());
    }

    pub fn pop_function(&mut self) -> Result<FunctionFrame, RuntimeErrorKind> {
        let mut inner = self.inner.lock().expect(LOCK_MSG);
        inner
            .functions
            .pop()
            .ok_or(RuntimeErrorKind::NoFunctionContext)
    }

    pub fn push_returns(&mut self, values: Vec<Value>) -> Result<(), RuntimeErrorKind> {
        let mut inner = self.inner.lock().expect(LOCK_MSG);
        let frame = inner
            .functions
            .last_mut()
            .ok_or(RuntimeErrorKind::NoFunctionContext)?;
        frame.returns.extend(values);
        Ok(())
    }

    /// Whether the innermost call has collected a return value.
    pub fn has_returned(&self) -> bool {
        let inner = self.inner.lock().expect(LOCK_MSG);
        inner
            .functions
            .last()
            .is_some_and(|frame| !frame.returns.is_empty())
    }
}

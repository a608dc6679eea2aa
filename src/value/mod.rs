pub mod error;
pub mod formatter;
mod ledger;
mod object;

use crate::environment::Environment;
use crate::interpreter::SystemContext;
use crate::parser::statement::FunctionDecl;
use crate::string::format_number;
use compact_str::{CompactString, CompactStringExt};
use error::RuntimeErrorKind;
pub use ledger::KeyLedger;
pub use object::{
    as_index, as_key, ArrayMethod, ArrayObject, BoundArrayMethod, BoundDictionaryMethod,
    DictionaryMethod, DictionaryObject, IteratorResult, ValueIterator, MAX_ARRAY_GAP,
};
use std::{cmp::Ordering, fmt::Display, sync::Arc};

/// A host callback callable from scripts. Arguments arrive already evaluated.
pub trait NativeFunction: std::fmt::Debug + Send + Sync {
    fn get_name(&self) -> &str;
    fn call(
        &self,
        arguments: &[Value],
        context: &mut dyn SystemContext,
    ) -> Result<Value, RuntimeErrorKind>;
}

/// A closure: a function declaration paired with the environment it was declared in.
#[derive(Clone)]
pub struct UserFunction {
    pub declaration: Arc<FunctionDecl>,
    pub closure: Environment,
}

impl UserFunction {
    pub fn get_name(&self) -> &str {
        self.declaration
            .name
            .as_ref()
            .map(|name| name.name.as_str())
            .unwrap_or("anonima")
    }
}

impl std::fmt::Debug for UserFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserFunction")
            .field("name", &self.get_name())
            .field("parameters", &self.declaration.parameters.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum Object {
    String(CompactString),
    Array(Arc<ArrayObject>),
    Dictionary(Arc<DictionaryObject>),
    Function(Arc<UserFunction>),
    NativeFunction(Arc<dyn NativeFunction>),
}

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Number(f64),
    Boolean(bool),
    Object(Object),
}

impl Value {
    pub fn string(value: impl Into<CompactString>) -> Self {
        Value::Object(Object::String(value.into()))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Object(Object::Array(Arc::new(ArrayObject::new(items))))
    }

    pub fn dictionary(entries: impl IntoIterator<Item = (CompactString, Value)>) -> Self {
        Value::Object(Object::Dictionary(Arc::new(DictionaryObject::from_entries(
            entries,
        ))))
    }

    pub fn native(function: impl NativeFunction + 'static) -> Self {
        Value::Object(Object::NativeFunction(Arc::new(function)))
    }

    pub fn function(declaration: Arc<FunctionDecl>, closure: Environment) -> Self {
        Value::Object(Object::Function(Arc::new(UserFunction {
            declaration,
            closure,
        })))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Object(Object::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Number(_) => "Number",
            Value::Boolean(_) => "Boolean",
            Value::Object(Object::String(_)) => "String",
            Value::Object(Object::Array(_)) => "Array",
            Value::Object(Object::Dictionary(_)) => "Dictionary",
            Value::Object(Object::Function(_)) => "Function",
            Value::Object(Object::NativeFunction(_)) => "NativeFunction",
        }
    }

    /// Condition coercion: only Booleans have a truth value.
    pub fn as_boolean(&self) -> Result<bool, RuntimeErrorKind> {
        match self {
            Value::Boolean(v) => Ok(*v),
            v => Err(RuntimeErrorKind::NonBoolean(v.type_name())),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "nulo"),
            Value::Number(v) => write!(f, "{}", format_number(*v)),
            Value::Boolean(true) => write!(f, "verdadeiro"),
            Value::Boolean(false) => write!(f, "falso"),
            Value::Object(Object::String(v)) => write!(f, "{v}"),
            Value::Object(Object::Array(array)) => write!(f, "{array}"),
            Value::Object(Object::Dictionary(dictionary)) => write!(f, "{dictionary}"),
            Value::Object(Object::Function(function)) => {
                write!(f, "<função {}>", function.get_name())
            }
            Value::Object(Object::NativeFunction(function)) => {
                write!(f, "<função nativa {}>", function.get_name())
            }
        }
    }
}

fn unsupported(operator: &'static str, lhs: &Value, rhs: &Value) -> RuntimeErrorKind {
    RuntimeErrorKind::UnsupportedOperator {
        operator,
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    }
}

// Arithmetic. Every operator dispatches on the left operand.
impl Value {
    pub fn add(&self, rhs: &Value) -> Result<Value, RuntimeErrorKind> {
        match (self, rhs) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Number(a), Value::Object(Object::String(b))) => {
                Ok(Value::string([format_number(*a).as_str(), b.as_str()].concat_compact()))
            }
            (Value::Object(Object::String(a)), Value::Object(Object::String(b))) => {
                Ok(Value::string([a, b].concat_compact()))
            }
            (Value::Object(Object::String(a)), Value::Number(b)) => {
                Ok(Value::string([a.as_str(), format_number(*b).as_str()].concat_compact()))
            }
            (lhs, rhs) => Err(unsupported("+", lhs, rhs)),
        }
    }

    fn numeric(
        &self,
        rhs: &Value,
        operator: &'static str,
        apply: impl FnOnce(f64, f64) -> f64,
    ) -> Result<Value, RuntimeErrorKind> {
        match (self, rhs) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(apply(*a, *b))),
            (lhs, rhs) => Err(unsupported(operator, lhs, rhs)),
        }
    }

    pub fn subtract(&self, rhs: &Value) -> Result<Value, RuntimeErrorKind> {
        self.numeric(rhs, "-", |a, b| a - b)
    }

    pub fn multiply(&self, rhs: &Value) -> Result<Value, RuntimeErrorKind> {
        self.numeric(rhs, "*", |a, b| a * b)
    }

    pub fn divide(&self, rhs: &Value) -> Result<Value, RuntimeErrorKind> {
        self.numeric(rhs, "/", |a, b| a / b)
    }

    pub fn modulo(&self, rhs: &Value) -> Result<Value, RuntimeErrorKind> {
        self.numeric(rhs, "%", |a, b| a % b)
    }

    /// `negar`: arithmetic negation for Numbers, logical for Booleans.
    pub fn not(&self) -> Result<Value, RuntimeErrorKind> {
        match self {
            Value::Number(v) => Ok(Value::Number(-v)),
            Value::Boolean(v) => Ok(Value::Boolean(!v)),
            v => Err(RuntimeErrorKind::UnsupportedUnaryOperator {
                operator: "negar",
                operand: v.type_name(),
            }),
        }
    }
}

// Comparison
impl Value {
    /// Equality never fails: mismatched types are simply unequal.
    pub fn is_equal(&self, rhs: &Value) -> bool {
        match (self, rhs) {
            (Value::Null, Value::Null) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => match (a, b) {
                (Object::String(a), Object::String(b)) => a == b,
                (Object::Array(a), Object::Array(b)) => Arc::ptr_eq(a, b),
                (Object::Dictionary(a), Object::Dictionary(b)) => Arc::ptr_eq(a, b),
                (Object::Function(a), Object::Function(b)) => Arc::ptr_eq(a, b),
                (Object::NativeFunction(a), Object::NativeFunction(b)) => Arc::ptr_eq(a, b),
                _ => false,
            },
            _ => false,
        }
    }

    pub fn is_not_equal(&self, rhs: &Value) -> bool {
        !self.is_equal(rhs)
    }

    fn ordering(&self, rhs: &Value, operator: &'static str) -> Result<Option<Ordering>, RuntimeErrorKind> {
        match (self, rhs) {
            (Value::Number(a), Value::Number(b)) => Ok(a.partial_cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(Some(a.cmp(b))),
            (Value::Object(Object::String(a)), Value::Object(Object::String(b))) => {
                Ok(Some(a.cmp(b)))
            }
            (lhs, rhs) => Err(unsupported(operator, lhs, rhs)),
        }
    }

    pub fn greater_than(&self, rhs: &Value) -> Result<bool, RuntimeErrorKind> {
        Ok(matches!(self.ordering(rhs, ">")?, Some(Ordering::Greater)))
    }

    pub fn greater_than_or_equal(&self, rhs: &Value) -> Result<bool, RuntimeErrorKind> {
        Ok(matches!(
            self.ordering(rhs, ">=")?,
            Some(Ordering::Greater | Ordering::Equal)
        ))
    }

    pub fn less_than(&self, rhs: &Value) -> Result<bool, RuntimeErrorKind> {
        Ok(matches!(self.ordering(rhs, "<")?, Some(Ordering::Less)))
    }

    pub fn less_than_or_equal(&self, rhs: &Value) -> Result<bool, RuntimeErrorKind> {
        Ok(matches!(
            self.ordering(rhs, "<=")?,
            Some(Ordering::Less | Ordering::Equal)
        ))
    }
}

// Indexing and iteration
impl Value {
    /// Reads a property. Collection methods shadow entries of the same name.
    pub fn get(&self, key: &Value) -> Result<Value, RuntimeErrorKind> {
        match self {
            Value::Object(Object::Array(array)) => {
                if let Some(method) = key.as_str().and_then(ArrayMethod::from_name) {
                    return Ok(Value::native(BoundArrayMethod {
                        array: array.clone(),
                        method,
                    }));
                }
                Ok(as_index(key)
                    .map(|index| array.get_index(index))
                    .unwrap_or_default())
            }
            Value::Object(Object::Dictionary(dictionary)) => {
                if let Some(method) = key.as_str().and_then(DictionaryMethod::from_name) {
                    return Ok(Value::native(BoundDictionaryMethod {
                        dictionary: dictionary.clone(),
                        method,
                    }));
                }
                Ok(dictionary.get_entry(&as_key(key)))
            }
            Value::Object(_) => Ok(Value::Null),
            v => Err(RuntimeErrorKind::NotIndexable(v.type_name())),
        }
    }

    /// Writes a property. Writing `Null` deletes the entry.
    pub fn set(&self, key: &Value, value: Value) -> Result<(), RuntimeErrorKind> {
        match self {
            Value::Object(Object::Array(array)) => {
                let index = as_index(key).ok_or(RuntimeErrorKind::InvalidArgument {
                    name: "indice",
                    expected: "a non-negative whole Number",
                })?;
                array.set_index(index, value)
            }
            Value::Object(Object::Dictionary(dictionary)) => {
                dictionary.set_entry(as_key(key), value);
                Ok(())
            }
            v => Err(RuntimeErrorKind::NotIndexable(v.type_name())),
        }
    }

    pub fn start_iteration(&self) -> Result<ValueIterator, RuntimeErrorKind> {
        match self {
            Value::Object(Object::Array(array)) => Ok(ValueIterator::over_array(array.clone())),
            Value::Object(Object::Dictionary(dictionary)) => {
                Ok(ValueIterator::over_dictionary(dictionary.clone()))
            }
            v => Err(RuntimeErrorKind::NotIterable(v.type_name())),
        }
    }
}

use super::{error::RuntimeErrorKind, ledger::KeyLedger, NativeFunction, Value};
use crate::interpreter::SystemContext;
use compact_str::{CompactString, ToCompactString};
use std::{
    collections::HashMap,
    fmt::Display,
    sync::{Arc, Mutex},
};

const LOCK_MSG: &str = "Collection lock should not be poisoned.";

/// Largest run of `Null` padding a single write past the end may create.
pub const MAX_ARRAY_GAP: usize = 1 << 20;

/// Converts a key into an array position. Numeric strings are accepted as well.
pub fn as_index(key: &Value) -> Option<usize> {
    let number = match key {
        Value::Number(v) => *v,
        Value::Object(super::Object::String(s)) => s.trim().parse().ok()?,
        _ => return None,
    };
    if number.is_finite() && number >= 0.0 && number.fract() == 0.0 {
        Some(number as usize)
    } else {
        None
    }
}

/// Dictionary keys are strings; any other key is stringified.
pub fn as_key(key: &Value) -> CompactString {
    match key {
        Value::Object(super::Object::String(s)) => s.clone(),
        other => other.to_compact_string(),
    }
}

fn argument(arguments: &[Value], position: usize) -> Value {
    arguments.get(position).cloned().unwrap_or_default()
}

#[derive(Debug, Default)]
pub struct ArrayObject {
    items: Mutex<Vec<Value>>,
}

impl ArrayObject {
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect(LOCK_MSG).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_index(&self, index: usize) -> Value {
        let items = self.items.lock().expect(LOCK_MSG);
        items.get(index).cloned().unwrap_or_default()
    }

    /// Writing `Null` removes the element and shifts the tail down. Writing past the end pads
    /// the gap with `Null`, up to `MAX_ARRAY_GAP` elements.
    pub fn set_index(&self, index: usize, value: Value) -> Result<(), RuntimeErrorKind> {
        let mut items = self.items.lock().expect(LOCK_MSG);
        let length = items.len();
        if value.is_null() {
            if index < length {
                items.remove(index);
            }
        } else if index < length {
            items[index] = value;
        } else if index - length > MAX_ARRAY_GAP {
            return Err(RuntimeErrorKind::IndexOutOfRange { index, length });
        } else {
            items.resize(index, Value::Null);
            items.push(value);
        }
        Ok(())
    }

    pub fn push(&self, value: Value) {
        self.items.lock().expect(LOCK_MSG).push(value);
    }

    pub fn remove(&self, index: usize) -> Value {
        let mut items = self.items.lock().expect(LOCK_MSG);
        if index < items.len() {
            items.remove(index)
        } else {
            Value::Null
        }
    }
}

// A collection that contains itself is rendered as an ellipsis: its lock is already held.
impl Display for ArrayObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Ok(items) = self.items.try_lock() else {
            return write!(f, "[...]");
        };
        write!(f, "[")?;
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{item}")?;
        }
        write!(f, "]")
    }
}

#[derive(Debug, Default)]
struct DictionaryEntries {
    /// Each value is paired with the slot of its key in the ledger.
    entries: HashMap<CompactString, (Value, usize)>,
    keys: KeyLedger,
}

#[derive(Debug, Default)]
pub struct DictionaryObject {
    inner: Mutex<DictionaryEntries>,
}

impl DictionaryObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (CompactString, Value)>) -> Self {
        let dictionary = Self::new();
        for (key, value) in entries {
            dictionary.set_entry(key, value);
        }
        dictionary
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect(LOCK_MSG).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_entry(&self, key: &str) -> Value {
        let inner = self.inner.lock().expect(LOCK_MSG);
        inner
            .entries
            .get(key)
            .map(|(value, _)| value.clone())
            .unwrap_or_default()
    }

    /// Writing `Null` deletes the key. Re-assigning an existing key keeps its position.
    pub fn set_entry(&self, key: CompactString, value: Value) {
        let mut inner = self.inner.lock().expect(LOCK_MSG);
        let DictionaryEntries { entries, keys } = &mut *inner;
        if value.is_null() {
            if let Some((_, slot)) = entries.remove(&key) {
                keys.remove(slot);
            }
        } else if let Some(entry) = entries.get_mut(&key) {
            entry.0 = value;
        } else {
            let slot = keys.insert(key.clone());
            entries.insert(key, (value, slot));
        }
    }

    pub fn keys(&self) -> Vec<CompactString> {
        let inner = self.inner.lock().expect(LOCK_MSG);
        inner.keys.iter().cloned().collect()
    }

    fn first_key(&self) -> Option<CompactString> {
        self.inner.lock().expect(LOCK_MSG).keys.first().cloned()
    }

    /// Reads `key` and the key that follows it, or `None` if `key` is gone.
    fn entry_and_successor(&self, key: &str) -> Option<(Value, Option<CompactString>)> {
        let inner = self.inner.lock().expect(LOCK_MSG);
        let (value, slot) = inner.entries.get(key)?;
        Some((value.clone(), inner.keys.next_of(*slot).cloned()))
    }
}

impl Display for DictionaryObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Ok(inner) = self.inner.try_lock() else {
            return write!(f, "{{...}}");
        };
        write!(f, "{{")?;
        for (index, key) in inner.keys.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            if let Some((value, _)) = inner.entries.get(key) {
                write!(f, "[\"{key}\"] = {value}")?;
            }
        }
        write!(f, "}}")
    }
}

#[derive(Debug, Clone)]
pub struct IteratorResult {
    pub index: Option<Value>,
    pub value: Option<Value>,
    pub done: bool,
}

impl IteratorResult {
    fn entry(index: Value, value: Value) -> Self {
        Self {
            index: Some(index),
            value: Some(value),
            done: false,
        }
    }

    fn done() -> Self {
        Self {
            index: None,
            value: None,
            done: true,
        }
    }
}

/// Cursor over a live collection: changes made during iteration are observed.
#[derive(Debug, Clone)]
pub enum ValueIterator {
    Array {
        array: Arc<ArrayObject>,
        index: usize,
    },
    Dictionary {
        dictionary: Arc<DictionaryObject>,
        /// The key to yield next.
        cursor: Option<CompactString>,
    },
}

impl ValueIterator {
    pub fn over_array(array: Arc<ArrayObject>) -> Self {
        ValueIterator::Array { array, index: 0 }
    }

    pub fn over_dictionary(dictionary: Arc<DictionaryObject>) -> Self {
        let cursor = dictionary.first_key();
        ValueIterator::Dictionary { dictionary, cursor }
    }

    pub fn next_entry(&mut self) -> IteratorResult {
        match self {
            ValueIterator::Array { array, index } => {
                let items = array.items.lock().expect(LOCK_MSG);
                match items.get(*index) {
                    Some(value) => {
                        let result = IteratorResult::entry(Value::Number(*index as f64), value.clone());
                        *index += 1;
                        result
                    }
                    None => IteratorResult::done(),
                }
            }
            ValueIterator::Dictionary { dictionary, cursor } => {
                let Some(key) = cursor.take() else {
                    return IteratorResult::done();
                };
                // A pending key deleted by the loop body ends the iteration.
                match dictionary.entry_and_successor(&key) {
                    Some((value, next)) => {
                        *cursor = next;
                        IteratorResult::entry(Value::string(key), value)
                    }
                    None => IteratorResult::done(),
                }
            }
        }
    }
}

impl Iterator for ValueIterator {
    type Item = (Value, Value);

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_entry() {
            IteratorResult {
                index: Some(index),
                value: Some(value),
                done: false,
            } => Some((index, value)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayMethod {
    Get,
    Set,
    Push,
    Remove,
    Length,
}

impl ArrayMethod {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pega" => Some(Self::Get),
            "seta" => Some(Self::Set),
            "adiciona" => Some(Self::Push),
            "remove" => Some(Self::Remove),
            "tamanho" => Some(Self::Length),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Get => "pega",
            Self::Set => "seta",
            Self::Push => "adiciona",
            Self::Remove => "remove",
            Self::Length => "tamanho",
        }
    }
}

/// An array method bound to its receiver, produced by indexing the array by method name.
#[derive(Debug)]
pub struct BoundArrayMethod {
    pub array: Arc<ArrayObject>,
    pub method: ArrayMethod,
}

fn expect_index(arguments: &[Value], position: usize) -> Result<usize, RuntimeErrorKind> {
    as_index(&argument(arguments, position)).ok_or(RuntimeErrorKind::InvalidArgument {
        name: "indice",
        expected: "a non-negative whole Number",
    })
}

impl NativeFunction for BoundArrayMethod {
    fn get_name(&self) -> &str {
        self.method.name()
    }

    fn call(
        &self,
        arguments: &[Value],
        _context: &mut dyn SystemContext,
    ) -> Result<Value, RuntimeErrorKind> {
        match self.method {
            ArrayMethod::Get => Ok(self.array.get_index(expect_index(arguments, 0)?)),
            ArrayMethod::Set => {
                let index = expect_index(arguments, 0)?;
                self.array.set_index(index, argument(arguments, 1))?;
                Ok(Value::Null)
            }
            ArrayMethod::Push => {
                self.array.push(argument(arguments, 0));
                Ok(Value::Null)
            }
            ArrayMethod::Remove => Ok(self.array.remove(expect_index(arguments, 0)?)),
            ArrayMethod::Length => Ok(Value::Number(self.array.len() as f64)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryMethod {
    Get,
    Set,
    Length,
}

impl DictionaryMethod {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pega" => Some(Self::Get),
            "seta" => Some(Self::Set),
            "tamanho" => Some(Self::Length),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Get => "pega",
            Self::Set => "seta",
            Self::Length => "tamanho",
        }
    }
}

#[derive(Debug)]
pub struct BoundDictionaryMethod {
    pub dictionary: Arc<DictionaryObject>,
    pub method: DictionaryMethod,
}

impl NativeFunction for BoundDictionaryMethod {
    fn get_name(&self) -> &str {
        self.method.name()
    }

    fn call(
        &self,
        arguments: &[Value],
        _context: &mut dyn SystemContext,
    ) -> Result<Value, RuntimeErrorKind> {
        match self.method {
            DictionaryMethod::Get => {
                let key = as_key(&argument(arguments, 0));
                Ok(self.dictionary.get_entry(&key))
            }
            DictionaryMethod::Set => {
                let key = as_key(&argument(arguments, 0));
                self.dictionary.set_entry(key, argument(arguments, 1));
                Ok(Value::Null)
            }
            DictionaryMethod::Length => Ok(Value::Number(self.dictionary.len() as f64)),
        }
    }
}

#[cfg(feature = "serde")]
mod serde;

use std::{
    collections::{btree_map, BTreeMap},
    fmt,
    iter::FromIterator,
};

use prost::bytes::Bytes;
use prost_reflect::DynamicMessage;

/// A dynamically-typed value, as produced and consumed by a scripting environment.
///
/// Values mirror the types of a Lua-like runtime: `nil`, booleans, integer and floating point
/// numbers, strings and tables. A [`DynamicMessage`] may also be passed where a nested message
/// is expected, in which case it is used directly instead of being converted from a table.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absence of a value.
    Nil,
    /// A boolean value.
    Boolean(bool),
    /// An integer number.
    Integer(i64),
    /// A floating point number.
    Number(f64),
    /// A UTF-8 string.
    String(String),
    /// A raw byte string.
    Bytes(Bytes),
    /// A table of values keyed by integers, strings or booleans.
    Table(Table),
    /// An opaque handle to an already constructed message.
    Message(DynamicMessage),
}

/// A key for an entry in a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// A boolean key.
    Boolean(bool),
    /// An integer key. Keys `1..=n` make up the array part of a table.
    Integer(i64),
    /// A string key, naming a message field or a map entry.
    String(String),
}

/// An associative table, the universal container of dynamic values.
///
/// A table whose keys are exactly the integers `1..=n` is *array-shaped* and represents a
/// list. Any other table represents a message or a map. The empty table is both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    booleans: BTreeMap<bool, Value>,
    integers: BTreeMap<i64, Value>,
    strings: BTreeMap<String, Value>,
}

impl Value {
    /// Gets the name of the type of this value, as reported in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) | Value::Number(_) => "number",
            Value::String(_) | Value::Bytes(_) => "string",
            Value::Table(_) => "table",
            Value::Message(_) => "message",
        }
    }

    /// Returns `true` if this value is [`Value::Nil`].
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Returns the value if it is a [`Value::Boolean`].
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Boolean(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value if it is a [`Value::Integer`].
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Value::Integer(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value as a float if it is a [`Value::Number`] or [`Value::Integer`].
    pub fn as_number(&self) -> Option<f64> {
        match *self {
            Value::Number(value) => Some(value),
            Value::Integer(value) => Some(value as f64),
            _ => None,
        }
    }

    /// Returns the value if it is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the raw bytes of a [`Value::String`] or [`Value::Bytes`].
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(value) => Some(value.as_bytes()),
            Value::Bytes(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a reference to the table if this is a [`Value::Table`].
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Returns a mutable reference to the table if this is a [`Value::Table`].
    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Returns a reference to the message if this is a [`Value::Message`].
    pub fn as_message(&self) -> Option<&DynamicMessage> {
        match self {
            Value::Message(message) => Some(message),
            _ => None,
        }
    }
}

impl Table {
    /// Creates a new, empty table.
    pub fn new() -> Self {
        Table::default()
    }

    /// Creates an array-shaped table with `values` at indices `1..=n`.
    ///
    /// `nil` elements leave a hole, so the result is only array-shaped if there are none.
    pub fn from_sequence<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut table = Table::new();
        for (index, value) in (1..).zip(values) {
            table.insert(Key::Integer(index), value);
        }
        table
    }

    /// Inserts a value, returning the previous value for the key if there was one.
    ///
    /// Inserting [`Value::Nil`] removes the key.
    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        let value = value.into();
        if value.is_nil() {
            return self.remove(key);
        }

        match key.into() {
            Key::Boolean(key) => self.booleans.insert(key, value),
            Key::Integer(key) => self.integers.insert(key, value),
            Key::String(key) => self.strings.insert(key, value),
        }
    }

    /// Appends a value at index `len() + 1` of the array part.
    pub fn push(&mut self, value: impl Into<Value>) {
        let index = self.sequence_len() as i64 + 1;
        self.insert(Key::Integer(index), value);
    }

    /// Removes a key from the table, returning its value if it was present.
    pub fn remove(&mut self, key: impl Into<Key>) -> Option<Value> {
        match key.into() {
            Key::Boolean(key) => self.booleans.remove(&key),
            Key::Integer(key) => self.integers.remove(&key),
            Key::String(key) => self.strings.remove(&key),
        }
    }

    /// Gets the value for a key.
    pub fn get(&self, key: &Key) -> Option<&Value> {
        match key {
            Key::Boolean(key) => self.booleans.get(key),
            Key::Integer(key) => self.integers.get(key),
            Key::String(key) => self.strings.get(key),
        }
    }

    /// Gets the value stored under a string key.
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        self.strings.get(name)
    }

    /// Gets the value stored under an integer key.
    pub fn get_index(&self, index: i64) -> Option<&Value> {
        self.integers.get(&index)
    }

    /// Gets a mutable reference to the value stored under a string key.
    pub fn get_field_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.strings.get_mut(name)
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.booleans.len() + self.integers.len() + self.strings.len()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the keys of this table are exactly the integers `1..=n`.
    pub fn is_sequence(&self) -> bool {
        if !self.booleans.is_empty() || !self.strings.is_empty() {
            return false;
        }

        match (self.integers.keys().next(), self.integers.keys().next_back()) {
            (Some(&first), Some(&last)) => first == 1 && last == self.integers.len() as i64,
            _ => true,
        }
    }

    /// Returns the length of the array part: the largest `n` such that `1..=n` are all keys.
    pub fn sequence_len(&self) -> usize {
        self.integers
            .range(1..)
            .zip(1..)
            .take_while(|&((key, _), index)| *key == index)
            .count()
    }

    /// Gets an iterator over the elements of this table in index order, if it is array-shaped.
    pub fn as_sequence(&self) -> Option<btree_map::Values<'_, i64, Value>> {
        if self.is_sequence() {
            Some(self.integers.values())
        } else {
            None
        }
    }

    /// Gets an iterator over the string-keyed entries of this table.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.strings.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Gets an iterator over all entries: boolean keys first, then integer keys in ascending
    /// order, then string keys in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, &Value)> + '_ {
        let booleans = self
            .booleans
            .iter()
            .map(|(&key, value)| (Key::Boolean(key), value));
        let integers = self
            .integers
            .iter()
            .map(|(&key, value)| (Key::Integer(key), value));
        let strings = self
            .strings
            .iter()
            .map(|(key, value)| (Key::String(key.clone()), value));
        booleans.chain(integers).chain(strings)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Boolean(key) => write!(f, "{}", key),
            Key::Integer(key) => write!(f, "{}", key),
            Key::String(key) => write!(f, "{:?}", key),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Table
where
    K: Into<Key>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut table = Table::new();
        table.extend(iter);
        table
    }
}

impl<K, V> Extend<(K, V)> for Table
where
    K: Into<Key>,
    V: Into<Value>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl From<bool> for Key {
    fn from(value: bool) -> Self {
        Key::Boolean(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Integer(value.into())
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Integer(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::String(value.to_owned())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Bytes(value)
    }
}

impl From<Table> for Value {
    fn from(value: Table) -> Self {
        Value::Table(value)
    }
}

impl From<DynamicMessage> for Value {
    fn from(value: DynamicMessage) -> Self {
        Value::Message(value)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Nil)
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(values: Vec<T>) -> Self {
        Value::Table(Table::from_sequence(values))
    }
}

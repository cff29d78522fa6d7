use core::fmt;
use std::{cell::{Cell, RefCell}, collections::{BTreeMap, HashMap, HashSet}, mem, rc::Rc};

use itertools::Itertools;
use serde::Serialize;

use crate::{error::{ErrorKind, ExecResult}, interpreter::Interpreter, stack::ensure_sufficient_stack};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    text: Rc<str>,
    executable: bool,
}

impl Name {
    pub fn literal(text: &str) -> Self {
        Self { text: Rc::from(text), executable: false }
    }

    pub fn executable(text: &str) -> Self {
        Self { text: Rc::from(text), executable: true }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn key(&self) -> Rc<str> {
        self.text.clone()
    }

    pub fn is_executable(&self) -> bool {
        self.executable
    }

    pub fn with_executable(&self, executable: bool) -> Self {
        Self { text: self.text.clone(), executable }
    }
}

/// A window onto a shared, fixed-length buffer.
///
/// Cloning copies the handle, never the elements, so writes through one
/// handle are visible through every other handle on the same storage.
/// `interval` produces a handle onto a sub-range of the same storage.
pub struct SharedSlice<T> {
    storage: Rc<RefCell<Vec<T>>>,
    start: usize,
    len: usize,
}

pub type ArrayRef = SharedSlice<Object>;
pub type StringRef = SharedSlice<u8>;

impl<T> Clone for SharedSlice<T> {
    fn clone(&self) -> Self {
        Self { storage: self.storage.clone(), start: self.start, len: self.len }
    }
}

// The last handle releases the elements on a guarded stack
impl<T> Drop for SharedSlice<T> {
    fn drop(&mut self) {
        if let Some(storage) = Rc::get_mut(&mut self.storage) {
            let items = mem::take(storage.get_mut());
            ensure_sufficient_stack(move || drop(items));
        }
    }
}

impl<T> fmt::Debug for SharedSlice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSlice")
            .field("start", &self.start)
            .field("len", &self.len)
            .finish()
    }
}

impl<T: Clone> SharedSlice<T> {
    pub fn new(items: Vec<T>) -> Self {
        let len = items.len();
        Self { storage: Rc::new(RefCell::new(items)), start: 0, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.len { return None; }
        self.storage.borrow().get(self.start + index).cloned()
    }

    pub fn set(&self, index: usize, value: T) -> bool {
        if index >= self.len { return false; }
        self.storage.borrow_mut()[self.start + index] = value;
        true
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.storage.borrow()[self.start..self.start + self.len].to_vec()
    }

    pub fn interval(&self, start: usize, count: usize) -> Option<Self> {
        if start.checked_add(count)? > self.len { return None; }
        Some(Self { storage: self.storage.clone(), start: self.start + start, len: count })
    }

    /// Overwrites `items.len()` elements starting at `index`.
    pub fn write_at(&self, index: usize, items: &[T]) -> bool {
        match index.checked_add(items.len()) {
            Some(end) if end <= self.len => {
                let offset = self.start + index;
                self.storage.borrow_mut()[offset..offset + items.len()].clone_from_slice(items);
                true
            }
            _ => false,
        }
    }

    pub fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.storage, &other.storage) && self.start == other.start && self.len == other.len
    }

    fn storage_id(&self) -> *const () {
        Rc::as_ptr(&self.storage) as *const ()
    }
}

impl StringRef {
    pub fn from_text(text: &str) -> Self {
        Self::new(text.as_bytes().to_vec())
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.to_vec()).into_owned()
    }
}

struct DictionaryInner {
    entries: RefCell<HashMap<Rc<str>, Object>>,
    read_only: Cell<bool>,
}

impl Drop for DictionaryInner {
    fn drop(&mut self) {
        let entries = mem::take(self.entries.get_mut());
        ensure_sufficient_stack(move || drop(entries));
    }
}

/// Shared handle onto a mutable name-to-object mapping.
#[derive(Clone)]
pub struct Dictionary(Rc<DictionaryInner>);

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dictionary")
            .field("len", &self.len())
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Dictionary {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Rc::new(DictionaryInner {
            entries: RefCell::new(HashMap::with_capacity(capacity)),
            read_only: Cell::new(false),
        }))
    }

    pub fn get(&self, key: &str) -> Option<Object> {
        self.0.entries.borrow().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.entries.borrow().contains_key(key)
    }

    pub fn insert(&self, key: Rc<str>, value: Object) -> Result<(), ErrorKind> {
        if self.is_read_only() { return Err(ErrorKind::InvalidAccess); }
        self.0.entries.borrow_mut().insert(key, value);
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), ErrorKind> {
        if self.is_read_only() { return Err(ErrorKind::InvalidAccess); }
        self.0.entries.borrow_mut().remove(key);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.0.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries sorted by key, detached from the dictionary.
    pub fn entries(&self) -> Vec<(Rc<str>, Object)> {
        self.0.entries.borrow()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .sorted_by(|a, b| a.0.cmp(&b.0))
            .collect()
    }

    pub fn is_read_only(&self) -> bool {
        self.0.read_only.get()
    }

    pub fn set_read_only(&self) {
        self.0.read_only.set(true);
    }

    pub fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn storage_id(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl FromIterator<(Rc<str>, Object)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (Rc<str>, Object)>>(entries: I) -> Self {
        Self(Rc::new(DictionaryInner {
            entries: RefCell::new(entries.into_iter().collect()),
            read_only: Cell::new(false),
        }))
    }
}

pub(crate) type OperatorFn = fn(&mut Interpreter) -> ExecResult;

/// A built-in operator bound in systemdict.
#[derive(Clone, Copy)]
pub struct Operator {
    name: &'static str,
    function: OperatorFn,
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{}--", self.name)
    }
}

impl Operator {
    pub(crate) fn new(name: &'static str, function: OperatorFn) -> Self {
        Self { name, function }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn call(&self, interpreter: &mut Interpreter) -> ExecResult {
        (self.function)(interpreter)
    }
}

#[derive(Clone)]
pub enum Object {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    String(StringRef),
    Name(Name),
    Array(ArrayRef),
    /// An executable array. Shares its storage type with `Array`.
    Procedure(ArrayRef),
    Dictionary(Dictionary),
    Operator(Operator),
    Mark,
    Null,
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.syntax_form())
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text_form())
    }
}

pub(crate) fn format_real(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1.0e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

fn escape_string(bytes: &[u8]) -> String {
    let mut escaped = String::with_capacity(bytes.len() + 2);
    for &byte in bytes {
        match byte {
            b'(' | b')' | b'\\' => {
                escaped.push('\\');
                escaped.push(byte as char);
            }
            b'\n' => escaped.push_str("\\n"),
            b'\r' => escaped.push_str("\\r"),
            b'\t' => escaped.push_str("\\t"),
            0x20..=0x7e => escaped.push(byte as char),
            _ => escaped.push_str(&format!("\\{:03o}", byte)),
        }
    }
    escaped
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integertype",
            Self::Real(_) => "realtype",
            Self::Boolean(_) => "booleantype",
            Self::String(_) => "stringtype",
            Self::Name(_) => "nametype",
            Self::Array(_) | Self::Procedure(_) => "arraytype",
            Self::Dictionary(_) => "dicttype",
            Self::Operator(_) => "operatortype",
            Self::Mark => "marktype",
            Self::Null => "nulltype",
        }
    }

    pub fn is_executable(&self) -> bool {
        match self {
            Self::Name(name) => name.is_executable(),
            Self::Procedure(_) | Self::Operator(_) => true,
            _ => false,
        }
    }

    pub fn string(text: &str) -> Self {
        Self::String(StringRef::from_text(text))
    }

    pub fn array(items: Vec<Object>) -> Self {
        Self::Array(ArrayRef::new(items))
    }

    pub fn procedure(items: Vec<Object>) -> Self {
        Self::Procedure(ArrayRef::new(items))
    }

    pub fn literal_name(text: &str) -> Self {
        Self::Name(Name::literal(text))
    }

    pub fn executable_name(text: &str) -> Self {
        Self::Name(Name::executable(text))
    }

    /// Equality as `eq` sees it: numbers by value, strings and names by
    /// text, composites by identity.
    pub fn ps_eq(&self, other: &Object) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Integer(a), Self::Real(b)) | (Self::Real(b), Self::Integer(a)) => (*a as f64) == *b,
            (Self::Real(a), Self::Real(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::String(a), Self::String(b)) => a.to_vec() == b.to_vec(),
            (Self::String(string), Self::Name(name)) | (Self::Name(name), Self::String(string))
                => string.to_vec() == name.text().as_bytes(),
            (Self::Name(a), Self::Name(b)) => a.text() == b.text(),
            (Self::Array(a) | Self::Procedure(a), Self::Array(b) | Self::Procedure(b)) => a.same_as(b),
            (Self::Dictionary(a), Self::Dictionary(b)) => a.same_as(b),
            (Self::Operator(a), Self::Operator(b)) => a.name() == b.name(),
            (Self::Mark, Self::Mark) | (Self::Null, Self::Null) => true,
            _ => false,
        }
    }

    /// The form `=` prints: strings raw, names without the slash,
    /// everything else as `==` would.
    pub fn text_form(&self) -> String {
        match self {
            Self::String(string) => string.to_string_lossy(),
            Self::Name(name) => name.text().to_owned(),
            other => other.syntax_form(),
        }
    }

    /// The form `==` and `pstack` print.
    pub fn syntax_form(&self) -> String {
        let mut out = String::new();
        self.write_syntax(&mut out, &mut HashSet::new());
        out
    }

    fn write_syntax(&self, out: &mut String, seen: &mut HashSet<*const ()>) {
        let atom = match self {
            Self::Integer(value) => value.to_string(),
            Self::Real(value) => format_real(*value),
            Self::Boolean(value) => value.to_string(),
            Self::String(string) => format!("({})", escape_string(&string.to_vec())),
            Self::Name(name) if name.is_executable() => name.text().to_owned(),
            Self::Name(name) => format!("/{}", name.text()),
            Self::Array(items) => return Self::write_syntax_items(items, ("[", "]"), out, seen),
            Self::Procedure(items) => return Self::write_syntax_items(items, ("{", "}"), out, seen),
            Self::Dictionary(_) => "-dict-".to_owned(),
            Self::Operator(operator) => format!("--{}--", operator.name()),
            Self::Mark => "-mark-".to_owned(),
            Self::Null => "null".to_owned(),
        };
        out.push_str(&atom);
    }

    fn write_syntax_items(items: &ArrayRef, (open, close): (&str, &str), out: &mut String, seen: &mut HashSet<*const ()>) {
        let id = items.storage_id();
        out.push_str(open);
        if seen.insert(id) {
            for (index, item) in items.to_vec().iter().enumerate() {
                if index > 0 { out.push(' '); }
                ensure_sufficient_stack(|| item.write_syntax(out, seen));
            }
            seen.remove(&id);
        } else {
            out.push_str("...");
        }
        out.push_str(close);
    }

    /// An owned, detached copy of this object and everything it reaches.
    pub fn snapshot(&self) -> Value {
        self.snapshot_with(&mut HashSet::new())
    }

    fn snapshot_with(&self, seen: &mut HashSet<*const ()>) -> Value {
        match self {
            Self::Integer(value) => Value::Integer(*value),
            Self::Real(value) => Value::Real(*value),
            Self::Boolean(value) => Value::Boolean(*value),
            Self::String(string) => Value::String(string.to_string_lossy()),
            Self::Name(name) => Value::Name { name: name.text().to_owned(), executable: name.is_executable() },
            Self::Array(items) => Self::snapshot_items(items, seen).map_or(Value::Cycle, Value::Array),
            Self::Procedure(items) => Self::snapshot_items(items, seen).map_or(Value::Cycle, Value::Procedure),
            Self::Dictionary(dictionary) => {
                let id = dictionary.storage_id();
                if !seen.insert(id) { return Value::Cycle; }

                let entries = dictionary.entries()
                    .into_iter()
                    .map(|(key, value)| (key.to_string(), ensure_sufficient_stack(|| value.snapshot_with(seen))))
                    .collect();
                seen.remove(&id);
                Value::Dictionary(entries)
            }
            Self::Operator(operator) => Value::Operator(operator.name().to_owned()),
            Self::Mark => Value::Mark,
            Self::Null => Value::Null,
        }
    }

    fn snapshot_items(items: &ArrayRef, seen: &mut HashSet<*const ()>) -> Option<Vec<Value>> {
        let id = items.storage_id();
        if !seen.insert(id) { return None; }

        let values = items.to_vec().iter().map(|item| ensure_sufficient_stack(|| item.snapshot_with(seen))).collect();
        seen.remove(&id);
        Some(values)
    }
}

/// Owned snapshot of an [`Object`], safe to keep after the interpreter
/// that produced it is gone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    String(String),
    Name { name: String, executable: bool },
    Array(Vec<Value>),
    Procedure(Vec<Value>),
    Dictionary(BTreeMap<String, Value>),
    Operator(String),
    Mark,
    Null,
    /// A composite that contains itself, cut at the repeated reference.
    Cycle,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => value.fmt(f),
            Self::Real(value) => f.write_str(&format_real(*value)),
            Self::Boolean(value) => value.fmt(f),
            Self::String(value) => write!(f, "({})", value),
            Self::Name { name, executable: true } => f.write_str(name),
            Self::Name { name, executable: false } => write!(f, "/{}", name),
            Self::Array(items) => ensure_sufficient_stack(|| write!(f, "[{}]", items.iter().format(" "))),
            Self::Procedure(items) => ensure_sufficient_stack(|| write!(f, "{{{}}}", items.iter().format(" "))),
            Self::Dictionary(entries) => {
                let body = entries.iter()
                    .format_with(" ", |(key, value), f| f(&format_args!("/{} {}", key, value)));
                ensure_sufficient_stack(|| write!(f, "<<{}>>", body))
            }
            Self::Operator(name) => write!(f, "--{}--", name),
            Self::Mark => f.write_str("-mark-"),
            Self::Null => f.write_str("null"),
            Self::Cycle => f.write_str("..."),
        }
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        match self {
            Self::Array(items) | Self::Procedure(items) if !items.is_empty() => {
                let items = mem::take(items);
                ensure_sufficient_stack(move || drop(items));
            }
            Self::Dictionary(entries) if !entries.is_empty() => {
                let entries = mem::take(entries);
                ensure_sufficient_stack(move || drop(entries));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_share_storage() {
        let array = ArrayRef::new(vec![Object::Integer(1), Object::Integer(2)]);
        let alias = array.clone();
        assert!(alias.set(1, Object::Integer(99)));
        assert_eq!(array.get(1).map(|o| o.snapshot()), Some(Value::Integer(99)));
        assert!(array.same_as(&alias));
    }

    #[test]
    fn intervals_write_through() {
        let string = StringRef::from_text("hello");
        let tail = string.interval(3, 2).unwrap();
        assert!(tail.set(0, b'L'));
        assert_eq!(string.to_string_lossy(), "helLo");
        assert!(string.interval(4, 2).is_none());
        assert!(!tail.write_at(1, b"xy"));
    }

    #[test]
    fn deep_nesting_prints_and_drops() {
        let mut nested = Object::Null;
        for _ in 0..300_000 {
            nested = Object::array(vec![nested]);
        }

        let text = nested.syntax_form();
        assert_eq!(text.len(), 2 * 300_000 + "null".len());
        assert!(text.starts_with("[[[") && text.ends_with("null]]]"));

        let value = nested.snapshot();
        assert!(matches!(&value, Value::Array(items) if items.len() == 1));
        assert!(value.to_string().ends_with("null]]"));
        drop(value);
        drop(nested);
    }

    #[test]
    fn deep_dictionaries_drop() {
        let mut nested = Dictionary::new();
        for _ in 0..300_000 {
            let outer = Dictionary::new();
            assert!(outer.insert(Rc::from("inner"), Object::Dictionary(nested)).is_ok());
            nested = outer;
        }
        drop(nested);
    }

    #[test]
    fn equality_rules() {
        assert!(Object::Integer(3).ps_eq(&Object::Real(3.0)));
        assert!(Object::string("abc").ps_eq(&Object::literal_name("abc")));
        assert!(!Object::string("abc").ps_eq(&Object::Integer(3)));
        assert!(!Object::array(vec![]).ps_eq(&Object::array(vec![])));
        assert!(Object::Mark.ps_eq(&Object::Mark));
        assert!(!Object::Mark.ps_eq(&Object::Null));
    }

    #[test]
    fn syntax_and_text_forms() {
        let procedure = Object::procedure(vec![
            Object::Integer(1),
            Object::Real(2.0),
            Object::executable_name("add"),
            Object::string("a(b"),
        ]);
        assert_eq!(procedure.syntax_form(), r"{1 2.0 add (a\(b)}");
        assert_eq!(Object::literal_name("x").syntax_form(), "/x");
        assert_eq!(Object::literal_name("x").text_form(), "x");
        assert_eq!(Object::string("hi").text_form(), "hi");
        assert_eq!(Object::Real(3.5).text_form(), "3.5");
    }

    #[test]
    fn self_referencing_arrays_are_cut() {
        let array = ArrayRef::new(vec![Object::Null]);
        array.set(0, Object::Array(array.clone()));
        let object = Object::Array(array);
        assert_eq!(object.syntax_form(), "[[...]]");
        assert_eq!(object.snapshot(), Value::Array(vec![Value::Cycle]));
    }

    #[test]
    fn read_only_dictionaries_reject_writes() {
        let dictionary = Dictionary::new();
        dictionary.insert(Rc::from("a"), Object::Integer(1)).unwrap();
        dictionary.set_read_only();
        assert_eq!(dictionary.insert(Rc::from("b"), Object::Null), Err(ErrorKind::InvalidAccess));
        assert_eq!(dictionary.len(), 1);
    }
}

use std::rc::Rc;

use crate::{error::ErrorKind, object::{Dictionary, Object}};

// systemdict and userdict are never popped
const PERMANENT_FRAMES: usize = 2;

/// The stack of scopes that names are resolved against.
///
/// Bottom-first: `frames()[0]` is systemdict, `frames()[1]` is userdict and
/// the last frame is the current dictionary.
#[derive(Debug, Clone)]
pub struct DictionaryStack {
    frames: Vec<Dictionary>,
    limit: usize,
}

impl DictionaryStack {
    pub fn new(system: Dictionary, limit: usize) -> Self {
        Self {
            frames: vec![system, Dictionary::new()],
            limit: limit.max(PERMANENT_FRAMES),
        }
    }

    pub fn system(&self) -> &Dictionary {
        &self.frames[0]
    }

    pub fn user(&self) -> &Dictionary {
        &self.frames[1]
    }

    pub fn current(&self) -> &Dictionary {
        // `frames` never shrinks below PERMANENT_FRAMES
        &self.frames[self.frames.len() - 1]
    }

    pub fn frames(&self) -> &[Dictionary] {
        &self.frames
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn begin(&mut self, dictionary: Dictionary) -> Result<(), ErrorKind> {
        if self.frames.len() >= self.limit { return Err(ErrorKind::DictStackOverflow); }
        self.frames.push(dictionary);
        Ok(())
    }

    pub fn end(&mut self) -> Result<Dictionary, ErrorKind> {
        if self.frames.len() <= PERMANENT_FRAMES { return Err(ErrorKind::StackUnderflow); }
        self.frames.pop().ok_or(ErrorKind::StackUnderflow)
    }

    pub fn def(&self, key: Rc<str>, value: Object) -> Result<(), ErrorKind> {
        self.current().insert(key, value)
    }

    pub fn find(&self, key: &str) -> Option<Object> {
        self.frames.iter().rev().find_map(|frame| frame.get(key))
    }

    pub fn lookup(&self, key: &str) -> Result<Object, ErrorKind> {
        self.find(key).ok_or(ErrorKind::Undefined)
    }

    /// The topmost frame defining `key`.
    pub fn where_defined(&self, key: &str) -> Option<&Dictionary> {
        self.frames.iter().rev().find(|frame| frame.contains(key))
    }

    pub fn store(&self, key: Rc<str>, value: Object) -> Result<(), ErrorKind> {
        match self.where_defined(&key) {
            Some(frame) => frame.insert(key, value),
            None => self.def(key, value),
        }
    }
}

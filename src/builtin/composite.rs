use crate::{
    error::{ErrorKind, ExecResult},
    interpreter::Interpreter,
    object::{ArrayRef, Object, StringRef},
};

use super::{expect_count, expect_index, expect_integer, expect_key, expect_length, expect_procedure, loop_step};

// Rebuilds an array object of the same flavor around a new window
fn same_flavor(original: &Object, items: ArrayRef) -> Object {
    match original {
        Object::Procedure(_) => Object::Procedure(items),
        _ => Object::Array(items),
    }
}

fn string_byte(value: &Object) -> ExecResult<u8> {
    u8::try_from(expect_integer(value)?).map_err(|_| ErrorKind::RangeCheck.into())
}

pub(super) fn builtin_array(interpreter: &mut Interpreter) -> ExecResult {
    let [len] = interpreter.pop_n()?;
    let len = expect_length(interpreter, &len)?;
    interpreter.push(Object::array(vec![Object::Null; len]))
}

pub(super) fn builtin_string(interpreter: &mut Interpreter) -> ExecResult {
    let [len] = interpreter.pop_n()?;
    let len = expect_length(interpreter, &len)?;
    interpreter.push(Object::String(StringRef::new(vec![0; len])))
}

pub(super) fn builtin_length(interpreter: &mut Interpreter) -> ExecResult {
    let [object] = interpreter.pop_n()?;
    let len = match &object {
        Object::Array(items) | Object::Procedure(items) => items.len(),
        Object::String(string) => string.len(),
        Object::Dictionary(dictionary) => dictionary.len(),
        Object::Name(name) => name.text().len(),
        _ => return Err(ErrorKind::TypeCheck.into()),
    };
    interpreter.push(Object::Integer(len as i64))
}

pub(super) fn builtin_get(interpreter: &mut Interpreter) -> ExecResult {
    let [container, key] = interpreter.pop_n()?;
    let value = match &container {
        Object::Array(items) | Object::Procedure(items) => {
            let index = expect_index(expect_integer(&key)?, items.len())?;
            items.get(index).ok_or(ErrorKind::RangeCheck)?
        }
        Object::String(string) => {
            let index = expect_index(expect_integer(&key)?, string.len())?;
            Object::Integer(string.get(index).ok_or(ErrorKind::RangeCheck)?.into())
        }
        Object::Dictionary(dictionary) => dictionary.get(&expect_key(&key)?).ok_or(ErrorKind::Undefined)?,
        _ => return Err(ErrorKind::TypeCheck.into()),
    };
    interpreter.push(value)
}

pub(super) fn builtin_put(interpreter: &mut Interpreter) -> ExecResult {
    let [container, key, value] = interpreter.pop_n()?;
    match &container {
        Object::Array(items) | Object::Procedure(items) => {
            let index = expect_index(expect_integer(&key)?, items.len())?;
            items.set(index, value);
        }
        Object::String(string) => {
            let index = expect_index(expect_integer(&key)?, string.len())?;
            string.set(index, string_byte(&value)?);
        }
        Object::Dictionary(dictionary) => dictionary.insert(expect_key(&key)?, value)?,
        _ => return Err(ErrorKind::TypeCheck.into()),
    }
    Ok(())
}

pub(super) fn builtin_getinterval(interpreter: &mut Interpreter) -> ExecResult {
    // The result shares storage with the original
    let [container, start, count] = interpreter.pop_n()?;
    let (start, count) = (expect_count(expect_integer(&start)?)?, expect_count(expect_integer(&count)?)?);
    let interval = match &container {
        Object::Array(items) | Object::Procedure(items) => items.interval(start, count)
            .map(|items| same_flavor(&container, items)),
        Object::String(string) => string.interval(start, count).map(Object::String),
        _ => return Err(ErrorKind::TypeCheck.into()),
    };
    interpreter.push(interval.ok_or(ErrorKind::RangeCheck)?)
}

pub(super) fn builtin_putinterval(interpreter: &mut Interpreter) -> ExecResult {
    let [destination, start, source] = interpreter.pop_n()?;
    let start = expect_count(expect_integer(&start)?)?;
    let written = match (&destination, &source) {
        (Object::Array(target) | Object::Procedure(target), Object::Array(items) | Object::Procedure(items))
            => target.write_at(start, &items.to_vec()),
        (Object::String(target), Object::String(bytes)) => target.write_at(start, &bytes.to_vec()),
        _ => return Err(ErrorKind::TypeCheck.into()),
    };

    if !written { return Err(ErrorKind::RangeCheck.into()); }
    Ok(())
}

/// `copy` with a composite on top: `source destination copy` overwrites the
/// start of `destination` and pushes the overwritten part.
pub(super) fn copy_composite(interpreter: &mut Interpreter) -> ExecResult {
    let [source, destination] = interpreter.pop_n()?;
    let copied = match (&source, &destination) {
        (Object::Array(items) | Object::Procedure(items), Object::Array(target) | Object::Procedure(target)) => {
            let items = items.to_vec();
            if !target.write_at(0, &items) { return Err(ErrorKind::RangeCheck.into()); }
            target.interval(0, items.len()).map(|items| same_flavor(&destination, items))
        }
        (Object::String(bytes), Object::String(target)) => {
            let bytes = bytes.to_vec();
            if !target.write_at(0, &bytes) { return Err(ErrorKind::RangeCheck.into()); }
            target.interval(0, bytes.len()).map(Object::String)
        }
        (Object::Dictionary(entries), Object::Dictionary(target)) => {
            for (key, value) in entries.entries() {
                target.insert(key, value)?;
            }
            Some(destination.clone())
        }
        _ => return Err(ErrorKind::TypeCheck.into()),
    };
    interpreter.push(copied.ok_or(ErrorKind::RangeCheck)?)
}

pub(super) fn builtin_forall(interpreter: &mut Interpreter) -> ExecResult {
    let [container, procedure] = interpreter.pop_n()?;
    let body = expect_procedure(&procedure)?;

    // Elements are read one at a time, so writes made by the body to
    // later positions are seen
    match &container {
        Object::Array(items) | Object::Procedure(items) => {
            for index in 0..items.len() {
                let Some(item) = items.get(index) else { break };
                interpreter.push(item)?;
                if loop_step(interpreter.call(&body))?.is_break() { break; }
            }
        }
        Object::String(string) => {
            for index in 0..string.len() {
                let Some(byte) = string.get(index) else { break };
                interpreter.push(Object::Integer(byte.into()))?;
                if loop_step(interpreter.call(&body))?.is_break() { break; }
            }
        }
        Object::Dictionary(dictionary) => {
            for (key, value) in dictionary.entries() {
                interpreter.push(Object::literal_name(&key))?;
                interpreter.push(value)?;
                if loop_step(interpreter.call(&body))?.is_break() { break; }
            }
        }
        _ => return Err(ErrorKind::TypeCheck.into()),
    }
    Ok(())
}

pub(super) fn builtin_aload(interpreter: &mut Interpreter) -> ExecResult {
    let [array] = interpreter.pop_n()?;
    let items = match &array {
        Object::Array(items) | Object::Procedure(items) => items.to_vec(),
        _ => return Err(ErrorKind::TypeCheck.into()),
    };

    items.into_iter().try_for_each(|item| interpreter.push(item))?;
    interpreter.push(array)
}

pub(super) fn builtin_astore(interpreter: &mut Interpreter) -> ExecResult {
    // The array stays put until the operands are known to be there
    let target = match interpreter.peek(0)? {
        Object::Array(items) | Object::Procedure(items) => items.clone(),
        _ => return Err(ErrorKind::TypeCheck.into()),
    };
    interpreter.require(target.len() + 1)?;

    let array = interpreter.pop()?;
    let start = interpreter.operand_stack().len() - target.len();
    let items = interpreter.stack_mut().split_off(start);
    target.write_at(0, &items);
    interpreter.push(array)
}

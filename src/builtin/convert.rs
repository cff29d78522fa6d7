use crate::{
    error::{ErrorKind, ExecResult},
    interpreter::Interpreter,
    object::{format_real, Object},
    parser::parse_number,
};

use super::expect_string;

pub(super) fn builtin_type(interpreter: &mut Interpreter) -> ExecResult {
    let [object] = interpreter.pop_n()?;
    interpreter.push(Object::executable_name(object.type_name()))
}

pub(super) fn builtin_cvx(interpreter: &mut Interpreter) -> ExecResult {
    let [object] = interpreter.pop_n()?;
    let executable = match object {
        Object::Array(items) => Object::Procedure(items),
        Object::Name(name) => Object::Name(name.with_executable(true)),
        other => other,
    };
    interpreter.push(executable)
}

pub(super) fn builtin_cvlit(interpreter: &mut Interpreter) -> ExecResult {
    let [object] = interpreter.pop_n()?;
    let literal = match object {
        Object::Procedure(items) => Object::Array(items),
        Object::Name(name) => Object::Name(name.with_executable(false)),
        other => other,
    };
    interpreter.push(literal)
}

pub(super) fn builtin_xcheck(interpreter: &mut Interpreter) -> ExecResult {
    let [object] = interpreter.pop_n()?;
    interpreter.push(Object::Boolean(object.is_executable()))
}

// Strings convert by their numeric syntax
fn numeric_value(object: &Object) -> ExecResult<Object> {
    match object {
        Object::Integer(_) | Object::Real(_) => Ok(object.clone()),
        Object::String(string) => parse_number(string.to_string_lossy().trim()).ok_or_else(|| ErrorKind::TypeCheck.into()),
        _ => Err(ErrorKind::TypeCheck.into()),
    }
}

pub(super) fn builtin_cvi(interpreter: &mut Interpreter) -> ExecResult {
    let [object] = interpreter.pop_n()?;
    let integer = match numeric_value(&object)? {
        Object::Real(value) => {
            let truncated = value.trunc();
            if !(i64::MIN as f64..=i64::MAX as f64).contains(&truncated) {
                return Err(ErrorKind::RangeCheck.into());
            }
            truncated as i64
        }
        Object::Integer(value) => value,
        _ => return Err(ErrorKind::TypeCheck.into()),
    };
    interpreter.push(Object::Integer(integer))
}

pub(super) fn builtin_cvr(interpreter: &mut Interpreter) -> ExecResult {
    let [object] = interpreter.pop_n()?;
    let real = match numeric_value(&object)? {
        Object::Integer(value) => value as f64,
        Object::Real(value) => value,
        _ => return Err(ErrorKind::TypeCheck.into()),
    };
    interpreter.push(Object::Real(real))
}

pub(super) fn builtin_cvn(interpreter: &mut Interpreter) -> ExecResult {
    let [object] = interpreter.pop_n()?;
    let name = match object {
        Object::String(string) => Object::literal_name(&string.to_string_lossy()),
        name @ Object::Name(_) => name,
        _ => return Err(ErrorKind::TypeCheck.into()),
    };
    interpreter.push(name)
}

fn string_value(object: &Object) -> String {
    match object {
        Object::Integer(value) => value.to_string(),
        Object::Real(value) => format_real(*value),
        Object::Boolean(value) => value.to_string(),
        Object::String(string) => string.to_string_lossy(),
        Object::Name(name) => name.text().to_owned(),
        Object::Operator(operator) => operator.name().to_owned(),
        _ => "--nostringval--".to_owned(),
    }
}

pub(super) fn builtin_cvs(interpreter: &mut Interpreter) -> ExecResult {
    // Fills the start of the buffer and pushes the filled part
    let [object, buffer] = interpreter.pop_n()?;
    let buffer = expect_string(&buffer)?;
    let text = string_value(&object);

    if !buffer.write_at(0, text.as_bytes()) { return Err(ErrorKind::RangeCheck.into()); }
    let written = buffer.interval(0, text.len()).ok_or(ErrorKind::RangeCheck)?;
    interpreter.push(Object::String(written))
}

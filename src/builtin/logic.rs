use std::cmp::Ordering;

use crate::{error::{ErrorKind, ExecResult}, interpreter::Interpreter, object::Object};

use super::{expect_integer, expect_number, Number};

pub(super) fn builtin_eq(interpreter: &mut Interpreter) -> ExecResult {
    let [a, b] = interpreter.pop_n()?;
    interpreter.push(Object::Boolean(a.ps_eq(&b)))
}

pub(super) fn builtin_ne(interpreter: &mut Interpreter) -> ExecResult {
    let [a, b] = interpreter.pop_n()?;
    interpreter.push(Object::Boolean(!a.ps_eq(&b)))
}

// Numbers compare by value, strings bytewise; nothing else is ordered
fn ordering(a: &Object, b: &Object) -> ExecResult<Option<Ordering>> {
    match (a, b) {
        (Object::String(a), Object::String(b)) => Ok(Some(a.to_vec().cmp(&b.to_vec()))),
        _ => match (expect_number(a)?, expect_number(b)?) {
            (Number::Integer(a), Number::Integer(b)) => Ok(Some(a.cmp(&b))),
            (a, b) => Ok(a.as_f64().partial_cmp(&b.as_f64())),
        },
    }
}

fn relational(interpreter: &mut Interpreter, accept: fn(Ordering) -> bool) -> ExecResult {
    let [a, b] = interpreter.pop_n()?;
    let result = ordering(&a, &b)?.is_some_and(accept);
    interpreter.push(Object::Boolean(result))
}

pub(super) fn builtin_lt(interpreter: &mut Interpreter) -> ExecResult {
    relational(interpreter, Ordering::is_lt)
}

pub(super) fn builtin_le(interpreter: &mut Interpreter) -> ExecResult {
    relational(interpreter, Ordering::is_le)
}

pub(super) fn builtin_gt(interpreter: &mut Interpreter) -> ExecResult {
    relational(interpreter, Ordering::is_gt)
}

pub(super) fn builtin_ge(interpreter: &mut Interpreter) -> ExecResult {
    relational(interpreter, Ordering::is_ge)
}

// Logical on booleans, bitwise on integers
fn logical(interpreter: &mut Interpreter, boolean_op: fn(bool, bool) -> bool, integer_op: fn(i64, i64) -> i64) -> ExecResult {
    let [a, b] = interpreter.pop_n()?;
    let result = match (a, b) {
        (Object::Boolean(a), Object::Boolean(b)) => Object::Boolean(boolean_op(a, b)),
        (Object::Integer(a), Object::Integer(b)) => Object::Integer(integer_op(a, b)),
        _ => return Err(ErrorKind::TypeCheck.into()),
    };
    interpreter.push(result)
}

pub(super) fn builtin_and(interpreter: &mut Interpreter) -> ExecResult {
    logical(interpreter, |a, b| a && b, |a, b| a & b)
}

pub(super) fn builtin_or(interpreter: &mut Interpreter) -> ExecResult {
    logical(interpreter, |a, b| a || b, |a, b| a | b)
}

pub(super) fn builtin_xor(interpreter: &mut Interpreter) -> ExecResult {
    logical(interpreter, |a, b| a ^ b, |a, b| a ^ b)
}

pub(super) fn builtin_not(interpreter: &mut Interpreter) -> ExecResult {
    let [value] = interpreter.pop_n()?;
    let result = match value {
        Object::Boolean(value) => Object::Boolean(!value),
        Object::Integer(value) => Object::Integer(!value),
        _ => return Err(ErrorKind::TypeCheck.into()),
    };
    interpreter.push(result)
}

pub(super) fn builtin_bitshift(interpreter: &mut Interpreter) -> ExecResult {
    // Positive shifts go left, negative right; bits pushed out are lost
    let [value, shift] = interpreter.pop_n()?;
    let (value, shift) = (expect_integer(&value)?, expect_integer(&shift)?);
    let distance = u32::try_from(shift.unsigned_abs()).unwrap_or(u32::MAX);
    let result = if shift >= 0 {
        value.checked_shl(distance).unwrap_or(0)
    } else {
        value.checked_shr(distance).unwrap_or(if value < 0 { -1 } else { 0 })
    };
    interpreter.push(Object::Integer(result))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{error::ErrorKind, interpreter::Interpreter, object::Value};

    fn run(source: &str) -> anyhow::Result<Vec<Value>> {
        let mut interpreter = Interpreter::new();
        interpreter.run(source)?;
        Ok(interpreter.snapshot())
    }

    fn booleans(values: &[bool]) -> Vec<Value> {
        values.iter().copied().map(Value::Boolean).collect()
    }

    #[test]
    fn equality() -> anyhow::Result<()> {
        assert_eq!(run("1 1.0 eq (abc) (abc) eq (abc) /abc eq 1 (1) eq")?, booleans(&[true, true, true, false]));
        assert_eq!(run("[1] [1] eq [1] dup eq 1 2 ne")?, booleans(&[false, true, true]));
        Ok(())
    }

    #[test]
    fn ordering() -> anyhow::Result<()> {
        assert_eq!(run("1 2 lt 2 2 le 2.5 2 gt 1 2 ge")?, booleans(&[true, true, true, false]));
        assert_eq!(run("(abc) (abd) lt (b) (abc) gt")?, booleans(&[true, true]));
        assert_eq!(Interpreter::new().run("(a) 1 lt").unwrap_err().kind, ErrorKind::TypeCheck);
        assert_eq!(Interpreter::new().run("true false lt").unwrap_err().kind, ErrorKind::TypeCheck);
        Ok(())
    }

    #[test]
    fn logic_and_bits() -> anyhow::Result<()> {
        assert_eq!(run("true false and true false or true true xor false not")?, booleans(&[false, true, false, true]));
        assert_eq!(run("12 10 and 12 10 or 12 10 xor 0 not")?, vec![
            Value::Integer(8),
            Value::Integer(14),
            Value::Integer(6),
            Value::Integer(-1),
        ]);
        assert_eq!(run("1 4 bitshift 256 -4 bitshift 1 64 bitshift")?, vec![
            Value::Integer(16),
            Value::Integer(16),
            Value::Integer(0),
        ]);
        assert_eq!(Interpreter::new().run("true 1 and").unwrap_err().kind, ErrorKind::TypeCheck);
        Ok(())
    }
}

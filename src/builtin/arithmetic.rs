use crate::{error::{ErrorKind, ExecResult}, interpreter::Interpreter, object::Object};

use super::{expect_integer, expect_number, Number};

// Integer results that overflow i64 are recomputed as reals
fn numeric_binary(interpreter: &mut Interpreter, integer_op: fn(i64, i64) -> Option<i64>, real_op: fn(f64, f64) -> f64) -> ExecResult {
    let [a, b] = interpreter.pop_n()?;
    let real = match (expect_number(&a)?, expect_number(&b)?) {
        (Number::Integer(a), Number::Integer(b)) => match integer_op(a, b) {
            Some(result) => return interpreter.push(Object::Integer(result)),
            None => real_op(a as f64, b as f64),
        },
        (a, b) => real_op(a.as_f64(), b.as_f64()),
    };
    real_result(interpreter, real)
}

fn numeric_unary(interpreter: &mut Interpreter, integer_op: fn(i64) -> Option<i64>, real_op: fn(f64) -> f64) -> ExecResult {
    let [value] = interpreter.pop_n()?;
    let real = match expect_number(&value)? {
        Number::Integer(value) => match integer_op(value) {
            Some(result) => return interpreter.push(Object::Integer(result)),
            None => real_op(value as f64),
        },
        Number::Real(value) => real_op(value),
    };
    real_result(interpreter, real)
}

fn integer_binary(interpreter: &mut Interpreter, op: fn(i64, i64) -> Option<i64>) -> ExecResult {
    let [a, b] = interpreter.pop_n()?;
    let (a, b) = (expect_integer(&a)?, expect_integer(&b)?);
    let result = op(a, b).ok_or(ErrorKind::UndefinedResult)?;
    interpreter.push(Object::Integer(result))
}

// Integers pass through untouched
fn rounding(interpreter: &mut Interpreter, op: fn(f64) -> f64) -> ExecResult {
    let [value] = interpreter.pop_n()?;
    let result = match expect_number(&value)? {
        Number::Integer(value) => Object::Integer(value),
        Number::Real(value) => Object::Real(op(value)),
    };
    interpreter.push(result)
}

fn real_result(interpreter: &mut Interpreter, value: f64) -> ExecResult {
    if !value.is_finite() { return Err(ErrorKind::UndefinedResult.into()); }
    interpreter.push(Object::Real(value))
}

pub(super) fn builtin_add(interpreter: &mut Interpreter) -> ExecResult {
    numeric_binary(interpreter, i64::checked_add, |a, b| a + b)
}

pub(super) fn builtin_sub(interpreter: &mut Interpreter) -> ExecResult {
    numeric_binary(interpreter, i64::checked_sub, |a, b| a - b)
}

pub(super) fn builtin_mul(interpreter: &mut Interpreter) -> ExecResult {
    numeric_binary(interpreter, i64::checked_mul, |a, b| a * b)
}

pub(super) fn builtin_div(interpreter: &mut Interpreter) -> ExecResult {
    let [a, b] = interpreter.pop_n()?;
    let (a, b) = (expect_number(&a)?.as_f64(), expect_number(&b)?.as_f64());
    if b == 0.0 { return Err(ErrorKind::UndefinedResult.into()); }
    real_result(interpreter, a / b)
}

pub(super) fn builtin_idiv(interpreter: &mut Interpreter) -> ExecResult {
    // Truncates toward zero
    integer_binary(interpreter, i64::checked_div)
}

pub(super) fn builtin_mod(interpreter: &mut Interpreter) -> ExecResult {
    // The result takes the sign of the dividend
    integer_binary(interpreter, i64::checked_rem)
}

pub(super) fn builtin_neg(interpreter: &mut Interpreter) -> ExecResult {
    numeric_unary(interpreter, i64::checked_neg, |value| -value)
}

pub(super) fn builtin_abs(interpreter: &mut Interpreter) -> ExecResult {
    numeric_unary(interpreter, i64::checked_abs, f64::abs)
}

pub(super) fn builtin_ceiling(interpreter: &mut Interpreter) -> ExecResult {
    rounding(interpreter, f64::ceil)
}

pub(super) fn builtin_floor(interpreter: &mut Interpreter) -> ExecResult {
    rounding(interpreter, f64::floor)
}

pub(super) fn builtin_round(interpreter: &mut Interpreter) -> ExecResult {
    // Halves go up: -4.5 rounds to -4
    rounding(interpreter, |value| (value + 0.5).floor())
}

pub(super) fn builtin_truncate(interpreter: &mut Interpreter) -> ExecResult {
    rounding(interpreter, f64::trunc)
}

pub(super) fn builtin_sqrt(interpreter: &mut Interpreter) -> ExecResult {
    let [value] = interpreter.pop_n()?;
    let value = expect_number(&value)?.as_f64();
    if value < 0.0 { return Err(ErrorKind::RangeCheck.into()); }
    real_result(interpreter, value.sqrt())
}

pub(super) fn builtin_exp(interpreter: &mut Interpreter) -> ExecResult {
    let [base, exponent] = interpreter.pop_n()?;
    let (base, exponent) = (expect_number(&base)?.as_f64(), expect_number(&exponent)?.as_f64());
    if base < 0.0 && exponent.fract() != 0.0 { return Err(ErrorKind::UndefinedResult.into()); }
    real_result(interpreter, base.powf(exponent))
}

fn logarithm(interpreter: &mut Interpreter, op: fn(f64) -> f64) -> ExecResult {
    let [value] = interpreter.pop_n()?;
    let value = expect_number(&value)?.as_f64();
    if value <= 0.0 { return Err(ErrorKind::RangeCheck.into()); }
    real_result(interpreter, op(value))
}

pub(super) fn builtin_ln(interpreter: &mut Interpreter) -> ExecResult {
    logarithm(interpreter, f64::ln)
}

pub(super) fn builtin_log(interpreter: &mut Interpreter) -> ExecResult {
    logarithm(interpreter, f64::log10)
}

// Angles are in degrees
fn trigonometric(interpreter: &mut Interpreter, op: fn(f64) -> f64) -> ExecResult {
    let [angle] = interpreter.pop_n()?;
    let angle = expect_number(&angle)?.as_f64();
    real_result(interpreter, op(angle.to_radians()))
}

pub(super) fn builtin_sin(interpreter: &mut Interpreter) -> ExecResult {
    trigonometric(interpreter, f64::sin)
}

pub(super) fn builtin_cos(interpreter: &mut Interpreter) -> ExecResult {
    trigonometric(interpreter, f64::cos)
}

pub(super) fn builtin_atan(interpreter: &mut Interpreter) -> ExecResult {
    let [numerator, denominator] = interpreter.pop_n()?;
    let (numerator, denominator) = (expect_number(&numerator)?.as_f64(), expect_number(&denominator)?.as_f64());
    if numerator == 0.0 && denominator == 0.0 { return Err(ErrorKind::UndefinedResult.into()); }

    let degrees = numerator.atan2(denominator).to_degrees();
    real_result(interpreter, if degrees < 0.0 { degrees + 360.0 } else { degrees })
}

use crate::{
    error::{ErrorKind, ExecResult, Unwind},
    interpreter::Interpreter,
    object::Object,
};

use super::{expect_bool, expect_count, expect_integer, expect_number, expect_procedure, loop_step, Number};

pub(super) fn builtin_if(interpreter: &mut Interpreter) -> ExecResult {
    let [condition, procedure] = interpreter.pop_n()?;
    let procedure = expect_procedure(&procedure)?;
    if expect_bool(&condition)? {
        interpreter.call(&procedure)?;
    }
    Ok(())
}

pub(super) fn builtin_ifelse(interpreter: &mut Interpreter) -> ExecResult {
    let [condition, consequent, alternative] = interpreter.pop_n()?;
    let (consequent, alternative) = (expect_procedure(&consequent)?, expect_procedure(&alternative)?);
    let branch = if expect_bool(&condition)? { consequent } else { alternative };
    interpreter.call(&branch)
}

pub(super) fn builtin_for(interpreter: &mut Interpreter) -> ExecResult {
    let [initial, increment, limit, procedure] = interpreter.pop_n()?;
    let body = expect_procedure(&procedure)?;
    let (initial, increment, limit) = (expect_number(&initial)?, expect_number(&increment)?, expect_number(&limit)?);

    match (initial, increment) {
        // The counter stays an integer only when it starts and steps as one
        (Number::Integer(mut counter), Number::Integer(step)) => {
            if step == 0 { return Err(ErrorKind::RangeCheck.into()); }
            let past_limit = |counter: i64| match limit {
                Number::Integer(limit) => if step > 0 { counter > limit } else { counter < limit },
                Number::Real(limit) => if step > 0 { counter as f64 > limit } else { (counter as f64) < limit },
            };

            while !past_limit(counter) {
                interpreter.push(Object::Integer(counter))?;
                if loop_step(interpreter.call(&body))?.is_break() { break; }
                match counter.checked_add(step) {
                    Some(next) => counter = next,
                    None => break,
                }
            }
        }
        (initial, increment) => {
            let (mut counter, step, limit) = (initial.as_f64(), increment.as_f64(), limit.as_f64());
            if step == 0.0 { return Err(ErrorKind::RangeCheck.into()); }

            while if step > 0.0 { counter <= limit } else { counter >= limit } {
                interpreter.push(Object::Real(counter))?;
                if loop_step(interpreter.call(&body))?.is_break() { break; }
                counter += step;
            }
        }
    }
    Ok(())
}

pub(super) fn builtin_repeat(interpreter: &mut Interpreter) -> ExecResult {
    let [count, procedure] = interpreter.pop_n()?;
    let body = expect_procedure(&procedure)?;
    let count = expect_count(expect_integer(&count)?)?;

    for _ in 0..count {
        if loop_step(interpreter.call(&body))?.is_break() { break; }
    }
    Ok(())
}

pub(super) fn builtin_loop(interpreter: &mut Interpreter) -> ExecResult {
    let [procedure] = interpreter.pop_n()?;
    let body = expect_procedure(&procedure)?;

    while loop_step(interpreter.call(&body))?.is_continue() {}
    Ok(())
}

pub(super) fn builtin_exit(_interpreter: &mut Interpreter) -> ExecResult {
    Err(Unwind::Exit)
}

pub(super) fn builtin_stop(_interpreter: &mut Interpreter) -> ExecResult {
    Err(Unwind::Stop)
}

pub(super) fn builtin_exec(interpreter: &mut Interpreter) -> ExecResult {
    let [object] = interpreter.pop_n()?;
    interpreter.invoke(object)
}

pub(super) fn builtin_stopped(interpreter: &mut Interpreter) -> ExecResult {
    let [object] = interpreter.pop_n()?;
    let stopped = match interpreter.invoke(object) {
        Ok(()) => false,
        Err(Unwind::Stop) => true,
        Err(Unwind::Error(error)) => {
            tracing::debug!(%error, "caught by stopped");
            interpreter.record_error(&error);
            true
        }
        // `exit` belongs to the enclosing loop
        Err(Unwind::Exit) => return Err(Unwind::Exit),
    };
    interpreter.push(Object::Boolean(stopped))
}

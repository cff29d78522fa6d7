use crate::{error::{ErrorKind, ExecResult}, interpreter::Interpreter, object::Object};

use super::{composite::copy_composite, expect_count, expect_integer};

// Reads an integer operand `depth` places down, leaving the stack as it is
fn peek_count(interpreter: &Interpreter, depth: usize) -> ExecResult<usize> {
    expect_count(expect_integer(interpreter.peek(depth)?)?)
}

pub(super) fn builtin_pop(interpreter: &mut Interpreter) -> ExecResult {
    interpreter.pop()?;
    Ok(())
}

pub(super) fn builtin_exch(interpreter: &mut Interpreter) -> ExecResult {
    let [a, b] = interpreter.pop_n()?;
    interpreter.push(b)?;
    interpreter.push(a)
}

pub(super) fn builtin_dup(interpreter: &mut Interpreter) -> ExecResult {
    let top = interpreter.peek(0)?.clone();
    interpreter.push(top)
}

pub(super) fn builtin_copy(interpreter: &mut Interpreter) -> ExecResult {
    if !matches!(interpreter.peek(0)?, Object::Integer(_)) {
        return copy_composite(interpreter);
    }

    let count = peek_count(interpreter, 0)?;
    let available = interpreter.operand_stack().len() - 1;
    if count > available { return Err(ErrorKind::RangeCheck.into()); }

    interpreter.pop()?;
    let start = available - count;
    let copied = interpreter.operand_stack()[start..].to_vec();
    copied.into_iter().try_for_each(|object| interpreter.push(object))
}

pub(super) fn builtin_index(interpreter: &mut Interpreter) -> ExecResult {
    let depth = peek_count(interpreter, 0)?;
    let object = interpreter.peek(depth + 1)
        .map_err(|_| ErrorKind::RangeCheck)?
        .clone();

    interpreter.pop()?;
    interpreter.push(object)
}

pub(super) fn builtin_roll(interpreter: &mut Interpreter) -> ExecResult {
    // n j roll: rotates the top n objects by j places toward the top
    let shift = expect_integer(interpreter.peek(0)?)?;
    let count = peek_count(interpreter, 1)?;
    if count > interpreter.operand_stack().len() - 2 { return Err(ErrorKind::RangeCheck.into()); }

    interpreter.pop_n::<2>()?;
    if count == 0 { return Ok(()); }

    let stack = interpreter.stack_mut();
    let start = stack.len() - count;
    let places = shift.rem_euclid(count as i64) as usize;
    stack[start..].rotate_right(places);
    Ok(())
}

pub(super) fn builtin_clear(interpreter: &mut Interpreter) -> ExecResult {
    interpreter.stack_mut().clear();
    Ok(())
}

pub(super) fn builtin_count(interpreter: &mut Interpreter) -> ExecResult {
    let depth = interpreter.operand_stack().len();
    interpreter.push(Object::Integer(depth as i64))
}

pub(super) fn builtin_mark(interpreter: &mut Interpreter) -> ExecResult {
    interpreter.push(Object::Mark)
}

fn mark_position(interpreter: &Interpreter) -> ExecResult<usize> {
    interpreter.operand_stack()
        .iter()
        .rposition(|object| matches!(object, Object::Mark))
        .ok_or_else(|| ErrorKind::UnmatchedMark.into())
}

pub(super) fn builtin_cleartomark(interpreter: &mut Interpreter) -> ExecResult {
    let position = mark_position(interpreter)?;
    interpreter.stack_mut().truncate(position);
    Ok(())
}

pub(super) fn builtin_counttomark(interpreter: &mut Interpreter) -> ExecResult {
    let position = mark_position(interpreter)?;
    let count = interpreter.operand_stack().len() - position - 1;
    interpreter.push(Object::Integer(count as i64))
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

    fn integers(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::Integer).collect()
    }

    #[test]
    fn shuffling() -> anyhow::Result<()> {
        assert_eq!(run("1 2 exch")?, integers(&[2, 1]));
        assert_eq!(run("1 2 dup")?, integers(&[1, 2, 2]));
        assert_eq!(run("1 2 3 pop")?, integers(&[1, 2]));
        assert_eq!(run("1 2 3 2 copy")?, integers(&[1, 2, 3, 2, 3]));
        assert_eq!(run("1 2 3 0 copy")?, integers(&[1, 2, 3]));
        assert_eq!(run("1 2 3 2 index")?, integers(&[1, 2, 3, 1]));
        assert_eq!(run("1 2 3 clear count")?, integers(&[0]));
        Ok(())
    }

    #[test]
    fn roll_rotates_toward_the_top() -> anyhow::Result<()> {
        assert_eq!(run("1 2 3 3 1 roll")?, integers(&[3, 1, 2]));
        assert_eq!(run("1 2 3 3 -1 roll")?, integers(&[2, 3, 1]));
        assert_eq!(run("1 2 3 2 5 roll")?, integers(&[1, 3, 2]));
        assert_eq!(run("1 2 3 0 1 roll")?, integers(&[1, 2, 3]));
        Ok(())
    }

    #[test]
    fn counts_out_of_range() {
        let mut interpreter = Interpreter::new();
        assert_eq!(interpreter.run("1 2 5 copy").unwrap_err().kind, ErrorKind::RangeCheck);
        assert_eq!(interpreter.snapshot(), integers(&[1, 2, 5]));

        interpreter.run("clear").unwrap();
        assert_eq!(interpreter.run("1 2 2 index").unwrap_err().kind, ErrorKind::RangeCheck);
        assert_eq!(interpreter.run("clear 1 -1 index").unwrap_err().kind, ErrorKind::RangeCheck);
        assert_eq!(interpreter.run("clear 1 2 3 1 roll").unwrap_err().kind, ErrorKind::RangeCheck);
        assert_eq!(interpreter.run("clear 1 (x) index").unwrap_err().kind, ErrorKind::TypeCheck);

        interpreter.run("clear").unwrap();
        assert_eq!(interpreter.run("1 2 -1 1 roll").unwrap_err().kind, ErrorKind::RangeCheck);
        assert_eq!(interpreter.snapshot(), integers(&[1, 2, -1, 1]));
        assert_eq!(interpreter.run("clear 1 2 -1 index").unwrap_err().kind, ErrorKind::RangeCheck);
        assert_eq!(interpreter.snapshot(), integers(&[1, 2, -1]));
    }

    #[test]
    fn marks() -> anyhow::Result<()> {
        assert_eq!(run("1 mark 2 3 counttomark")?, vec![Value::Integer(1), Value::Mark, Value::Integer(2), Value::Integer(3), Value::Integer(2)]);
        assert_eq!(run("1 mark 2 mark 3 cleartomark")?, vec![Value::Integer(1), Value::Mark, Value::Integer(2)]);
        assert_eq!(Interpreter::new().run("1 counttomark").unwrap_err().kind, ErrorKind::UnmatchedMark);
        Ok(())
    }

    #[test]
    fn empty_stack_underflows() {
        for operator in ["pop", "exch", "dup", "copy", "index", "roll"] {
            assert_eq!(Interpreter::new().run(operator).unwrap_err().kind, ErrorKind::StackUnderflow, "{}", operator);
        }
    }
}

use crate::{
    error::{ErrorKind, ExecResult},
    interpreter::Interpreter,
    object::{Dictionary, Object},
};

use super::{expect_dictionary, expect_key, expect_length};

const INITIAL_CAPACITY_LIMIT: usize = 1024;

pub(super) fn builtin_def(interpreter: &mut Interpreter) -> ExecResult {
    let [key, value] = interpreter.pop_n()?;
    let key = expect_key(&key)?;
    interpreter.dictionaries().def(key, value)?;
    Ok(())
}

pub(super) fn builtin_load(interpreter: &mut Interpreter) -> ExecResult {
    let [key] = interpreter.pop_n()?;
    let value = interpreter.dictionaries().lookup(&expect_key(&key)?)?;
    interpreter.push(value)
}

pub(super) fn builtin_store(interpreter: &mut Interpreter) -> ExecResult {
    let [key, value] = interpreter.pop_n()?;
    let key = expect_key(&key)?;
    interpreter.dictionaries().store(key, value)?;
    Ok(())
}

pub(super) fn builtin_begin(interpreter: &mut Interpreter) -> ExecResult {
    let [dictionary] = interpreter.pop_n()?;
    let dictionary = expect_dictionary(&dictionary)?;
    interpreter.dictionaries_mut().begin(dictionary)?;
    Ok(())
}

pub(super) fn builtin_end(interpreter: &mut Interpreter) -> ExecResult {
    interpreter.dictionaries_mut().end()?;
    Ok(())
}

pub(super) fn builtin_dict(interpreter: &mut Interpreter) -> ExecResult {
    // The capacity is only a hint; dictionaries grow as needed
    let [capacity] = interpreter.pop_n()?;
    let capacity = expect_length(interpreter, &capacity)?;
    interpreter.push(Object::Dictionary(Dictionary::with_capacity(capacity.min(INITIAL_CAPACITY_LIMIT))))
}

pub(super) fn builtin_currentdict(interpreter: &mut Interpreter) -> ExecResult {
    let current = interpreter.current_dictionary().clone();
    interpreter.push(Object::Dictionary(current))
}

pub(super) fn builtin_countdictstack(interpreter: &mut Interpreter) -> ExecResult {
    let depth = interpreter.dictionaries().depth();
    interpreter.push(Object::Integer(depth as i64))
}

pub(super) fn builtin_known(interpreter: &mut Interpreter) -> ExecResult {
    let [dictionary, key] = interpreter.pop_n()?;
    let known = expect_dictionary(&dictionary)?.contains(&expect_key(&key)?);
    interpreter.push(Object::Boolean(known))
}

pub(super) fn builtin_where(interpreter: &mut Interpreter) -> ExecResult {
    let [key] = interpreter.pop_n()?;
    let key = expect_key(&key)?;
    match interpreter.dictionaries().where_defined(&key).cloned() {
        Some(dictionary) => {
            interpreter.push(Object::Dictionary(dictionary))?;
            interpreter.push(Object::Boolean(true))
        }
        None => interpreter.push(Object::Boolean(false)),
    }
}

pub(super) fn builtin_undef(interpreter: &mut Interpreter) -> ExecResult {
    let [dictionary, key] = interpreter.pop_n()?;
    expect_dictionary(&dictionary)?.remove(&expect_key(&key)?)?;
    Ok(())
}

pub(super) fn builtin_userdict(interpreter: &mut Interpreter) -> ExecResult {
    let user = interpreter.dictionaries().user().clone();
    interpreter.push(Object::Dictionary(user))
}

pub(super) fn builtin_systemdict(interpreter: &mut Interpreter) -> ExecResult {
    let system = interpreter.dictionaries().system().clone();
    interpreter.push(Object::Dictionary(system))
}

pub(super) fn builtin_error_dict(interpreter: &mut Interpreter) -> ExecResult {
    let info = interpreter.error_info().clone();
    interpreter.push(Object::Dictionary(info))
}

pub(super) fn builtin_dict_open(interpreter: &mut Interpreter) -> ExecResult {
    interpreter.push(Object::Mark)
}

pub(super) fn builtin_dict_close(interpreter: &mut Interpreter) -> ExecResult {
    // mark key1 value1 ... keyN valueN >>
    let position = interpreter.operand_stack()
        .iter()
        .rposition(|object| matches!(object, Object::Mark))
        .ok_or(ErrorKind::UnmatchedMark)?;

    let items = &interpreter.operand_stack()[position + 1..];
    if items.len() % 2 != 0 { return Err(ErrorKind::RangeCheck.into()); }

    let dictionary = Dictionary::with_capacity(items.len() / 2);
    for pair in items.chunks_exact(2) {
        dictionary.insert(expect_key(&pair[0])?, pair[1].clone())?;
    }

    interpreter.stack_mut().truncate(position);
    interpreter.push(Object::Dictionary(dictionary))
}

pub(super) fn builtin_readonly(interpreter: &mut Interpreter) -> ExecResult {
    let [dictionary] = interpreter.pop_n()?;
    expect_dictionary(&dictionary)?.set_read_only();
    interpreter.push(dictionary)
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

    fn error_of(source: &str) -> Option<ErrorKind> {
        Interpreter::new().run(source).err().map(|error| error.kind)
    }

    #[test]
    fn def_load_store() -> anyhow::Result<()> {
        assert_eq!(run("/x 1 def /x load")?, vec![Value::Integer(1)]);
        assert_eq!(run("(x) 1 def x")?, vec![Value::Integer(1)]);
        assert_eq!(run("/x 1 def 1 dict begin /x 2 store end x")?, vec![Value::Integer(2)]);
        assert_eq!(error_of("/nothing load"), Some(ErrorKind::Undefined));
        assert_eq!(error_of("1 2 def"), Some(ErrorKind::TypeCheck));
        Ok(())
    }

    #[test]
    fn dictionary_stack_depth() -> anyhow::Result<()> {
        assert_eq!(run("countdictstack 5 dict begin countdictstack end countdictstack")?, vec![
            Value::Integer(2),
            Value::Integer(3),
            Value::Integer(2),
        ]);
        assert_eq!(error_of("1 begin"), Some(ErrorKind::TypeCheck));
        Ok(())
    }

    #[test]
    fn known_where_undef() -> anyhow::Result<()> {
        assert_eq!(run("/d 1 dict def d /k 1 put d /k known d /j known")?, vec![Value::Boolean(true), Value::Boolean(false)]);
        assert_eq!(run("/x 1 def /x where { userdict eq } if /y where")?, vec![Value::Boolean(true), Value::Boolean(false)]);
        assert_eq!(run("/add where { systemdict eq } if")?, vec![Value::Boolean(true)]);
        assert_eq!(run("/x 1 def userdict /x undef /x where")?, vec![Value::Boolean(false)]);
        assert_eq!(error_of("systemdict /add undef"), Some(ErrorKind::InvalidAccess));
        Ok(())
    }

    #[test]
    fn currentdict_tracks_begin() -> anyhow::Result<()> {
        assert_eq!(run("currentdict userdict eq 1 dict dup begin currentdict eq")?, vec![Value::Boolean(true), Value::Boolean(true)]);
        Ok(())
    }

    #[test]
    fn dictionary_literals() -> anyhow::Result<()> {
        assert_eq!(run("<< /a 1 /b (two) >> dup /a get exch /b get")?, vec![Value::Integer(1), Value::String("two".to_owned())]);
        assert_eq!(run("<< >> length")?, vec![Value::Integer(0)]);
        assert_eq!(error_of("<< /a >>"), Some(ErrorKind::RangeCheck));
        assert_eq!(error_of("/a 1 >>"), Some(ErrorKind::UnmatchedMark));
        assert_eq!(error_of("<< 1 2 >>"), Some(ErrorKind::TypeCheck));
        Ok(())
    }

    #[test]
    fn readonly_dictionaries() {
        assert_eq!(error_of("1 dict readonly begin /x 1 def"), Some(ErrorKind::InvalidAccess));
        assert_eq!(error_of("<< /a 1 >> readonly /a 2 put"), Some(ErrorKind::InvalidAccess));
    }
}

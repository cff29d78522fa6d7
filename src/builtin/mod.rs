use std::{ops::ControlFlow, rc::Rc};

use crate::{
    error::{ErrorKind, ExecResult, Unwind},
    interpreter::Interpreter,
    object::{ArrayRef, Dictionary, Object, Operator, OperatorFn, StringRef},
};

mod arithmetic;
mod composite;
mod control;
mod convert;
mod dict;
mod io;
mod logic;
mod operand;

use arithmetic::*;
use composite::*;
use control::*;
use convert::*;
use dict::*;
use io::*;
use logic::*;
use operand::*;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Number {
    Integer(i64),
    Real(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Self::Integer(value) => value as f64,
            Self::Real(value) => value,
        }
    }
}

impl From<Number> for Object {
    fn from(number: Number) -> Self {
        match number {
            Number::Integer(value) => Object::Integer(value),
            Number::Real(value) => Object::Real(value),
        }
    }
}

fn expect_number(object: &Object) -> ExecResult<Number> {
    match object {
        Object::Integer(value) => Ok(Number::Integer(*value)),
        Object::Real(value) => Ok(Number::Real(*value)),
        _ => Err(ErrorKind::TypeCheck.into()),
    }
}

fn expect_integer(object: &Object) -> ExecResult<i64> {
    match object {
        Object::Integer(value) => Ok(*value),
        _ => Err(ErrorKind::TypeCheck.into()),
    }
}

fn expect_bool(object: &Object) -> ExecResult<bool> {
    match object {
        Object::Boolean(value) => Ok(*value),
        _ => Err(ErrorKind::TypeCheck.into()),
    }
}

fn expect_procedure(object: &Object) -> ExecResult<ArrayRef> {
    match object {
        Object::Procedure(body) => Ok(body.clone()),
        _ => Err(ErrorKind::TypeCheck.into()),
    }
}

fn expect_dictionary(object: &Object) -> ExecResult<Dictionary> {
    match object {
        Object::Dictionary(dictionary) => Ok(dictionary.clone()),
        _ => Err(ErrorKind::TypeCheck.into()),
    }
}

fn expect_string(object: &Object) -> ExecResult<StringRef> {
    match object {
        Object::String(string) => Ok(string.clone()),
        _ => Err(ErrorKind::TypeCheck.into()),
    }
}

/// Dictionary keys: names, or strings standing in for the name they spell.
fn expect_key(object: &Object) -> ExecResult<Rc<str>> {
    match object {
        Object::Name(name) => Ok(name.key()),
        Object::String(string) => Ok(Rc::from(string.to_string_lossy())),
        _ => Err(ErrorKind::TypeCheck.into()),
    }
}

fn expect_count(value: i64) -> ExecResult<usize> {
    usize::try_from(value).map_err(|_| ErrorKind::RangeCheck.into())
}

// A requested element count: negative is RangeCheck, past the configured limit LimitCheck
fn expect_length(interpreter: &Interpreter, value: &Object) -> ExecResult<usize> {
    let len = expect_count(expect_integer(value)?)?;
    if len > interpreter.config().max_composite_len {
        return Err(ErrorKind::LimitCheck.into());
    }
    Ok(len)
}

fn expect_index(value: i64, len: usize) -> ExecResult<usize> {
    match usize::try_from(value) {
        Ok(index) if index < len => Ok(index),
        _ => Err(ErrorKind::RangeCheck.into()),
    }
}

/// Folds one run of a loop body into loop control: `exit` breaks, anything
/// else that unwinds keeps unwinding.
fn loop_step(result: ExecResult) -> ExecResult<ControlFlow<()>> {
    match result {
        Ok(()) => Ok(ControlFlow::Continue(())),
        Err(Unwind::Exit) => Ok(ControlFlow::Break(())),
        Err(other) => Err(other),
    }
}

const OPERATORS: &[(&str, OperatorFn)] = &[
    ("add", builtin_add),
    ("sub", builtin_sub),
    ("mul", builtin_mul),
    ("div", builtin_div),
    ("idiv", builtin_idiv),
    ("mod", builtin_mod),
    ("neg", builtin_neg),
    ("abs", builtin_abs),
    ("ceiling", builtin_ceiling),
    ("floor", builtin_floor),
    ("round", builtin_round),
    ("truncate", builtin_truncate),
    ("sqrt", builtin_sqrt),
    ("exp", builtin_exp),
    ("ln", builtin_ln),
    ("log", builtin_log),
    ("sin", builtin_sin),
    ("cos", builtin_cos),
    ("atan", builtin_atan),

    ("pop", builtin_pop),
    ("exch", builtin_exch),
    ("dup", builtin_dup),
    ("copy", builtin_copy),
    ("index", builtin_index),
    ("roll", builtin_roll),
    ("clear", builtin_clear),
    ("count", builtin_count),
    ("mark", builtin_mark),
    ("cleartomark", builtin_cleartomark),
    ("counttomark", builtin_counttomark),

    ("eq", builtin_eq),
    ("ne", builtin_ne),
    ("lt", builtin_lt),
    ("le", builtin_le),
    ("gt", builtin_gt),
    ("ge", builtin_ge),
    ("and", builtin_and),
    ("or", builtin_or),
    ("xor", builtin_xor),
    ("not", builtin_not),
    ("bitshift", builtin_bitshift),

    ("if", builtin_if),
    ("ifelse", builtin_ifelse),
    ("for", builtin_for),
    ("repeat", builtin_repeat),
    ("loop", builtin_loop),
    ("exit", builtin_exit),
    ("exec", builtin_exec),
    ("stop", builtin_stop),
    ("stopped", builtin_stopped),

    ("def", builtin_def),
    ("load", builtin_load),
    ("store", builtin_store),
    ("begin", builtin_begin),
    ("end", builtin_end),
    ("dict", builtin_dict),
    ("currentdict", builtin_currentdict),
    ("countdictstack", builtin_countdictstack),
    ("known", builtin_known),
    ("where", builtin_where),
    ("undef", builtin_undef),
    ("userdict", builtin_userdict),
    ("systemdict", builtin_systemdict),
    ("$error", builtin_error_dict),
    ("<<", builtin_dict_open),
    (">>", builtin_dict_close),
    ("readonly", builtin_readonly),

    ("array", builtin_array),
    ("string", builtin_string),
    ("length", builtin_length),
    ("get", builtin_get),
    ("put", builtin_put),
    ("getinterval", builtin_getinterval),
    ("putinterval", builtin_putinterval),
    ("forall", builtin_forall),
    ("aload", builtin_aload),
    ("astore", builtin_astore),

    ("type", builtin_type),
    ("cvx", builtin_cvx),
    ("cvlit", builtin_cvlit),
    ("xcheck", builtin_xcheck),
    ("cvi", builtin_cvi),
    ("cvr", builtin_cvr),
    ("cvn", builtin_cvn),
    ("cvs", builtin_cvs),

    ("print", builtin_print),
    ("=", builtin_print_text),
    ("==", builtin_print_syntax),
    ("stack", builtin_stack),
    ("pstack", builtin_pstack),
    ("flush", builtin_flush),
];

/// systemdict: every operator plus `true`, `false` and `null`.
pub(crate) fn system_dictionary() -> Dictionary {
    OPERATORS.iter()
        .map(|&(name, function)| (Rc::<str>::from(name), Object::Operator(Operator::new(name, function))))
        .chain([
            (Rc::<str>::from("true"), Object::Boolean(true)),
            (Rc::<str>::from("false"), Object::Boolean(false)),
            (Rc::<str>::from("null"), Object::Null),
        ])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_names_are_unique() {
        let dictionary = system_dictionary();
        assert_eq!(dictionary.len(), OPERATORS.len() + 3);
    }

    #[test]
    fn operators_know_their_names() {
        let dictionary = system_dictionary();
        match dictionary.get("roll") {
            Some(Object::Operator(operator)) => assert_eq!(operator.name(), "roll"),
            other => panic!("roll is bound to {:?}", other),
        }
    }

    #[test]
    fn indices_are_range_checked() {
        assert!(expect_index(2, 3).is_ok());
        assert!(expect_index(3, 3).is_err());
        assert!(expect_index(-1, 3).is_err());
        assert!(expect_count(-1).is_err());
    }
}

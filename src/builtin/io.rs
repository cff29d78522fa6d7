use crate::{
    error::{ErrorKind, ExecResult},
    interpreter::Interpreter,
    object::Object,
};

use super::expect_string;

fn emit(interpreter: &mut Interpreter, bytes: &[u8]) -> ExecResult {
    interpreter.output()
        .write_all(bytes)
        .map_err(|error| {
            tracing::warn!(%error, "output sink failed");
            ErrorKind::IoError.into()
        })
}

// One line per object, top of the stack first
fn emit_stack(interpreter: &mut Interpreter, form: fn(&Object) -> String) -> ExecResult {
    let lines: String = interpreter.operand_stack()
        .iter()
        .rev()
        .map(|object| form(object) + "\n")
        .collect();
    emit(interpreter, lines.as_bytes())
}

pub(super) fn builtin_print(interpreter: &mut Interpreter) -> ExecResult {
    let [string] = interpreter.pop_n()?;
    let bytes = expect_string(&string)?.to_vec();
    emit(interpreter, &bytes)
}

pub(super) fn builtin_print_text(interpreter: &mut Interpreter) -> ExecResult {
    let [object] = interpreter.pop_n()?;
    emit(interpreter, format!("{}\n", object.text_form()).as_bytes())
}

pub(super) fn builtin_print_syntax(interpreter: &mut Interpreter) -> ExecResult {
    let [object] = interpreter.pop_n()?;
    emit(interpreter, format!("{}\n", object.syntax_form()).as_bytes())
}

pub(super) fn builtin_stack(interpreter: &mut Interpreter) -> ExecResult {
    emit_stack(interpreter, Object::text_form)
}

pub(super) fn builtin_pstack(interpreter: &mut Interpreter) -> ExecResult {
    emit_stack(interpreter, Object::syntax_form)
}

pub(super) fn builtin_flush(interpreter: &mut Interpreter) -> ExecResult {
    interpreter.output()
        .flush()
        .map_err(|_| ErrorKind::IoError.into())
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};

    use pretty_assertions::assert_eq;

    use crate::{error::ErrorKind, interpreter::Interpreter, output::SharedOutput};

    fn output_of(source: &str) -> anyhow::Result<String> {
        let output = SharedOutput::new();
        Interpreter::new().with_output(output.clone()).run(source)?;
        Ok(output.contents())
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn printing_forms() -> anyhow::Result<()> {
        assert_eq!(output_of("(a\\)b) print")?, "a)b");
        assert_eq!(output_of("(a\\)b) ==")?, "(a\\)b)\n");
        assert_eq!(output_of("3.0 = 3 = /add load = { 1 /x } =")?, "3.0\n3\n--add--\n{1 /x}\n");
        assert_eq!(output_of("mark null == ==")?, "null\n-mark-\n");
        Ok(())
    }

    #[test]
    fn stack_printing_leaves_stack_alone() -> anyhow::Result<()> {
        let output = SharedOutput::new();
        let mut interpreter = Interpreter::new().with_output(output.clone());
        interpreter.run("1 2 pstack")?;
        assert_eq!(output.contents(), "2\n1\n");
        assert_eq!(interpreter.operand_stack().len(), 2);
        Ok(())
    }

    #[test]
    fn print_needs_a_string() {
        assert_eq!(Interpreter::new().with_output(SharedOutput::new()).run("1 print").unwrap_err().kind, ErrorKind::TypeCheck);
    }

    #[test]
    fn sink_failures_are_io_errors() {
        let mut interpreter = Interpreter::new().with_output(BrokenSink);
        assert_eq!(interpreter.run("(x) print").unwrap_err().kind, ErrorKind::IoError);
        assert_eq!(interpreter.run("flush").unwrap_err().kind, ErrorKind::IoError);
    }
}

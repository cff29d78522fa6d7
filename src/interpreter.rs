use std::io::{self, Write};

use crate::{
    builtin::system_dictionary,
    config::InterpreterConfig,
    dictionary::DictionaryStack,
    error::{ErrorKind, ExecResult, PsError},
    object::{ArrayRef, Dictionary, Name, Object, Value},
    parser::{parse, Program},
    stack::ensure_sufficient_stack,
};

/// One PostScript execution context: operand stack, dictionary stack and
/// output sink.
///
/// State persists across calls to [`Interpreter::run`], so a program can be
/// fed in pieces. Separate interpreters share nothing.
pub struct Interpreter {
    operand_stack: Vec<Object>,
    dictionaries: DictionaryStack,
    error_info: Dictionary,
    output: Box<dyn Write>,
    config: InterpreterConfig,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        let system = system_dictionary();
        system.set_read_only();

        Self {
            operand_stack: Vec::new(),
            dictionaries: DictionaryStack::new(system, config.max_dictionary_stack),
            error_info: Dictionary::new(),
            output: Box::new(io::stdout()),
            config,
            call_depth: 0,
        }
    }

    /// Replaces the sink that `print`, `=`, `==`, `stack` and `pstack` write to.
    pub fn with_output(mut self, output: impl Write + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Tokenizes, parses and evaluates `source`.
    ///
    /// On error the stacks keep whatever state they had when it was raised.
    pub fn run(&mut self, source: &str) -> Result<(), PsError> {
        let program = parse(source).map_err(|error| {
            tracing::warn!(%error, "parse failed");
            error
        })?;
        tracing::debug!(objects = program.len(), "running program");
        self.execute_program(&program)
    }

    pub fn execute_program(&mut self, program: &Program) -> Result<(), PsError> {
        program.objects()
            .iter()
            .try_for_each(|object| self.execute(object.clone()))
            .map_err(|unwind| {
                let error = unwind.into_error();
                tracing::warn!(%error, "uncaught error");
                error
            })
    }

    /// The operand stack, bottom first.
    pub fn operand_stack(&self) -> &[Object] {
        &self.operand_stack
    }

    /// Owned copy of the operand stack, bottom first.
    pub fn snapshot(&self) -> Vec<Value> {
        self.operand_stack.iter().map(Object::snapshot).collect()
    }

    /// The dictionary stack, bottom (systemdict) first.
    pub fn dictionary_stack(&self) -> &[Dictionary] {
        self.dictionaries.frames()
    }

    pub fn current_dictionary(&self) -> &Dictionary {
        self.dictionaries.current()
    }

    /// `$error`: details of the last error caught by `stopped`.
    pub fn error_info(&self) -> &Dictionary {
        &self.error_info
    }

    pub(crate) fn dictionaries(&self) -> &DictionaryStack {
        &self.dictionaries
    }

    pub(crate) fn dictionaries_mut(&mut self) -> &mut DictionaryStack {
        &mut self.dictionaries
    }

    pub(crate) fn stack_mut(&mut self) -> &mut Vec<Object> {
        &mut self.operand_stack
    }

    pub(crate) fn output(&mut self) -> &mut dyn Write {
        &mut *self.output
    }

    pub(crate) fn push(&mut self, object: Object) -> ExecResult {
        if self.operand_stack.len() >= self.config.max_operand_stack {
            return Err(ErrorKind::StackOverflow.into());
        }
        self.operand_stack.push(object);
        Ok(())
    }

    pub(crate) fn require(&self, count: usize) -> ExecResult {
        if self.operand_stack.len() < count { return Err(ErrorKind::StackUnderflow.into()); }
        Ok(())
    }

    /// The object `depth` places below the top, without popping.
    pub(crate) fn peek(&self, depth: usize) -> ExecResult<&Object> {
        self.require(depth + 1)?;
        Ok(&self.operand_stack[self.operand_stack.len() - 1 - depth])
    }

    pub(crate) fn pop(&mut self) -> ExecResult<Object> {
        self.operand_stack.pop().ok_or_else(|| ErrorKind::StackUnderflow.into())
    }

    /// Pops the top `N` objects, returned in the order they were pushed.
    /// Leaves the stack untouched when it holds fewer than `N`.
    pub(crate) fn pop_n<const N: usize>(&mut self) -> ExecResult<[Object; N]> {
        self.require(N)?;
        let split = self.operand_stack.len() - N;
        self.operand_stack.split_off(split)
            .try_into()
            .map_err(|_| ErrorKind::StackUnderflow.into())
    }

    pub(crate) fn record_error(&mut self, error: &PsError) {
        let command = match &error.command {
            Some(command) => Object::literal_name(command),
            None => Object::Null,
        };
        // A user may have made $error read-only; the record is then skipped
        let _ = self.error_info.insert("newerror".into(), Object::Boolean(true))
            .and_then(|_| self.error_info.insert("errorname".into(), Object::literal_name(error.kind.name())))
            .and_then(|_| self.error_info.insert("command".into(), command));
    }

    pub(crate) fn execute(&mut self, object: Object) -> ExecResult {
        // Only executable names do anything when met in a sequence. Literals
        // and procedures alike are pushed.
        match object {
            Object::Name(name) if name.is_executable() => self.execute_name(&name),
            other => self.push(other),
        }
    }

    fn execute_name(&mut self, name: &Name) -> ExecResult {
        let value = self.dictionaries.lookup(name.text())
            .map_err(|kind| PsError::new(kind).with_command(name.text()))?;
        self.invoke(value).map_err(|unwind| unwind.with_command(name.text()))
    }

    /// Runs `object` the way `exec` does: operators are called, procedures
    /// evaluated, executable names resolved, and anything else pushed back.
    pub(crate) fn invoke(&mut self, object: Object) -> ExecResult {
        match object {
            Object::Operator(operator) => operator.call(self).map_err(|unwind| unwind.with_command(operator.name())),
            Object::Procedure(body) => self.call(&body),
            Object::Name(name) if name.is_executable() => self.execute_name(&name),
            other => self.push(other),
        }
    }

    pub(crate) fn call(&mut self, body: &ArrayRef) -> ExecResult {
        if self.call_depth >= self.config.max_call_depth {
            return Err(ErrorKind::ExecStackOverflow.into());
        }

        self.call_depth += 1;
        tracing::trace!(depth = self.call_depth, len = body.len(), "call");
        let result = ensure_sufficient_stack(|| self.evaluate(body));
        self.call_depth -= 1;
        result
    }

    fn evaluate(&mut self, body: &ArrayRef) -> ExecResult {
        // Elements are fetched one at a time since the body may be the
        // target of a `put` while it runs
        for index in 0..body.len() {
            if let Some(object) = body.get(index) {
                self.execute(object)?;
            }
        }
        Ok(())
    }
}

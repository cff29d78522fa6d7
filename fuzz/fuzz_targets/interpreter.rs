#![no_main]

use core::fmt;

use itertools::Itertools;
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};
use pscript::{Interpreter, InterpreterConfig, SharedOutput};

// A handful of names so that definitions and lookups collide
#[derive(Arbitrary, Debug)]
enum Identifier {
    A, B, C, D,
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            Identifier::A => "a",
            Identifier::B => "b",
            Identifier::C => "c",
            Identifier::D => "d",
        })
    }
}

// Operators, but never `loop`: nothing guarantees it would terminate
#[derive(Arbitrary, Debug)]
enum PsAtom {
    Add, Sub, Mul, Div, Idiv, Mod, Neg, Sqrt, Round,
    Pop, Exch, Dup, Copy, Index, Roll, Clear, Count,
    Mark, ClearToMark, CountToMark,
    Eq, Ne, Lt, Gt, And, Or, Not, True, False, Null,
    If, IfElse, For, Repeat, Exit, Exec, Stop, Stopped,
    Def, Load, Store, Begin, End, Dict, Known, Where, Undef,
    DictOpen, DictClose,
    Array, StringOp, Length, Get, Put, GetInterval, PutInterval,
    Forall, Aload, Astore,
    Type, Cvx, Cvlit, Cvi, Cvs, Cvn,
    Print, Equals, Pstack,

    Name(Identifier),
    LiteralName(Identifier),
    Integer(i8),
    Real(i8),
    Text(String),
}

impl fmt::Display for PsAtom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            PsAtom::Add => "add",
            PsAtom::Sub => "sub",
            PsAtom::Mul => "mul",
            PsAtom::Div => "div",
            PsAtom::Idiv => "idiv",
            PsAtom::Mod => "mod",
            PsAtom::Neg => "neg",
            PsAtom::Sqrt => "sqrt",
            PsAtom::Round => "round",
            PsAtom::Pop => "pop",
            PsAtom::Exch => "exch",
            PsAtom::Dup => "dup",
            PsAtom::Copy => "copy",
            PsAtom::Index => "index",
            PsAtom::Roll => "roll",
            PsAtom::Clear => "clear",
            PsAtom::Count => "count",
            PsAtom::Mark => "mark",
            PsAtom::ClearToMark => "cleartomark",
            PsAtom::CountToMark => "counttomark",
            PsAtom::Eq => "eq",
            PsAtom::Ne => "ne",
            PsAtom::Lt => "lt",
            PsAtom::Gt => "gt",
            PsAtom::And => "and",
            PsAtom::Or => "or",
            PsAtom::Not => "not",
            PsAtom::True => "true",
            PsAtom::False => "false",
            PsAtom::Null => "null",
            PsAtom::If => "if",
            PsAtom::IfElse => "ifelse",
            PsAtom::For => "for",
            PsAtom::Repeat => "repeat",
            PsAtom::Exit => "exit",
            PsAtom::Exec => "exec",
            PsAtom::Stop => "stop",
            PsAtom::Stopped => "stopped",
            PsAtom::Def => "def",
            PsAtom::Load => "load",
            PsAtom::Store => "store",
            PsAtom::Begin => "begin",
            PsAtom::End => "end",
            PsAtom::Dict => "dict",
            PsAtom::Known => "known",
            PsAtom::Where => "where",
            PsAtom::Undef => "undef",
            PsAtom::DictOpen => "<<",
            PsAtom::DictClose => ">>",
            PsAtom::Array => "array",
            PsAtom::StringOp => "string",
            PsAtom::Length => "length",
            PsAtom::Get => "get",
            PsAtom::Put => "put",
            PsAtom::GetInterval => "getinterval",
            PsAtom::PutInterval => "putinterval",
            PsAtom::Forall => "forall",
            PsAtom::Aload => "aload",
            PsAtom::Astore => "astore",
            PsAtom::Type => "type",
            PsAtom::Cvx => "cvx",
            PsAtom::Cvlit => "cvlit",
            PsAtom::Cvi => "cvi",
            PsAtom::Cvs => "cvs",
            PsAtom::Cvn => "cvn",
            PsAtom::Print => "print",
            PsAtom::Equals => "=",
            PsAtom::Pstack => "pstack",
            PsAtom::Name(name) => return write!(f, "{}", name),
            PsAtom::LiteralName(name) => return write!(f, "/{}", name),
            PsAtom::Integer(value) => return write!(f, "{}", value),
            PsAtom::Real(value) => return write!(f, "{}.5", value),
            PsAtom::Text(text) => {
                let text: String = text.chars().filter(char::is_ascii_alphanumeric).collect();
                return write!(f, "({})", text);
            }
        })
    }
}

#[derive(Arbitrary, Debug)]
enum PsCommand {
    Procedure(Vec<PsCommand>),
    Array(Vec<PsCommand>),

    Atom(PsAtom),
}

fn stringify_body(values: &[PsCommand]) -> String {
    values.iter()
        .map(PsCommand::to_string)
        .join(" ")
}

impl fmt::Display for PsCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PsCommand::Procedure(body) => write!(f, "{{ {} }}", stringify_body(body)),
            PsCommand::Array(body) => write!(f, "[ {} ]", stringify_body(body)),
            PsCommand::Atom(atom) => atom.fmt(f),
        }
    }
}

fuzz_target!(|lines: Vec<Vec<PsCommand>>| {
    let config = InterpreterConfig {
        max_call_depth: 64,
        max_operand_stack: 4096,
        max_dictionary_stack: 32,
        max_composite_len: 4096,
    };
    let mut interpreter = Interpreter::with_config(config).with_output(SharedOutput::new());

    for line in lines {
        let _ = interpreter.run(&stringify_body(&line));
    }
    let _ = interpreter.snapshot();
});

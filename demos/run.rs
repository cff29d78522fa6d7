use pscript::Interpreter;

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Only initialize if RUST_LOG is set
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() {
    init_tracing();

    let program = vec![
        "/spam { eggs 3 mul } def",
        "spam",
        "/eggs 20 def",
        "spam",
        "/factorial { dup 1 le { pop 1 } { dup 1 sub factorial mul } ifelse } def",
        "10 factorial",
        "{ 1 0 div } stopped",
        "pstack",
    ];

    let mut interpreter = Interpreter::new();
    for source in program {
        match interpreter.run(source) {
            Ok(()) => println!("{}: {:?}", source, interpreter.operand_stack()),
            Err(err) => println!("{}: {}", source, err)
        }
    }
}

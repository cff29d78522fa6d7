use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt};
use pscript::Interpreter;

async fn query(stdout: &mut io::Stdout, lines: &mut io::Lines<io::BufReader<io::Stdin>>) -> io::Result<Option<String>> {
    stdout.write_all("PS> ".as_bytes()).await?;
    stdout.flush().await?;
    lines.next_line().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut interpreter = Interpreter::new();
    let mut lines = io::BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    // The stacks carry over from one line to the next
    while let Some(line) = query(&mut stdout, &mut lines).await? {
        match interpreter.run(&line) {
            Ok(()) => {
                let stack: Vec<String> = interpreter.operand_stack().iter().map(|object| object.syntax_form()).collect();
                println!("[{}]", stack.join(" "));
            }
            Err(err) => println!("{}", err),
        }
    }

    Ok(())
}

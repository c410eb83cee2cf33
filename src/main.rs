mod cli;

use std::error::Error;
use std::fs;
use std::io::{self, Write};

use cli::Cli;
use ember::interpreter::Interpreter;
use log::error;

const BANNER: &str = ">> you're in the ember REPL. to exit: either type exit and hit return or ctrl + c <<";

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::init();

    simple_logger::init_with_level((&args.verbosity).into())?;

    match &args.source {
        Some(path) => run_file(path),
        None => {
            start_repl();
            Ok(())
        }
    }
}

fn run_file(path: &std::path::Path) -> Result<(), Box<dyn Error>> {
    let canonical = fs::canonicalize(path)?;
    let source = fs::read_to_string(&canonical)?;

    let mut stdout = io::stdout();
    let mut interpreter = Interpreter::new(&mut stdout);

    if let Err(err) = ember::run(&source, &mut interpreter) {
        error!("{err}");
        eprintln!("{err}");
        std::process::exit(-1);
    }

    Ok(())
}

fn start_repl() {
    println!("{BANNER}");

    let mut stdout = io::stdout();
    let mut interpreter = Interpreter::new(&mut stdout);

    loop {
        print!(">> ");
        io::stdout().flush().ok();

        let mut line = String::new();
        if io::stdin().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }

        if line.trim() == "exit" {
            break;
        }

        if let Err(err) = ember::run(&line, &mut interpreter) {
            error!("{err}");
            println!("{err}");
        }
    }
}

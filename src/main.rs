use std::{env, io, process};

use nebula_lang::Nebula;

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut nebula = Nebula::new(io::stdout());

    match args.len() {
        n if n > 2 => {
            eprintln!("usage: nebula [script]");
            process::exit(1);
        }
        2 => {
            if let Err(error) = nebula.run_file(&args[1]) {
                eprintln!("nebula error: {error}");
                process::exit(1);
            }
        }
        _ => nebula.run_prompt(),
    };
}

//! Tokenize an XQuery file line by line and print one JSON object per line.

use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::process;

use xqlex::{expected_token_names, Mode, XQueryLexer};

fn print_usage() {
    eprintln!("Usage: xqtok [FILE]          tokenize FILE (or stdin)");
    eprintln!("       xqtok --expected MODE  list the terminals admissible in MODE");
}

fn read_input(path: Option<&str>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn tokenize(path: Option<&str>) -> io::Result<()> {
    let text = read_input(path)?;
    let mut lexer = XQueryLexer::new();
    let mut state: Option<String> = None;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (row, line) in text.lines().enumerate() {
        let lt = lexer.tokenize_line(line, state.as_deref(), row);
        serde_json::to_writer(&mut out, &lt)?;
        writeln!(out)?;
        state = Some(lt.state);
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    let result = match args.get(1).map(String::as_str) {
        Some("-h" | "--help") => {
            print_usage();
            Ok(())
        }
        Some("--expected") => {
            let Some(name) = args.get(2) else {
                print_usage();
                process::exit(1);
            };
            match name.parse::<Mode>() {
                Ok(mode) => {
                    for token in expected_token_names(mode.token_set()) {
                        println!("{}", token);
                    }
                    Ok(())
                }
                Err(e) => {
                    eprintln!("{}", e);
                    process::exit(1);
                }
            }
        }
        path => tokenize(path),
    };

    if let Err(e) = result {
        eprintln!("xqtok: {}", e);
        process::exit(1);
    }
}

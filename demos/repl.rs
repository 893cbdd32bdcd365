use blisp::evaluator::Environment;
use blisp::parser::{ParseConfig, parse_program_with_config};
use blisp::{evaluate_top_level, render};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::panic;
use std::process;

fn main() {
    init_logging();

    let result = panic::catch_unwind(|| {
        if let Err(err) = run_repl() {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    });

    if let Err(panic_info) = result {
        eprintln!("The REPL encountered an unexpected error and must exit.");

        if let Some(msg) = panic_info.downcast_ref::<&str>() {
            eprintln!("Error: {msg}");
        } else if let Some(msg) = panic_info.downcast_ref::<String>() {
            eprintln!("Error: {msg}");
        } else {
            eprintln!("Error: Unknown panic occurred");
        }

        process::exit(1);
    }
}

/// Log to stderr, filtered by BLISP_LOG, then RUST_LOG, defaulting to warn
fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_env("BLISP_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_repl() -> Result<(), ReadlineError> {
    println!("blisp {}", env!("CARGO_PKG_VERSION"));
    println!("Enter expressions like: + 1 (* 2 3)");
    println!("Type :help for more commands, or Ctrl+C to exit.");
    println!();

    let mut rl = DefaultEditor::new()?;
    let config = ParseConfig {
        handle_comments: true,
    };
    let mut show_ast = false;

    loop {
        match rl.readline("blisp> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":ast" => {
                        show_ast = !show_ast;
                        println!("Parse tree display {}", if show_ast { "on" } else { "off" });
                        continue;
                    }
                    ":env" => {
                        print_environment(&Environment::with_builtins());
                        continue;
                    }
                    ":quit" | ":exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                match parse_program_with_config(line, config) {
                    Ok(tree) => {
                        if show_ast {
                            print!("{tree}");
                        }
                        println!("{}", render(&evaluate_top_level(&tree)));
                    }
                    Err(e) => println!("{e}"),
                }
            }

            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => return Err(err),
        }
    }

    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  :help      - Show this help message");
    println!("  :ast       - Toggle printing the parse tree of each line");
    println!("  :env       - Show the builtin bindings");
    println!("  :quit      - Exit the interpreter");
    println!("  :exit      - Exit the interpreter");
    println!("  Ctrl+C     - Exit the interpreter");
    println!();
    println!("Each line is an implicit S-expression: `+ 1 2` is `(+ 1 2)`.");
    println!("Text after ';' is a comment.");
    println!();
    println!("Values:");
    println!("  Numbers: 42, -5");
    println!("  S-expressions: (+ 1 2), evaluated");
    println!("  Q-expressions: {{1 2 3}}, left as data");
    println!();
    println!("Builtins:");
    println!("  Arithmetic: +, -, *, /, %, ^");
    println!("  Lists: head, tail, list, eval, join");
    println!();
    println!("Examples:");
    println!("  (- 5)");
    println!("  head {{1 2 3}}");
    println!("  eval (list + 1 2)");
    println!("  join {{1 2}} {{3}}");
    println!();
}

fn print_environment(env: &Environment) {
    if env.is_empty() {
        println!("Environment is empty.");
        return;
    }

    println!("Builtin functions ({}):", env.len());
    let mut col = 0;
    for (name, _) in env.iter() {
        print!("  {name:<15}");
        col += 1;
        if col % 4 == 0 {
            println!();
        }
    }
    if col % 4 != 0 {
        println!();
    }
    println!();
}

use clap::{Parser, Subcommand};
use merv::*;
use miette::{IntoDiagnostic, Report, WrapErr};
use std::path::{Path, PathBuf};
use std::{
    fs,
    io::{self, Write},
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Bind a variable, e.g. `--var ready=true` (repeatable)
    #[arg(short, long = "var", global = true, value_parser = parse_binding)]
    vars: Vec<(String, Value)>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the tokens of a file
    Tokenize { filename: PathBuf },
    /// Print the expression tree of a file
    Parse { filename: PathBuf },
    /// Evaluate a single expression
    Eval { expression: String },
    /// Read and evaluate expressions line by line
    Repl,
}

/// Reads `name=value`; the value is a bool, a number, or else a string.
fn parse_binding(arg: &str) -> Result<(String, Value), String> {
    let (name, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got `{arg}`"))?;
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
        return Err(format!("`{name}` is not a valid variable name"));
    }

    let value = match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => match raw.parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::from(raw),
        },
    };
    Ok((name.to_string(), value))
}

fn read_source(filename: &Path) -> miette::Result<String> {
    fs::read_to_string(filename)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading '{}' failed", filename.display()))
}

fn evaluate(source: &str, env: &SharedEnv) -> miette::Result<Value> {
    let thunk =
        parse(source, env).map_err(|e| Report::new(e).with_source_code(source.to_string()))?;
    Ok(thunk.call()?)
}

fn main() -> miette::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let mut env = Environment::new();
    builtins::install(&mut env);
    for (name, value) in cli.vars {
        env.define_variable(name, value);
    }
    let env = env.shared();

    match cli.command {
        Commands::Tokenize { filename } => {
            let file_contents = read_source(&filename)?;

            for token in Lexer::new(&file_contents) {
                let token =
                    token.map_err(|e| Report::new(e).with_source_code(file_contents.clone()))?;
                println!("{:?} {:?} @{}", token.kind, token.slice, token.offset);
            }
        }
        Commands::Parse { filename } => {
            let file_contents = read_source(&filename)?;

            let thunk = parse(&file_contents, &env)
                .map_err(|e| Report::new(e).with_source_code(file_contents.clone()))?;
            println!("{}", thunk.expr());
        }
        Commands::Eval { expression } => {
            println!("{}", evaluate(&expression, &env)?);
        }
        Commands::Repl => loop {
            print!("merv> ");
            io::stdout().flush().into_diagnostic()?;

            let mut input = String::new();
            if io::stdin().read_line(&mut input).into_diagnostic()? == 0 {
                break;
            }
            let input = input.trim();
            if input.is_empty() {
                continue;
            }
            if input.eq_ignore_ascii_case("exit") {
                break;
            }
            if input == ":env" {
                print!("{}", env.borrow());
                continue;
            }

            match evaluate(input, &env) {
                Ok(value) => println!("{value}"),
                Err(report) => eprintln!("{report:?}"),
            }
        },
    }

    Ok(())
}

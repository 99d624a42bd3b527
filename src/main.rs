use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::scanner::Scanner;
use rox::session::{Lox, RunStatus};
use rox::token::Token;

/// Exit code for a malformed command line.
const EX_USAGE: i32 = 64;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print the token list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a Lox program
    Run { filename: Option<PathBuf> },

    /// Starts an interactive prompt
    Repl,
}

/// Reads the contents of a file into a String
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn missing_file(command: &str) -> ! {
    info!("No filepath provided for {}", command);
    eprintln!("No input filepath was provided. Usage: rox {} <filename>", command);
    std::process::exit(EX_USAGE);
}

fn exit_with(status: RunStatus) {
    if status != RunStatus::Ok {
        debug!("Exiting with {:?}", status);
        std::process::exit(status.exit_code());
    }
}

fn tokenize(source: &str, json: bool) -> Result<()> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut tokenized = true;

    for token in Scanner::new(source) {
        match token {
            Ok(token) => {
                if !json {
                    println!("{}", token);
                }
                tokens.push(token);
            }

            Err(e) => {
                tokenized = false;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    if json {
        let rendered = serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?;
        println!("{}", rendered);
    }

    if !tokenized {
        exit_with(RunStatus::StaticError);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn repl() -> Result<()> {
    info!("Starting REPL");

    let mut lox = Lox::new();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }

        let status: RunStatus = lox.run_line(&line);
        debug!("Line finished with {:?}", status);
    }

    info!("REPL closed");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => {
            let filename = filename.unwrap_or_else(|| missing_file("tokenize"));
            tokenize(&read_file(filename)?, json)?;
        }

        Commands::Evaluate { filename } => {
            let filename = filename.unwrap_or_else(|| missing_file("evaluate"));
            let source: String = read_file(filename)?;

            exit_with(Lox::new().run_line(&source));
        }

        Commands::Run { filename } => {
            let filename = filename.unwrap_or_else(|| missing_file("run"));
            let source: String = read_file(filename)?;

            info!("Provided input:\n {}", source);

            exit_with(Lox::new().run(&source));
        }

        Commands::Repl => repl()?,
    }

    Ok(())
}

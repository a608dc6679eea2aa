use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use std::path::{Path, PathBuf};
use std::{fs::read_to_string, process::ExitCode};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const COMPILE_ERROR_CODE: u8 = 65;
const RUNTIME_ERROR_CODE: u8 = 70;

#[derive(Debug, Parser)]
#[clap(name = "pardal", version)]
pub struct CLArgs {
    #[clap(subcommand)]
    pub routine: PardalCommand,
}

#[derive(Debug, Subcommand)]
pub enum PardalCommand {
    /// Print the token stream of a file.
    Tokenize {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "basic")]
        format: ErrorFormat,
    },
    /// Print the statement outline of a file.
    Parse {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "basic")]
        format: ErrorFormat,
    },
    Run {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "pretty")]
        format: ErrorFormat,
    },
    /// Run a file one node at a time.
    Debug {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "pretty")]
        format: ErrorFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ErrorFormat {
    Debug,
    Basic,
    Pretty,
}

fn main() -> ExitCode {
    pardal_main().expect("Encountered an error!")
}

fn install_tracing() {
    let filter =
        EnvFilter::try_from_env("PARDAL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn pardal_main() -> Result<ExitCode> {
    color_eyre::install().expect("Can't fail at first call!");
    install_tracing();
    let args = CLArgs::parse();
    let code = match args.routine {
        PardalCommand::Tokenize { path, format } => {
            let src = read_to_string(&path)?;
            tokenize(&src, &path, format)
        }
        PardalCommand::Parse { path, format } => {
            let src = read_to_string(&path)?;
            parse(&src, &path, format)
        }
        PardalCommand::Run { path, format } => {
            let src = read_to_string(&path)?;
            run(&src, &path, format)
        }
        PardalCommand::Debug { path, format } => {
            let src = read_to_string(&path)?;
            debug(&src, &path, format)?
        }
    };
    Ok(code)
}

fn tokenize(src: &str, path: &Path, format: ErrorFormat) -> ExitCode {
    use pardal::lexer::formatter::{
        BasicFormatter, DebugFormatter, PrettyFormatter, TokenFormatter,
    };
    use pardal::lexer::{Lexer, TokenKind};

    let mut lexer = Lexer::new(src);
    let formatter: Box<dyn TokenFormatter + '_> = match format {
        ErrorFormat::Debug => Box::new(DebugFormatter),
        ErrorFormat::Basic => Box::new(BasicFormatter::new(src)),
        ErrorFormat::Pretty => Box::new(PrettyFormatter::new(src, path)),
    };
    let mut succeeded = true;
    loop {
        match lexer.next_token() {
            Ok(token) => {
                println!("{}", formatter.format(&token));
                if matches!(token.kind, TokenKind::Eof) {
                    break;
                }
            }
            Err(error) => {
                eprintln!("{}", formatter.format_error(&error));
                succeeded = false;
            }
        }
    }
    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(COMPILE_ERROR_CODE)
    }
}

fn parse_program(
    src: &str,
    path: &Path,
    format: ErrorFormat,
) -> Option<pardal::parser::Program> {
    use pardal::parser::formatter::{
        BasicParserFormatter, DebugParserFormatter, ParserFormatter, PrettyParserFormatter,
    };
    use pardal::parser::Parser;

    match Parser::new(src).parse() {
        Ok(program) => Some(program),
        Err(error) => {
            let formatter: Box<dyn ParserFormatter + '_> = match format {
                ErrorFormat::Debug => Box::new(DebugParserFormatter),
                ErrorFormat::Basic => Box::new(BasicParserFormatter::new(src)),
                ErrorFormat::Pretty => Box::new(PrettyParserFormatter::new(src, path)),
            };
            eprintln!("{}", formatter.format_error(&error));
            None
        }
    }
}

fn parse(src: &str, path: &Path, format: ErrorFormat) -> ExitCode {
    use pardal::parser::formatter::{BasicParserFormatter, ParserFormatter};

    match parse_program(src, path, format) {
        Some(program) => {
            print!("{}", BasicParserFormatter::new(src).format(&program));
            ExitCode::SUCCESS
        }
        None => ExitCode::from(COMPILE_ERROR_CODE),
    }
}

fn value_formatter<'src>(
    src: &'src str,
    path: &'src Path,
    format: ErrorFormat,
) -> Box<dyn pardal::value::formatter::ValueFormatter + 'src> {
    use pardal::value::formatter::{BasicFormatter, DebugFormatter, PrettyFormatter};

    match format {
        ErrorFormat::Debug => Box::new(DebugFormatter),
        ErrorFormat::Basic => Box::new(BasicFormatter::new(src)),
        ErrorFormat::Pretty => Box::new(PrettyFormatter::new(src, path)),
    }
}

fn run(src: &str, path: &Path, format: ErrorFormat) -> ExitCode {
    use pardal::interpreter::{StdioContext, TreeWalkInterpreter};

    let Some(program) = parse_program(src, path, format) else {
        return ExitCode::from(COMPILE_ERROR_CODE);
    };
    let mut interpreter = TreeWalkInterpreter::new(program);
    match interpreter.run(&mut StdioContext) {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", value_formatter(src, path, format).format_error(&error));
            ExitCode::from(RUNTIME_ERROR_CODE)
        }
    }
}

fn debug(src: &str, path: &Path, format: ErrorFormat) -> Result<ExitCode> {
    use pardal::debugger::{DebugDriver, DebugError, DebugSession, SharedStdin};
    use pardal::interpreter::StdioContext;

    let Some(program) = parse_program(src, path, format) else {
        return Ok(ExitCode::from(COMPILE_ERROR_CODE));
    };
    let mut session = DebugSession::new(program, StdioContext);
    let mut driver = DebugDriver::new(SharedStdin, std::io::stdout());
    match driver.run(&mut session) {
        Ok(_) | Err(DebugError::ProgramExit) | Err(DebugError::ProgramFinished) => {
            Ok(ExitCode::SUCCESS)
        }
        Err(DebugError::Runtime(error)) => {
            eprintln!("{}", value_formatter(src, path, format).format_error(&error));
            Ok(ExitCode::from(RUNTIME_ERROR_CODE))
        }
        Err(error) => Err(error.into()),
    }
}

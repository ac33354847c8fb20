use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path;
use std::process;

use clap::{ArgAction, Parser, ValueEnum};
use log::{error, LevelFilter};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use search_trees::script::Session;
use search_trees::{ColorBalanced, HeightBalanced, LevelBalanced, ScriptError, Strategy, Unbalanced};

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum StrategyKind {
    Unbalanced,
    HeightBalanced,
    ColorBalanced,
    LevelBalanced,
}

/// Runs a command script against an ordered map built on the chosen balancing strategy.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    #[arg(name = "script-file", index(1))]
    script_file: Option<path::PathBuf>,
    #[arg(long, short, value_enum, default_value_t = StrategyKind::HeightBalanced)]
    strategy: StrategyKind,
    /// Validate every invariant after each mutating command.
    #[arg(long, short)]
    check: bool,
    #[arg(short, action = ArgAction::Count)]
    verbose: u8,
}

fn run<S: Strategy>(input: Box<dyn BufRead>, check: bool) -> Result<(), ScriptError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut session: Session<S> = Session::new(check);
    session.run(input, &mut out)?;
    out.flush()?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let config = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();
    if let Err(e) = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto) {
        eprintln!("cannot install logger: {}", e);
    }

    let input: Box<dyn BufRead> = match &cli.script_file {
        Some(script_file) => match fs::File::open(script_file) {
            Ok(f) => Box::new(BufReader::new(f)),
            Err(e) => {
                error!("cannot open {}: {}", script_file.display(), e);
                process::exit(2);
            },
        },
        None => Box::new(BufReader::new(io::stdin())),
    };

    let res = match cli.strategy {
        StrategyKind::Unbalanced => run::<Unbalanced>(input, cli.check),
        StrategyKind::HeightBalanced => run::<HeightBalanced>(input, cli.check),
        StrategyKind::ColorBalanced => run::<ColorBalanced>(input, cli.check),
        StrategyKind::LevelBalanced => run::<LevelBalanced>(input, cli.check),
    };

    if let Err(e) = res {
        error!("{}", e);
        process::exit(1);
    }
}

use ansi_term::Style;
use basic::lang::Error;
use basic::mach::{read_blobs, Config, Loader};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "basic-load", version, about = "Load and check a BASIC program")]
pub struct Args {
    /// Program to load, `.bas` may be left off
    pub file: PathBuf,

    /// Columns per tab stop
    #[arg(long = "tab", value_name = "N", default_value_t = 4)]
    pub tab_width: usize,

    /// Lowest array index
    #[arg(
        long,
        value_name = "0|1",
        default_value_t = 0,
        value_parser = clap::value_parser!(i16).range(0..=1)
    )]
    pub base: i16,

    /// Start with the MMDEBUG gate open
    #[arg(long)]
    pub debug: bool,

    /// Print the stored program
    #[arg(long)]
    pub list: bool,

    /// Print every file opened
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            tab_width: self.tab_width,
            debug: self.debug,
            base: self.base,
            ..Config::default()
        }
    }
}

pub fn main() {
    let args = Args::parse();
    if let Err(error) = run(&args) {
        eprintln!("{}", Style::new().bold().paint(error.to_string()));
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let mut loader = Loader::new(args.config());
    let result = loader.load(&args.file.to_string_lossy());
    if args.verbose {
        for (depth, name) in loader.trace() {
            println!("{}{}", "  ".repeat(*depth), name);
        }
    }
    result?;
    let program = loader.program();
    if args.list {
        for line in program.listing() {
            println!("{}", line);
        }
    }
    let blobs = read_blobs(program.blob_region())?;
    if let Some(path) = loader.current_file() {
        println!("{}", Style::new().bold().paint(path.to_string_lossy()));
    }
    println!(
        "{} bytes, {} blobs, CRC-32 {:08X}",
        program.len() + program.blob_region().len(),
        blobs.len(),
        program.checksum()
    );
    Ok(())
}

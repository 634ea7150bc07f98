use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{bail, IntoDiagnostic, Result};

use vesper::{assemble, Assembly, Cpu, Ram};

/// Vesper is a complete & convenient toolchain for Vesper-16 assembly code.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.asm` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run text `.asm` or binary `.bin` file directly and output to terminal
    Run {
        /// `.asm` or `.bin` file to run
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
    },
    /// Create binary `.bin` file to run later or view compiled data
    Compile {
        /// `.asm` file to compile
        name: PathBuf,
        /// Destination to output .bin file
        dest: Option<PathBuf>,
    },
    /// Check a `.asm` file without running or outputting binary
    Check {
        /// File to check
        name: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(vesper::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    if let Some(command) = args.command {
        match command {
            Command::Run { name, minimal } => run(&name, minimal),
            Command::Compile { name, dest } => {
                file_message(Green, "Assembling", &name);
                let contents = fs::read_to_string(&name).into_diagnostic()?;
                let asm = assemble(&contents)?;

                let out_file_name = match dest {
                    Some(dest) => dest,
                    None => match name.with_extension("bin").file_name() {
                        Some(base) => base.into(),
                        None => bail!("Cannot derive an output name. Exiting..."),
                    },
                };
                let mut file = File::create(&out_file_name).into_diagnostic()?;
                file.write_all(&asm.bytes).into_diagnostic()?;

                message(Green, "Finished", "emit binary");
                file_message(Green, "Saved", &out_file_name);
                Ok(())
            }
            Command::Check { name } => {
                file_message(Green, "Checking", &name);
                let contents = fs::read_to_string(&name).into_diagnostic()?;
                let _ = assemble(&contents)?;
                message(Green, "Success", "no errors found!");
                Ok(())
            }
        }
    } else if let Some(path) = args.path {
        run(&path, false)
    } else {
        println!("\n~ vesper v{VERSION} ~");
        println!("{}", LOGO.truecolor(183, 197, 255).bold());
        println!("{SHORT_INFO}");
        std::process::exit(0);
    }
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &PathBuf) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message<S>(color: MsgColor, left: S, right: S)
where
    S: Colorize + std::fmt::Display,
{
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

fn run(name: &PathBuf, minimal: bool) -> Result<()> {
    let bytes = match name.extension().and_then(|ext| ext.to_str()) {
        Some("bin") => {
            let mut file = File::open(name).into_diagnostic()?;
            let mut buffer = Vec::new();
            file.read_to_end(&mut buffer).into_diagnostic()?;
            buffer
        }
        Some("asm") => {
            if !minimal {
                file_message(MsgColor::Green, "Assembling", name);
            }
            let contents = fs::read_to_string(name).into_diagnostic()?;
            let Assembly { bytes, .. } = assemble(&contents)?;
            bytes
        }
        Some(_) => bail!("File has unknown extension. Exiting..."),
        None => bail!("File has no extension. Exiting..."),
    };

    if bytes.len() > 0x10000 {
        bail!("Program image does not fit in 64 KiB of memory");
    }

    let mut ram = Ram::new();
    ram.load(0, &bytes);
    let mut cpu = Cpu::new(ram);

    if !minimal {
        message(MsgColor::Green, "Running", "emitted binary");
    }
    cpu.run()?;

    for (label, value) in cpu.register_bank() {
        println!("{label:>4}: 0x{value:04X}");
    }

    if !minimal {
        file_message(MsgColor::Green, "Completed", name);
    }
    Ok(())
}

const LOGO: &str = r#"

 __   _____  ____  _ __   ___ _ __
 \ \ / / _ \/ __|| '_ \ / _ \ '__|
  \ V /  __/\__ \| |_) |  __/ |
   \_/ \___||___/| .__/ \___|_|
                 |_|                       "#;

const SHORT_INFO: &str = r"
Welcome to vesper, an all-in-one toolchain for working with
Vesper-16 assembly code.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");

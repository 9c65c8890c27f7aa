// graphicsbc: interpreter for a compact, character-oriented drawing
// language.
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU Lesser General Public License
// as published by the Free Software Foundation, either version 3 of
// the License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public
// License along with this program.  If not, see
// <https://www.gnu.org/licenses/>.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;
use tracing_subscriber::EnvFilter;

/// Interpreter for the character-oriented drawing language: reads a source
/// file, runs it, writes the resulting canvas as a PNG.
#[derive(ClapParser, Debug)]
#[command(name = "interpret", version, about)]
struct Args {
    /// Source file to parse and run.
    source: PathBuf,

    /// Where to write the resulting PNG.
    #[arg(default_value = "/tmp/out.png")]
    output: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("graphicsbc={level}")))
        .with_writer(std::io::stderr)
        .init();

    let source = match std::fs::read_to_string(&args.source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: could not read {}: {}", args.source.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match graphicsbc::run_program(&source, &args.output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

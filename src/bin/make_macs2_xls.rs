//! make-macs2-xls - Convert MACS2 peak output into an XLS report
//!
//! Reads the tab-delimited peak list written by MACS2 and produces a
//! workbook with the ranked peaks, the MACS run notes and a column legend.

use clap::Parser;
use macs2_xls_tools::pipeline::{convert, ConvertConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "make-macs2-xls", version)]
#[command(about = "Create an XLS spreadsheet from the output of the MACS2 peak caller")]
#[command(
    long_about = "Create an XLS spreadsheet from the output of the MACS2 peak caller. \
<MACS2_OUTPUT> is the output '.xls' file from MACS2; if supplied then <XLS_OUT> is \
the name to use for the output file, otherwise it will be called 'XLS_<MACS2_OUTPUT>.xls'."
)]
struct Cli {
    /// Peak file written by MACS2
    #[arg(value_name = "MACS2_OUTPUT")]
    input: PathBuf,

    /// Output spreadsheet (default: XLS_<MACS2_OUTPUT>.xls)
    #[arg(value_name = "XLS_OUT")]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();

    // Usage errors exit 1, not clap's default of 2.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
        Err(e) => e.exit(),
    };

    let config = ConvertConfig::new(cli.input, cli.output);
    match convert(&config, |line| println!("{}", line)) {
        Ok(summary) => {
            log::info!("{}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

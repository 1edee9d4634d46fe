use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{ArgGroup, Parser};
use ecad_file_format::{
    ConversionReport, ConvertConfig, ConvertError, EcadFamily, convert_bom, convert_positions,
};
use env_logger::Env;
use log::debug;

/// Convert ECAD BOM and pick-and-place exports to the JLCPCB assembly CSV format.
#[derive(Parser, Debug)]
#[command(author, version, arg_required_else_help = true)]
#[command(group(ArgGroup::new("family").args(["fusion", "kicad"])))]
struct Cli {
    /// Inputs are Fusion 360 / Eagle exports
    #[arg(long)]
    fusion: bool,

    /// Inputs are KiCad exports
    #[arg(long)]
    kicad: bool,

    /// BOM export to convert
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    bom: Option<PathBuf>,

    /// Placement export to convert. With --fusion, pass either file of a
    /// `_front`/`_back` (or `_top`/`_bottom`) pair; the other one is picked up too.
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pos: Option<PathBuf>,

    /// Output file name prefix, files are written as <PREFIX>_bom.csv and <PREFIX>_pos.csv
    #[arg(long, value_name = "PREFIX", default_value = "JLC")]
    out: String,

    /// Directory to write the output files to
    #[arg(long, value_name = "DIR", default_value = ".", value_hint = clap::ValueHint::DirPath)]
    out_dir: PathBuf,

    /// Order BOM lines by their first designator
    #[arg(long)]
    sort: bool,

    /// More output, repeat for debug logs
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn family(&self) -> Result<EcadFamily, ConvertError> {
        match (self.fusion, self.kicad) {
            (true, _) => Ok(EcadFamily::Fusion),
            (_, true) => Ok(EcadFamily::KiCad),
            _ => Err(ConvertError::MissingRequiredFlag(
                "--fusion or --kicad".to_string(),
            )),
        }
    }

    fn config(&self) -> ConvertConfig {
        ConvertConfig {
            output_prefix: self.out.clone(),
            output_dir: self.out_dir.clone(),
            sort_by_designator: self.sort,
            ..ConvertConfig::default()
        }
    }

    /// Everything that makes the invocation unusable before any file is read.
    fn validate(&self) -> Result<EcadFamily, ConvertError> {
        let family = self.family()?;
        if self.bom.is_none() && self.pos.is_none() {
            return Err(ConvertError::MissingRequiredFlag("--bom or --pos".to_string()));
        }
        for input in self.bom.iter().chain(self.pos.iter()) {
            if !input.is_file() {
                return Err(ConvertError::MissingFile(input.clone()));
            }
        }
        Ok(family)
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => e.exit(),
    };

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let family = match cli.validate() {
        Ok(family) => family,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(if e.is_usage_error() { 2 } else { 1 });
        }
    };

    match run(&cli, family) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Convert each requested artifact. One failing does not stop the other.
fn run(cli: &Cli, family: EcadFamily) -> anyhow::Result<()> {
    let config = cli.config();
    debug!("{family} inputs, {config:?}");
    let mut failed = 0;

    if let Some(bom) = &cli.bom {
        let result = convert_bom(family, bom, &config)
            .with_context(|| format!("BOM conversion of {} failed", bom.display()));
        match result {
            Ok(report) => print_report("BOM", "parts", &report),
            Err(e) => {
                eprintln!("error: {e:#}");
                failed += 1;
            }
        }
    }
    if let Some(pos) = &cli.pos {
        let result = convert_positions(family, pos, &config)
            .with_context(|| format!("positions conversion of {} failed", pos.display()));
        match result {
            Ok(report) => print_report("Positions", "placements", &report),
            Err(e) => {
                eprintln!("error: {e:#}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} conversion(s) failed, see above");
    }
    Ok(())
}

fn print_report(what: &str, unit: &str, report: &ConversionReport) {
    println!("{what} conversion completed: {}", report.output.display());
    println!(
        "  {} {unit} from {} ({})",
        report.records,
        report
            .inputs
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
        report.variants.join(", ")
    );
    if !report.warnings.is_empty() {
        println!("  {} warning(s)", report.warnings.len());
    }
}

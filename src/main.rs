//! `bridge-gad`: parameter file in, general-arrangement drawing out.

use std::path::PathBuf;
use std::process::ExitCode;

use bridge_gad::errors::{GadError, exit};
use bridge_gad::params::loader::{load_cross_section, load_parameters};
use bridge_gad::render::{Backend, OutputFormat, PageSize, PdfOptions, RenderOptions, Renderer, ScreenView};
use bridge_gad::{GeometryBuilder, ParameterStore, TitleInfo};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

#[derive(Parser, Debug)]
#[command(name = "bridge-gad", version, about = "Draw the general arrangement of a bridge")]
struct Cli {
    /// Parameter file (Parameter,Value,Description rows)
    input: PathBuf,

    /// Drawing to write
    output: PathBuf,

    /// Output format; guessed from the output extension when absent
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Plan and elevation scale, overriding SCALE1
    #[arg(long, value_name = "N")]
    scale: Option<f64>,

    /// Skew in degrees, overriding SKEW
    #[arg(long, value_name = "DEG", allow_negative_numbers = true)]
    skew: Option<f64>,

    /// Do not print warnings
    #[arg(long)]
    silent: bool,

    /// Ground profile as a separate chainage,RL file
    #[arg(long, value_name = "FILE")]
    cross_section: Option<PathBuf>,

    /// Paper size for PDF output
    #[arg(long, value_enum, default_value_t = PageSize::A3)]
    page: PageSize,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    project: Option<String>,

    #[arg(long = "drawing-no", value_name = "NUMBER")]
    drawing_no: Option<String>,

    /// Date in the title block; today when absent
    #[arg(long)]
    date: Option<String>,
}

impl Cli {
    fn title_info(&self) -> TitleInfo {
        let defaults = TitleInfo::default();
        TitleInfo {
            title: self.title.clone().unwrap_or(defaults.title),
            project: self.project.clone().unwrap_or(defaults.project),
            drawing_number: self.drawing_no.clone().unwrap_or_default(),
            date: self
                .date
                .clone()
                .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string()),
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                exit::INVALID_ARGUMENTS
            } else {
                exit::SUCCESS
            };
            // nothing useful to do if stderr is gone
            let _ = e.print();
            return ExitCode::from(code);
        }
    };
    init_tracing(cli.silent);

    let Some(format) = cli.format.or_else(|| OutputFormat::from_extension(&cli.output)) else {
        let _ = Cli::command()
            .error(
                ErrorKind::ValueValidation,
                format!(
                    "cannot tell the format of {}; pass --format",
                    cli.output.display()
                ),
            )
            .print();
        return ExitCode::from(exit::INVALID_ARGUMENTS);
    };

    match run(&cli, format) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code)
        }
    }
}

fn run(cli: &Cli, format: OutputFormat) -> Result<(), GadError> {
    let mut raw = load_parameters(&cli.input)?;
    if let Some(path) = &cli.cross_section {
        raw.cross_section = load_cross_section(path)?;
    }
    if let Some(scale) = cli.scale {
        raw.set("SCALE1", scale);
    }
    if let Some(skew) = cli.skew {
        raw.set("SKEW", skew);
    }

    let store = ParameterStore::from_raw(raw)?;
    let list = GeometryBuilder::new(&store)
        .with_title(cli.title_info())
        .build()?;

    let options = RenderOptions {
        pdf: PdfOptions {
            page: cli.page,
            ..PdfOptions::default()
        },
        view: ScreenView::default(),
    };
    let report = Backend::for_format(format, &options).emit(&list, &cli.output)?;

    if !cli.silent {
        for w in store.warnings() {
            eprintln!("warning: {w}");
        }
        for w in list.warnings() {
            eprintln!("warning: {w}");
        }
        for w in &report.warnings {
            eprintln!("warning: {w}");
        }
    }
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_tracing(silent: bool) {
    use tracing_subscriber::EnvFilter;
    let fallback = if silent { "error" } else { "bridge_gad=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(not(feature = "tracing"))]
fn init_tracing(_silent: bool) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn negative_skew_parses() {
        let cli = Cli::try_parse_from(["bridge-gad", "in.csv", "out.dxf", "--skew", "-15"]).unwrap();
        assert_eq!(cli.skew, Some(-15.0));
        assert_eq!(cli.page, PageSize::A3);
    }

    #[test]
    fn title_defaults() {
        let cli = Cli::try_parse_from([
            "bridge-gad",
            "in.csv",
            "out.pdf",
            "--drawing-no",
            "GAD-7",
            "--date",
            "2026-03-01",
        ])
        .unwrap();
        let info = cli.title_info();
        assert_eq!(info.title, "GENERAL ARRANGEMENT DRAWING");
        assert_eq!(info.drawing_number, "GAD-7");
        assert_eq!(info.date, "2026-03-01");
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = Cli::try_parse_from(["bridge-gad", "in.csv", "out.pdf", "--colour"]).unwrap_err();
        assert!(err.use_stderr());
    }
}

//! Compute SPM globals for a 4D NIfTI image and check them against reference values
//!
//! Usage: spm-globals [IMAGE] [REFERENCE]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info};

use spm_globals::compare::{compare_globals, report_lines, Comparison, Tolerance};
use spm_globals::logging::init_tracing;
use spm_globals::nifti_io::read_nifti_series_file;
use spm_globals::reference::read_reference_file;
use spm_globals::{spm_globals, spm_globals_par};

#[derive(Parser, Debug)]
#[command(author, version, about = "SPM global signal for 4D NIfTI images")]
struct Cli {
    /// 4D NIfTI image (.nii or .nii.gz)
    #[arg(default_value = "ds107_sub012_t1r2.nii")]
    image: PathBuf,

    /// Whitespace-delimited reference globals
    #[arg(default_value = "global_signals.txt")]
    reference: PathBuf,

    /// Relative tolerance
    #[arg(long, default_value_t = Tolerance::default().rtol)]
    rtol: f64,

    /// Absolute tolerance
    #[arg(long, default_value_t = Tolerance::default().atol)]
    atol: f64,

    /// Compute volumes on all cores
    #[arg(long)]
    parallel: bool,

    /// Print the computed globals, one per line, and skip validation
    #[arg(long)]
    print: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn run(cli: &Cli) -> spm_globals::Result<()> {
    let start = Instant::now();
    let series = read_nifti_series_file(&cli.image)?;
    let (nx, ny, nz, _) = series.dims;
    info!(
        "Loaded {} ({}x{}x{}, {} volumes) in {:.2?}",
        cli.image.display(),
        nx,
        ny,
        nz,
        series.n_volumes(),
        start.elapsed()
    );

    let globals = if cli.parallel {
        spm_globals_par(&series.data)?
    } else {
        spm_globals(&series.data)?
    };

    if cli.print {
        for value in &globals {
            println!("{}", value);
        }
        return Ok(());
    }

    let expected = read_reference_file(&cli.reference)?;
    let tol = Tolerance {
        rtol: cli.rtol,
        atol: cli.atol,
    };

    let comparison = compare_globals(&globals, &expected, tol);
    match &comparison {
        Comparison::Close => {}
        Comparison::Differ { mismatches } => {
            info!("{} of {} volumes outside tolerance", mismatches.len(), globals.len());
            for m in mismatches {
                info!(
                    "volume {}: computed {} reference {}",
                    m.index, m.computed, m.reference
                );
            }
        }
        Comparison::ShapeMismatch {
            computed,
            reference,
        } => info!("computed {} values, reference has {}", computed, reference),
    }

    for line in report_lines(&comparison, &globals, &expected) {
        println!("{}", line);
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    if let Err(e) = init_tracing(level) {
        eprintln!("{}", e);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

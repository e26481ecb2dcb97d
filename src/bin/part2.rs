use anyhow::{Context, Result};
use chronospatial::{
    calibrator::{DEFAULT_DIGIT_COUNT, DEFAULT_MAX_EXPANSIONS, DEFAULT_SLACK},
    machine::DEFAULT_STEP_LIMIT,
    CLIArgs, CalibrationConfig, Calibrator,
};
use clap::Parser;

#[derive(Debug, Parser)]
struct Args {
    #[command(flatten)]
    common: CLIArgs,
    /// Octal digits in a candidate for register A
    #[arg(long, default_value_t = DEFAULT_DIGIT_COUNT)]
    digits: usize,
    /// Outputs a partial candidate may lag behind its digit and still be refined
    #[arg(long, default_value_t = DEFAULT_SLACK)]
    slack: usize,
    #[arg(long, default_value_t = DEFAULT_MAX_EXPANSIONS)]
    max_expansions: usize,
    /// Instructions a single candidate run may execute
    #[arg(long, default_value_t = DEFAULT_STEP_LIMIT)]
    step_limit: usize,
    /// Try candidates one by one instead of on the thread pool
    #[arg(long)]
    sequential: bool,
}

impl Args {
    fn calibration_config(&self) -> CalibrationConfig {
        CalibrationConfig {
            digit_count: self.digits,
            slack: self.slack,
            max_expansions: self.max_expansions,
            step_limit: self.step_limit,
            parallel: !self.sequential,
        }
    }
}

fn main() -> Result<()> {
    chronospatial::init_logging();
    let args = Args::parse();
    let input_path = &args.common.input_path;
    let info = chronospatial::read_debug_info(input_path)
        .with_context(|| format!("failed to open given file({}).", input_path.display()))?;

    let register_a = Calibrator::new(&info.program, &info.registers, args.calibration_config())
        .calibrate()
        .with_context(|| format!("failed to calibrate program {}.", info.program))?;
    println!(
        "The lowest value of register A that makes the program output itself is {}.",
        register_a
    );

    Ok(())
}

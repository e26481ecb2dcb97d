use anyhow::{Context, Result};
use chronospatial::{machine::join_values, CLIArgs, Computer};
use clap::Parser;

#[derive(Debug, Parser)]
struct Args {
    #[command(flatten)]
    common: CLIArgs,
    /// Give up after this many executed instructions
    #[arg(long, default_value_t = chronospatial::machine::DEFAULT_STEP_LIMIT)]
    step_limit: usize,
}

fn main() -> Result<()> {
    chronospatial::init_logging();
    let args = Args::parse();
    let input_path = &args.common.input_path;
    let info = chronospatial::read_debug_info(input_path)
        .with_context(|| format!("failed to open given file({}).", input_path.display()))?;

    let mut computer = Computer::new(&info.registers).with_step_limit(args.step_limit);
    computer
        .run(&info.program)
        .with_context(|| format!("failed to run program {}.", info.program))?;
    println!(
        "After running given code, the computer output {}.",
        join_values(computer.output())
    );

    Ok(())
}

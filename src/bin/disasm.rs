use anyhow::{Context, Result};
use chronospatial::CLIArgs;
use clap::Parser;

fn main() -> Result<()> {
    chronospatial::init_logging();
    let args = CLIArgs::parse();
    let info = chronospatial::read_debug_info(&args.input_path)
        .with_context(|| format!("failed to open given file({}).", args.input_path.display()))?;

    println!(
        "; A = {}, B = {}, C = {}",
        info.registers.a, info.registers.b, info.registers.c
    );
    for (addr, text) in info.program.listing() {
        println!("{:>3}: {}", addr, text);
    }

    Ok(())
}

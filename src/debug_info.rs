use std::{fs, path::Path};

use anyhow::{Context, Result};

use crate::{
    machine::{Program, RegisterName, Registers, Word},
    Error,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugInfo {
    pub registers: Registers,
    pub program: Program,
}

impl TryFrom<&str> for DebugInfo {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut lines = value.lines().map(str::trim);
        let mut registers = Registers::default();
        for &name in RegisterName::all() {
            let line = lines
                .by_ref()
                .find(|line| !line.is_empty())
                .ok_or(Error::NoRegisterLine(name))?;
            *registers.reg_mut(name) = read_register(name, line)?;
        }

        let program_line = lines
            .find(|line| !line.is_empty())
            .ok_or(Error::NoProgram)?;

        Ok(DebugInfo {
            registers,
            program: read_program(program_line)?,
        })
    }
}

pub fn read_debug_info<P: AsRef<Path>>(path: P) -> Result<DebugInfo> {
    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read given file({}).", path.as_ref().display()))?;

    DebugInfo::try_from(text.as_str()).with_context(|| {
        format!(
            "Failed to parse debug information in given file({}).",
            path.as_ref().display()
        )
    })
}

fn read_register(name: RegisterName, text: &str) -> Result<Word, Error> {
    let header = format!("Register {}:", name);
    let value_text = text
        .strip_prefix(&header)
        .ok_or(Error::InvalidRegisterText(text.to_string()))?
        .trim();
    value_text
        .parse::<Word>()
        .map_err(|_| Error::InvalidRegisterValue(value_text.to_string()))
}

fn read_program(text: &str) -> Result<Program, Error> {
    static HEADER: &str = "Program:";
    let code_text = text
        .strip_prefix(HEADER)
        .ok_or(Error::InvalidProgramText(text.to_string()))?
        .trim();
    let code = code_text
        .split(',')
        .map(|s| {
            let s = s.trim();
            s.parse::<u8>()
                .map_err(|_| Error::InvalidCode(s.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Program::try_from(code)
}

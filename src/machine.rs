use std::fmt::Display;

use int_enum::IntEnum;
use tracing::trace;

use crate::Error;

pub type Word = u128;

pub const DEFAULT_STEP_LIMIT: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterName {
    A,
    B,
    C,
}

impl Display for RegisterName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RegisterName::A => "A",
            RegisterName::B => "B",
            RegisterName::C => "C",
        };
        write!(f, "{}", name)
    }
}

impl RegisterName {
    pub fn all() -> &'static [RegisterName] {
        static ALL_REGISTERS: [RegisterName; 3] = [RegisterName::A, RegisterName::B, RegisterName::C];

        &ALL_REGISTERS
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    pub a: Word,
    pub b: Word,
    pub c: Word,
}

impl Registers {
    pub fn new(a: Word, b: Word, c: Word) -> Self {
        Self { a, b, c }
    }

    pub fn with_a(&self, a: Word) -> Self {
        Self { a, ..*self }
    }

    pub fn reg(&self, name: RegisterName) -> &Word {
        match name {
            RegisterName::A => &self.a,
            RegisterName::B => &self.b,
            RegisterName::C => &self.c,
        }
    }

    pub fn reg_mut(&mut self, name: RegisterName) -> &mut Word {
        match name {
            RegisterName::A => &mut self.a,
            RegisterName::B => &mut self.b,
            RegisterName::C => &mut self.c,
        }
    }
}

trait ExecutionContext {
    fn reg(&self, name: RegisterName) -> Word;
    fn reg_mut(&mut self, name: RegisterName) -> &mut Word;
    fn inst_ptr_mut(&mut self) -> &mut usize;
    fn output(&mut self, n: u8);
}

#[derive(Debug)]
struct ProgramContext<'a> {
    computer: &'a mut Computer,
    inst_ptr: &'a mut usize,
}

impl<'a> ExecutionContext for ProgramContext<'a> {
    fn reg(&self, name: RegisterName) -> Word {
        *self.computer.registers.reg(name)
    }

    fn reg_mut(&mut self, name: RegisterName) -> &mut Word {
        self.computer.registers.reg_mut(name)
    }

    fn inst_ptr_mut(&mut self) -> &mut usize {
        &mut self.inst_ptr
    }

    fn output(&mut self, n: u8) {
        self.computer.output.push(n);
    }
}

impl<'a> ProgramContext<'a> {
    pub fn new(computer: &'a mut Computer, inst_ptr: &'a mut usize) -> Self {
        Self { computer, inst_ptr }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntEnum)]
#[repr(u8)]
pub enum Instruction {
    Adv = 0,
    Bxl = 1,
    Bst = 2,
    Jnz = 3,
    Bxc = 4,
    Out = 5,
    Bdv = 6,
    Cdv = 7,
}

impl Instruction {
    fn exec_in(&self, operand: u8, mut context: impl ExecutionContext) -> Result<(), Error> {
        if operand > 7 {
            return Err(Error::InvalidOperand(operand));
        }

        match self {
            Instruction::Adv => {
                *context.reg_mut(RegisterName::A) = Self::divide(&context, operand)?
            }
            Instruction::Bxl => *context.reg_mut(RegisterName::B) ^= Word::from(operand),
            Instruction::Bst => {
                *context.reg_mut(RegisterName::B) = Self::combo_operand(operand, &context)? % 8
            }
            Instruction::Jnz => {
                if context.reg(RegisterName::A) != 0 {
                    *context.inst_ptr_mut() = usize::from(operand);
                    return Ok(());
                }
            }
            Instruction::Bxc => {
                let c = context.reg(RegisterName::C);
                *context.reg_mut(RegisterName::B) ^= c
            }
            Instruction::Out => {
                let value = Self::combo_operand(operand, &context)? % 8;
                // Lowest three bits always fit.
                context.output(value as u8)
            }
            Instruction::Bdv => {
                *context.reg_mut(RegisterName::B) = Self::divide(&context, operand)?
            }
            Instruction::Cdv => {
                *context.reg_mut(RegisterName::C) = Self::divide(&context, operand)?
            }
        }
        *context.inst_ptr_mut() += 2;

        Ok(())
    }

    fn combo_operand(operand: u8, context: &impl ExecutionContext) -> Result<Word, Error> {
        match operand {
            0..=3 => Ok(Word::from(operand)),
            4 => Ok(context.reg(RegisterName::A)),
            5 => Ok(context.reg(RegisterName::B)),
            6 => Ok(context.reg(RegisterName::C)),
            other => Err(Error::InvalidOperand(other)),
        }
    }

    /// A / 2^combo, where a power past the register width leaves nothing.
    fn divide(context: &impl ExecutionContext, operand: u8) -> Result<Word, Error> {
        let power = Self::combo_operand(operand, context)?;
        let numerator = context.reg(RegisterName::A);

        Ok(u32::try_from(power)
            .ok()
            .and_then(|power| numerator.checked_shr(power))
            .unwrap_or(0))
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Adv => "adv",
            Instruction::Bxl => "bxl",
            Instruction::Bst => "bst",
            Instruction::Jnz => "jnz",
            Instruction::Bxc => "bxc",
            Instruction::Out => "out",
            Instruction::Bdv => "bdv",
            Instruction::Cdv => "cdv",
        }
    }

    pub fn describe(&self, operand: u8) -> String {
        match self {
            Instruction::Bxl | Instruction::Jnz => format!("{} {}", self.mnemonic(), operand),
            Instruction::Bxc => self.mnemonic().to_string(),
            Instruction::Adv
            | Instruction::Bst
            | Instruction::Out
            | Instruction::Bdv
            | Instruction::Cdv => {
                let operand_text = match operand {
                    0..=3 => operand.to_string(),
                    4..=6 => RegisterName::all()[usize::from(operand - 4)].to_string(),
                    other => format!("?{}", other),
                };
                format!("{} {}", self.mnemonic(), operand_text)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    code: Vec<u8>,
}

impl TryFrom<Vec<u8>> for Program {
    type Error = Error;

    fn try_from(code: Vec<u8>) -> Result<Self, Self::Error> {
        if let Some(bad) = code.iter().find(|&&n| n > 7) {
            return Err(Error::InvalidCode(bad.to_string()));
        }
        if code.len() % 2 != 0 {
            return Err(Error::OddProgramLength(code.len()));
        }

        Ok(Self { code })
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", join_values(&self.code))
    }
}

impl Program {
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn listing(&self) -> impl Iterator<Item = (usize, String)> + '_ {
        self.code.chunks(2).enumerate().map(|(ind, pair)| {
            let text = match Instruction::try_from(pair[0]) {
                Ok(inst) => inst.describe(pair[1]),
                Err(code) => format!("??? {} {}", code, pair[1]),
            };
            (ind * 2, text)
        })
    }
}

pub fn join_values(values: &[u8]) -> String {
    values
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug)]
pub struct Computer {
    registers: Registers,
    output: Vec<u8>,
    step_limit: usize,
}

impl Computer {
    pub fn new(registers: &Registers) -> Self {
        Self {
            registers: *registers,
            output: Vec::new(),
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn run(&mut self, program: &Program) -> Result<(), Error> {
        let code = program.code();
        let mut inst_ptr = 0;
        let mut steps_n = 0;
        while inst_ptr < code.len() {
            if steps_n == self.step_limit {
                return Err(Error::NonTerminating(self.step_limit));
            }
            steps_n += 1;

            let inst = Instruction::try_from(code[inst_ptr]).map_err(Error::InvalidOpcode)?;
            // A jump to the last cell leaves an opcode without operand, that halts too.
            let Some(operand) = code.get(inst_ptr + 1).copied() else {
                break;
            };

            trace!(inst_ptr, ?inst, operand, registers = ?self.registers, "execute");
            inst.exec_in(operand, ProgramContext::new(self, &mut inst_ptr))?;
        }

        Ok(())
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn prefix_match_len(&self, expected: &[u8]) -> usize {
        self.output
            .iter()
            .zip(expected)
            .take_while(|(out, exp)| out == exp)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub output: Vec<u8>,
    pub matched: Option<usize>,
}

pub fn run(
    program: &Program,
    registers: &Registers,
    expected_output: Option<&[u8]>,
) -> Result<RunOutcome, Error> {
    let mut computer = Computer::new(registers);
    computer.run(program)?;
    let matched = expected_output.map(|expected| computer.prefix_match_len(expected));

    Ok(RunOutcome {
        output: computer.output,
        matched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(code: &[u8]) -> Program {
        Program::try_from(code.to_vec()).unwrap()
    }

    fn run_computer(code: &[u8], registers: Registers) -> Computer {
        let mut computer = Computer::new(&registers);
        computer.run(&program(code)).unwrap();
        computer
    }

    #[test]
    fn bst_reads_register_c() {
        let computer = run_computer(&[2, 6], Registers::new(0, 0, 9));
        assert_eq!(computer.registers().b, 1);
    }

    #[test]
    fn out_emits_literal_operands() {
        let computer = run_computer(&[5, 0, 5, 1, 5, 4], Registers::new(10, 0, 0));
        assert_eq!(computer.output(), &[0, 1, 2]);
    }

    #[test]
    fn loop_drains_register_a() {
        let computer = run_computer(&[0, 1, 5, 4, 3, 0], Registers::new(2024, 0, 0));
        assert_eq!(computer.output(), &[4, 2, 5, 6, 7, 7, 7, 7, 3, 1, 0]);
        assert_eq!(computer.registers().a, 0);
    }

    #[test]
    fn bxl_and_bxc_xor_into_b() {
        let computer = run_computer(&[1, 7], Registers::new(0, 29, 0));
        assert_eq!(computer.registers().b, 26);

        let computer = run_computer(&[4, 0], Registers::new(0, 2024, 43690));
        assert_eq!(computer.registers().b, 44354);
    }

    #[test]
    fn calibration_trace_from_729() {
        let outcome = run(&program(&[0, 1, 5, 4, 3, 0]), &Registers::new(729, 0, 0), None).unwrap();
        assert_eq!(outcome.output, vec![4, 6, 3, 5, 6, 3, 5, 2, 1, 0]);
        assert_eq!(outcome.matched, None);
    }

    #[test]
    fn repeated_runs_agree() {
        let code = program(&[2, 4, 1, 2, 7, 5, 0, 3, 1, 7, 4, 1, 5, 5, 3, 0]);
        let registers = Registers::new(46187030, 0, 0);
        let first = run(&code, &registers, None).unwrap();
        let second = run(&code, &registers, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.output, vec![2, 5, 7, 0, 1, 4, 1, 2, 5]);
    }

    #[test]
    fn division_by_one_keeps_value() {
        let registers = Registers::new(123456789, 0, 0);
        let computer = run_computer(&[0, 0], registers);
        assert_eq!(computer.registers().a, 123456789);

        let computer = run_computer(&[6, 0, 7, 0], registers);
        assert_eq!(computer.registers().b, 123456789);
        assert_eq!(computer.registers().c, 123456789);
    }

    #[test]
    fn oversized_shift_clears_target() {
        let computer = run_computer(&[6, 5], Registers::new(Word::MAX, 500, 0));
        assert_eq!(computer.registers().b, 0);

        let computer = run_computer(&[7, 5], Registers::new(Word::MAX, 127, 0));
        assert_eq!(computer.registers().c, 1);
    }

    #[test]
    fn jnz_with_zero_a_falls_through() {
        // Jumping would skip `out 1`.
        let computer = run_computer(&[3, 4, 5, 1, 5, 2], Registers::new(0, 0, 0));
        assert_eq!(computer.output(), &[1, 2]);

        let computer = run_computer(&[3, 4, 5, 1, 5, 2], Registers::new(1, 0, 0));
        assert_eq!(computer.output(), &[2]);
    }

    #[test]
    fn one_value_per_out() {
        // Outputs A mod 8 once per loop, three loops for A = 0o777.
        let computer = run_computer(&[5, 4, 0, 3, 3, 0], Registers::new(0o777, 0, 0));
        assert_eq!(computer.output().len(), 3);
    }

    #[test]
    fn combo_seven_is_invalid() {
        for code in [[0, 7], [2, 7], [5, 7], [6, 7], [7, 7]] {
            let mut computer = Computer::new(&Registers::new(1, 2, 3));
            assert_eq!(
                computer.run(&program(&code)),
                Err(Error::InvalidOperand(7))
            );
        }
    }

    #[test]
    fn combo_below_seven_is_valid() {
        for operand in 0..7 {
            for opcode in [0, 2, 5, 6, 7] {
                let mut computer = Computer::new(&Registers::new(1 << 20, 5, 9));
                assert!(computer.run(&program(&[opcode, operand])).is_ok());
            }
        }
    }

    #[test]
    fn literal_seven_is_valid() {
        let computer = run_computer(&[1, 7], Registers::default());
        assert_eq!(computer.registers().b, 7);
    }

    #[test]
    fn step_limit_stops_endless_loop() {
        let mut computer = Computer::new(&Registers::new(1, 0, 0)).with_step_limit(100);
        assert_eq!(
            computer.run(&program(&[3, 0])),
            Err(Error::NonTerminating(100))
        );
    }

    #[test]
    fn jump_onto_last_cell_halts() {
        let computer = run_computer(&[3, 3, 5, 1], Registers::new(1, 0, 0));
        assert!(computer.output().is_empty());
    }

    #[test]
    fn prefix_match_stops_at_mismatch() {
        let code = program(&[0, 1, 5, 4, 3, 0]);
        let registers = Registers::new(729, 0, 0);
        let outcome = run(&code, &registers, Some(&[4, 6, 3, 0, 6])).unwrap();
        assert_eq!(outcome.matched, Some(3));

        let outcome = run(&code, &registers, Some(&[4, 6])).unwrap();
        assert_eq!(outcome.matched, Some(2));

        let outcome = run(&code, &registers, Some(&[1])).unwrap();
        assert_eq!(outcome.matched, Some(0));
    }

    #[test]
    fn program_rejects_bad_code() {
        assert_eq!(
            Program::try_from(vec![0, 1, 5]),
            Err(Error::OddProgramLength(3))
        );
        assert_eq!(
            Program::try_from(vec![0, 8]),
            Err(Error::InvalidCode("8".to_string()))
        );
    }

    #[test]
    fn listing_reads_operands_by_kind() {
        let code = program(&[2, 4, 1, 2, 7, 5, 4, 1, 5, 7, 3, 0]);
        let listing: Vec<_> = code.listing().collect();
        assert_eq!(
            listing,
            vec![
                (0, "bst A".to_string()),
                (2, "bxl 2".to_string()),
                (4, "cdv B".to_string()),
                (6, "bxc".to_string()),
                (8, "out ?7".to_string()),
                (10, "jnz 0".to_string()),
            ]
        );
    }
}

use std::collections::{HashSet, VecDeque};

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info};

use crate::{
    machine::{Computer, Program, Registers, Word, DEFAULT_STEP_LIMIT},
    Error,
};

pub const DEFAULT_DIGIT_COUNT: usize = 16;
pub const DEFAULT_SLACK: usize = 2;
pub const DEFAULT_MAX_EXPANSIONS: usize = 1_000_000;
pub const MAX_DIGIT_COUNT: usize = Word::BITS as usize / 3;

const DIGIT_VALUES_N: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationConfig {
    pub digit_count: usize,
    pub slack: usize,
    pub max_expansions: usize,
    pub step_limit: usize,
    pub parallel: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            digit_count: DEFAULT_DIGIT_COUNT,
            slack: DEFAULT_SLACK,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
            step_limit: DEFAULT_STEP_LIMIT,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DigitVector(Vec<u8>);

impl DigitVector {
    pub fn zeros(digit_count: usize) -> Self {
        Self(vec![0; digit_count])
    }

    /// Copy with the digit at `place` (0 is least significant) replaced.
    pub fn with_digit(&self, place: usize, value: u8) -> Self {
        let mut digits = self.0.clone();
        let ind = digits.len() - 1 - place;
        digits[ind] = value;
        Self(digits)
    }

    pub fn value(&self) -> Word {
        self.0
            .iter()
            .fold(0, |acc, &digit| acc * 8 + Word::from(digit))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchNode {
    digits: DigitVector,
    digit: usize,
    matched: usize,
}

impl SearchNode {
    fn root(digit_count: usize) -> Self {
        Self {
            digits: DigitVector::zeros(digit_count),
            digit: 0,
            matched: 0,
        }
    }
}

#[derive(Debug)]
struct Trial {
    digits: DigitVector,
    matched: usize,
    is_exact: bool,
}

#[derive(Debug)]
pub struct Calibrator<'a> {
    program: &'a Program,
    registers: Registers,
    config: CalibrationConfig,
}

impl<'a> Calibrator<'a> {
    pub fn new(program: &'a Program, registers: &Registers, config: CalibrationConfig) -> Self {
        Self {
            program,
            registers: *registers,
            config,
        }
    }

    pub fn calibrate(&self) -> Result<Word, Error> {
        self.search(|digits| self.try_digits(digits))
    }

    fn search<F>(&self, evaluate: F) -> Result<Word, Error>
    where
        F: Fn(DigitVector) -> Result<Trial, Error> + Sync,
    {
        let digit_count = self.config.digit_count.max(self.program.len());
        if digit_count > MAX_DIGIT_COUNT {
            return Err(Error::DigitCountTooLarge(digit_count));
        }

        let root = SearchNode::root(digit_count);
        let mut visited = HashSet::from([(root.digits.clone(), root.digit)]);
        let mut to_check = VecDeque::from([root]);
        let mut solutions = Vec::new();
        let mut expansions = 0;
        while let Some(node) = to_check.pop_front() {
            if expansions == self.config.max_expansions {
                return Err(Error::SearchExhausted(self.config.max_expansions));
            }
            expansions += 1;

            // Trials are in digit order; nothing after the first exact one counts, errors included.
            for trial in self.expand(&node, &evaluate) {
                let trial = trial?;
                if trial.is_exact {
                    let register_a = trial.digits.value();
                    debug!(%register_a, digit = node.digit, "found self-reproducing value");
                    solutions.push(register_a);
                    break;
                }

                let next_digit = node.digit + 1;
                if next_digit < digit_count
                    && trial.matched + self.config.slack >= node.digit
                    && visited.insert((trial.digits.clone(), next_digit))
                {
                    to_check.push_back(SearchNode {
                        digits: trial.digits,
                        digit: next_digit,
                        matched: trial.matched,
                    });
                }
            }

            to_check.make_contiguous().sort_by(|n1, n2| {
                n2.matched
                    .cmp(&n1.matched)
                    .then(n1.digit.cmp(&n2.digit))
                    .then_with(|| n1.digits.cmp(&n2.digits))
            });
            debug!(
                expansions,
                digit = node.digit,
                matched = node.matched,
                queued = to_check.len(),
                "expanded search node"
            );
        }

        let register_a = solutions
            .iter()
            .copied()
            .min()
            .ok_or(Error::NoSolutionFound)?;
        info!(%register_a, expansions, solutions = solutions.len(), "calibration finished");

        Ok(register_a)
    }

    fn expand<F>(&self, node: &SearchNode, evaluate: &F) -> Vec<Result<Trial, Error>>
    where
        F: Fn(DigitVector) -> Result<Trial, Error> + Sync,
    {
        let candidate = |value: u8| evaluate(node.digits.with_digit(node.digit, value));
        if self.config.parallel {
            (0..DIGIT_VALUES_N).into_par_iter().map(candidate).collect()
        } else {
            (0..DIGIT_VALUES_N).map(candidate).collect()
        }
    }

    fn try_digits(&self, digits: DigitVector) -> Result<Trial, Error> {
        let mut computer = Computer::new(&self.registers.with_a(digits.value()))
            .with_step_limit(self.config.step_limit);
        computer.run(self.program)?;

        let target = self.program.code();
        let matched = computer.prefix_match_len(target);
        Ok(Trial {
            digits,
            matched,
            is_exact: computer.output() == target,
        })
    }
}

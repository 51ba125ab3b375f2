//! The fixed ten-stage pipeline.
//!
//! Every project runs through the same 28-day timeline. Each stage owns a
//! contiguous window of days; together the windows cover days 1 through 28
//! exactly once.

use std::fmt;
use std::ops::RangeInclusive;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::TimelineError;

/// Number of stages in the pipeline.
pub const STAGE_COUNT: u8 = 10;

/// Length of the pipeline in days.
pub const TIMELINE_DAYS: u32 = 28;

/// A validated stage number in `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Stage(u8);

impl Stage {
    /// The first stage.
    pub const FIRST: Self = Self(1);

    /// The final stage.
    pub const LAST: Self = Self(STAGE_COUNT);

    /// Create a stage, rejecting numbers outside `1..=10`.
    pub fn new(number: u8) -> Result<Self, TimelineError> {
        if (1..=STAGE_COUNT).contains(&number) {
            Ok(Self(number))
        } else {
            Err(TimelineError::InvalidStage(i64::from(number)))
        }
    }

    /// Create a stage, clamping the number into `1..=10`.
    pub fn clamped(number: u8) -> Self {
        Self(number.clamp(1, STAGE_COUNT))
    }

    /// The stage number.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// The stage's table entry.
    pub fn definition(self) -> &'static StageDefinition {
        &STAGES[usize::from(self.0 - 1)]
    }

    /// Iterate all stages in pipeline order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=STAGE_COUNT).map(Self)
    }
}

impl TryFrom<u8> for Stage {
    type Error = TimelineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Stage> for u8 {
    fn from(stage: Stage) -> Self {
        stage.0
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the stage table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDefinition {
    /// Stage number (1-based)
    pub number: u8,
    /// First day of the stage window (1-based, inclusive)
    pub first_day: u32,
    /// Last day of the stage window (inclusive)
    pub last_day: u32,
    /// Short display title
    pub title: &'static str,
    /// Longer description of the work in this stage
    pub description: &'static str,
}

impl StageDefinition {
    /// The stage as a typed value.
    pub fn stage(&self) -> Stage {
        Stage(self.number)
    }

    /// The days this stage occupies.
    pub fn day_range(&self) -> RangeInclusive<u32> {
        self.first_day..=self.last_day
    }

    /// Number of days in the stage window.
    pub fn duration(&self) -> u32 {
        self.last_day - self.first_day + 1
    }

    /// Whether `day` falls inside this stage.
    pub fn contains(&self, day: u32) -> bool {
        self.day_range().contains(&day)
    }
}

/// The stage table, in pipeline order.
pub static STAGES: [StageDefinition; STAGE_COUNT as usize] = [
    StageDefinition {
        number: 1,
        first_day: 1,
        last_day: 3,
        title: "Molecular Composition Analysis",
        description: "Analytical characterization (HPLC-MS/MS, NMR, FTIR) to determine molecular \
                      structure and purity profiles.",
    },
    StageDefinition {
        number: 2,
        first_day: 4,
        last_day: 6,
        title: "Thermodynamic Stability Assessment",
        description: "Thermal analysis, accelerated stability testing and vapor sorption studies \
                      to evaluate formulation stability.",
    },
    StageDefinition {
        number: 3,
        first_day: 7,
        last_day: 9,
        title: "Synergistic Interaction Modeling",
        description: "Molecular dynamics simulations and in-vitro interaction studies to optimize \
                      ingredient synergies.",
    },
    StageDefinition {
        number: 4,
        first_day: 10,
        last_day: 12,
        title: "Bioavailability Enhancement",
        description: "ADME profiling, dissolution optimization and delivery-system strategies.",
    },
    StageDefinition {
        number: 5,
        first_day: 13,
        last_day: 15,
        title: "Regulatory Compliance Validation",
        description: "Safety margin assessments and heavy metals analysis for regulatory \
                      compliance.",
    },
    StageDefinition {
        number: 6,
        first_day: 16,
        last_day: 18,
        title: "Microencapsulation Engineering",
        description: "Particle engineering with spray-drying, fluid bed coating and coacervation.",
    },
    StageDefinition {
        number: 7,
        first_day: 19,
        last_day: 21,
        title: "Analytical Method Development",
        description: "Method validation, HPLC method development and stability-indicating assays.",
    },
    StageDefinition {
        number: 8,
        first_day: 22,
        last_day: 24,
        title: "Manufacturing Process Optimization",
        description: "Design of Experiments with process analytical technology for scalable \
                      manufacturing.",
    },
    StageDefinition {
        number: 9,
        first_day: 25,
        last_day: 26,
        title: "Quality Control Implementation",
        description: "Statistical process control and critical quality attribute definition.",
    },
    StageDefinition {
        number: 10,
        first_day: 27,
        last_day: 28,
        title: "Final Product Characterization",
        description: "Shelf-life prediction, product profiling and final specification \
                      documentation.",
    },
];

/// Day-to-stage lookup, indexed by `day - 1`.
static DAY_INDEX: Lazy<[u8; TIMELINE_DAYS as usize]> = Lazy::new(|| {
    let mut index = [0u8; TIMELINE_DAYS as usize];
    for def in &STAGES {
        for day in def.day_range() {
            index[(day - 1) as usize] = def.number;
        }
    }
    index
});

/// All stage definitions in order.
pub fn all() -> &'static [StageDefinition] {
    &STAGES
}

/// Find the stage whose window contains `day`.
///
/// Only days `1..=28` are in the table; callers clamp anything else.
pub fn stage_of(day: u32) -> Result<&'static StageDefinition, TimelineError> {
    if day == 0 || day > TIMELINE_DAYS {
        return Err(TimelineError::DayOutOfRange(day));
    }
    let number = DAY_INDEX[(day - 1) as usize];
    Ok(&STAGES[usize::from(number - 1)])
}

/// Look up a stage definition by number.
pub fn definition(stage: u8) -> Result<&'static StageDefinition, TimelineError> {
    Stage::new(stage).map(Stage::definition)
}

/// The day window of a stage.
pub fn range_of(stage: u8) -> Result<RangeInclusive<u32>, TimelineError> {
    definition(stage).map(StageDefinition::day_range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_partition_timeline() {
        let mut covered = Vec::new();
        for stage in 1..=STAGE_COUNT {
            covered.extend(range_of(stage).unwrap());
        }
        let expected: Vec<u32> = (1..=TIMELINE_DAYS).collect();
        assert_eq!(covered, expected);
    }

    #[test]
    fn test_ranges_are_contiguous() {
        for pair in STAGES.windows(2) {
            assert_eq!(pair[0].last_day + 1, pair[1].first_day);
            assert_eq!(pair[0].number + 1, pair[1].number);
        }
    }

    #[test]
    fn test_stage_of_day_14() {
        let def = stage_of(14).unwrap();
        assert_eq!(def.number, 5);
        assert_eq!(def.day_range(), 13..=15);
    }

    #[test]
    fn test_stage_of_boundaries() {
        assert_eq!(stage_of(1).unwrap().number, 1);
        assert_eq!(stage_of(3).unwrap().number, 1);
        assert_eq!(stage_of(4).unwrap().number, 2);
        assert_eq!(stage_of(26).unwrap().number, 9);
        assert_eq!(stage_of(28).unwrap().number, 10);
    }

    #[test]
    fn test_stage_of_out_of_range() {
        assert!(matches!(stage_of(0), Err(TimelineError::DayOutOfRange(0))));
        assert!(matches!(stage_of(29), Err(TimelineError::DayOutOfRange(29))));
    }

    #[test]
    fn test_range_of_invalid_stage() {
        assert!(matches!(range_of(0), Err(TimelineError::InvalidStage(0))));
        assert!(matches!(range_of(11), Err(TimelineError::InvalidStage(11))));
    }

    #[test]
    fn test_stage_newtype() {
        assert_eq!(Stage::new(7).unwrap().get(), 7);
        assert!(Stage::new(0).is_err());
        assert_eq!(Stage::clamped(0), Stage::FIRST);
        assert_eq!(Stage::clamped(42), Stage::LAST);
        assert_eq!(Stage::all().count(), 10);
        assert_eq!(Stage::LAST.definition().title, "Final Product Characterization");
    }

    #[test]
    fn test_short_final_stages() {
        assert_eq!(definition(9).unwrap().duration(), 2);
        assert_eq!(definition(10).unwrap().duration(), 2);
        assert_eq!(definition(1).unwrap().duration(), 3);
    }
}

//! The fixed set of datasets and their processing order.

use serde::Serialize;
use std::fmt;

/// One unit of input/output work.
///
/// `Dataset::ALL` is the processing order. States must precede cities and
/// cities must precede neighborhoods, since the later datasets resolve
/// surrogate ids assigned by the earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dataset {
    Users,
    Categories,
    Segments,
    AgeGroups,
    IncomeRanges,
    States,
    Cities,
    Neighborhoods,
}

impl Dataset {
    pub const ALL: [Dataset; 8] = [
        Dataset::Users,
        Dataset::Categories,
        Dataset::Segments,
        Dataset::AgeGroups,
        Dataset::IncomeRanges,
        Dataset::States,
        Dataset::Cities,
        Dataset::Neighborhoods,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Users => "users",
            Dataset::Categories => "categories",
            Dataset::Segments => "segments",
            Dataset::AgeGroups => "age-groups",
            Dataset::IncomeRanges => "income-ranges",
            Dataset::States => "states",
            Dataset::Cities => "cities",
            Dataset::Neighborhoods => "neighborhoods",
        }
    }

    /// File stem shared by the input extract and the output script
    pub fn file_stem(&self) -> &'static str {
        match self {
            Dataset::Users => "1-usuario",
            Dataset::Categories => "2-categoria",
            Dataset::Segments => "3-segmento",
            Dataset::AgeGroups => "4-grupo-idade",
            Dataset::IncomeRanges => "5-intervalo-renda",
            Dataset::States => "6-estado",
            Dataset::Cities => "7-cidade",
            Dataset::Neighborhoods => "8-bairro",
        }
    }

    /// Target table of the emitted statements
    pub fn table(&self) -> &'static str {
        match self {
            Dataset::Users => "users",
            Dataset::Categories => "categories",
            Dataset::Segments => "segments",
            Dataset::AgeGroups => "age_groups",
            Dataset::IncomeRanges => "income_ranges",
            Dataset::States => "states",
            Dataset::Cities => "cities",
            Dataset::Neighborhoods => "neighborhoods",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Dataset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.name() == normalized || d.file_stem() == normalized)
            .ok_or_else(|| {
                format!(
                    "Unknown dataset: '{}'. Known datasets: {}",
                    s,
                    Self::ALL.iter().map(|d| d.name()).collect::<Vec<_>>().join(", ")
                )
            })
    }
}

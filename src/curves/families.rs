//! Curve family names and the mapping from family to scenario columns

use crate::error::{AlmError, Diagnostics};
use crate::grid::{RawCurveTable, ScenarioGrid};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Named curve families carried on the scenario grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveFamily {
    Gilts,
    Swaps,
    Credit,
    Inflation,
    RealisedInflation,
    FxRates,
}

impl CurveFamily {
    /// Families the engine tries to extract on every run
    pub const ALL: [CurveFamily; 6] = [
        CurveFamily::Gilts,
        CurveFamily::Swaps,
        CurveFamily::Credit,
        CurveFamily::Inflation,
        CurveFamily::RealisedInflation,
        CurveFamily::FxRates,
    ];

    /// Families that get a forward curve derived
    pub fn needs_forward(self) -> bool {
        matches!(
            self,
            CurveFamily::Gilts | CurveFamily::Swaps | CurveFamily::Credit | CurveFamily::Inflation
        )
    }

    /// Families that additionally get a spot curve recovered from forwards
    pub fn needs_spot(self) -> bool {
        matches!(self, CurveFamily::Inflation)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CurveFamily::Gilts => "gilts",
            CurveFamily::Swaps => "swaps",
            CurveFamily::Credit => "credit",
            CurveFamily::Inflation => "inflation",
            CurveFamily::RealisedInflation => "realised_inflation",
            CurveFamily::FxRates => "fx_rates",
        }
    }
}

impl fmt::Display for CurveFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurveFamily {
    type Err = AlmError;

    /// Accepts both the family names and the legacy discount-basis labels
    /// ("Gilt", "Swap", "Credit") used in liability input tables.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gilts" | "Gilt" => Ok(CurveFamily::Gilts),
            "swaps" | "Swap" => Ok(CurveFamily::Swaps),
            "credit" | "Credit" => Ok(CurveFamily::Credit),
            "inflation" => Ok(CurveFamily::Inflation),
            "realised_inflation" => Ok(CurveFamily::RealisedInflation),
            "fx_rates" => Ok(CurveFamily::FxRates),
            other => Err(AlmError::InvalidInput(format!(
                "unknown curve family '{}'",
                other
            ))),
        }
    }
}

/// Base currency of a scenario column (GBP is the numeraire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Gbp,
    Usd,
    Eur,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Currency::Gbp => "GBP",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        };
        f.write_str(s)
    }
}

/// One scenario column belonging to a curve family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappedColumn {
    /// Column name on the scenario grid
    pub column: String,
    /// Base currency; only meaningful for FX and return columns
    #[serde(default)]
    pub currency: Currency,
}

impl MappedColumn {
    pub fn named(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            currency: Currency::Gbp,
        }
    }

    pub fn with_currency(column: impl Into<String>, currency: Currency) -> Self {
        Self {
            column: column.into(),
            currency,
        }
    }
}

/// Mapping from curve family to its constituent scenario columns, in tenor
/// order for rate families
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurveMapping {
    pub families: HashMap<CurveFamily, Vec<MappedColumn>>,
}

impl CurveMapping {
    pub fn columns(&self, family: CurveFamily) -> Option<&[MappedColumn]> {
        self.families.get(&family).map(|v| v.as_slice())
    }
}

/// Extract every mappable family from the scenario grid
///
/// A family with no mapping entry is recorded as a diagnostic and omitted;
/// a mapped column missing from the grid itself is fatal.
pub fn extract_families(
    grid: &ScenarioGrid,
    mapping: &CurveMapping,
    diags: &mut Diagnostics,
) -> Result<HashMap<CurveFamily, RawCurveTable>, AlmError> {
    let mut out = HashMap::new();
    let mut missing = Vec::new();

    for family in CurveFamily::ALL {
        let Some(columns) = mapping.columns(family) else {
            missing.push(family.as_str());
            continue;
        };
        let names: Vec<String> = columns.iter().map(|c| c.column.clone()).collect();
        out.insert(family, grid.raw_table(&names)?);
    }

    if !missing.is_empty() {
        diags.push(format!(
            "no column mapping for curve families: {}",
            missing.join(", ")
        ));
    }

    Ok(out)
}

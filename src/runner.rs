//! Run orchestration
//!
//! `AlmRunner` builds the curves and FX factors once per scenario grid, then
//! runs one or more asset strategies against a single liability. Reports are
//! keyed by descriptive names; multi-strategy runs suffix the per-strategy
//! tables with `_strat_{i}`.

use crate::assets::{portfolio_factors, roll_forward, AssetStrategy};
use crate::curves::{
    discount_day0, AlmCurves, CurveFamily, CurveMapping, DiscountBasis, FxFactors,
};
use crate::error::{AlmError, Diagnostics};
use crate::grid::{ScenarioGrid, Series};
use crate::hedging::{hedge_overlay, ldi_impacts, leverage};
use crate::liabilities::{proxy_schedule, CashflowModel, CashflowSchedule, ProxyProfiles};
use crate::reporting::{
    frame_table, funding_levels, percentile_table, snapshot_table, ReportSet, ReportTable,
    SimulationFrame, DEFAULT_QUANTILES,
};
use crate::valuation::{ie01, present_values, pv01, BASIS_POINT};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Margin over the base curve: a single level or a full 100-point vector
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Margin {
    Flat(f64),
    Curve(Vec<f64>),
}

impl Default for Margin {
    fn default() -> Self {
        Margin::Flat(0.0)
    }
}

/// One discounting basis as configured
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasisConfig {
    pub name: String,
    pub base: CurveFamily,
    #[serde(default)]
    pub margin: Margin,
}

impl BasisConfig {
    pub fn to_basis(&self) -> Result<DiscountBasis, AlmError> {
        match &self.margin {
            Margin::Flat(level) => Ok(DiscountBasis::flat(&self.name, self.base, *level)),
            Margin::Curve(vector) => {
                DiscountBasis::new(&self.name, self.base, vector.clone())
            }
        }
    }
}

/// Proxy construction inputs, used when no explicit schedule is supplied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub target_duration: f64,
    /// Fraction of the blended profile treated as inflation-linked
    pub inflation_linkage: f64,
    pub low_duration: Vec<f64>,
    pub high_duration: Vec<f64>,
}

/// Liability side of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiabilityConfig {
    /// Target day-0 liability value the schedule is scaled to
    pub starting_value: f64,
    /// Explicit schedule; takes precedence over the proxy
    #[serde(default)]
    pub cashflows: Option<CashflowSchedule>,
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
}

/// Quantiles and report timesteps for the percentile tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingConfig {
    #[serde(default = "default_quantiles")]
    pub quantiles: Vec<f64>,
    #[serde(default = "default_timesteps")]
    pub timesteps: Vec<usize>,
}

fn default_quantiles() -> Vec<f64> {
    DEFAULT_QUANTILES.to_vec()
}

fn default_timesteps() -> Vec<usize> {
    (0..=20).collect()
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            quantiles: default_quantiles(),
            timesteps: default_timesteps(),
        }
    }
}

impl ReportingConfig {
    /// Quantile levels must be probabilities
    pub fn validate(&self) -> Result<(), AlmError> {
        for &q in &self.quantiles {
            if !(0.0..=1.0).contains(&q) {
                return Err(AlmError::InvalidInput(format!(
                    "quantile level {} is outside [0, 1]",
                    q
                )));
            }
        }
        Ok(())
    }
}

/// Complete run configuration, loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub curve_mapping: CurveMapping,
    pub bases: Vec<BasisConfig>,
    pub liability: LiabilityConfig,
    pub strategies: Vec<AssetStrategy>,
    #[serde(default)]
    pub reporting: ReportingConfig,
}

impl RunConfig {
    pub fn from_path(path: &Path) -> Result<Self, AlmError> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| AlmError::InvalidInput(format!("run config: {}", e)))
    }
}

/// One strategy's full results: the per-row frame and its report tables
#[derive(Debug, Clone)]
pub struct StrategyOutput {
    pub frame: SimulationFrame,
    pub reports: ReportSet,
}

/// The projection engine for one scenario grid
///
/// Curves, FX factors, and the basis list are built once; each `run_strategy`
/// call reuses them.
pub struct AlmRunner {
    grid: ScenarioGrid,
    curves: AlmCurves,
    fx: FxFactors,
    bases: Vec<DiscountBasis>,
}

impl AlmRunner {
    pub fn new(
        grid: ScenarioGrid,
        mapping: &CurveMapping,
        bases: Vec<DiscountBasis>,
        diags: &mut Diagnostics,
    ) -> Result<Self, AlmError> {
        if bases.is_empty() {
            return Err(AlmError::InvalidInput(
                "at least one discounting basis is required".to_string(),
            ));
        }
        let curves = AlmCurves::build(&grid, mapping, diags)?;
        let fx = FxFactors::build(&curves, mapping);
        log::info!(
            "runner ready: {} trials, horizon {}, {} bases",
            grid.shape().trials,
            grid.shape().horizon,
            bases.len()
        );
        Ok(Self {
            grid,
            curves,
            fx,
            bases,
        })
    }

    pub fn curves(&self) -> &AlmCurves {
        &self.curves
    }

    pub fn bases(&self) -> &[DiscountBasis] {
        &self.bases
    }

    /// Resolve the liability schedule: explicit cashflows win, otherwise the
    /// duration-matched proxy on the first basis
    pub fn resolve_schedule(
        &self,
        liability: &LiabilityConfig,
    ) -> Result<CashflowSchedule, AlmError> {
        if let Some(schedule) = &liability.cashflows {
            schedule.validate()?;
            return Ok(schedule.clone());
        }
        let Some(proxy) = &liability.proxy else {
            return Err(AlmError::InvalidInput(
                "liability needs either explicit cashflows or a proxy configuration".to_string(),
            ));
        };

        let profiles =
            ProxyProfiles::new(proxy.low_duration.clone(), proxy.high_duration.clone())?;
        let discount = discount_day0(&self.curves, &self.bases[0], 0.0)?;
        proxy_schedule(
            &profiles,
            proxy.target_duration,
            proxy.inflation_linkage,
            &discount,
        )
    }

    /// Build the liability cashflow model, scaled to the starting value
    pub fn build_liability(
        &self,
        liability: &LiabilityConfig,
    ) -> Result<CashflowModel, AlmError> {
        let schedule = self.resolve_schedule(liability)?;
        CashflowModel::build(&self.curves, &self.bases[0], &schedule, liability.starting_value)
    }

    /// Run one asset strategy against a prepared liability model
    pub fn run_strategy(
        &self,
        model: &CashflowModel,
        strategy: &AssetStrategy,
        reporting: &ReportingConfig,
        diags: &mut Diagnostics,
    ) -> Result<StrategyOutput, AlmError> {
        log::info!("running strategy '{}'", strategy.name);
        reporting.validate()?;
        let shape = self.curves.shape();

        let total = model.total_cashflows(&model.inflation);
        let pv = present_values(&total, &self.curves, &self.bases, 0.0)?;
        let pv01 = pv01(&total, &self.curves, &self.bases, &pv, BASIS_POINT)?;
        let ie01 = ie01(model, &self.curves, &self.bases, &pv, BASIS_POINT)?;

        // hedging attribution on the first basis only
        let prev_total = model.total_cashflows(&model.previous_year_view());
        let pv_prev = present_values(&prev_total, &self.curves, &self.bases[..1], 0.0)?;
        let impacts = ldi_impacts(&pv[0], &pv_prev[0], &model.realized)?;
        let overlay = hedge_overlay(&impacts, strategy.hedge_ratios);

        let factors =
            portfolio_factors(&self.grid, &self.fx, &strategy.classes, &strategy.shocks)?;
        let assets = roll_forward(
            strategy.starting_value,
            &factors,
            &model.realized,
            &overlay,
            &strategy.contributions,
        );

        let mut frame = SimulationFrame::new(shape);
        let mut snapshot_columns = Vec::new();
        for (basis, series) in self.bases.iter().zip(&pv) {
            let name = format!("Liabilities {}", basis.name);
            snapshot_columns.push(name.clone());
            frame.insert(name, series.clone());
        }
        snapshot_columns.push("Assets".to_string());
        frame.insert("Assets", assets.clone());
        for (basis, series) in self.bases.iter().zip(&pv) {
            let surplus_values = assets
                .values()
                .iter()
                .zip(series.values())
                .map(|(&a, &l)| a - l)
                .collect();
            frame.insert(
                format!("Surplus {}", basis.name),
                Series::from_values(shape, surplus_values),
            );
        }
        for (basis, series) in self.bases.iter().zip(&pv) {
            frame.insert(
                format!("Funding_level_{}", basis.name),
                funding_levels(&assets, series, &basis.name, diags),
            );
        }
        for (basis, series) in self.bases.iter().zip(&pv01) {
            frame.insert(format!("PV01 {}", basis.name), series.clone());
        }
        for (basis, series) in self.bases.iter().zip(&ie01) {
            frame.insert(format!("IE01 {}", basis.name), series.clone());
        }

        let mut leverage_frame = SimulationFrame::new(shape);
        let leverage_series = leverage(
            &pv,
            strategy.hedge_ratios.interest,
            strategy.ldi_allocation,
            &assets,
        );
        for (basis, series) in self.bases.iter().zip(leverage_series) {
            leverage_frame.insert(format!("Leverage {}", basis.name), series);
        }

        let mut reports = ReportSet::default();
        reports.insert(
            "percentiles",
            percentile_table(&frame, &reporting.quantiles, &reporting.timesteps),
        );
        reports.insert("day0_snapshot", snapshot_table(&frame, &snapshot_columns));
        // raw per-(trial, timestep) leverage; the percentile view is extra
        reports.insert("leverage", frame_table(&leverage_frame));
        reports.insert(
            "leverage_percentiles",
            percentile_table(&leverage_frame, &reporting.quantiles, &reporting.timesteps),
        );

        Ok(StrategyOutput { frame, reports })
    }

    /// Run every strategy against one liability and merge the reports
    ///
    /// With a single strategy tables keep their plain names; with several,
    /// each strategy's tables are suffixed `_strat_{i}` (1-based, input
    /// order). The rates summary is liability-independent and appears once,
    /// unsuffixed.
    pub fn run_strategies(
        &self,
        liability: &LiabilityConfig,
        strategies: &[AssetStrategy],
        reporting: &ReportingConfig,
        diags: &mut Diagnostics,
    ) -> Result<ReportSet, AlmError> {
        if strategies.is_empty() {
            return Err(AlmError::InvalidInput(
                "at least one asset strategy is required".to_string(),
            ));
        }
        reporting.validate()?;
        let model = self.build_liability(liability)?;

        let mut merged = ReportSet::default();
        merged.insert("rates", self.rates_table(reporting));

        for (index, strategy) in strategies.iter().enumerate() {
            let output = self.run_strategy(&model, strategy, reporting, diags)?;
            if strategies.len() == 1 {
                merged.merge(output.reports);
            } else {
                // 1-based suffix, matching the historical report names
                for name in output.reports.names() {
                    if let Some(table) = output.reports.get(name) {
                        merged.insert(format!("{}_strat_{}", name, index + 1), table.clone());
                    }
                }
            }
        }
        Ok(merged)
    }

    /// Percentile summary of the raw market inputs: 1/10/20-year rates for
    /// each mapped rate family plus the realized inflation index
    fn rates_table(&self, reporting: &ReportingConfig) -> ReportTable {
        let mut frame = SimulationFrame::new(self.curves.shape());

        let labeled = [
            (CurveFamily::Gilts, "Gilt"),
            (CurveFamily::Swaps, "Swap"),
            (CurveFamily::Credit, "Credit"),
            (CurveFamily::Inflation, "Inflation"),
        ];
        for (family, label) in labeled {
            let Ok(raw) = self.curves.raw(family) else {
                continue;
            };
            for year in [1usize, 10, 20] {
                if year <= raw.width() {
                    frame.insert(format!("{} {}y", label, year), raw.column(year - 1));
                }
            }
        }
        if let Ok(raw) = self.curves.raw(CurveFamily::RealisedInflation) {
            if raw.width() > 0 {
                frame.insert("RPI index", raw.column(0));
            }
        }

        percentile_table(&frame, &reporting.quantiles, &reporting.timesteps)
    }
}

//! Liability cashflows: proxy construction, scaling, and realization

mod cashflows;
mod proxy;

pub use cashflows::{day0_present_value, CashflowModel, CashflowSchedule, UnwindTable};
pub use proxy::{
    duration, match_duration, proxy_schedule, ProxyProfiles, SOLVER_MAX_ITERATIONS,
    SOLVER_TOLERANCE,
};

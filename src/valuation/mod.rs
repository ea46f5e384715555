//! Present value and sensitivity engine

mod pv;
mod sensitivity;

pub use pv::{present_values, pv_differences};
pub use sensitivity::{ie01, pv01, BASIS_POINT};

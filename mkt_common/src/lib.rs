mod commission_rate;
mod money;

pub mod helpers;
pub mod op;

pub use commission_rate::{CommissionRate, CommissionRateError, BASIS_POINTS_PER_UNIT};
pub use money::{Money, MoneyConversionError};

//! Park-Net: a weighted-priority parking spot lottery for condominium
//! residents, with carry-forward priority for the previous period's losers.

pub mod config;
pub mod error;
pub mod lottery;
pub mod telemetry;

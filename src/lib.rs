pub mod calculator;
pub mod config;
pub mod expression;
pub mod grid;
pub mod output;
pub mod resolver;
pub mod scale;
pub mod telemetry;
pub mod thresholds;

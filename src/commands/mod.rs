pub mod interval;
pub mod report;
pub mod sweep;

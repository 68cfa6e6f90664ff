// Aggregation module
// Buckets classified trials by saccade partition and contrast, and pools sessions

pub mod counts;
pub mod psychometric;

pub use counts::{Partition, ResponseCounts, SessionAggregate, SummaryRow};
pub use psychometric::PsychometricCurve;

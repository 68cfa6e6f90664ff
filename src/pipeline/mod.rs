// Pipeline execution and monitoring module
// Runs the per-session stages, pools sessions, and traces each run

pub mod pool;
pub mod session;
pub mod trace;

pub use pool::{pool_sessions, PooledAnalysis, SkippedSession};
pub use session::{
    ExtractionSummary, SeriesStatus, Session, SessionAnalysis, SessionError, SessionResult,
    SessionStatus,
};
pub use trace::{read_trace_file, Stage, TraceEntry, TraceError, TraceWriter, TRACE_FILE};

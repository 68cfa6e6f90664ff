// Cross-session pooling
// Sessions are analyzed independently on the rayon pool and their counts summed

use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::aggregate::SessionAggregate;
use crate::config::AnalysisConfig;

use super::session::{Session, SessionResult};

/// A session left out of the pool, with the reason
#[derive(Debug, Clone, Serialize)]
pub struct SkippedSession {
    pub folder: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct PooledAnalysis {
    pub aggregate: SessionAggregate,
    pub included: Vec<PathBuf>,
    pub skipped: Vec<SkippedSession>,
}

fn analyze_one(folder: &Path, config: &AnalysisConfig, filtered: bool) -> SessionResult<SessionAggregate> {
    let session = Session::open(folder, config.clone())?;
    Ok(session.analyze(filtered)?.aggregate)
}

/// Pool response counts over `folders`
///
/// A session that fails to analyze is skipped and reported; the rest are pooled.
pub fn pool_sessions(folders: &[PathBuf], config: &AnalysisConfig, filtered: bool) -> PooledAnalysis {
    let outcomes: Vec<(PathBuf, SessionResult<SessionAggregate>)> = folders
        .par_iter()
        .map(|folder| (folder.clone(), analyze_one(folder, config, filtered)))
        .collect();

    let mut included = Vec::new();
    let mut skipped = Vec::new();
    let mut aggregates = Vec::new();

    for (folder, outcome) in outcomes {
        match outcome {
            Ok(aggregate) => {
                included.push(folder);
                aggregates.push(aggregate);
            }
            Err(e) => {
                log::warn!("Skipping session {}: {}", folder.display(), e);
                skipped.push(SkippedSession {
                    folder,
                    reason: e.to_string(),
                });
            }
        }
    }

    let aggregate = SessionAggregate::pool(&aggregates);
    log::info!(
        "Pooled {} sessions ({} skipped)",
        aggregate.sessions(),
        skipped.len()
    );

    PooledAnalysis {
        aggregate,
        included,
        skipped,
    }
}

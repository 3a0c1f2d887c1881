//! CSV output of rendered leaderboards

use crate::error::{RankingError, Result};
use crate::report::render::RenderedReport;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the rankings table
pub const SCORES_FILE: &str = "scores.csv";

/// File name of the wins table
pub const WINS_FILE: &str = "wins.csv";

/// Writes `scores.csv` and `wins.csv` into a fixed directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn scores_path(&self) -> PathBuf {
        self.dir.join(SCORES_FILE)
    }

    pub fn wins_path(&self) -> PathBuf {
        self.dir.join(WINS_FILE)
    }

    /// Write both tables, replacing previous output
    ///
    /// Rows are headerless: `player,tournament_count,mean,sigma,score` and
    /// `player,win_count,loser1,loser2,...`.
    pub fn write(&self, report: &RenderedReport) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| RankingError::persistence(&self.dir, e))?;

        let scores_path = self.scores_path();
        let mut scores = open_writer(&scores_path)?;
        for row in &report.rankings {
            scores
                .write_record([
                    row.player.clone(),
                    row.tournament_count.to_string(),
                    row.mean.to_string(),
                    row.sigma.to_string(),
                    row.score.to_string(),
                ])
                .map_err(|e| RankingError::persistence(&scores_path, e))?;
        }
        scores
            .flush()
            .map_err(|e| RankingError::persistence(&scores_path, e))?;

        let wins_path = self.wins_path();
        let mut wins = open_writer(&wins_path)?;
        for row in &report.wins {
            let mut record = Vec::with_capacity(row.losers.len() + 2);
            record.push(row.player.clone());
            record.push(row.win_count.to_string());
            record.extend(row.losers.iter().cloned());
            wins.write_record(&record)
                .map_err(|e| RankingError::persistence(&wins_path, e))?;
        }
        wins.flush()
            .map_err(|e| RankingError::persistence(&wins_path, e))?;

        info!(
            "Wrote {} ranking rows to {} and {} win rows to {}",
            report.rankings.len(),
            scores_path.display(),
            report.wins.len(),
            wins_path.display()
        );
        Ok(())
    }
}

fn open_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    let writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| RankingError::persistence(path, e))?;
    Ok(writer)
}

use crate::channel::ChannelMode;
use crate::error::SortError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Counters one stage collects while it runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: usize,
    pub run_len: usize,
    pub received: usize,
    pub emitted: usize,
    pub pairs_completed: usize,
    /// Largest number of elements held in both queues at once
    pub peak_occupancy: usize,
    /// Time spent outside `recv`/`send`, i.e. storing and merging
    pub busy_secs: f64,
    pub blocked_secs: f64,
    pub elapsed_secs: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub input_len: usize,
    pub stage_count: usize,
    pub channel: ChannelMode,
    pub wall_secs: f64,
    pub stages: Vec<StageReport>,
}

impl RunReport {
    pub fn new(
        input_len: usize,
        stage_count: usize,
        channel: ChannelMode,
        wall_secs: f64,
        mut stages: Vec<StageReport>,
    ) -> Self {
        stages.sort_by_key(|s| s.stage);
        RunReport { input_len, stage_count, channel, wall_secs, stages }
    }

    /// Sum of per-stage busy time, excluding time blocked on links.
    pub fn reduced_secs(&self) -> f64 {
        self.stages.iter().map(|s| s.busy_secs).sum()
    }

    /// Elements held anywhere at peak: every stage's queues plus the source.
    pub fn peak_elements(&self) -> usize {
        self.stages.iter().map(|s| s.peak_occupancy).sum::<usize>() + self.input_len
    }

    pub fn write_json(&self, path: &Path) -> Result<(), SortError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(index: usize, peak: usize, busy: f64) -> StageReport {
        StageReport {
            stage: index,
            run_len: 1 << (index - 1),
            received: 8,
            emitted: 8,
            pairs_completed: 8 >> index,
            peak_occupancy: peak,
            busy_secs: busy,
            blocked_secs: 0.5 - busy,
            elapsed_secs: 0.5,
        }
    }

    #[test]
    fn test_totals() {
        let stages = vec![stage(3, 5, 0.25), stage(1, 2, 0.5), stage(2, 3, 0.25)];
        let report = RunReport::new(8, 4, ChannelMode::Rendezvous, 0.5, stages);
        assert_eq!(report.stages.iter().map(|s| s.stage).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(report.peak_elements(), 2 + 3 + 5 + 8);
        assert!((report.reduced_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_write_json_roundtrips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = RunReport::new(2, 2, ChannelMode::Buffered, 0.0, vec![stage(1, 2, 0.0)]);
        report.write_json(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: RunReport = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, report);
        assert!(text.contains("\"peak_occupancy\": 2"));
        assert!(text.contains("\"channel\": \"buffered\""));
    }
}

use serde::{Deserialize, Serialize};

/// Where a record stands in its pipeline. Shared by candidates, CVs and employees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Pending,
    Passed,
    Failed,
    Rejected,
}

impl RoundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundStatus::Pending => "pending",
            RoundStatus::Passed => "passed",
            RoundStatus::Failed => "failed",
            RoundStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoundStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RoundStatus::Pending),
            "passed" => Ok(RoundStatus::Passed),
            "failed" => Ok(RoundStatus::Failed),
            "rejected" => Ok(RoundStatus::Rejected),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Progress {
    /// 1-based. Equals `stages + 1` once the record has passed every stage.
    pub current_round: u32,
    pub status: RoundStatus,
}

impl Progress {
    pub fn start() -> Self {
        Self {
            current_round: 1,
            status: RoundStatus::Pending,
        }
    }

    pub fn new(current_round: u32, status: RoundStatus) -> Self {
        Self {
            current_round,
            status,
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_is_first_round_pending() {
        assert_eq!(Progress::start(), Progress::new(1, RoundStatus::Pending));
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            RoundStatus::Pending,
            RoundStatus::Passed,
            RoundStatus::Failed,
            RoundStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<RoundStatus>(), Ok(status));
        }
        assert!("hired".parse::<RoundStatus>().is_err());
    }
}

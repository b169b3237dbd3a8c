use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a single pipeline execution
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct AnalysisRunId(pub Uuid);

impl AnalysisRunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AnalysisRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnalysisRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AnalysisRunId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<AnalysisRunId> for Uuid {
    fn from(id: AnalysisRunId) -> Self {
        id.0
    }
}

use crate::domain::{Group, Sample};
use crate::error::Result;

/// Anything that can produce the two samples of an experiment.
pub trait SampleSource {
    fn load(&self, group: Group) -> Result<Sample>;

    /// Human-readable description used in log lines.
    fn describe_source(&self) -> String;
}

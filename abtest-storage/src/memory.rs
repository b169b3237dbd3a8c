use abtest_core::{CoreError, Group, Result, Sample, SampleSource};

/// Two samples already held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    control: Sample,
    test: Sample,
}

impl MemorySource {
    pub fn new(control: Sample, test: Sample) -> Result<Self> {
        if control.group != Group::Control || test.group != Group::Test {
            return Err(CoreError::Validation(
                "memory source expects a control and a test sample".to_string(),
            ));
        }
        Ok(Self { control, test })
    }
}

impl SampleSource for MemorySource {
    fn load(&self, group: Group) -> Result<Sample> {
        Ok(match group {
            Group::Control => self.control.clone(),
            Group::Test => self.test.clone(),
        })
    }

    fn describe_source(&self) -> String {
        "in-memory samples".to_string()
    }
}

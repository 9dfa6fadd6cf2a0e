/// Metric names recorded for a run. Derived from the run name so several runs in the same
/// process can be told apart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationLabels {
    pub success: String,
    pub error: String,
    pub timeout: String,
    pub latency: String,
}

impl OperationLabels {
    pub fn new(base_name: &str) -> Self {
        Self {
            success: format!("{base_name}_success"),
            error: format!("{base_name}_error"),
            timeout: format!("{base_name}_timeout"),
            latency: format!("{base_name}_latency"),
        }
    }
}

/// Ordered log of executed steps, kept while recording is on
#[derive(Debug, Clone, Default)]
pub(crate) struct Recording {
    enabled: bool,
    step_names: Vec<String>,
    message_types: Vec<&'static str>,
}

impl Recording {
    /// Clear the log and start appending
    pub(crate) fn start(&mut self) {
        self.enabled = true;
        self.step_names.clear();
        self.message_types.clear();
    }

    /// Stop appending, keeping what was logged
    pub(crate) fn stop(&mut self) {
        self.enabled = false;
    }

    pub(crate) fn record(&mut self, step: &str, message_type: &'static str) {
        if self.enabled {
            self.step_names.push(step.to_string());
            self.message_types.push(message_type);
        }
    }

    pub(crate) fn step_names(&self) -> &[String] {
        &self.step_names
    }

    pub(crate) fn message_types(&self) -> &[&'static str] {
        &self.message_types
    }
}

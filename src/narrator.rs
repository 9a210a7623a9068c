use crate::engine::EndReason;

/// Where the core sends what happened. The session never talks to a console directly.
pub trait Narrator {
    fn present(&mut self, lines: &[String]);

    fn report_end(&mut self, reason: &EndReason);
}

/// Keeps everything in memory; used by the headless runner and tests.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    pub lines: Vec<String>,
    pub end: Option<EndReason>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Narrator for Transcript {
    fn present(&mut self, lines: &[String]) {
        self.lines.extend_from_slice(lines);
    }

    fn report_end(&mut self, reason: &EndReason) {
        self.end = Some(reason.clone());
    }
}

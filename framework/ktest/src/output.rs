//! Text sink for the report.
//!
//! The report is line oriented and goes to one of:
//! - Stdout: the default for the CLI
//! - Buffer: captured for tests that assert on report lines
//! - Silent: discarded
//!
//! Enum dispatch rather than a trait object; there are exactly three sinks.

use parking_lot::Mutex;

/// Line buffer used by [`Output::Buffer`].
#[derive(Default)]
pub struct BufferOutput {
    lines: Mutex<Vec<String>>,
}

impl BufferOutput {
    pub fn new() -> Self {
        BufferOutput::default()
    }

    fn println(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }

    /// All captured lines, in order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Captured text joined with newlines.
    pub fn text(&self) -> String {
        let lines = self.lines.lock();
        let mut text = lines.join("\n");
        if !lines.is_empty() {
            text.push('\n');
        }
        text
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

/// Where report lines go.
#[derive(Default)]
pub enum Output {
    #[default]
    Stdout,
    Buffer(BufferOutput),
    Silent,
}

impl Output {
    /// A capturing sink.
    pub fn buffer() -> Self {
        Output::Buffer(BufferOutput::new())
    }

    /// Write one line.
    pub fn println(&self, line: &str) {
        match self {
            Output::Stdout => println!("{line}"),
            Output::Buffer(buffer) => buffer.println(line),
            Output::Silent => {}
        }
    }

    /// Captured lines; empty for sinks that don't capture.
    pub fn captured_lines(&self) -> Vec<String> {
        match self {
            Output::Buffer(buffer) => buffer.lines(),
            Output::Stdout | Output::Silent => Vec::new(),
        }
    }

    /// Captured text; empty for sinks that don't capture.
    pub fn captured(&self) -> String {
        match self {
            Output::Buffer(buffer) => buffer.text(),
            Output::Stdout | Output::Silent => String::new(),
        }
    }

    /// Forget captured output. No-op for stdout and silent.
    pub fn clear(&self) {
        if let Output::Buffer(buffer) = self {
            buffer.clear();
        }
    }
}

//! Append-only text sinks for renderer output.

use std::io::Write;
use std::sync::Mutex;

/// Receives raw renderer output as it arrives.
pub trait OutputSink: Send + Sync {
    /// Append text exactly as produced.
    fn append(&self, text: &str);

    /// Append text followed by a newline.
    fn append_line(&self, line: &str) {
        self.append(line);
        self.append("\n");
    }
}

/// Collects everything into memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    buffer: Mutex<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything appended so far.
    pub fn contents(&self) -> String {
        self.buffer
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl OutputSink for MemorySink {
    fn append(&self, text: &str) {
        let mut buf = self
            .buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        buf.push_str(text);
    }
}

/// Writes to any `Write`, flushing after every chunk.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> OutputSink for WriterSink<W> {
    fn append(&self, text: &str) {
        let mut out = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // A closed stream must not abort the render.
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

/// Renderer output on the terminal. Uses stderr so stdout carries only results.
pub type ConsoleSink = WriterSink<std::io::Stderr>;

impl WriterSink<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

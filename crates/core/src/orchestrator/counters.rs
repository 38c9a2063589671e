//! Step and port bookkeeping for one provisioning run.

use tracing::info;

use super::types::OrchestratorError;

/// Numbered progress reporting: `[step/total] description`.
#[derive(Debug, Clone)]
pub struct ProgressCounter {
    step: usize,
    total: usize,
    lines: Vec<String>,
}

impl ProgressCounter {
    pub fn new(total: usize) -> Self {
        Self {
            step: 0,
            total,
            lines: Vec::with_capacity(total),
        }
    }

    /// Moves to the next step and logs its progress line.
    pub fn advance(&mut self, description: impl AsRef<str>) -> usize {
        self.step += 1;
        let line = format!("[{}/{}] {}", self.step, self.total, description.as_ref());
        info!("{}", line);
        self.lines.push(line);
        self.step
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// Hands out consecutive TCP ports starting at a base port.
#[derive(Debug, Clone)]
pub struct PortAllocator {
    /// `None` once `u16::MAX` has been handed out.
    next: Option<u16>,
    last: Option<u16>,
}

impl PortAllocator {
    pub fn new(base: u16) -> Self {
        Self {
            next: Some(base),
            last: None,
        }
    }

    pub fn next_port(&mut self) -> Result<u16, OrchestratorError> {
        let port = self.next.ok_or_else(|| {
            OrchestratorError::InvalidRequest(format!("no TCP ports left after {}", u16::MAX))
        })?;
        self.next = port.checked_add(1);
        self.last = Some(port);
        Ok(port)
    }

    /// The most recently allocated port, if any.
    pub fn last_allocated(&self) -> Option<u16> {
        self.last
    }
}

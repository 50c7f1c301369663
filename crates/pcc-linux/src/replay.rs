use std::fs;
use std::path::Path;

use anyhow::Context;

use pcc_core::{PcError, Sample};
use pcc_hal::TimingSource;

/// Replays recorded timings, one value per whitespace-separated token.
/// Reports `WouldBlock` once drained, like a quiet live source.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    values: Vec<f64>,
    cursor: usize,
}

impl ReplaySource {
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let values = text
            .split_whitespace()
            .enumerate()
            .map(|(i, tok)| {
                tok.parse::<f64>()
                    .with_context(|| format!("token {}: {:?} is not a number", i, tok))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self::from_values(values))
    }

    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.values.len() - self.cursor
    }
}

impl TimingSource for ReplaySource {
    fn sample(&mut self) -> nb::Result<Sample, PcError> {
        let Some(&value) = self.values.get(self.cursor) else {
            return Err(nb::Error::WouldBlock);
        };
        let s = Sample::new(self.cursor as u64, value);
        self.cursor += 1;
        Ok(s)
    }
}

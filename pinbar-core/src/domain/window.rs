//! Fixed-capacity, time-ordered candle window.

use std::collections::VecDeque;
use std::ops::Index;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::candle::Candle;

#[derive(Debug, Error, PartialEq)]
pub enum WindowError {
    #[error("Candle window capacity must be at least 1")]
    ZeroCapacity,

    #[error("Candle at {pushed} is older than the latest candle at {latest}")]
    OutOfOrder {
        latest: DateTime<Utc>,
        pushed: DateTime<Utc>,
    },
}

/// Ring buffer of candles in chronological order.
///
/// Index 0 is the oldest retained candle, `len() - 1` the latest. Pushing
/// beyond capacity evicts the oldest candle. A candle with the same timestamp
/// as the latest one replaces it (a still-forming kline being updated); an
/// older timestamp is rejected.
#[derive(Debug, Clone)]
pub struct CandleWindow {
    candles: VecDeque<Candle>,
    capacity: usize,
}

impl CandleWindow {
    pub fn new(capacity: usize) -> Result<Self, WindowError> {
        if capacity == 0 {
            return Err(WindowError::ZeroCapacity);
        }
        Ok(Self {
            candles: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Build a window from candles in chronological order, keeping the newest `capacity`.
    pub fn from_candles<I>(capacity: usize, candles: I) -> Result<Self, WindowError>
    where
        I: IntoIterator<Item = Candle>,
    {
        let mut window = Self::new(capacity)?;
        for candle in candles {
            window.push(candle)?;
        }
        Ok(window)
    }

    /// Append a candle. Returns the evicted candle, if any.
    pub fn push(&mut self, candle: Candle) -> Result<Option<Candle>, WindowError> {
        if let Some(latest) = self.candles.back_mut() {
            if candle.timestamp < latest.timestamp {
                return Err(WindowError::OutOfOrder {
                    latest: latest.timestamp,
                    pushed: candle.timestamp,
                });
            }
            if candle.timestamp == latest.timestamp {
                *latest = candle;
                return Ok(None);
            }
        }

        let evicted = if self.candles.len() == self.capacity {
            self.candles.pop_front()
        } else {
            None
        };
        self.candles.push_back(candle);
        Ok(evicted)
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.back()
    }

    /// Index of the latest candle, if any.
    pub fn latest_index(&self) -> Option<usize> {
        self.candles.len().checked_sub(1)
    }

    /// True when at least `required` candles are held.
    pub fn has_at_least(&self, required: usize) -> bool {
        self.candles.len() >= required
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candle> + '_ {
        self.candles.iter()
    }

    /// Candles in the inclusive index range `start..=end`, or `None` if out of bounds.
    pub fn span(&self, start: usize, end: usize) -> Option<impl Iterator<Item = &Candle> + '_> {
        if start > end || end >= self.candles.len() {
            return None;
        }
        Some(self.candles.range(start..=end))
    }
}

impl Index<usize> for CandleWindow {
    type Output = Candle;

    fn index(&self, index: usize) -> &Self::Output {
        &self.candles[index]
    }
}

// SPDX-License-Identifier: GPL-3.0-or-later
use std::collections::VecDeque;
use std::time::Duration;

/// A trait for types that can be averaged together in place.
pub trait Average: Clone {
    fn add_assign(&mut self, rhs: &Self);
    fn sub_assign(&mut self, rhs: &Self);
    fn div(&self, count: u32) -> Self;
}

impl Average for Duration {
    fn add_assign(&mut self, rhs: &Self) {
        *self += *rhs;
    }

    fn sub_assign(&mut self, rhs: &Self) {
        *self -= *rhs;
    }

    fn div(&self, count: u32) -> Self {
        *self / count
    }
}

pub trait MovingAverage<T> {
    /// Add a new sample and return the new moving average afterwards.
    fn update(&mut self, new_value: T) -> T;

    /// Get the current moving average. If there have been no samples yet, it returns [None].
    fn current_value(&self) -> Option<T>;
}

/// A moving average over the last `N` samples, all weighted identically.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxcarFilter<T, const N: usize> {
    samples: VecDeque<T>,
    sum: Option<T>,
}

impl<T, const N: usize> BoxcarFilter<T, N> {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(N),
            sum: None,
        }
    }
}

impl<T, const N: usize> Default for BoxcarFilter<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Average, const N: usize> MovingAverage<T> for BoxcarFilter<T, N> {
    fn update(&mut self, new_value: T) -> T {
        if self.samples.len() >= N {
            if let (Some(oldest), Some(sum)) = (self.samples.pop_front(), self.sum.as_mut()) {
                sum.sub_assign(&oldest);
            }
        }
        let sum = match self.sum.as_mut() {
            Some(sum) => {
                sum.add_assign(&new_value);
                sum.clone()
            }
            None => {
                self.sum = Some(new_value.clone());
                new_value.clone()
            }
        };
        self.samples.push_back(new_value);
        sum.div(self.samples.len() as u32)
    }

    fn current_value(&self) -> Option<T> {
        self.sum
            .as_ref()
            .map(|sum| sum.div(self.samples.len() as u32))
    }
}

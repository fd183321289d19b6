//! In-memory storage of recorded draws.

use std::collections::HashMap;

use crate::{
    distribution::{Distribution, Scalar},
    model::Model,
    node::NodeHandle,
    shape::Shape,
};

/// Named series of real-valued draws, in recording order.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    names: Vec<String>,
    series: HashMap<String, Vec<f64>>,
}

impl Trace {
    pub fn new() -> Trace {
        Trace::default()
    }

    /// Append one value to the series `name`, creating it if needed.
    pub fn push(&mut self, name: &str, value: f64) {
        match self.series.get_mut(name) {
            Some(series) => series.push(value),
            None => {
                self.names.push(name.to_string());
                self.series.insert(name.to_string(), vec![value]);
            }
        }
    }

    /// Record every value of a node. Array and matrix elements are stored
    /// as separate series named like `x[2]` or `m[1, 0]`.
    pub fn record_node<D: Distribution, S: Shape>(&mut self, model: &Model, handle: NodeHandle<D, S>) {
        let node = model.node(handle);
        for (offset, value) in node.values().iter().enumerate() {
            let name = format!("{}{}", node.name(), node.shape().index_at(offset));
            self.push(&name, value.to_f64());
        }
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(Vec::as_slice)
    }

    /// Series names in order of first appearance.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Length of the longest series.
    pub fn len(&self) -> usize {
        self.series.values().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mean(&self, name: &str) -> Option<f64> {
        let series = self.get(name)?;
        if series.is_empty() {
            return None;
        }
        Some(series.iter().sum::<f64>() / series.len() as f64)
    }

    /// Unbiased sample variance.
    pub fn variance(&self, name: &str) -> Option<f64> {
        let series = self.get(name)?;
        if series.len() < 2 {
            return None;
        }
        let mean = self.mean(name)?;
        let ss: f64 = series.iter().map(|x| (x - mean).powi(2)).sum();
        Some(ss / (series.len() - 1) as f64)
    }

    /// Drop the first `n` values of every series.
    pub fn discard(&mut self, n: usize) {
        for series in self.series.values_mut() {
            series.drain(..n.min(series.len()));
        }
    }
}

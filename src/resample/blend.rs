use std::collections::VecDeque;

use ndarray::{Array2, Axis};

/// Combine lanes of `plane` along `axis` with one tap list per output lane.
pub fn blend_axis(plane: &Array2<f64>, taps: &[Vec<(usize, f64)>], axis: Axis) -> Array2<f64> {
    let mut shape = plane.raw_dim();
    shape[axis.index()] = taps.len();
    let mut out = Array2::zeros(shape);

    for (j, lane_taps) in taps.iter().enumerate() {
        let mut lane = out.index_axis_mut(axis, j);
        for &(src, weight) in lane_taps {
            lane.scaled_add(weight, &plane.index_axis(axis, src));
        }
    }
    out
}

/// Running weighted sums of source slices along z.
///
/// Slices are pushed in increasing z; an output is handed back as soon as its
/// last tap has been added, so at most the outputs whose windows overlap the
/// current slice are held in memory.
pub struct ZAccumulator<'a> {
    taps: &'a [Vec<(usize, f64)>],
    next_output: usize,
    open: VecDeque<(usize, Array2<f64>)>,
}

impl<'a> ZAccumulator<'a> {
    pub fn new(taps: &'a [Vec<(usize, f64)>]) -> Self {
        Self {
            taps,
            next_output: 0,
            open: VecDeque::new(),
        }
    }

    /// Whether any output still waiting reads source slice `z`.
    pub fn needs(&self, z: usize) -> bool {
        self.taps[self.next_output_window()..]
            .iter()
            .take_while(|taps| taps.first().is_some_and(|&(first, _)| first <= z))
            .any(|taps| taps.iter().any(|&(i, _)| i == z))
    }

    fn next_output_window(&self) -> usize {
        self.open.front().map_or(self.next_output, |&(o, _)| o)
    }

    /// Add source slice `z`, returning the outputs it completes, in order.
    pub fn push(&mut self, z: usize, plane: &Array2<f64>) -> Vec<(usize, Array2<f64>)> {
        while self.next_output < self.taps.len()
            && self.taps[self.next_output]
                .first()
                .is_some_and(|&(first, _)| first <= z)
        {
            self.open
                .push_back((self.next_output, Array2::zeros(plane.raw_dim())));
            self.next_output += 1;
        }

        for (o, acc) in self.open.iter_mut() {
            if let Some(&(_, weight)) = self.taps[*o].iter().find(|&&(i, _)| i == z) {
                acc.scaled_add(weight, plane);
            }
        }

        let mut done = Vec::new();
        while let Some(&(o, _)) = self.open.front() {
            let last = self.taps[o].last().map_or(0, |&(i, _)| i);
            if last > z {
                break;
            }
            if let Some(finished) = self.open.pop_front() {
                done.push(finished);
            }
        }
        done
    }

    pub fn is_finished(&self) -> bool {
        self.next_output == self.taps.len() && self.open.is_empty()
    }
}

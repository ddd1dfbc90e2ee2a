//! Forward-mode tangents for per-agent quantities.
//!
//! Every quantity that depends on the learnable transmission rates carries, next to its value,
//! one tangent column per parameter. Propagating the tangents through each stage of a step gives
//! the exact derivative of any later outcome with respect to every parameter, without keeping a
//! tape of earlier steps around. With only a handful of venue types, the tangent matrix is a
//! small constant factor on top of the values.

use ndarray::{Array1, Array2, ArrayView1, Axis};

/// A scalar with tangents with respect to all parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Dual {
    pub value: f64,
    pub tangent: Array1<f64>,
}

impl Dual {
    /// A scalar that does not depend on any parameter.
    pub fn constant(value: f64, n_params: usize) -> Self {
        Self {
            value,
            tangent: Array1::zeros(n_params),
        }
    }

    /// A scalar with tangent `derivative` in the direction of parameter `index`.
    pub fn variable(value: f64, derivative: f64, index: usize, n_params: usize) -> Self {
        let mut tangent = Array1::zeros(n_params);
        tangent[index] = derivative;
        Self { value, tangent }
    }

    pub fn n_params(&self) -> usize {
        self.tangent.len()
    }

    /// Derivative with respect to parameter `index`.
    pub fn derivative(&self, index: usize) -> f64 {
        self.tangent[index]
    }
}

/// An array of per-node values with a tangent row per node.
///
/// The tangent matrix has shape `(len, n_params)`.
#[derive(Clone, Debug, PartialEq)]
pub struct DualArray {
    pub value: Array1<f64>,
    pub tangent: Array2<f64>,
}

impl DualArray {
    pub fn zeros(len: usize, n_params: usize) -> Self {
        Self {
            value: Array1::zeros(len),
            tangent: Array2::zeros((len, n_params)),
        }
    }

    pub fn constant(value: Array1<f64>, n_params: usize) -> Self {
        let len = value.len();
        Self {
            value,
            tangent: Array2::zeros((len, n_params)),
        }
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn n_params(&self) -> usize {
        self.tangent.ncols()
    }

    /// Value and tangents of a single entry.
    pub fn get(&self, index: usize) -> Dual {
        Dual {
            value: self.value[index],
            tangent: self.tangent.row(index).to_owned(),
        }
    }

    pub fn tangent_row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.tangent.row(index)
    }

    /// Sum over all entries.
    pub fn sum(&self) -> Dual {
        Dual {
            value: self.value.sum(),
            tangent: self.tangent.sum_axis(Axis(0)),
        }
    }

    /// Elementwise product `self * other`.
    pub fn mul(&self, other: &DualArray) -> DualArray {
        let value = &self.value * &other.value;
        let tangent = &self.tangent * &other.value.view().insert_axis(Axis(1))
            + &other.tangent * &self.value.view().insert_axis(Axis(1));
        DualArray { value, tangent }
    }

    /// Elementwise product with an array that does not depend on any parameter.
    pub fn mul_constant(&self, other: &Array1<f64>) -> DualArray {
        let column = other.view().insert_axis(Axis(1));
        DualArray {
            value: &self.value * other,
            tangent: &self.tangent * &column,
        }
    }

    /// Product of every entry with the same dual scalar.
    pub fn scale(&self, factor: &Dual) -> DualArray {
        let outer = self
            .value
            .view()
            .insert_axis(Axis(1))
            .dot(&factor.tangent.view().insert_axis(Axis(0)));
        DualArray {
            value: &self.value * factor.value,
            tangent: &self.tangent * factor.value + outer,
        }
    }

    /// Elementwise `1 - self`.
    pub fn complement(&self) -> DualArray {
        DualArray {
            value: self.value.mapv(|v| 1. - v),
            tangent: -&self.tangent,
        }
    }

    /// Elementwise `self += other`.
    pub fn add_assign(&mut self, other: &DualArray) {
        self.value += &other.value;
        self.tangent += &other.tangent;
    }
}

//! Immutable numeric vector used for samples and feature vectors

use nalgebra::DVector;

use crate::error::{CoreError, Result};

/// A fixed-length sequence of reals. Every operation returns a new vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    values: DVector<f64>,
}

impl Vector {
    /// Create a new vector from its components
    pub fn new(values: Vec<f64>) -> Self {
        Vector {
            values: DVector::from_vec(values),
        }
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f64] {
        self.values.as_slice()
    }

    /// Value at index `i`, if present
    pub fn get(&self, i: usize) -> Option<f64> {
        self.values.as_slice().get(i).copied()
    }

    pub fn add(&self, other: &Vector) -> Result<Vector> {
        self.check_size(other, "add")?;
        Ok(Vector {
            values: &self.values + &other.values,
        })
    }

    pub fn subtract(&self, other: &Vector) -> Result<Vector> {
        self.check_size(other, "subtract")?;
        Ok(Vector {
            values: &self.values - &other.values,
        })
    }

    /// Elementwise division. Zero divisors are not guarded here.
    pub fn divide(&self, other: &Vector) -> Result<Vector> {
        self.check_size(other, "divide")?;
        Ok(Vector {
            values: self.values.component_div(&other.values),
        })
    }

    /// Euclidean distance to `other`
    pub fn distance(&self, other: &Vector) -> Result<f64> {
        self.check_size(other, "measure the distance between")?;
        Ok((&self.values - &other.values).norm())
    }

    fn check_size(&self, other: &Vector, op: &'static str) -> Result<()> {
        if self.size() != other.size() {
            return Err(CoreError::SizeMismatch {
                op,
                left: self.size(),
                right: other.size(),
            });
        }
        Ok(())
    }
}

impl From<Vec<f64>> for Vector {
    fn from(values: Vec<f64>) -> Self {
        Vector::new(values)
    }
}

impl From<&[f64]> for Vector {
    fn from(values: &[f64]) -> Self {
        Vector::new(values.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: &Vector, b: &Vector) -> bool {
        a.size() == b.size()
            && a.values()
                .iter()
                .zip(b.values())
                .all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn test_add_then_subtract_restores_original() {
        let a = Vector::new(vec![1.5, -2.25, 3.0, 0.1]);
        let b = Vector::new(vec![0.3, 7.0, -4.5, 1e6]);
        let restored = a.add(&b).unwrap().subtract(&b).unwrap();
        assert!(approx_eq(&restored, &a));
    }

    #[test]
    fn test_elementwise_divide() {
        let a = Vector::new(vec![4.0, 9.0]);
        let b = Vector::new(vec![2.0, 3.0]);
        assert_eq!(a.divide(&b).unwrap(), Vector::new(vec![2.0, 3.0]));
    }

    #[test]
    fn test_operations_do_not_mutate() {
        let a = Vector::new(vec![1.0, 2.0]);
        let b = Vector::new(vec![1.0, 1.0]);
        let _ = a.add(&b).unwrap();
        assert_eq!(a.values(), &[1.0, 2.0]);
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        let a = Vector::new(vec![1.0, 2.0, 3.0]);
        let b = Vector::new(vec![1.0, 2.0]);

        for result in [a.add(&b), a.subtract(&b), a.divide(&b)] {
            match result {
                Err(CoreError::SizeMismatch { left, right, .. }) => {
                    assert_eq!((left, right), (3, 2));
                }
                other => panic!("expected size mismatch, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_euclidean_distance() {
        let a = Vector::new(vec![0.0, 0.0]);
        let b = Vector::new(vec![3.0, 4.0]);
        assert!((a.distance(&b).unwrap() - 5.0).abs() < 1e-12);
    }
}

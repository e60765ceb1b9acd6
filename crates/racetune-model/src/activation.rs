//! Elementwise activation functions for [`FeedForwardNetwork`](crate::network::FeedForwardNetwork) layers.

/// Activation applied to a layer's pre-activation vector.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Activation {
    /// `1 / (1 + e^-x)`
    #[default]
    #[display("sigmoid")]
    Sigmoid,
    /// Hyperbolic tangent.
    #[display("tanh")]
    Tanh,
    /// `max(0, x)`
    #[display("relu")]
    Relu,
    /// `clamp(x + 0.5, 0, 1)`: squashes an unbounded output into a control range.
    #[display("clipped-shift")]
    ClippedShift,
    /// Leaves the pre-activation untouched.
    #[display("identity")]
    Identity,
}

impl Activation {
    #[must_use]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Self::Tanh => x.tanh(),
            Self::Relu => x.max(0.0),
            Self::ClippedShift => (x + 0.5).clamp(0.0, 1.0),
            Self::Identity => x,
        }
    }

    pub fn apply_in_place(self, values: &mut [f64]) {
        if self == Self::Identity {
            return;
        }
        for v in values {
            *v = self.apply(*v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid() {
        assert_eq!(Activation::Sigmoid.apply(0.0), 0.5);
        assert!(Activation::Sigmoid.apply(40.0) > 0.999_999);
        assert!(Activation::Sigmoid.apply(-40.0) < 1e-6);
    }

    #[test]
    fn test_relu_and_tanh() {
        assert_eq!(Activation::Relu.apply(-3.0), 0.0);
        assert_eq!(Activation::Relu.apply(2.5), 2.5);
        assert_eq!(Activation::Tanh.apply(0.0), 0.0);
        assert!((Activation::Tanh.apply(1.0) - 1.0f64.tanh()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clipped_shift() {
        let mut values = [-1.0, -0.2, 0.0, 0.3, 0.7];
        Activation::ClippedShift.apply_in_place(&mut values);
        let expected = [0.0, 0.3, 0.5, 0.8, 1.0];
        for (v, e) in values.iter().zip(expected) {
            assert!((v - e).abs() < 1e-12, "{v} != {e}");
        }
    }
}

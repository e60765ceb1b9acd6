//! A small fully-connected feed-forward network tuned as a flat parameter vector.
//!
//! Each layer computes `y = activation(Wᵀx + b)` where `W` has one row per
//! input and one column per output. The network owns one activation buffer per
//! layer boundary so that repeated forward passes do not allocate.
//!
//! # Parameter layout
//!
//! The flat vector exposed through [`Tunable`] lists, for each layer in
//! construction order, the weights row by row (`W[0][0], W[0][1], …`) followed
//! by the biases when the network uses them. Persisted controllers depend on
//! this order.
//!
//! # Example
//!
//! ```
//! use racetune_model::{activation::Activation, network::FeedForwardNetwork};
//!
//! let mut net = FeedForwardNetwork::new(2, false).unwrap();
//! net.add_layer(2, Activation::ClippedShift).unwrap();
//! net.set_weights(&[1.0, 0.0, 0.0, 1.0]).unwrap();
//! let out = net.predict(&[0.25, -0.25]).unwrap();
//! assert_eq!(out, &[0.75, 0.25]);
//! ```

use rand::Rng;
use rand_distr::NormalError;

use crate::{
    activation::Activation,
    tunable::{ParameterError, Tunable},
    vector,
};

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum NetworkError {
    #[display("network layers need at least one neuron")]
    EmptyLayer,
    #[display("network expects {expected} inputs, got {actual}")]
    InputLength { expected: usize, actual: usize },
    #[display("invalid weight initialization distribution")]
    Distribution { source: NormalError },
}

/// One fully-connected layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    inputs: usize,
    outputs: usize,
    weights: Vec<f64>,
    bias: Option<Vec<f64>>,
    activation: Activation,
}

impl Layer {
    fn new(inputs: usize, outputs: usize, use_bias: bool, activation: Activation) -> Self {
        Self {
            inputs,
            outputs,
            weights: vec![0.0; inputs * outputs],
            bias: use_bias.then(|| vec![0.0; outputs]),
            activation,
        }
    }

    #[must_use]
    pub fn inputs(&self) -> usize {
        self.inputs
    }

    #[must_use]
    pub fn outputs(&self) -> usize {
        self.outputs
    }

    #[must_use]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Weight connecting input `row` to output `col`.
    #[must_use]
    pub fn weight(&self, row: usize, col: usize) -> f64 {
        self.weights[row * self.outputs + col]
    }

    #[must_use]
    pub fn bias(&self) -> Option<&[f64]> {
        self.bias.as_deref()
    }

    fn parameter_count(&self) -> usize {
        self.weights.len() + self.bias.as_ref().map_or(0, Vec::len)
    }

    fn forward(&self, input: &[f64], output: &mut [f64]) {
        match &self.bias {
            Some(bias) => output.copy_from_slice(bias),
            None => output.fill(0.0),
        }
        for (x, row) in input.iter().zip(self.weights.chunks_exact(self.outputs)) {
            for (y, w) in output.iter_mut().zip(row) {
                *y += w * x;
            }
        }
        self.activation.apply_in_place(output);
    }
}

/// Stack of fully-connected layers.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedForwardNetwork {
    use_bias: bool,
    layers: Vec<Layer>,
    // buffers[0] is the input, buffers[k + 1] the output of layer k
    buffers: Vec<Vec<f64>>,
}

impl FeedForwardNetwork {
    /// Creates a network with `inputs` input neurons and no layers.
    ///
    /// Whether layers carry biases is fixed here for the whole network.
    pub fn new(inputs: usize, use_bias: bool) -> Result<Self, NetworkError> {
        if inputs == 0 {
            return Err(NetworkError::EmptyLayer);
        }
        Ok(Self {
            use_bias,
            layers: vec![],
            buffers: vec![vec![0.0; inputs]],
        })
    }

    /// Appends a zero-initialized layer fed by the previous layer's outputs.
    pub fn add_layer(
        &mut self,
        outputs: usize,
        activation: Activation,
    ) -> Result<(), NetworkError> {
        if outputs == 0 {
            return Err(NetworkError::EmptyLayer);
        }
        let inputs = self.output().len();
        self.layers
            .push(Layer::new(inputs, outputs, self.use_bias, activation));
        self.buffers.push(vec![0.0; outputs]);
        Ok(())
    }

    /// Builder-style variant of [`Self::add_layer`].
    pub fn with_layer(
        mut self,
        outputs: usize,
        activation: Activation,
    ) -> Result<Self, NetworkError> {
        self.add_layer(outputs, activation)?;
        Ok(self)
    }

    #[must_use]
    pub fn input_len(&self) -> usize {
        self.buffers[0].len()
    }

    #[must_use]
    pub fn uses_bias(&self) -> bool {
        self.use_bias
    }

    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Input buffer read by the next [`Self::forward`] call.
    pub fn input_mut(&mut self) -> &mut [f64] {
        &mut self.buffers[0]
    }

    /// Output of the last layer as of the last [`Self::forward`] call.
    ///
    /// For a network without layers this is the input buffer.
    #[must_use]
    pub fn output(&self) -> &[f64] {
        let last = self.buffers.len() - 1;
        &self.buffers[last]
    }

    /// Propagates the input buffer through every layer.
    pub fn forward(&mut self) {
        for (k, layer) in self.layers.iter().enumerate() {
            let (head, tail) = self.buffers.split_at_mut(k + 1);
            layer.forward(&head[k], &mut tail[0]);
        }
    }

    /// Copies `input` into the input buffer, runs [`Self::forward`] and returns the output.
    pub fn predict(&mut self, input: &[f64]) -> Result<&[f64], NetworkError> {
        let expected = self.input_len();
        if input.len() != expected {
            return Err(NetworkError::InputLength {
                expected,
                actual: input.len(),
            });
        }
        self.buffers[0].copy_from_slice(input);
        self.forward();
        Ok(self.output())
    }

    /// Draws fresh weights and biases.
    ///
    /// Weights follow `N(0, 2 / (fan_in + fan_out))` and biases `N(0, 1 / fan_out)`.
    #[expect(clippy::cast_precision_loss)]
    pub fn init_weights<R>(&mut self, rng: &mut R) -> Result<(), NetworkError>
    where
        R: Rng + ?Sized,
    {
        for layer in &mut self.layers {
            let fan_in = layer.inputs as f64;
            let fan_out = layer.outputs as f64;
            let std_dev = (2.0 / (fan_in + fan_out)).sqrt();
            layer.weights = vector::gaussian(rng, layer.weights.len(), 0.0, std_dev)
                .map_err(|source| NetworkError::Distribution { source })?;
            if let Some(bias) = &mut layer.bias {
                *bias = vector::gaussian(rng, bias.len(), 0.0, (1.0 / fan_out).sqrt())
                    .map_err(|source| NetworkError::Distribution { source })?;
            }
        }
        Ok(())
    }

    /// Concatenated weights and biases in serialization order.
    #[must_use]
    pub fn weights(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.parameter_count());
        for layer in &self.layers {
            out.extend_from_slice(&layer.weights);
            if let Some(bias) = &layer.bias {
                out.extend_from_slice(bias);
            }
        }
        out
    }

    /// Replaces all weights and biases from a vector in serialization order.
    pub fn set_weights(&mut self, weights: &[f64]) -> Result<(), ParameterError> {
        ParameterError::check(self.parameter_count(), weights.len())?;
        let mut rest = weights;
        for layer in &mut self.layers {
            let (w, tail) = rest.split_at(layer.weights.len());
            layer.weights.copy_from_slice(w);
            rest = tail;
            if let Some(bias) = &mut layer.bias {
                let (b, tail) = rest.split_at(bias.len());
                bias.copy_from_slice(b);
                rest = tail;
            }
        }
        Ok(())
    }
}

impl Tunable for FeedForwardNetwork {
    fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    fn lower_bounds(&self) -> Vec<f64> {
        vec![f64::NEG_INFINITY; self.parameter_count()]
    }

    fn upper_bounds(&self) -> Vec<f64> {
        vec![f64::INFINITY; self.parameter_count()]
    }

    fn parameters(&self) -> Vec<f64> {
        self.weights()
    }

    fn set_parameters(&mut self, parameters: &[f64]) -> Result<(), ParameterError> {
        self.set_weights(parameters)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn speed_network() -> FeedForwardNetwork {
        FeedForwardNetwork::new(7, true)
            .unwrap()
            .with_layer(7, Activation::Tanh)
            .unwrap()
            .with_layer(7, Activation::Tanh)
            .unwrap()
            .with_layer(1, Activation::ClippedShift)
            .unwrap()
    }

    #[test]
    fn test_identity_clipped_shift_scenario() {
        let mut net = FeedForwardNetwork::new(2, false)
            .unwrap()
            .with_layer(2, Activation::ClippedShift)
            .unwrap();
        net.set_weights(&[1.0, 0.0, 0.0, 1.0]).unwrap();
        let out = net.predict(&[0.3, -0.2]).unwrap();
        assert!((out[0] - 0.8).abs() < 1e-12);
        assert!((out[1] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_parameter_count() {
        let net = speed_network();
        assert_eq!(net.parameter_count(), (7 * 7 + 7) * 2 + 7 + 1);

        let no_bias = FeedForwardNetwork::new(3, false)
            .unwrap()
            .with_layer(4, Activation::Relu)
            .unwrap()
            .with_layer(2, Activation::Sigmoid)
            .unwrap();
        assert_eq!(no_bias.parameter_count(), 3 * 4 + 4 * 2);
    }

    #[test]
    fn test_serialization_order_is_row_major_then_bias() {
        let mut net = FeedForwardNetwork::new(2, true)
            .unwrap()
            .with_layer(3, Activation::Identity)
            .unwrap();
        let params = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 10.0, 20.0, 30.0];
        net.set_parameters(&params).unwrap();
        let layer = &net.layers()[0];
        assert_eq!(layer.weight(0, 2), 3.0);
        assert_eq!(layer.weight(1, 0), 4.0);
        assert_eq!(layer.bias(), Some(&[10.0, 20.0, 30.0][..]));

        // y_j = Σ_i W[i][j] x_i + b_j
        let out = net.predict(&[1.0, -1.0]).unwrap();
        assert_eq!(out, &[7.0, 17.0, 27.0]);
    }

    #[test]
    fn test_round_trip_is_bitwise_identical() {
        let mut net = speed_network();
        let mut rng = Pcg32::seed_from_u64(5);
        net.init_weights(&mut rng).unwrap();
        let before = net.parameters();
        net.set_parameters(&before).unwrap();
        assert_eq!(net.parameters(), before);
    }

    #[test]
    fn test_set_parameters_rejects_wrong_length() {
        let mut net = speed_network();
        let before = net.parameters();
        let err = net.set_parameters(&[1.0; 3]).unwrap_err();
        assert_eq!(err.expected, 120);
        assert_eq!(net.parameters(), before);
    }

    #[test]
    fn test_init_weights_is_seeded_and_nonzero() {
        let mut a = speed_network();
        let mut b = speed_network();
        a.init_weights(&mut Pcg32::seed_from_u64(9)).unwrap();
        b.init_weights(&mut Pcg32::seed_from_u64(9)).unwrap();
        assert_eq!(a.parameters(), b.parameters());
        assert!(a.parameters().iter().any(|w| *w != 0.0));
    }

    #[test]
    fn test_predict_checks_input_length() {
        let mut net = speed_network();
        assert_eq!(
            net.predict(&[0.0; 3]).unwrap_err(),
            NetworkError::InputLength {
                expected: 7,
                actual: 3
            }
        );
    }

    #[test]
    fn test_forward_output_in_control_range() {
        let mut net = speed_network();
        net.init_weights(&mut Pcg32::seed_from_u64(1)).unwrap();
        for (i, x) in net.input_mut().iter_mut().enumerate() {
            *x = f64::from(u32::try_from(i).unwrap()) * 0.3;
        }
        net.forward();
        assert_eq!(net.output().len(), 1);
        assert!((0.0..=1.0).contains(&net.output()[0]));
    }

    #[test]
    fn test_empty_layers_rejected() {
        assert_eq!(
            FeedForwardNetwork::new(0, true).unwrap_err(),
            NetworkError::EmptyLayer
        );
        let mut net = FeedForwardNetwork::new(2, true).unwrap();
        assert_eq!(
            net.add_layer(0, Activation::Tanh).unwrap_err(),
            NetworkError::EmptyLayer
        );
    }
}

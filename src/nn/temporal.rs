//! Temporal encoder shared by the actor and the critic
//!
//! Sits between the concatenated `[compressed lidar, position(, action)]` features and
//! the network head. Two variants are chosen at construction:
//! - `Stateless`: a single linear projection applied per timestep
//! - `Recurrent`: a single-layer LSTM whose `(hidden, cell)` memory is owned by the caller

use burn::{
    nn::{Linear, LinearConfig, Lstm, LstmConfig, LstmState},
    prelude::*,
    tensor::backend::Backend,
};

/// Number of stacked LSTM layers in the recurrent variant.
pub const NUM_RECURRENT_LAYERS: usize = 1;

/// Which temporal encoder a network is built with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemporalMode {
    Stateless,
    Recurrent,
}

impl TemporalMode {
    pub fn is_recurrent(self) -> bool {
        matches!(self, Self::Recurrent)
    }

    /// Stacked LSTM layers behind this mode (zero when stateless).
    pub fn recurrent_layers(self) -> usize {
        match self {
            Self::Stateless => 0,
            Self::Recurrent => NUM_RECURRENT_LAYERS,
        }
    }
}

/// LSTM memory carried across calls.
///
/// Both tensors are `[NUM_RECURRENT_LAYERS, batch, hidden_dim]`.
#[derive(Clone, Debug)]
pub struct RecurrentState<B: Backend> {
    pub hidden: Tensor<B, 3>,
    pub cell: Tensor<B, 3>,
}

impl<B: Backend> RecurrentState<B> {
    /// All-zero memory for `batch_size` sequences.
    pub fn zeros(batch_size: usize, hidden_dim: usize, device: &B::Device) -> Self {
        let shape = [NUM_RECURRENT_LAYERS, batch_size, hidden_dim];
        Self {
            hidden: Tensor::zeros(shape, device),
            cell: Tensor::zeros(shape, device),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.hidden.dims()[1]
    }

    pub fn hidden_dim(&self) -> usize {
        self.hidden.dims()[2]
    }

    /// Drops the autodiff graph attached to the memory.
    pub fn detach(self) -> Self {
        Self {
            hidden: self.hidden.detach(),
            cell: self.cell.detach(),
        }
    }

    fn into_lstm_state(self) -> LstmState<B, 2> {
        LstmState::new(self.cell.squeeze(0), self.hidden.squeeze(0))
    }

    fn from_lstm_state(state: LstmState<B, 2>) -> Self {
        Self {
            hidden: state.hidden.unsqueeze_dim(0),
            cell: state.cell.unsqueeze_dim(0),
        }
    }
}

/// Configuration for [`TemporalEncoder`]
#[derive(Config, Debug)]
pub struct TemporalEncoderConfig {
    /// Width of the per-timestep input features
    pub input_dim: usize,
    /// Width of the encoded output (and of the LSTM memory)
    pub hidden_dim: usize,
    /// Build the LSTM variant instead of the linear one
    #[config(default = false)]
    pub recurrent: bool,
}

impl TemporalEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TemporalEncoder<B> {
        if self.recurrent {
            let lstm = LstmConfig::new(self.input_dim, self.hidden_dim, true).init(device);
            TemporalEncoder::Recurrent(lstm)
        } else {
            let linear = LinearConfig::new(self.input_dim, self.hidden_dim).init(device);
            TemporalEncoder::Stateless(linear)
        }
    }
}

#[derive(Module, Debug)]
pub enum TemporalEncoder<B: Backend> {
    Stateless(Linear<B>),
    Recurrent(Lstm<B>),
}

impl<B: Backend> TemporalEncoder<B> {
    pub fn mode(&self) -> TemporalMode {
        match self {
            Self::Stateless(_) => TemporalMode::Stateless,
            Self::Recurrent(_) => TemporalMode::Recurrent,
        }
    }

    /// Encodes `[batch, seq, input_dim]` into `[batch, seq, hidden_dim]`.
    ///
    /// The recurrent variant starts from zeros when `state` is `None` and always
    /// returns the memory after the last timestep. The stateless variant ignores
    /// `state` and returns `None`.
    pub fn forward(
        &self,
        input: Tensor<B, 3>,
        state: Option<RecurrentState<B>>,
    ) -> (Tensor<B, 3>, Option<RecurrentState<B>>) {
        match self {
            Self::Stateless(linear) => (linear.forward(input), None),
            Self::Recurrent(lstm) => {
                let state = state.map(RecurrentState::into_lstm_state);
                let (output, next) = lstm.forward(input, state);
                (output, Some(RecurrentState::from_lstm_state(next)))
            }
        }
    }
}

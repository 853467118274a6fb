//! Polyak averaging between a live network and its frozen target
//!
//! ```text
//! θ_target ← τ · θ_live + (1 − τ) · θ_target
//! ```
//!
//! Parameters are paired by traversal order, so the two modules only need to share an
//! architecture, not parameter ids.

use burn::{
    module::{Module, ModuleMapper, ModuleVisitor, ParamId},
    prelude::*,
    tensor::backend::Backend,
};

/// Collects every float parameter, detached and flattened to 1D.
struct LiveParams<B: Backend> {
    params: Vec<Tensor<B, 1>>,
}

impl<B: Backend> ModuleVisitor<B> for LiveParams<B> {
    fn visit_float<const D: usize>(&mut self, _id: ParamId, tensor: &Tensor<B, D>) {
        let numel = tensor.shape().num_elements();
        self.params.push(tensor.clone().detach().reshape([numel]));
    }
}

/// Blends each target parameter with the live parameter at the same position.
struct Blend<B: Backend> {
    live: std::vec::IntoIter<Tensor<B, 1>>,
    tau: f64,
}

impl<B: Backend> ModuleMapper<B> for Blend<B> {
    fn map_float<const D: usize>(&mut self, _id: ParamId, tensor: Tensor<B, D>) -> Tensor<B, D> {
        match self.live.next() {
            Some(live) => {
                let shape = tensor.shape();
                let target = tensor.detach().reshape([shape.num_elements()]);
                live.mul_scalar(self.tau)
                    .add(target.mul_scalar(1.0 - self.tau))
                    .reshape(shape)
            }
            // architectures always match; an exhausted iterator leaves the target as is
            None => tensor,
        }
    }
}

/// Moves `target` a fraction `tau` of the way towards `live`.
///
/// `tau == 0` returns `target` untouched and `tau == 1` yields an exact copy of the
/// live values. The result never requires gradients.
pub fn soft_update<B, M>(live: &M, target: M, tau: f64) -> M
where
    B: Backend,
    M: Module<B>,
{
    if tau == 0.0 {
        return target;
    }

    let mut collector = LiveParams { params: Vec::new() };
    live.visit(&mut collector);

    let mut blend = Blend {
        live: collector.params.into_iter(),
        tau,
    };
    target.map(&mut blend).no_grad()
}

/// Shapes of every float parameter in traversal order.
pub fn param_shapes<B: Backend, M: Module<B>>(module: &M) -> Vec<Vec<usize>> {
    struct Shapes(Vec<Vec<usize>>);

    impl<B: Backend> ModuleVisitor<B> for Shapes {
        fn visit_float<const D: usize>(&mut self, _id: ParamId, tensor: &Tensor<B, D>) {
            self.0.push(tensor.dims().to_vec());
        }
    }

    let mut shapes = Shapes(Vec::new());
    module.visit(&mut shapes);
    shapes.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::{MLP, MLPConfig};
    use burn::backend::ndarray::{NdArray, NdArrayDevice};

    type TestBackend = NdArray;

    fn flat_params(module: &MLP<TestBackend>) -> Vec<f32> {
        let mut collector = LiveParams { params: Vec::new() };
        module.visit(&mut collector);
        collector
            .params
            .into_iter()
            .flat_map(|t| t.into_data().to_vec::<f32>().unwrap())
            .collect()
    }

    fn pair(device: &NdArrayDevice) -> (MLP<TestBackend>, MLP<TestBackend>) {
        let config = MLPConfig::new(3, vec![4], 2);
        (config.init(device), config.init(device))
    }

    #[test]
    fn zero_tau_leaves_target_untouched() {
        let device = NdArrayDevice::default();
        let (live, target) = pair(&device);
        let before = flat_params(&target);

        let target = soft_update::<TestBackend, _>(&live, target, 0.0);

        assert_eq!(flat_params(&target), before);
    }

    #[test]
    fn unit_tau_copies_live() {
        let device = NdArrayDevice::default();
        let (live, target) = pair(&device);

        let target = soft_update::<TestBackend, _>(&live, target, 1.0);

        assert_eq!(flat_params(&target), flat_params(&live));
    }

    #[test]
    fn single_step_is_a_convex_blend() {
        let device = NdArrayDevice::default();
        let (live, target) = pair(&device);
        let live_values = flat_params(&live);
        let target_values = flat_params(&target);
        let tau = 0.25;

        let updated = flat_params(&soft_update::<TestBackend, _>(&live, target, tau));

        for ((u, l), t) in updated.iter().zip(&live_values).zip(&target_values) {
            let expected = tau as f32 * l + (1.0 - tau as f32) * t;
            assert!((u - expected).abs() < 1e-6, "{u} != {expected}");
        }
    }

    #[test]
    fn repeated_updates_converge_geometrically() {
        let device = NdArrayDevice::default();
        let (live, mut target) = pair(&device);
        let live_values = flat_params(&live);
        let initial_gap: Vec<f32> = flat_params(&target)
            .iter()
            .zip(&live_values)
            .map(|(t, l)| t - l)
            .collect();
        let tau = 0.1;
        let steps = 20;

        for _ in 0..steps {
            target = soft_update::<TestBackend, _>(&live, target, tau);
        }

        let decay = (1.0 - tau as f32).powi(steps);
        for ((t, l), gap) in flat_params(&target).iter().zip(&live_values).zip(&initial_gap) {
            let expected = gap * decay;
            assert!(((t - l) - expected).abs() < 1e-5, "gap {} expected {}", t - l, expected);
        }
    }

    #[test]
    fn shapes_follow_traversal_order() {
        let device = NdArrayDevice::default();
        let (live, _) = pair(&device);

        let shapes = param_shapes::<TestBackend, _>(&live);

        assert_eq!(shapes, vec![vec![3, 4], vec![4], vec![4, 2], vec![2]]);
    }
}

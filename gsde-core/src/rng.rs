// The generator is seeded once and handed to every component that draws. Clones share the same
// underlying stream, so a rollout consumes one sequence no matter which component draws first.

use candle_core::{DType, Device, Shape, Tensor};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, StandardNormal};
use std::{cell::RefCell, rc::Rc};

#[derive(Debug, Clone)]
pub struct RngHandle(Rc<RefCell<StdRng>>);

impl RngHandle {
    pub fn seeded(seed: u64) -> Self {
        Self(Rc::new(RefCell::new(StdRng::seed_from_u64(seed))))
    }

    /// Draws `ε ~ N(0, 1)` with the requested shape.
    pub fn standard_normal<S: Into<Shape>>(
        &self,
        shape: S,
        dtype: DType,
        device: &Device,
    ) -> candle_core::Result<Tensor> {
        let shape: Shape = shape.into();
        let mut rng = self.0.borrow_mut();
        let data: Vec<f32> = (0..shape.elem_count())
            .map(|_| StandardNormal.sample(&mut *rng))
            .collect();
        Tensor::from_vec(data, shape, device)?.to_dtype(dtype)
    }
}

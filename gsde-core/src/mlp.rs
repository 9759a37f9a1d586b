use candle_core::{Result, Tensor};
use candle_nn::{Linear, Module, VarBuilder, linear};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Tanh,
    Relu,
}

impl Module for Activation {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        match self {
            Self::Tanh => xs.tanh(),
            Self::Relu => xs.relu(),
        }
    }
}

#[derive(Debug, Clone)]
enum Layer {
    Linear(Linear),
    Activation(Activation),
}

impl Module for Layer {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        match self {
            Self::Linear(linear) => linear.forward(xs),
            Self::Activation(activation) => activation.forward(xs),
        }
    }
}

/// Feed forward stack, linear layers separated by an activation. The output layer is linear.
#[derive(Debug, Clone, Default)]
pub struct Mlp {
    layers: Vec<Layer>,
    output_dim: usize,
}

impl Module for Mlp {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let mut xs = xs.clone();
        for layer in self.layers.iter() {
            xs = layer.forward(&xs)?
        }
        Ok(xs)
    }
}

impl Mlp {
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }
}

pub fn build_mlp(
    input_dim: usize,
    layers: &[usize],
    activation: Activation,
    vb: &VarBuilder,
    prefix: &str,
) -> Result<Mlp> {
    let mut last_dim = input_dim;
    let mut mlp = Mlp::default();
    let num_layers = layers.len();
    for (layer_idx, layer_size) in layers.iter().enumerate() {
        let layer = linear(last_dim, *layer_size, vb.pp(format!("{prefix}{layer_idx}")))?;
        mlp.layers.push(Layer::Linear(layer));
        if layer_idx != num_layers - 1 {
            mlp.layers.push(Layer::Activation(activation));
        }
        last_dim = *layer_size;
    }
    mlp.output_dim = last_dim;
    Ok(mlp)
}

#[cfg(test)]
mod test {
    use super::{Activation, build_mlp};
    use candle_core::{DType, Device, Module, Result, Tensor};
    use candle_nn::{VarBuilder, VarMap};

    #[test]
    fn output_layer_has_no_activation() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let mlp = build_mlp(3, &[8, 8, 2], Activation::Tanh, &vb, "actor")?;
        assert_eq!(mlp.layers.len(), 5);
        assert_eq!(mlp.output_dim(), 2);
        let xs = Tensor::ones((4, 3), DType::F32, &Device::Cpu)?;
        assert_eq!(mlp.forward(&xs)?.dims(), &[4, 2]);
        Ok(())
    }
}

use ndarray::{array, Array2, Array4, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::activations::Activation;
use crate::error::DqnError;
use crate::layers::{Conv2dLayer, DenseLayer, LayerTrait, StateDict, WeightInit};

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

#[test]
fn test_dense_layer_creation() {
    let layer = DenseLayer::new(3, 2, Activation::Relu, &mut rng());
    assert_eq!(layer.weights.value.shape(), [3, 2]);
    assert_eq!(layer.biases.value.shape(), [2]);
    assert_eq!(layer.input_size(), 3);
    assert_eq!(layer.output_size(), 2);
    assert_eq!(layer.num_parameters(), 8);
}

#[test]
fn test_dense_layer_forward() {
    let mut layer = DenseLayer::new(2, 2, Activation::Linear, &mut rng());
    layer.weights.value = array![[1.0, -1.0], [2.0, 0.5]];
    layer.biases.value = array![0.5, 0.0];

    let output = layer.forward(array![[1.0, 1.0], [0.0, 2.0]].view());
    assert_eq!(output, array![[3.5, -0.5], [4.5, 1.0]]);
}

#[test]
fn test_dense_backward_before_forward_fails() {
    let mut layer = DenseLayer::new(2, 2, Activation::Relu, &mut rng());
    let result = layer.backward(Array2::ones((1, 2)).view());
    assert!(matches!(result, Err(DqnError::Training(_))));
}

#[test]
fn test_dense_backward_gradients() {
    let mut layer = DenseLayer::new(2, 1, Activation::Linear, &mut rng());
    layer.weights.value = array![[0.5], [-1.0]];
    let inputs = array![[1.0, 2.0], [3.0, -1.0]];

    layer.forward_train(inputs.view());
    let input_grad = layer.backward(array![[1.0], [2.0]].view()).unwrap();

    // dW = x^T g, db = sum g, dx = g W^T
    assert_eq!(layer.weights.grad, array![[7.0], [0.0]]);
    assert_eq!(layer.biases.grad, array![3.0]);
    assert_eq!(input_grad, array![[0.5, -1.0], [1.0, -2.0]]);

    // gradients accumulate until zeroed
    layer.forward_train(inputs.view());
    layer.backward(array![[1.0], [2.0]].view()).unwrap();
    assert_eq!(layer.biases.grad, array![6.0]);
    layer.zero_grad();
    assert_eq!(layer.biases.grad, array![0.0]);
}

#[test]
fn test_weight_initialization_bounds() {
    let mut rng = rng();
    let layer = DenseLayer::new_with_init(10, 20, Activation::Relu, WeightInit::HeUniform, &mut rng);
    let limit = (6.0 / 10.0_f32).sqrt();
    assert!(layer.weights.value.iter().all(|&w| w >= -limit && w <= limit));
    assert!(layer.weights.value.iter().any(|&w| w != 0.0));

    let layer = DenseLayer::new_with_init(16, 4, Activation::Linear, WeightInit::LecunUniform, &mut rng);
    assert!(layer.weights.value.iter().all(|&w| w.abs() <= 0.25));

    assert_eq!(WeightInit::for_activation(&Activation::Relu), WeightInit::HeUniform);
    assert_eq!(WeightInit::for_activation(&Activation::Linear), WeightInit::LecunUniform);
}

#[test]
fn test_conv_output_size() {
    let conv = Conv2dLayer::new(1, 32, (8, 8), (4, 4), Activation::Relu, &mut rng());
    assert_eq!(conv.output_size(84, 84), Some((20, 20)));
    assert_eq!(conv.output_size(7, 84), None);

    let conv = Conv2dLayer::new(32, 64, (4, 4), (2, 2), Activation::Relu, &mut rng());
    assert_eq!(conv.output_size(20, 20), Some((9, 9)));
}

#[test]
fn test_conv_forward_sums_receptive_fields() {
    let mut conv = Conv2dLayer::new(1, 1, (2, 2), (1, 1), Activation::Linear, &mut rng());
    conv.kernels.value.fill(1.0);
    conv.biases.value.fill(0.5);

    let input = Array4::from_shape_fn((1, 1, 3, 3), |(_, _, y, x)| (y * 3 + x) as f32);
    let output = conv.forward(input.view()).unwrap();

    assert_eq!(output.dim(), (1, 1, 2, 2));
    assert_eq!(output[[0, 0, 0, 0]], 0.0 + 1.0 + 3.0 + 4.0 + 0.5);
    assert_eq!(output[[0, 0, 1, 1]], 4.0 + 5.0 + 7.0 + 8.0 + 0.5);
}

#[test]
fn test_conv_rejects_wrong_channels() {
    let conv = Conv2dLayer::new(2, 4, (3, 3), (1, 1), Activation::Relu, &mut rng());
    let input = Array4::zeros((1, 1, 5, 5));
    assert!(matches!(conv.forward(input.view()), Err(DqnError::DimensionMismatch { .. })));
}

#[test]
fn test_conv_backward_matches_finite_differences() {
    // stride 2 over width 6 leaves an unused column
    let mut conv = Conv2dLayer::new(2, 3, (3, 3), (2, 2), Activation::Linear, &mut rng());
    let input = Array4::from_shape_fn((2, 2, 5, 6), |(b, c, y, x)| ((b * 7 + c * 5 + y * 3 + x) % 11) as f32 / 11.0);

    let output = conv.forward_train(input.view()).unwrap();
    let upstream = Array4::from_shape_fn(output.raw_dim(), |(b, o, y, x)| ((b + o + y + x) % 3) as f32 - 1.0);
    let input_grad = conv.backward(upstream.view()).unwrap();
    assert_eq!(input_grad.dim(), input.dim());

    let loss = |layer: &Conv2dLayer, x: &Array4<f32>| (layer.forward(x.view()).unwrap() * &upstream).sum();
    let h = 1e-2;

    let mut plus = conv.clone();
    plus.kernels.value[[1, 4]] += h;
    let mut minus = conv.clone();
    minus.kernels.value[[1, 4]] -= h;
    let numeric = (loss(&plus, &input) - loss(&minus, &input)) / (2.0 * h);
    assert!((conv.kernels.grad[[1, 4]] - numeric).abs() < 1e-2);

    let mut x_plus = input.clone();
    x_plus[[1, 0, 2, 3]] += h;
    let mut x_minus = input.clone();
    x_minus[[1, 0, 2, 3]] -= h;
    let numeric = (loss(&conv, &x_plus) - loss(&conv, &x_minus)) / (2.0 * h);
    assert!((input_grad[[1, 0, 2, 3]] - numeric).abs() < 1e-2);

    // the column no receptive field reaches gets no gradient
    assert!(input_grad.index_axis(Axis(3), 5).iter().all(|&g| g == 0.0));
}

#[test]
fn test_state_dict_export_import() {
    let mut rng = rng();
    let source = DenseLayer::new(3, 2, Activation::Relu, &mut rng);
    let mut dest = DenseLayer::new(3, 2, Activation::Relu, &mut rng);

    let mut dict = StateDict::new();
    source.export("fc", &mut dict);
    assert_eq!(dict.len(), 2);
    assert!(dict.contains_key("fc.weight"));

    dest.import("fc", &dict).unwrap();
    assert_eq!(dest.weights.value, source.weights.value);

    assert!(matches!(dest.import("other", &dict), Err(DqnError::InvalidParameter { .. })));

    let mut wrong = DenseLayer::new(2, 2, Activation::Relu, &mut rng);
    assert!(matches!(wrong.import("fc", &dict), Err(DqnError::DimensionMismatch { .. })));
}

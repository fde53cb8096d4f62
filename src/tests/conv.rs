use crate::{
    layers::{
        Activator, ConvOptions, DenseOptions, ImageShape, LayerType, Padding, Pooling,
    },
    optimizers::Adam,
    types::{LayerConstructionError, NetworkError},
    Network, NetworkType,
};

/// Two 4x4 gray images, a vertical and a horizontal bar.
fn bars() -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
    #[rustfmt::skip]
    let vertical = vec![
        0.0_f32, 1.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
    ];
    #[rustfmt::skip]
    let horizontal = vec![
        0.0_f32, 0.0, 0.0, 0.0,
        1.0, 1.0, 1.0, 1.0,
        0.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 0.0,
    ];

    (
        vec![vertical, horizontal],
        vec![vec![1.0, 0.0], vec![0.0, 1.0]],
    )
}

fn conv_network() -> Network {
    let mut network = Network::new(16, 2, false, false, NetworkType::Classification).unwrap();

    network
        .add_conv_layer(
            ConvOptions::new(2, 2, 3)
                .activator(Activator::Relu)
                .image_shape(ImageShape::new(4, 4, 1)),
        )
        .unwrap()
        .add_fc_layer(5, DenseOptions::new().activator(Activator::Relu))
        .unwrap()
        .add_output_layer(DenseOptions::new())
        .unwrap();

    network
}

#[test]
fn conv_layers_should_know_their_shapes() {
    let network = conv_network();

    assert_eq!(network.get_w_shape(0).unwrap(), vec![3, 1, 2, 2]);
    assert_eq!(network.get_b_shape(0).unwrap(), vec![3]);
    // same padding keeps 4x4, pooling halves it into 2x2x3
    assert_eq!(network.get_w_shape(1).unwrap(), vec![12, 5]);
    assert_eq!(
        network.layers_configs().get(1).unwrap().neural_structure.output_shape(),
        Some(ImageShape::new(2, 2, 3))
    );
    assert_eq!(
        network.layers_configs().layer_types(),
        vec![
            LayerType::Input,
            LayerType::Conv,
            LayerType::FullyConnected,
            LayerType::Output
        ]
    );
}

#[test]
fn conv_networks_should_train() {
    let (inputs, outputs) = bars();
    let mut network = conv_network();
    network.set_optimizer(Some(Adam::new(0.01).into())).unwrap();

    let first_loss = network.get_loss(&inputs, &outputs).unwrap();
    for _ in 0..100 {
        network.run_step(&inputs, &outputs, None, None).unwrap();
    }
    let last_loss = network.get_loss(&inputs, &outputs).unwrap();

    assert!(last_loss < first_loss);

    let conv_results = network.layers_results().get(1).unwrap();
    assert_eq!(
        conv_results.activated.as_ref().unwrap().dims(),
        &[2, 3, 4, 4]
    );
    assert_eq!(conv_results.pooled.as_ref().unwrap().dims(), &[2, 3, 2, 2]);
    assert_eq!(network.predict(&inputs).unwrap().len(), 2);
}

#[test]
fn valid_padding_and_uneven_strides_should_shrink_the_images() {
    let mut network = Network::new(36, 1, false, false, NetworkType::Regression).unwrap();

    let mut options = ConvOptions::new(3, 3, 2).image_shape(ImageShape::new(6, 6, 1));
    options.padding = Padding::Valid;
    options.strides = (1, 2);
    options.pooling = None;

    network
        .add_conv_layer(options)
        .unwrap()
        .add_output_layer(DenseOptions::new())
        .unwrap()
        .set_optimizer(None)
        .unwrap();

    // (6 - 3) / 1 + 1 = 4 rows and (6 - 3) / 2 + 1 = 2 columns
    assert_eq!(
        network.layers_configs().get(1).unwrap().neural_structure.output_shape(),
        Some(ImageShape::new(4, 2, 2))
    );

    let prediction = network.predict(&vec![0.5_f32; 36]).unwrap();
    assert_eq!(prediction, vec![vec![prediction[0][0]]]);

    let conv_results = network.layers_results().get(1).unwrap();
    assert_eq!(conv_results.output.as_ref().unwrap().dims(), &[1, 2, 4, 2]);
}

#[test]
fn average_pooling_should_be_supported() {
    let (inputs, outputs) = bars();
    let mut network = Network::new(16, 2, false, false, NetworkType::Classification).unwrap();

    network
        .add_conv_layer(
            ConvOptions::new(3, 3, 2)
                .image_shape(ImageShape::new(4, 4, 1))
                .pooling(Some(Pooling::Average)),
        )
        .unwrap()
        .add_output_layer(DenseOptions::new())
        .unwrap()
        .set_optimizer(None)
        .unwrap();

    network.run_step(&inputs, &outputs, None, None).unwrap();

    let pooled = network.layers_results().get(1).unwrap().pooled.clone().unwrap();
    assert_eq!(pooled.dims(), &[2, 2, 2, 2]);
}

#[test]
fn stacked_conv_layers_should_chain_their_images() {
    let mut network = Network::new(64, 1, false, false, NetworkType::Regression).unwrap();

    network
        .add_conv_layer(ConvOptions::new(3, 3, 4).image_shape(ImageShape::new(8, 8, 1)))
        .unwrap()
        .add_conv_layer(ConvOptions::new(3, 3, 6))
        .unwrap();

    assert_eq!(network.get_w_shape(1).unwrap(), vec![6, 4, 3, 3]);
    assert_eq!(
        network.layers_configs().last().neural_structure.output_shape(),
        Some(ImageShape::new(2, 2, 6))
    );
    assert_eq!(network.layers_configs().last().name, "conv_layer_2");
}

#[test]
fn should_refuse_broken_conv_layouts() {
    let mut network = Network::new(16, 2, false, false, NetworkType::Classification).unwrap();
    assert!(matches!(
        network.add_conv_layer(ConvOptions::new(2, 2, 3)),
        Err(NetworkError::Construction(
            LayerConstructionError::MissingImageShape
        ))
    ));
    assert!(matches!(
        network.add_conv_layer(ConvOptions::new(2, 2, 3).image_shape(ImageShape::new(3, 3, 1))),
        Err(NetworkError::Construction(
            LayerConstructionError::ImageShapeMismatch {
                expected: 16,
                found: 9
            }
        ))
    ));

    network
        .add_conv_layer(ConvOptions::new(2, 2, 3).image_shape(ImageShape::new(4, 4, 1)))
        .unwrap();
    assert!(matches!(
        network.add_hidden_layer(4, DenseOptions::new()),
        Err(NetworkError::Construction(
            LayerConstructionError::DenseAfterConv
        ))
    ));

    network.add_fc_layer(4, DenseOptions::new()).unwrap();
    assert!(matches!(
        network.add_conv_layer(ConvOptions::new(2, 2, 3)),
        Err(NetworkError::Construction(
            LayerConstructionError::ConvAfterDense
        ))
    ));
}

#[test]
fn valid_kernels_larger_than_the_image_should_be_refused() {
    let mut network = Network::new(4, 1, false, false, NetworkType::Regression).unwrap();

    let mut options = ConvOptions::new(3, 3, 1).image_shape(ImageShape::new(2, 2, 1));
    options.padding = Padding::Valid;

    assert!(matches!(
        network.add_conv_layer(options),
        Err(NetworkError::Construction(
            LayerConstructionError::KernelTooLarge { .. }
        ))
    ));
}

use crate::{
    layers::{Activator, ConvOptions, DenseOptions, ImageShape},
    saver::NetworkSaver,
    tests::{init_logger, xor_samples},
    types::{NetworkError, SaveError},
    Network, NetworkType,
};

fn trained_xor_network() -> Network {
    let (inputs, outputs) = xor_samples();
    let mut network = Network::new(2, 1, false, false, NetworkType::Regression).unwrap();

    network
        .add_hidden_layer(3, DenseOptions::new().activator(Activator::Tanh))
        .unwrap()
        .add_output_layer(DenseOptions::new())
        .unwrap()
        .set_optimizer(None)
        .unwrap();

    for _ in 0..5 {
        network.run_step(&inputs, &outputs, None, None).unwrap();
    }

    network
}

#[test]
fn restored_networks_should_predict_the_same() {
    init_logger();

    let dir = tempfile::tempdir().unwrap();
    let (inputs, _) = xor_samples();
    let mut network = trained_xor_network();
    network
        .normalizer_mut()
        .fit_minmax(&[vec![0.0, 0.0], vec![2.0, 4.0]]);

    let path = network
        .save("xor", Some(dir.path()), Some(5), false)
        .unwrap();
    assert_eq!(path, dir.path().join("xor-5.tfnn"));

    let expected = network.predict(&inputs).unwrap();

    let mut restored = NetworkSaver::restore(&path).unwrap();
    assert_eq!(restored.global_step(), 5);
    assert_eq!(restored.normalizer(), network.normalizer());
    assert_eq!(restored.get_all_w_shapes(), network.get_all_w_shapes());
    assert_eq!(
        restored.layers_configs().layer_types(),
        network.layers_configs().layer_types()
    );

    restored.set_optimizer(None).unwrap();
    assert_eq!(restored.predict(&inputs).unwrap(), expected);
    assert_eq!(
        restored.get_w(0).unwrap().to_vec2::<f32>().unwrap(),
        network.get_w(0).unwrap().to_vec2::<f32>().unwrap()
    );
}

#[test]
fn should_not_overwrite_without_replace() {
    let dir = tempfile::tempdir().unwrap();
    let mut network = trained_xor_network();

    network.save("xor", Some(dir.path()), None, false).unwrap();

    assert!(matches!(
        network.save("xor", Some(dir.path()), None, false),
        Err(NetworkError::Save(SaveError::AlreadyExists(_)))
    ));
    assert!(network.save("xor", Some(dir.path()), None, true).is_ok());
}

#[test]
fn saving_should_need_initialized_variables() {
    let dir = tempfile::tempdir().unwrap();
    let mut network = Network::new(2, 1, false, false, NetworkType::Regression).unwrap();
    network.add_output_layer(DenseOptions::new()).unwrap();

    assert!(matches!(
        network.save("untrained", Some(dir.path()), None, false),
        Err(NetworkError::SessionNotStarted)
    ));
}

#[test]
fn conv_networks_should_survive_a_restore() {
    let dir = tempfile::tempdir().unwrap();
    let mut network = Network::new(16, 2, true, false, NetworkType::Classification).unwrap();

    network
        .add_conv_layer(
            ConvOptions::new(2, 2, 2)
                .activator(Activator::Relu)
                .image_shape(ImageShape::new(4, 4, 1)),
        )
        .unwrap()
        .add_fc_layer(4, DenseOptions::new().dropout_layer())
        .unwrap()
        .add_output_layer(DenseOptions::new())
        .unwrap()
        .set_optimizer(None)
        .unwrap();
    network.initialize_variables().unwrap();

    let path = network.save("conv", Some(dir.path()), None, false).unwrap();
    let mut restored = NetworkSaver::restore(path).unwrap();

    assert_eq!(restored.regularization(), network.regularization());
    assert_eq!(restored.network_type(), NetworkType::Classification);

    restored.set_optimizer(None).unwrap();
    let samples = vec![vec![0.25_f32; 16]];
    assert_eq!(
        restored.predict_prob(&samples).unwrap(),
        network.predict_prob(&samples).unwrap()
    );
}

#[test]
fn restoring_a_missing_file_should_fail() {
    let dir = tempfile::tempdir().unwrap();

    assert!(matches!(
        NetworkSaver::restore(dir.path().join("nothing.tfnn")),
        Err(NetworkError::Save(SaveError::Io(_)))
    ));
}

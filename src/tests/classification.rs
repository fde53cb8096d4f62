use crate::{
    layers::DenseOptions,
    optimizers::Adam,
    tests::init_logger,
    Network, NetworkType,
};

fn two_classes() -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
    let inputs = vec![
        vec![-3.0_f32, 1.0],
        vec![-2.0, -1.0],
        vec![-1.5, 0.5],
        vec![1.5, -0.5],
        vec![2.0, 1.0],
        vec![3.0, -1.0],
    ];

    let outputs = vec![
        vec![1.0_f32, 0.0],
        vec![1.0, 0.0],
        vec![1.0, 0.0],
        vec![0.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 1.0],
    ];

    (inputs, outputs)
}

fn classifier() -> Network {
    let mut network = Network::new(2, 2, false, false, NetworkType::Classification).unwrap();

    network
        .add_output_layer(DenseOptions::new())
        .unwrap()
        .set_optimizer(Some(Adam::new(0.1).into()))
        .unwrap();

    network
}

#[test]
fn should_separate_two_classes() {
    init_logger();

    let (inputs, outputs) = two_classes();
    let mut network = classifier();

    for _ in 0..300 {
        network.run_step(&inputs, &outputs, None, None).unwrap();
    }

    assert_eq!(network.accuracy(&inputs, &outputs).unwrap(), 1.0);
    assert_eq!(network.predict(&inputs).unwrap(), outputs);
}

#[test]
fn probabilities_should_sum_to_one() {
    let (inputs, _) = two_classes();
    let mut network = classifier();

    let probabilities = network.predict_prob(&inputs).unwrap();

    assert_eq!(probabilities.len(), inputs.len());
    for sample in probabilities {
        assert_eq!(sample.len(), 2);
        assert!((sample.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }
}

#[test]
fn predictions_should_be_one_hot() {
    let (inputs, _) = two_classes();
    let mut network = classifier();

    for prediction in network.predict(&inputs).unwrap() {
        assert_eq!(prediction.iter().sum::<f32>(), 1.0);
        assert!(prediction.iter().all(|value| *value == 0.0 || *value == 1.0));
    }
}

use tfnn::{
    layers::{Activator, DenseOptions},
    optimizers::GradientDescent,
    FitOptions, Network, NetworkError, NetworkSaver, NetworkType,
};

fn main() -> Result<(), NetworkError> {
    env_logger::init();

    // Defining the training data
    let training_inputs: Vec<Vec<f32>> = Vec::from([
        Vec::from([0.0, 0.0]),
        Vec::from([0.0, 1.0]),
        Vec::from([1.0, 0.0]),
        Vec::from([1.0, 1.0]),
    ]);

    let expected_outputs: Vec<Vec<f32>> = Vec::from([
        Vec::from([0.0]),
        Vec::from([1.0]),
        Vec::from([1.0]),
        Vec::from([0.0]),
    ]);

    // Two inputs, one output, no regularization
    let mut xor_network = Network::new(2, 1, false, false, NetworkType::Regression)?;

    xor_network
        .add_hidden_layer(3, DenseOptions::new().activator(Activator::Tanh))?
        .add_output_layer(DenseOptions::new().activator(Activator::Tanh))?
        .set_optimizer(Some(GradientDescent::new(0.1).into()))?;

    let loss = xor_network.fit(
        &training_inputs,
        &expected_outputs,
        FitOptions {
            steps: 5000,
            batch_size: 4,
            verbose: true,
            compute_loss: true,
            ..FitOptions::default()
        },
    )?;

    println!("loss after training: {:?}", loss);
    println!("predictions: {:?}", xor_network.predict(&training_inputs)?);

    // the saved file keeps the layers and the trained values
    let path = xor_network.save("xor", None, None, true)?;
    xor_network.close();

    let mut restored_network = NetworkSaver::restore(&path)?;
    restored_network.set_optimizer(None)?;

    println!(
        "restored predictions: {:?}",
        restored_network.predict(&training_inputs)?
    );

    Ok(())
}

mod classification;
mod conv;
mod saving;

pub(crate) fn xor_samples() -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
    let inputs = vec![
        vec![0.0_f32, 0.0_f32],
        vec![1.0_f32, 0.0_f32],
        vec![0.0_f32, 1.0_f32],
        vec![1.0_f32, 1.0_f32],
    ];

    let outputs = vec![vec![0.0_f32], vec![1.0_f32], vec![1.0_f32], vec![0.0_f32]];

    (inputs, outputs)
}

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

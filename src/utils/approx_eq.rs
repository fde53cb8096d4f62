//! Assertions for comparing floats that went through the framework.

#![allow(dead_code)]

/// Asserts two matrices are approximately equal using the **assert_approx_equal**
/// function in every single vector of both matrices.
///
/// # Panics
///
/// Panics if the length of both matrices are not euqal, or
/// the length of vectors being compared are not equal.
pub(crate) fn assert_approx_equal_matrix(a: &[Vec<f32>], b: &[Vec<f32>], decimal_place: u32) {
    assert_eq!(a.len(), b.len());
    for (arr1, arr2) in a.iter().zip(b) {
        assert_approx_equal(arr1, arr2, decimal_place);
    }
}

/// Asserts that two vectors are approximately equal comparing all of their numbers
/// up to a certain **decimal_place**.
///
/// # Panics
///
/// Panics if the length of both vectors are not equal.
pub(crate) fn assert_approx_equal(a: &[f32], b: &[f32], decimal_place: u32) {
    assert_eq!(a.len(), b.len());

    let power_ten = 10.0_f32.powf(decimal_place as f32);
    let approximate = |values: &[f32]| -> Vec<f32> {
        values
            .iter()
            .map(|x| (x * power_ten).round() / power_ten)
            .collect()
    };

    assert_eq!(approximate(a), approximate(b));
}

/// Asserts if the vectors **a** and **b** are approximately equal
/// being at most **max_dist** of a difference.
///
/// # Panics
///
/// Panics if the length of both vectors are not equal.
pub(crate) fn assert_approx_equal_distance(a: &[f32], b: &[f32], max_dist: f32) {
    assert_eq!(a.len(), b.len());

    a.iter().zip(b).for_each(|(x, y)| {
        assert!(
            (x - y).abs() <= max_dist,
            "{} and {} are further apart than {}",
            x,
            y,
            max_dist
        );
    });
}

use crate::ClassifyError;

/// Index and value of the largest score. Ties keep the first index.
pub fn argmax(scores: &[f32]) -> Result<(usize, f32), ClassifyError> {
    let (first, rest) = scores.split_first().ok_or(ClassifyError::EmptyOutput)?;

    let mut best = (0, *first);
    for (index, value) in rest.iter().enumerate() {
        if *value > best.1 {
            best = (index + 1, *value);
        }
    }

    Ok(best)
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    exps.into_iter().map(|x| x / sum).collect()
}

//! Exact additive attribution for tree ensembles
//!
//! Implements the polynomial-time exact TreeSHAP path algorithm: for every
//! root-to-leaf path the recursion maintains the set of unique features split
//! on so far, together with the fraction of background samples (from node
//! covers) and of "present" feature subsets that reach the leaf. Summed with
//! the cover-weighted expected score, the attributions reconstruct the raw
//! prediction exactly.

use crate::artifacts::{GbdtModel, Tree};

/// One unique feature on the current decision path
#[derive(Debug, Clone, Copy)]
struct PathElement {
    /// Feature index, -1 for the root placeholder
    feature: i32,
    /// Fraction of background samples that follow this path when the feature
    /// is absent from the subset
    zero_fraction: f64,
    /// One when the observed value follows this path, zero otherwise
    one_fraction: f64,
    /// Permutation weight of subsets of this size
    pweight: f64,
}

/// Per-feature attributions for one feature vector, in model feature order
///
/// Satisfies local accuracy: `sum(phi) == model.predict_raw(x) -
/// model.expected_raw()` up to floating-point error.
pub fn tree_shap(model: &GbdtModel, x: &[f64]) -> Vec<f64> {
    let mut phi = vec![0.0; model.num_features()];
    for tree in &model.trees {
        shap_recurse(tree, x, &mut phi, 0, Vec::new(), 1.0, 1.0, -1);
    }
    phi
}

/// Grow the path by one feature and redistribute subset weights
fn extend(path: &mut Vec<PathElement>, zero_fraction: f64, one_fraction: f64, feature: i32) {
    let pweight = if path.is_empty() { 1.0 } else { 0.0 };
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        pweight,
    });

    let depth = path.len() - 1;
    for i in (0..depth).rev() {
        path[i + 1].pweight +=
            one_fraction * path[i].pweight * (i + 1) as f64 / (depth + 1) as f64;
        path[i].pweight =
            zero_fraction * path[i].pweight * (depth - i) as f64 / (depth + 1) as f64;
    }
}

/// Remove the path element at `index`, undoing its weight contribution
fn unwind(path: &mut Vec<PathElement>, index: usize) {
    let depth = path.len() - 1;
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let mut next_one_portion = path[depth].pweight;

    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = path[i].pweight;
            path[i].pweight =
                next_one_portion * (depth + 1) as f64 / ((i + 1) as f64 * one_fraction);
            next_one_portion =
                tmp - path[i].pweight * zero_fraction * (depth - i) as f64 / (depth + 1) as f64;
        } else {
            path[i].pweight =
                path[i].pweight * (depth + 1) as f64 / (zero_fraction * (depth - i) as f64);
        }
    }

    for i in index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.pop();
}

/// Total subset weight that would remain after unwinding `index`
fn unwound_sum(path: &[PathElement], index: usize) -> f64 {
    let depth = path.len() - 1;
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let mut next_one_portion = path[depth].pweight;
    let mut total = 0.0;

    if one_fraction != 0.0 {
        for i in (0..depth).rev() {
            let tmp = next_one_portion / ((i + 1) as f64 * one_fraction);
            total += tmp;
            next_one_portion =
                path[i].pweight - tmp * zero_fraction * (depth - i) as f64;
        }
    } else {
        for i in (0..depth).rev() {
            total += path[i].pweight / (zero_fraction * (depth - i) as f64);
        }
    }

    total * (depth + 1) as f64
}

#[allow(clippy::too_many_arguments)]
fn shap_recurse(
    tree: &Tree,
    x: &[f64],
    phi: &mut [f64],
    node_idx: usize,
    parent_path: Vec<PathElement>,
    zero_fraction: f64,
    one_fraction: f64,
    feature: i32,
) {
    let mut path = parent_path;
    extend(&mut path, zero_fraction, one_fraction, feature);

    let node = &tree.nodes[node_idx];
    if node.is_leaf() {
        let depth = path.len() - 1;
        for i in 1..=depth {
            let weight = unwound_sum(&path, i);
            let element = &path[i];
            phi[element.feature as usize] +=
                weight * (element.one_fraction - element.zero_fraction) * node.value;
        }
        return;
    }

    let (hot, cold) = if x[node.feature as usize] <= node.threshold {
        (node.left as usize, node.right as usize)
    } else {
        (node.right as usize, node.left as usize)
    };
    let hot_zero_fraction = tree.nodes[hot].cover / node.cover;
    let cold_zero_fraction = tree.nodes[cold].cover / node.cover;

    // A feature split on earlier in the path is unwound and re-extended so
    // each feature appears at most once
    let mut incoming_zero_fraction = 1.0;
    let mut incoming_one_fraction = 1.0;
    if let Some(previous) = path.iter().position(|e| e.feature == node.feature) {
        incoming_zero_fraction = path[previous].zero_fraction;
        incoming_one_fraction = path[previous].one_fraction;
        unwind(&mut path, previous);
    }

    shap_recurse(
        tree,
        x,
        phi,
        hot,
        path.clone(),
        hot_zero_fraction * incoming_zero_fraction,
        incoming_one_fraction,
        node.feature,
    );
    shap_recurse(
        tree,
        x,
        phi,
        cold,
        path,
        cold_zero_fraction * incoming_zero_fraction,
        0.0,
        node.feature,
    );
}

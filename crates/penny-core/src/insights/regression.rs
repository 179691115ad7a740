//! Regression models used by the monthly forecast
//!
//! Two fitting strategies share one train/predict surface:
//! - `RidgeRegression` - L2-regularized linear least squares, for short histories
//! - `RandomForest` - bagged regression trees, once there is enough history
//!
//! `ModelKind::for_history` picks between them from the number of months
//! available. Both are deterministic: the forest bootstraps from a fixed seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Features per month: index, count, mean, std dev, month of year
pub const FEATURE_COUNT: usize = 5;

pub type FeatureRow = [f64; FEATURE_COUNT];

/// Months of history needed before the tree ensemble is used
pub const MIN_MONTHS_FOR_ENSEMBLE: usize = 3;

/// Which fitting strategy produced a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Bagged regression trees
    TreeEnsemble,
    /// Ridge (L2-regularized) linear regression
    RidgeLinear,
}

impl ModelKind {
    /// Strategy for a history of `months` monthly samples
    pub fn for_history(months: usize) -> Self {
        if months >= MIN_MONTHS_FOR_ENSEMBLE {
            ModelKind::TreeEnsemble
        } else {
            ModelKind::RidgeLinear
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::TreeEnsemble => "tree_ensemble",
            ModelKind::RidgeLinear => "ridge_linear",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A trained model of either kind
#[derive(Debug, Clone)]
pub enum FittedModel {
    TreeEnsemble(RandomForest),
    RidgeLinear(RidgeRegression),
}

impl FittedModel {
    pub fn fit(kind: ModelKind, x: &[FeatureRow], y: &[f64]) -> Result<Self> {
        check_training_data(x, y)?;
        match kind {
            ModelKind::TreeEnsemble => Ok(FittedModel::TreeEnsemble(RandomForest::fit(
                x,
                y,
                ForestParams::default(),
            )?)),
            ModelKind::RidgeLinear => Ok(FittedModel::RidgeLinear(RidgeRegression::fit(
                x,
                y,
                RidgeRegression::DEFAULT_ALPHA,
            )?)),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            FittedModel::TreeEnsemble(_) => ModelKind::TreeEnsemble,
            FittedModel::RidgeLinear(_) => ModelKind::RidgeLinear,
        }
    }

    pub fn predict(&self, row: &FeatureRow) -> f64 {
        match self {
            FittedModel::TreeEnsemble(model) => model.predict(row),
            FittedModel::RidgeLinear(model) => model.predict(row),
        }
    }
}

fn check_training_data(x: &[FeatureRow], y: &[f64]) -> Result<()> {
    if x.is_empty() || x.len() != y.len() {
        return Err(Error::Forecast(format!(
            "Training data mismatch: {} rows, {} targets",
            x.len(),
            y.len()
        )));
    }
    let all_finite = x.iter().flatten().chain(y.iter()).all(|v| v.is_finite());
    if !all_finite {
        return Err(Error::Forecast("Training data contains non-finite values".into()));
    }
    Ok(())
}

// =============================================================================
// Ridge regression
// =============================================================================

/// Linear model fit by ridge regression. The intercept is not penalized.
#[derive(Debug, Clone)]
pub struct RidgeRegression {
    coefficients: FeatureRow,
    intercept: f64,
}

impl RidgeRegression {
    pub const DEFAULT_ALPHA: f64 = 1.0;

    pub fn fit(x: &[FeatureRow], y: &[f64], alpha: f64) -> Result<Self> {
        check_training_data(x, y)?;
        let n = x.len() as f64;

        let mut x_mean = [0.0; FEATURE_COUNT];
        for row in x {
            for (m, v) in x_mean.iter_mut().zip(row) {
                *m += v / n;
            }
        }
        let y_mean = y.iter().sum::<f64>() / n;

        // Normal equations on centered data: (XᵀX + αI) w = Xᵀy
        let mut a = [[0.0; FEATURE_COUNT]; FEATURE_COUNT];
        let mut b = [0.0; FEATURE_COUNT];
        for (row, target) in x.iter().zip(y) {
            let centered: Vec<f64> = row.iter().zip(&x_mean).map(|(v, m)| v - m).collect();
            let yc = target - y_mean;
            for i in 0..FEATURE_COUNT {
                b[i] += centered[i] * yc;
                for j in 0..FEATURE_COUNT {
                    a[i][j] += centered[i] * centered[j];
                }
            }
        }
        for (i, row) in a.iter_mut().enumerate() {
            row[i] += alpha;
        }

        let coefficients = solve(a, b)
            .ok_or_else(|| Error::Forecast("Singular system in ridge regression".into()))?;
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_mean)
                .map(|(w, m)| w * m)
                .sum::<f64>();

        Ok(Self {
            coefficients,
            intercept,
        })
    }

    pub fn predict(&self, row: &FeatureRow) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(w, v)| w * v)
                .sum::<f64>()
    }

    pub fn coefficients(&self) -> &FeatureRow {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

/// Gaussian elimination with partial pivoting
fn solve(
    mut a: [[f64; FEATURE_COUNT]; FEATURE_COUNT],
    mut b: FeatureRow,
) -> Option<FeatureRow> {
    const EPS: f64 = 1e-12;

    for col in 0..FEATURE_COUNT {
        let pivot = (col..FEATURE_COUNT).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot][col].abs() < EPS {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..FEATURE_COUNT {
            let factor = a[row][col] / a[col][col];
            for k in col..FEATURE_COUNT {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0; FEATURE_COUNT];
    for row in (0..FEATURE_COUNT).rev() {
        let tail: f64 = ((row + 1)..FEATURE_COUNT).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

// =============================================================================
// Regression trees and the forest
// =============================================================================

/// Forest hyperparameters
#[derive(Debug, Clone, Copy)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 8,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// CART regression tree minimizing squared error
#[derive(Debug, Clone)]
pub struct RegressionTree {
    root: Node,
}

impl RegressionTree {
    fn fit(x: &[FeatureRow], y: &[f64], indices: &[usize], params: &ForestParams) -> Self {
        Self {
            root: grow(x, y, indices, 0, params),
        }
    }

    pub fn predict(&self, row: &FeatureRow) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf(value) => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

fn grow(
    x: &[FeatureRow],
    y: &[f64],
    indices: &[usize],
    depth: usize,
    params: &ForestParams,
) -> Node {
    let n = indices.len() as f64;
    let leaf_value = indices.iter().map(|&i| y[i]).sum::<f64>() / n;

    let pure = indices.iter().all(|&i| (y[i] - y[indices[0]]).abs() < f64::EPSILON);
    if depth >= params.max_depth || indices.len() < params.min_samples_split || pure {
        return Node::Leaf(leaf_value);
    }

    match best_split(x, y, indices, params.min_samples_leaf) {
        Some((feature, threshold)) => {
            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .copied()
                .partition(|&i| x[i][feature] <= threshold);
            Node::Split {
                feature,
                threshold,
                left: Box::new(grow(x, y, &left, depth + 1, params)),
                right: Box::new(grow(x, y, &right, depth + 1, params)),
            }
        }
        None => Node::Leaf(leaf_value),
    }
}

/// Find the (feature, threshold) with the lowest total squared error
fn best_split(
    x: &[FeatureRow],
    y: &[f64],
    indices: &[usize],
    min_leaf: usize,
) -> Option<(usize, f64)> {
    let n = indices.len();
    let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
    let parent_sse = total_sq - total_sum * total_sum / n as f64;

    let mut best: Option<(usize, f64, f64)> = None;

    for feature in 0..FEATURE_COUNT {
        let mut pairs: Vec<(f64, f64)> = indices.iter().map(|&i| (x[i][feature], y[i])).collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 1..n {
            let (_, target) = pairs[k - 1];
            left_sum += target;
            left_sq += target * target;

            if k < min_leaf || n - k < min_leaf || pairs[k - 1].0 >= pairs[k].0 {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / k as f64)
                + (right_sq - right_sum * right_sum / (n - k) as f64);

            if sse < parent_sse - 1e-9 && best.map_or(true, |(_, _, b)| sse < b) {
                let threshold = (pairs[k - 1].0 + pairs[k].0) / 2.0;
                best = Some((feature, threshold, sse));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

/// Bootstrap-aggregated regression trees
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn fit(x: &[FeatureRow], y: &[f64], params: ForestParams) -> Result<Self> {
        check_training_data(x, y)?;
        if params.n_trees == 0 {
            return Err(Error::Forecast("Forest needs at least one tree".into()));
        }

        let mut rng = StdRng::seed_from_u64(params.seed);
        let n = x.len();
        let trees = (0..params.n_trees)
            .map(|_| {
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(x, y, &sample, &params)
            })
            .collect();

        Ok(Self { trees })
    }

    pub fn predict(&self, row: &FeatureRow) -> f64 {
        self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> (Vec<FeatureRow>, Vec<f64>) {
        let x: Vec<FeatureRow> = (0..n)
            .map(|i| [i as f64, 4.0, 100.0, 10.0, (i % 12 + 1) as f64])
            .collect();
        let y: Vec<f64> = (0..n).map(|i| 1000.0 + 100.0 * i as f64).collect();
        (x, y)
    }

    #[test]
    fn test_model_kind_selection() {
        assert_eq!(ModelKind::for_history(2), ModelKind::RidgeLinear);
        assert_eq!(ModelKind::for_history(3), ModelKind::TreeEnsemble);
        assert_eq!(ModelKind::for_history(24), ModelKind::TreeEnsemble);
    }

    #[test]
    fn test_ridge_recovers_linear_trend() {
        let (x, y) = rows(12);
        let model = RidgeRegression::fit(&x, &y, 1e-6).unwrap();
        let next = [12.0, 4.0, 100.0, 10.0, 1.0];
        // Month-of-year correlates with the index here, so check the fit, not the weights
        for (row, target) in x.iter().zip(&y) {
            assert!((model.predict(row) - target).abs() < 1.0);
        }
        assert!(model.predict(&next).is_finite());
    }

    #[test]
    fn test_ridge_pure_index_trend() {
        let x: Vec<FeatureRow> = (0..5).map(|i| [i as f64, 0.0, 0.0, 0.0, 0.0]).collect();
        let y: Vec<f64> = (0..5).map(|i| 10.0 + 2.0 * i as f64).collect();
        let model = RidgeRegression::fit(&x, &y, 1e-9).unwrap();

        assert!((model.coefficients()[0] - 2.0).abs() < 1e-6);
        assert!((model.intercept() - 10.0).abs() < 1e-6);
        assert!((model.predict(&[5.0, 0.0, 0.0, 0.0, 0.0]) - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_ridge_two_samples_is_solvable() {
        let x = vec![[0.0, 3.0, 50.0, 5.0, 1.0], [1.0, 4.0, 60.0, 0.0, 2.0]];
        let y = vec![150.0, 240.0];
        let model = RidgeRegression::fit(&x, &y, RidgeRegression::DEFAULT_ALPHA).unwrap();
        assert!(model.predict(&[2.0, 3.5, 55.0, 2.5, 3.0]).is_finite());
    }

    #[test]
    fn test_tree_fits_step_function() {
        let x: Vec<FeatureRow> = (0..6).map(|i| [i as f64, 0.0, 0.0, 0.0, 0.0]).collect();
        let y = vec![10.0, 10.0, 10.0, 50.0, 50.0, 50.0];
        let indices: Vec<usize> = (0..6).collect();
        let tree = RegressionTree::fit(&x, &y, &indices, &ForestParams::default());

        assert_eq!(tree.predict(&[1.0, 0.0, 0.0, 0.0, 0.0]), 10.0);
        assert_eq!(tree.predict(&[4.0, 0.0, 0.0, 0.0, 0.0]), 50.0);
    }

    #[test]
    fn test_forest_is_deterministic() {
        let (x, y) = rows(8);
        let a = RandomForest::fit(&x, &y, ForestParams::default()).unwrap();
        let b = RandomForest::fit(&x, &y, ForestParams::default()).unwrap();
        let probe = [8.0, 4.0, 100.0, 10.0, 9.0];

        assert_eq!(a.n_trees(), 100);
        assert_eq!(a.predict(&probe), b.predict(&probe));
    }

    #[test]
    fn test_forest_prediction_within_target_range() {
        let (x, y) = rows(6);
        let forest = RandomForest::fit(&x, &y, ForestParams::default()).unwrap();
        let prediction = forest.predict(&[6.0, 4.0, 100.0, 10.0, 7.0]);

        assert!((1000.0..=1500.0).contains(&prediction));
    }

    #[test]
    fn test_fit_rejects_bad_data() {
        assert!(FittedModel::fit(ModelKind::RidgeLinear, &[], &[]).is_err());
        let x = vec![[f64::NAN, 0.0, 0.0, 0.0, 0.0]];
        assert!(FittedModel::fit(ModelKind::TreeEnsemble, &x, &[1.0]).is_err());
        let x = vec![[0.0; FEATURE_COUNT]];
        assert!(FittedModel::fit(ModelKind::RidgeLinear, &x, &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_fitted_model_reports_kind() {
        let (x, y) = rows(4);
        let model = FittedModel::fit(ModelKind::TreeEnsemble, &x, &y).unwrap();
        assert_eq!(model.kind(), ModelKind::TreeEnsemble);
        let model = FittedModel::fit(ModelKind::RidgeLinear, &x, &y).unwrap();
        assert_eq!(model.kind(), ModelKind::RidgeLinear);
    }
}

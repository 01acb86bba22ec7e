use criterion::{black_box, criterion_group, criterion_main, Criterion};
use treepmml::tree::TreeArrays;
use treepmml::{ConverterMode, DecisionTreeClassifier, DecisionTreeConverter, Feature, TransformationContext, Tree};

/// Grow a balanced tree in depth-first order, splitting on
/// feature `depth % n_features` at every level.
fn grow(arrays: &mut TreeArrays, depth: usize, max_depth: usize, n_features: usize, n: usize) {
    let idx = arrays.children_left.len();
    arrays.children_left.push(-1);
    arrays.children_right.push(-1);
    arrays.feature.push(-2);
    arrays.threshold.push(-2.0);
    arrays.n_node_samples.push(n);
    arrays.value.push(vec![(n / 3) as f64, (n - n / 3) as f64]);
    if depth < max_depth {
        arrays.feature[idx] = (depth % n_features) as i64;
        arrays.threshold[idx] = 0.5;
        arrays.children_left[idx] = arrays.children_left.len() as i64;
        grow(arrays, depth + 1, max_depth, n_features, n / 2);
        arrays.children_right[idx] = arrays.children_left.len() as i64;
        grow(arrays, depth + 1, max_depth, n_features, n - n / 2);
    }
}

fn balanced_tree(max_depth: usize, n_features: usize) -> Tree {
    let mut arrays = TreeArrays {
        children_left: Vec::new(),
        children_right: Vec::new(),
        feature: Vec::new(),
        threshold: Vec::new(),
        n_node_samples: Vec::new(),
        value: Vec::new(),
    };
    grow(&mut arrays, 0, max_depth, n_features, 1 << (max_depth + 4));
    Tree::try_from(arrays).unwrap()
}

pub fn conversion_benchmarks(c: &mut Criterion) {
    let n_features = 8;
    let features: Vec<Feature> = (0..n_features)
        .map(|i| Feature::real_numeric(&format!("x{}", i)))
        .collect();
    let output = Feature::string_categorical("y", &["neg", "pos"]).unwrap();
    let context = TransformationContext::new(features.clone(), features, vec![], vec![output]).unwrap();
    let estimator = DecisionTreeClassifier::new(balanced_tree(12, n_features));
    let converter = DecisionTreeConverter::new(&estimator, context, ConverterMode::Classification);

    c.bench_function("pmml depth 12", |b| b.iter(|| black_box(&converter).pmml().unwrap()));
    c.bench_function("json dump depth 12", |b| {
        let doc = converter.pmml().unwrap();
        b.iter(|| black_box(&doc).json_dump().unwrap())
    });
}

criterion_group!(benches, conversion_benchmarks);
criterion_main!(benches);

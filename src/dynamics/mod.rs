pub mod discretize;

pub use discretize::DynamicsDiscretizer;

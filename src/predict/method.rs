use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::models::Regressor;
use super::models::forest::RandomForest;
use super::models::linear::LinearRegression;
use super::models::mlp::NeuralNetwork;
use super::models::polynomial::{self, PolynomialRegression};
use super::models::substitutes::{BoostedTreesSubstitute, SequenceModelSubstitute};
use super::models::svr::SupportVectorRegression;
use crate::error::DaplotError;

/// A named regression strategy, selected by its string tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Linear,
    Polynomial,
    Svr,
    RandomForest,
    NeuralNetwork,
    Xgboost,
    Lstm,
}

impl Method {
    pub const ALL: [Method; 7] = [
        Method::Linear,
        Method::Polynomial,
        Method::Svr,
        Method::RandomForest,
        Method::NeuralNetwork,
        Method::Xgboost,
        Method::Lstm,
    ];

    /// The tag callers use to request this method.
    pub fn tag(self) -> &'static str {
        match self {
            Method::Linear => "linear",
            Method::Polynomial => "polynomial",
            Method::Svr => "svr",
            Method::RandomForest => "randomforest",
            Method::NeuralNetwork => "neuralnetwork",
            Method::Xgboost => "xgboost",
            Method::Lstm => "lstm",
        }
    }

    /// Display name for selectors.
    pub fn label(self) -> &'static str {
        match self {
            Method::Linear => "Linear regression",
            Method::Polynomial => "Polynomial regression",
            Method::Svr => "Support vector regression",
            Method::RandomForest => "Random forest",
            Method::NeuralNetwork => "Neural network",
            Method::Xgboost => "XGBoost (random forest)",
            Method::Lstm => "LSTM (quadratic trend)",
        }
    }

    /// A fresh, unfitted model for this method.
    pub fn regressor(self) -> Box<dyn Regressor> {
        match self {
            Method::Linear => Box::new(LinearRegression::new()),
            Method::Polynomial => Box::new(PolynomialRegression::new(polynomial::MAX_DEGREE)),
            Method::Svr => Box::new(SupportVectorRegression::new()),
            Method::RandomForest => Box::new(RandomForest::new(100, 10)),
            Method::NeuralNetwork => Box::new(NeuralNetwork::new(vec![50, 25], 1000, 0.01)),
            Method::Xgboost => Box::new(BoostedTreesSubstitute::new()),
            Method::Lstm => Box::new(SequenceModelSubstitute::new()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Method {
    type Err = DaplotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Method::ALL
            .into_iter()
            .find(|m| m.tag() == wanted)
            .ok_or_else(|| DaplotError::UnsupportedMethod(s.to_string()))
    }
}

impl Serialize for Method {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for Method {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

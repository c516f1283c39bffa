use std::collections::{BTreeMap, BTreeSet};

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};

use crate::error::CorrelationError;

pub type Map = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expression {
    key: String,
    operator: Operator,
    values: BTreeSet<String>,
}

/// Selects the pods a subject owns: every `match_labels` pair must be present
/// with the same value and every expression must hold.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    match_labels: Map,
    match_expressions: Vec<Expression>,
}

// === Selector ===

impl Selector {
    pub fn from_map(match_labels: Map) -> Self {
        Self {
            match_labels,
            match_expressions: Vec::new(),
        }
    }

    pub fn matches(&self, labels: Option<&Map>) -> bool {
        let empty = Map::new();
        let labels = labels.unwrap_or(&empty);

        self.match_labels
            .iter()
            .all(|(k, v)| labels.get(k) == Some(v))
            && self.match_expressions.iter().all(|e| e.matches(labels))
    }
}

impl TryFrom<&LabelSelector> for Selector {
    type Error = CorrelationError;

    fn try_from(selector: &LabelSelector) -> Result<Self, Self::Error> {
        let match_expressions = selector
            .match_expressions
            .iter()
            .flatten()
            .map(Expression::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            match_labels: selector.match_labels.clone().unwrap_or_default(),
            match_expressions,
        })
    }
}

impl std::iter::FromIterator<(&'static str, &'static str)> for Selector {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        Self::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

// === Expression ===

impl Expression {
    fn matches(&self, labels: &Map) -> bool {
        match self.operator {
            Operator::In => labels.get(&self.key).is_some_and(|v| self.values.contains(v)),
            Operator::NotIn => !labels.get(&self.key).is_some_and(|v| self.values.contains(v)),
            Operator::Exists => labels.contains_key(&self.key),
            Operator::DoesNotExist => !labels.contains_key(&self.key),
        }
    }
}

impl TryFrom<&LabelSelectorRequirement> for Expression {
    type Error = CorrelationError;

    fn try_from(req: &LabelSelectorRequirement) -> Result<Self, Self::Error> {
        let operator = match req.operator.as_str() {
            "In" => Operator::In,
            "NotIn" => Operator::NotIn,
            "Exists" => Operator::Exists,
            "DoesNotExist" => Operator::DoesNotExist,
            other => {
                return Err(CorrelationError::InvalidOperator {
                    key: req.key.clone(),
                    operator: other.to_string(),
                })
            }
        };
        let values: BTreeSet<String> = req.values.iter().flatten().cloned().collect();

        match operator {
            Operator::In | Operator::NotIn if values.is_empty() => {
                Err(CorrelationError::MissingValues {
                    key: req.key.clone(),
                    operator: req.operator.clone(),
                })
            }
            Operator::Exists | Operator::DoesNotExist if !values.is_empty() => {
                Err(CorrelationError::UnexpectedValues {
                    key: req.key.clone(),
                    operator: req.operator.clone(),
                })
            }
            _ => Ok(Self {
                key: req.key.clone(),
                operator,
                values,
            }),
        }
    }
}

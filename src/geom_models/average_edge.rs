//! Edge averages of node fields, optionally with their derivatives.
//!
//! Without a derivative variable the model is named after the requested edge
//! model. With one, it becomes `<edge>:<var>@n0` (derivative with respect to
//! the head node's value) and fills the companion `<edge>:<var>@n1` (tail).

use std::fmt;
use std::str::FromStr;

use crate::geom_models::names::EDGE_INVERSE_LENGTH;
use crate::model::{ComputeContext, EdgeKind, ModelCalculation, ModelHandle};
use crate::model_error::ModelError;
use crate::region::Region;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AverageType {
    Arithmetic,
    Geometric,
    Gradient,
    NegativeGradient,
}

impl AverageType {
    pub fn keyword(self) -> &'static str {
        match self {
            AverageType::Arithmetic => "arithmetic",
            AverageType::Geometric => "geometric",
            AverageType::Gradient => "gradient",
            AverageType::NegativeGradient => "negative_gradient",
        }
    }

    fn is_gradient(self) -> bool {
        matches!(self, AverageType::Gradient | AverageType::NegativeGradient)
    }

    fn gradient_sign(self) -> f64 {
        match self {
            AverageType::NegativeGradient => -1.0,
            _ => 1.0,
        }
    }

    /// Average of the head value `x` and tail value `y`.
    fn average(self, x: f64, y: f64) -> f64 {
        match self {
            AverageType::Geometric => (x * y).sqrt(),
            _ => 0.5 * (x + y),
        }
    }

    /// Derivatives of [`average`](Self::average) with respect to the head
    /// and tail variables, given `xd = dx/dv0` and `yd = dy/dv1`.
    fn average_derivative(self, x: f64, xd: f64, y: f64, yd: f64) -> (f64, f64) {
        match self {
            AverageType::Geometric => {
                let ratio = (y / x).sqrt();
                (0.5 * xd * ratio, 0.5 * yd / ratio)
            }
            _ => (0.5 * xd, 0.5 * yd),
        }
    }
}

impl fmt::Display for AverageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for AverageType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arithmetic" => Ok(AverageType::Arithmetic),
            "geometric" => Ok(AverageType::Geometric),
            "gradient" => Ok(AverageType::Gradient),
            "negative_gradient" => Ok(AverageType::NegativeGradient),
            other => Err(ModelError::UnknownAverageType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AverageEdgeModel {
    edge_model: String,
    node_model: String,
    average_type: AverageType,
    variable: Option<String>,
}

impl AverageEdgeModel {
    pub fn new(edge_model: impl Into<String>, node_model: impl Into<String>, average_type: AverageType) -> Self {
        Self {
            edge_model: edge_model.into(),
            node_model: node_model.into(),
            average_type,
            variable: None,
        }
    }

    /// The derivative of the average with respect to `variable`.
    pub fn with_derivative(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }

    /// Name the model is registered under.
    pub fn name(&self) -> String {
        match &self.variable {
            Some(var) => format!("{}:{}@n0", self.edge_model, var),
            None => self.edge_model.clone(),
        }
    }

    fn tail_name(&self) -> Option<String> {
        self.variable
            .as_ref()
            .map(|var| format!("{}:{}@n1", self.edge_model, var))
    }

    /// Node model holding `d node_model / d variable`; `None` when the
    /// variable is the node model itself.
    pub fn derivative_model(&self) -> Option<String> {
        self.variable
            .as_ref()
            .filter(|var| **var != self.node_model)
            .map(|var| format!("{}:{}", self.node_model, var))
    }

    fn averages(&self, ctx: &ComputeContext<'_, EdgeKind>) -> Result<Vec<f64>, ModelError> {
        let nodes = ctx.node_values(&self.node_model)?;
        let edges = ctx.region().edges();
        if self.average_type.is_gradient() {
            let inverse = ctx.edge_values(EDGE_INVERSE_LENGTH)?;
            let sign = self.average_type.gradient_sign();
            Ok(edges
                .iter()
                .zip(inverse.iter())
                .map(|(e, inv)| sign * inv * (nodes[e.tail()] - nodes[e.head()]))
                .collect())
        } else {
            Ok(edges
                .iter()
                .map(|e| self.average_type.average(nodes[e.head()], nodes[e.tail()]))
                .collect())
        }
    }

    fn derivatives(&self, ctx: &ComputeContext<'_, EdgeKind>) -> Result<(Vec<f64>, Vec<f64>), ModelError> {
        let edges = ctx.region().edges();
        let derivative = match self.derivative_model() {
            Some(name) => Some(ctx.node_values(&name)?),
            None => None,
        };
        let d = |n: usize| derivative.as_ref().map_or(1.0, |values| values[n]);

        if self.average_type.is_gradient() {
            let inverse = ctx.edge_values(EDGE_INVERSE_LENGTH)?;
            let sign = self.average_type.gradient_sign();
            Ok(edges
                .iter()
                .zip(inverse.iter())
                .map(|(e, inv)| {
                    let ev = sign * inv;
                    (-ev * d(e.head()), ev * d(e.tail()))
                })
                .unzip())
        } else {
            let nodes = ctx.node_values(&self.node_model)?;
            Ok(edges
                .iter()
                .map(|e| {
                    let (h, t) = (e.head(), e.tail());
                    self.average_type.average_derivative(nodes[h], d(h), nodes[t], d(t))
                })
                .unzip())
        }
    }
}

impl ModelCalculation<EdgeKind> for AverageEdgeModel {
    fn dependencies(&self, _region: &Region) -> Vec<String> {
        let mut deps = vec![self.node_model.clone()];
        deps.extend(self.derivative_model());
        if self.average_type.is_gradient() {
            deps.push(EDGE_INVERSE_LENGTH.to_string());
        }
        deps
    }

    fn companions(&self, _region: &Region) -> Vec<String> {
        self.tail_name().into_iter().collect()
    }

    fn calculate(&self, ctx: &mut ComputeContext<'_, EdgeKind>) -> Result<(), ModelError> {
        match self.tail_name() {
            None => {
                let values = self.averages(ctx)?;
                ctx.set_values(values);
            }
            Some(tail) => {
                let (head, tail_values) = self.derivatives(ctx)?;
                ctx.set_values(head);
                ctx.set_companion_values(tail, tail_values);
            }
        }
        Ok(())
    }

    fn serialize(&self, model: &ModelHandle<'_, EdgeKind>, out: &mut dyn fmt::Write) -> fmt::Result {
        let region = model.region();
        write!(
            out,
            "COMMAND edge_average_model -device \"{}\" -region \"{}\" -node_model \"{}\" -edge_model \"{}\" -average_type \"{}\"",
            region.device_name(),
            region.name(),
            self.node_model,
            self.edge_model,
            self.average_type
        )?;
        if let Some(var) = &self.variable {
            write!(out, " -derivative \"{var}\"")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_derivative() {
        let plain = AverageEdgeModel::new("Eavg", "Potential", AverageType::Arithmetic);
        assert_eq!(plain.name(), "Eavg");
        assert_eq!(plain.derivative_model(), None);

        let d = plain.clone().with_derivative("Electrons");
        assert_eq!(d.name(), "Eavg:Electrons@n0");
        assert_eq!(d.tail_name().as_deref(), Some("Eavg:Electrons@n1"));
        assert_eq!(d.derivative_model().as_deref(), Some("Potential:Electrons"));

        let self_d = plain.with_derivative("Potential");
        assert_eq!(self_d.derivative_model(), None);
    }

    #[test]
    fn parses_keywords() {
        assert_eq!("negative_gradient".parse::<AverageType>(), Ok(AverageType::NegativeGradient));
        assert!(matches!(
            "harmonic".parse::<AverageType>(),
            Err(ModelError::UnknownAverageType(s)) if s == "harmonic"
        ));
    }

    #[test]
    fn geometric_derivative_scales_by_ratio() {
        let (d0, d1) = AverageType::Geometric.average_derivative(1.0, 1.0, 4.0, 1.0);
        assert_eq!(d0, 1.0);
        assert_eq!(d1, 0.25);
    }
}

//! Axis metadata attached to a chart
//!
//! Units may describe either axis or both. Labels always describe both axes.

use serde::Serialize;
use serde_json::Value;

use crate::error::TransposeError;
use crate::types::string_fields;

/// Units of a chart's axes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Units {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl Units {
    /// Return a new Units object. At least one axis must be given.
    pub fn new(x: Option<String>, y: Option<String>) -> Result<Self, TransposeError> {
        if x.is_none() && y.is_none() {
            return Err(Self::invalid());
        }
        Ok(Units { x, y })
    }

    fn invalid() -> TransposeError {
        TransposeError::Construction {
            field: "units",
            reason: r#"only objects of format {"x": <string>, "y": <string>} with either or both keys are accepted"#,
        }
    }
}

impl TryFrom<&Value> for Units {
    type Error = TransposeError;

    /// Accepts an object whose keys are exactly `x`, exactly `y`, or exactly `x` and `y`, with
    /// string values.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        if let Some(&[x, y]) = string_fields(value, &["x", "y"]).as_deref() {
            Self::new(Some(x.to_string()), Some(y.to_string()))
        } else if let Some(&[x]) = string_fields(value, &["x"]).as_deref() {
            Self::new(Some(x.to_string()), None)
        } else if let Some(&[y]) = string_fields(value, &["y"]).as_deref() {
            Self::new(None, Some(y.to_string()))
        } else {
            Err(Self::invalid())
        }
    }
}

/// Labels of a chart's axes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Labels {
    pub x: String,
    pub y: String,
}

impl Labels {
    /// Return a new Labels object.
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        Labels {
            x: x.into(),
            y: y.into(),
        }
    }
}

impl TryFrom<&Value> for Labels {
    type Error = TransposeError;

    /// Accepts an object with exactly the keys `x` and `y`, both with string values.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match string_fields(value, &["x", "y"]).as_deref() {
            Some(&[x, y]) => Ok(Self::new(x, y)),
            _ => Err(TransposeError::Construction {
                field: "labels",
                reason: r#"only objects of format {"x": <string>, "y": <string>} are accepted"#,
            }),
        }
    }
}

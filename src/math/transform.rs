use glam::{Mat4, Vec3};
use std::fmt;
use std::str::FromStr;

use crate::types::{CameraPose, ObjectPlane, Vector3};

/// One step of an ordered transform list
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformStep {
    Translate(Vec3),
    /// Degrees about X
    RotateX(f32),
    /// Degrees about Y
    RotateY(f32),
    /// Degrees about Z
    RotateZ(f32),
    /// Uniform scale
    Scale(f32),
}

impl TransformStep {
    pub fn to_matrix(&self) -> Mat4 {
        match *self {
            TransformStep::Translate(t) => Mat4::from_translation(t),
            TransformStep::RotateX(deg) => Mat4::from_rotation_x(deg.to_radians()),
            TransformStep::RotateY(deg) => Mat4::from_rotation_y(deg.to_radians()),
            TransformStep::RotateZ(deg) => Mat4::from_rotation_z(deg.to_radians()),
            TransformStep::Scale(s) => Mat4::from_scale(Vec3::splat(s)),
        }
    }

    fn function_name(&self) -> &'static str {
        match self {
            TransformStep::Translate(_) => "translate3d",
            TransformStep::RotateX(_) => "rotateX",
            TransformStep::RotateY(_) => "rotateY",
            TransformStep::RotateZ(_) => "rotateZ",
            TransformStep::Scale(_) => "scale",
        }
    }
}

impl fmt::Display for TransformStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.function_name();
        match *self {
            TransformStep::Translate(t) => write!(f, "{name}({}px, {}px, {}px)", t.x, t.y, t.z),
            TransformStep::RotateX(deg) | TransformStep::RotateY(deg) | TransformStep::RotateZ(deg) => {
                write!(f, "{name}({deg}deg)")
            }
            TransformStep::Scale(s) => write!(f, "{name}({s})"),
        }
    }
}

/// Ordered transform description; steps apply left to right
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransformChain {
    steps: Vec<TransformStep>,
}

impl TransformChain {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step - functional style
    pub fn then(mut self, step: TransformStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    /// Compose into one matrix (first step outermost)
    pub fn to_matrix(&self) -> Mat4 {
        self.steps
            .iter()
            .fold(Mat4::IDENTITY, |acc, step| acc * step.to_matrix())
    }

    /// First translation in the chain
    pub fn translation(&self) -> Option<Vec3> {
        self.steps.iter().find_map(|step| match step {
            TransformStep::Translate(t) => Some(*t),
            _ => None,
        })
    }

    pub fn rotation_y(&self) -> Option<f32> {
        self.steps.iter().find_map(|step| match step {
            TransformStep::RotateY(deg) => Some(*deg),
            _ => None,
        })
    }

    pub fn scale(&self) -> Option<f32> {
        self.steps.iter().find_map(|step| match step {
            TransformStep::Scale(s) => Some(*s),
            _ => None,
        })
    }
}

impl fmt::Display for TransformChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseTransformError {
    #[error("malformed transform near `{0}`")]
    Malformed(String),
    #[error("unknown transform function `{0}`")]
    UnknownFunction(String),
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("`{function}` takes {expected} argument(s), found {found}")]
    WrongArity {
        function: String,
        expected: usize,
        found: usize,
    },
}

fn parse_number(raw: &str, unit: &str) -> Result<f32, ParseTransformError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix(unit).unwrap_or(trimmed);
    digits
        .trim()
        .parse::<f32>()
        .map_err(|_| ParseTransformError::InvalidNumber(trimmed.to_string()))
}

fn parse_step(name: &str, args: &str) -> Result<TransformStep, ParseTransformError> {
    let values: Vec<&str> = args.split(',').collect();
    let expect = |expected: usize| {
        if values.len() == expected {
            Ok(())
        } else {
            Err(ParseTransformError::WrongArity {
                function: name.to_string(),
                expected,
                found: values.len(),
            })
        }
    };

    match name {
        "translate3d" => {
            expect(3)?;
            Ok(TransformStep::Translate(Vec3::new(
                parse_number(values[0], "px")?,
                parse_number(values[1], "px")?,
                parse_number(values[2], "px")?,
            )))
        }
        "rotateX" => {
            expect(1)?;
            Ok(TransformStep::RotateX(parse_number(args, "deg")?))
        }
        "rotateY" => {
            expect(1)?;
            Ok(TransformStep::RotateY(parse_number(args, "deg")?))
        }
        "rotateZ" => {
            expect(1)?;
            Ok(TransformStep::RotateZ(parse_number(args, "deg")?))
        }
        "scale" => {
            expect(1)?;
            Ok(TransformStep::Scale(parse_number(args, "")?))
        }
        other => Err(ParseTransformError::UnknownFunction(other.to_string())),
    }
}

impl FromStr for TransformChain {
    type Err = ParseTransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chain = TransformChain::new();
        let mut rest = s.trim();

        while !rest.is_empty() {
            let open = rest
                .find('(')
                .ok_or_else(|| ParseTransformError::Malformed(rest.to_string()))?;
            let close = rest[open..]
                .find(')')
                .map(|i| open + i)
                .ok_or_else(|| ParseTransformError::Malformed(rest.to_string()))?;

            let name = rest[..open].trim();
            chain = chain.then(parse_step(name, &rest[open + 1..close])?);
            rest = rest[close + 1..].trim_start();
        }

        Ok(chain)
    }
}

/// Pose transform: translate, rotate X, Y, Z, then uniform scale
pub fn compose_pose(position: Vector3, rotation: Vector3, scale: f32) -> TransformChain {
    TransformChain::new()
        .then(TransformStep::Translate(position.into()))
        .then(TransformStep::RotateX(rotation.x))
        .then(TransformStep::RotateY(rotation.y))
        .then(TransformStep::RotateZ(rotation.z))
        .then(TransformStep::Scale(scale))
}

pub fn compose_object_transform(plane: &ObjectPlane) -> TransformChain {
    compose_pose(plane.position, plane.rotation(), plane.scale())
}

/// Camera transform: translate by the negated pan, then scale by zoom
pub fn compose_camera_transform(camera: &CameraPose) -> TransformChain {
    // Subtracting from zero keeps an unpanned camera at +0 rather than -0
    let offset = Vec3::ZERO - Vec3::new(camera.pan_x, camera.pan_y, 0.0);
    TransformChain::new()
        .then(TransformStep::Translate(offset))
        .then(TransformStep::Scale(camera.zoom()))
}

//! Line-based gesture scripts for replaying interactions without a window
//!
//! ```text
//! # rotate the first plane by 30 degrees
//! down 100 100 shift @plane:0
//! move 130 100
//! up 130 100
//! wheel 0 0 -100
//! nav
//! hover 10 10
//! tap 10 10 200
//! ```
//!
//! Targets default to whatever is under the point; `@canvas` and
//! `@plane:N` (stacking index) override the hit test.

use glam::Vec2;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::editor::Editor;
use crate::traits::{Modifiers, PointerButton, PointerDown, PointerEvent, PointerSink, Response, SceneStore, Target};
use crate::types::PlaneId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ScriptError {
    pub line: usize,
    pub message: String,
}

/// Who a scripted event is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetSpec {
    /// Whatever the renderer finds under the point
    #[default]
    HitTest,
    Canvas,
    /// Plane by stacking index
    Plane(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Down {
        position: Vec2,
        button: PointerButton,
        modifiers: Modifiers,
        target: TargetSpec,
    },
    Move(Vec2),
    Up(Vec2),
    Wheel {
        position: Vec2,
        delta_y: f32,
        target: TargetSpec,
    },
    ToggleNavigation,
    Hover(Vec2),
    /// Tap after `after` of virtual time
    Tap { position: Vec2, after: Duration },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GestureScript {
    steps: Vec<ScriptStep>,
}

/// What replaying a script did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptSummary {
    pub steps: usize,
    pub commits: usize,
    pub redraws: usize,
}

impl GestureScript {
    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }

    /// Feed every step to `editor`; taps use a virtual clock
    pub fn run<S: SceneStore>(&self, editor: &mut Editor<S>) -> ScriptSummary {
        let mut summary = ScriptSummary::default();
        let mut clock = Instant::now();
        let mut hovered: Option<Target> = None;

        for step in &self.steps {
            let response = match step {
                ScriptStep::Down {
                    position,
                    button,
                    modifiers,
                    target,
                } => editor.handle_pointer(PointerEvent::Down(PointerDown {
                    target: resolve(editor, *target, *position),
                    button: *button,
                    modifiers: *modifiers,
                    position: *position,
                })),
                ScriptStep::Move(position) => editor.handle_pointer(PointerEvent::Move { position: *position }),
                ScriptStep::Up(position) => editor.handle_pointer(PointerEvent::Up { position: *position }),
                ScriptStep::Wheel {
                    position,
                    delta_y,
                    target,
                } => editor.handle_pointer(PointerEvent::Wheel {
                    target: resolve(editor, *target, *position),
                    delta_y: *delta_y,
                }),
                ScriptStep::ToggleNavigation => {
                    hovered = None;
                    editor.toggle_navigation_mode()
                }
                ScriptStep::Hover(position) => {
                    let target = editor.hit_test(*position);
                    let mut response = Response::default();
                    if hovered.as_ref() != Some(&target) {
                        if let Some(previous) = hovered.take() {
                            response = response.merge(editor.handle_pointer(PointerEvent::Leave { target: previous }));
                        }
                        response = response.merge(editor.handle_pointer(PointerEvent::Enter {
                            target: target.clone(),
                            position: *position,
                        }));
                        hovered = Some(target);
                    }
                    response.merge(editor.handle_pointer(PointerEvent::Move { position: *position }))
                }
                ScriptStep::Tap { position, after } => {
                    clock += *after;
                    editor.handle_pointer(PointerEvent::Click {
                        target: editor.hit_test(*position),
                        position: *position,
                        at: clock,
                    })
                }
            };

            summary.steps += 1;
            summary.commits += usize::from(response.committed);
            summary.redraws += usize::from(response.redraw);
        }

        log::debug!("script replayed: {summary:?}");
        summary
    }
}

fn resolve<S: SceneStore>(editor: &Editor<S>, which: TargetSpec, position: Vec2) -> Target {
    match which {
        TargetSpec::HitTest => editor.hit_test(position),
        TargetSpec::Canvas => Target::Canvas,
        TargetSpec::Plane(index) => Target::Plane(
            editor
                .scene()
                .objects()
                .get(index)
                .map(|plane| plane.id().clone())
                // Out-of-range index: an id the editor cannot resolve
                .unwrap_or_else(|| PlaneId::from(format!("missing-plane-{index}"))),
        ),
    }
}

struct Line<'a> {
    number: usize,
    tokens: Vec<&'a str>,
}

impl<'a> Line<'a> {
    fn error(&self, message: impl Into<String>) -> ScriptError {
        ScriptError {
            line: self.number,
            message: message.into(),
        }
    }

    fn number_at(&self, index: usize, what: &str) -> Result<f32, ScriptError> {
        let raw = self
            .tokens
            .get(index)
            .ok_or_else(|| self.error(format!("missing {what}")))?;
        raw.parse::<f32>()
            .map_err(|_| self.error(format!("invalid {what} `{raw}`")))
    }

    fn point(&self) -> Result<Vec2, ScriptError> {
        Ok(Vec2::new(self.number_at(1, "x")?, self.number_at(2, "y")?))
    }

    fn target(&self, token: &str) -> Result<Option<TargetSpec>, ScriptError> {
        if token == "@canvas" {
            return Ok(Some(TargetSpec::Canvas));
        }
        match token.strip_prefix("@plane:") {
            Some(index) => index
                .parse()
                .map(|index| Some(TargetSpec::Plane(index)))
                .map_err(|_| self.error(format!("invalid plane index `{index}`"))),
            None => Ok(None),
        }
    }

    fn no_extra(&self, from: usize) -> Result<(), ScriptError> {
        match self.tokens.get(from) {
            Some(extra) => Err(self.error(format!("unexpected `{extra}`"))),
            None => Ok(()),
        }
    }

    fn parse(&self) -> Result<ScriptStep, ScriptError> {
        match self.tokens[0] {
            "down" => {
                let position = self.point()?;
                let mut modifiers = Modifiers::NONE;
                let mut button = PointerButton::Primary;
                let mut target = TargetSpec::HitTest;
                for token in &self.tokens[3..] {
                    match *token {
                        "shift" => modifiers.shift = true,
                        "alt" => modifiers.alt = true,
                        "secondary" => button = PointerButton::Secondary,
                        "middle" => button = PointerButton::Middle,
                        other => match self.target(other)? {
                            Some(which) => target = which,
                            None => return Err(self.error(format!("unknown flag `{other}`"))),
                        },
                    }
                }
                Ok(ScriptStep::Down {
                    position,
                    button,
                    modifiers,
                    target,
                })
            }
            "move" => {
                self.no_extra(3)?;
                Ok(ScriptStep::Move(self.point()?))
            }
            "up" => {
                self.no_extra(3)?;
                Ok(ScriptStep::Up(self.point()?))
            }
            "wheel" => {
                let position = self.point()?;
                let delta_y = self.number_at(3, "wheel delta")?;
                let target = match self.tokens.get(4) {
                    Some(token) => self
                        .target(token)?
                        .ok_or_else(|| self.error(format!("unknown target `{token}`")))?,
                    None => TargetSpec::HitTest,
                };
                self.no_extra(5)?;
                Ok(ScriptStep::Wheel {
                    position,
                    delta_y,
                    target,
                })
            }
            "nav" => {
                self.no_extra(1)?;
                Ok(ScriptStep::ToggleNavigation)
            }
            "hover" => {
                self.no_extra(3)?;
                Ok(ScriptStep::Hover(self.point()?))
            }
            "tap" => {
                let position = self.point()?;
                let after = match self.tokens.get(3) {
                    Some(raw) => raw
                        .parse::<u64>()
                        .map(Duration::from_millis)
                        .map_err(|_| self.error(format!("invalid delay `{raw}`")))?,
                    None => Duration::ZERO,
                };
                self.no_extra(4)?;
                Ok(ScriptStep::Tap { position, after })
            }
            other => Err(self.error(format!("unknown command `{other}`"))),
        }
    }
}

impl FromStr for GestureScript {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut steps = Vec::new();
        for (index, raw) in s.lines().enumerate() {
            let content = raw.split('#').next().unwrap_or_default().trim();
            if content.is_empty() {
                continue;
            }
            let line = Line {
                number: index + 1,
                tokens: content.split_whitespace().collect(),
            };
            steps.push(line.parse()?);
        }
        Ok(Self { steps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command() {
        let script: GestureScript = "
            # comment line
            down 1 2 shift alt secondary @plane:3
            move 4 5   # trailing comment
            up 4 5
            wheel 0 0 -100 @canvas
            nav
            hover 7 8
            tap 7 8 250
        "
        .parse()
        .unwrap();

        assert_eq!(script.steps().len(), 7);
        assert_eq!(
            script.steps()[0],
            ScriptStep::Down {
                position: Vec2::new(1.0, 2.0),
                button: PointerButton::Secondary,
                modifiers: Modifiers::new(true, true),
                target: TargetSpec::Plane(3),
            }
        );
        assert_eq!(
            script.steps()[3],
            ScriptStep::Wheel {
                position: Vec2::ZERO,
                delta_y: -100.0,
                target: TargetSpec::Canvas
            }
        );
        assert_eq!(
            script.steps()[6],
            ScriptStep::Tap {
                position: Vec2::new(7.0, 8.0),
                after: Duration::from_millis(250)
            }
        );
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = "move 1 2\njump 3 4".parse::<GestureScript>().unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("jump"));

        let err = "down 1".parse::<GestureScript>().unwrap_err();
        assert_eq!(err, ScriptError { line: 1, message: "missing y".into() });

        assert!("down 1 2 ctrl".parse::<GestureScript>().is_err());
        assert!("down 1 2 @plane:x".parse::<GestureScript>().is_err());
        assert!("move 1 2 3".parse::<GestureScript>().is_err());
        assert!("tap 1 2 -5".parse::<GestureScript>().is_err());
    }
}

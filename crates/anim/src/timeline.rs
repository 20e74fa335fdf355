use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tableau_common::{NodeId, Transform};
use tableau_scene::SceneGraph;
use tracing::trace;

use crate::ease::Ease;

/// A single scalar transform channel a step can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    PositionX,
    PositionY,
    PositionZ,
    RotationX,
    RotationY,
    RotationZ,
    ScaleX,
    ScaleY,
    ScaleZ,
}

impl Property {
    pub fn get(self, t: &Transform) -> f32 {
        match self {
            Property::PositionX => t.position.x,
            Property::PositionY => t.position.y,
            Property::PositionZ => t.position.z,
            Property::RotationX => t.rotation.x,
            Property::RotationY => t.rotation.y,
            Property::RotationZ => t.rotation.z,
            Property::ScaleX => t.scale.x,
            Property::ScaleY => t.scale.y,
            Property::ScaleZ => t.scale.z,
        }
    }

    pub fn set(self, t: &mut Transform, value: f32) {
        let slot = match self {
            Property::PositionX => &mut t.position.x,
            Property::PositionY => &mut t.position.y,
            Property::PositionZ => &mut t.position.z,
            Property::RotationX => &mut t.rotation.x,
            Property::RotationY => &mut t.rotation.y,
            Property::RotationZ => &mut t.rotation.z,
            Property::ScaleX => &mut t.scale.x,
            Property::ScaleY => &mut t.scale.y,
            Property::ScaleZ => &mut t.scale.z,
        };
        *slot = value;
    }
}

/// One queued interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub target: NodeId,
    pub property: Property,
    pub to: f32,
    /// Captured from the scene when the step first runs.
    pub from: Option<f32>,
    /// Timeline time (seconds) at which the step begins.
    pub start: f32,
    pub duration: f32,
    pub ease: Ease,
}

impl Step {
    pub fn end(&self) -> f32 {
        self.start + self.duration
    }

    fn progress(&self, playhead: f32) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            ((playhead - self.start) / self.duration).clamp(0.0, 1.0)
        }
    }
}

/// Sequential tween queue with a start delay.
///
/// Steps run back to back. A step appended while the timeline is idle
/// starts at the current playhead instead of in the past.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    playhead: f32,
    end: f32,
    steps: VecDeque<Step>,
    enqueued_total: u64,
}

impl Timeline {
    /// Empty timeline whose first step cannot start before `delay` seconds.
    pub fn new(delay: f32) -> Self {
        Self {
            end: delay.max(0.0),
            ..Self::default()
        }
    }

    /// Append a step animating `property` of `target` to `value`.
    pub fn to(&mut self, target: NodeId, property: Property, value: f32, duration: f32, ease: Ease) -> &mut Self {
        let start = self.end.max(self.playhead);
        let step = Step {
            target,
            property,
            to: value,
            from: None,
            start,
            duration: duration.max(0.0),
            ease,
        };
        self.end = step.end();
        self.enqueued_total += 1;
        trace!(target = %target.short(), ?property, value, start, "step enqueued");
        self.steps.push_back(step);
        self
    }

    /// Move the playhead forward by `dt` seconds and write interpolated
    /// values into the scene. Returns the number of steps that finished.
    /// Steps whose target no longer exists are dropped.
    pub fn advance(&mut self, dt: f32, scene: &mut SceneGraph) -> usize {
        self.playhead += dt.max(0.0);
        let mut finished = 0;

        while let Some(step) = self.steps.front_mut() {
            if self.playhead < step.start {
                break;
            }
            let Some(node) = scene.get(step.target) else {
                self.steps.pop_front();
                continue;
            };
            let mut transform = node.transform;
            let property = step.property;
            let from = *step.from.get_or_insert_with(|| property.get(&transform));
            let p = step.progress(self.playhead);
            property.set(&mut transform, from + (step.to - from) * step.ease.apply(p));
            scene.set_transform(step.target, transform);

            if p < 1.0 {
                break;
            }
            self.steps.pop_front();
            finished += 1;
        }
        finished
    }

    /// Seconds since the timeline was created.
    pub fn playhead(&self) -> f32 {
        self.playhead
    }

    /// Time at which the last queued step ends.
    pub fn end(&self) -> f32 {
        self.end
    }

    /// Steps queued or running.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Nothing queued and nothing running.
    pub fn is_idle(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    /// Steps ever appended, including retired ones.
    pub fn enqueued_total(&self) -> u64 {
        self.enqueued_total
    }

    pub fn clear(&mut self) {
        self.steps.clear();
        self.end = self.end.min(self.playhead);
    }
}

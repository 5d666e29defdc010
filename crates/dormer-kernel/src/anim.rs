//! Keyframe animation clips and the per-instance mixer that plays them.
//!
//! Clips animate node translation, rotation and scale. Sampling is linear
//! for vectors and spherical for rotations, clamped to the first and last
//! keyframes. Playback loops on the clip duration.

use glam::{Mat4, Quat, Vec3};
use std::collections::HashMap;

use crate::assets::ModelData;

/// Keyframes for a vector property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackVec3 {
    /// Keyframe times in seconds, ascending
    pub times: Vec<f32>,
    /// Value at each keyframe
    pub values: Vec<Vec3>,
}

/// Keyframes for a rotation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackQuat {
    /// Keyframe times in seconds, ascending
    pub times: Vec<f32>,
    /// Value at each keyframe
    pub values: Vec<Quat>,
}

/// A named animation clip over the nodes of one model.
#[derive(Debug, Clone, Default)]
pub struct AnimationClip {
    /// Clip name
    pub name: String,
    /// Time of the last keyframe across all tracks
    pub duration: f32,
    /// Translation tracks by node index
    pub translations: HashMap<usize, TrackVec3>,
    /// Rotation tracks by node index
    pub rotations: HashMap<usize, TrackQuat>,
    /// Scale tracks by node index
    pub scales: HashMap<usize, TrackVec3>,
}

impl AnimationClip {
    /// Wraps a playback time into the clip.
    #[must_use]
    pub fn wrap_time(&self, t: f32) -> f32 {
        if self.duration > 0.0 {
            t.rem_euclid(self.duration)
        } else {
            0.0
        }
    }

    /// Returns true if no track animates anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.translations.is_empty() && self.rotations.is_empty() && self.scales.is_empty()
    }
}

/// Finds the keyframe segment containing `t` and the blend factor within it.
///
/// Returns `None` when `t` lies outside the keyframes; the caller clamps.
fn segment(times: &[f32], t: f32) -> Option<(usize, f32)> {
    let first = *times.first()?;
    let last = *times.last()?;
    if t <= first || t >= last || times.len() < 2 {
        return None;
    }
    // First index whose time exceeds t; always in 1..len here.
    let upper = times.partition_point(|&k| k <= t);
    let i = upper - 1;
    let span = times[upper] - times[i];
    let f = if span > 0.0 { (t - times[i]) / span } else { 0.0 };
    Some((i, f))
}

/// Samples a vector track at time `t`.
#[must_use]
pub fn sample_vec3(track: &TrackVec3, t: f32, default: Vec3) -> Vec3 {
    let (Some(&first), Some(&last)) = (track.values.first(), track.values.last()) else {
        return default;
    };
    match segment(&track.times, t) {
        Some((i, f)) => match (track.values.get(i), track.values.get(i + 1)) {
            (Some(a), Some(b)) => a.lerp(*b, f),
            _ => last,
        },
        None if t <= track.times.first().copied().unwrap_or(0.0) => first,
        None => last,
    }
}

/// Samples a rotation track at time `t`.
#[must_use]
pub fn sample_quat(track: &TrackQuat, t: f32, default: Quat) -> Quat {
    let (Some(&first), Some(&last)) = (track.values.first(), track.values.last()) else {
        return default;
    };
    match segment(&track.times, t) {
        Some((i, f)) => match (track.values.get(i), track.values.get(i + 1)) {
            (Some(a), Some(b)) => a.slerp(*b, f),
            _ => last,
        },
        None if t <= track.times.first().copied().unwrap_or(0.0) => first,
        None => last,
    }
}

/// Plays one clip at a time on a model instance.
#[derive(Debug, Clone, Default)]
pub struct AnimationMixer {
    /// Clip currently playing
    current: Option<String>,
    /// Playback time in seconds
    time: f32,
}

impl AnimationMixer {
    /// Creates an idle mixer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a clip from t = 0, replacing whatever was playing.
    pub fn play(&mut self, clip: impl Into<String>) {
        self.current = Some(clip.into());
        self.time = 0.0;
    }

    /// Stops playback. The model returns to its rest pose.
    pub fn stop(&mut self) {
        self.current = None;
        self.time = 0.0;
    }

    /// Advances playback.
    pub fn update(&mut self, dt: f32) {
        if self.current.is_some() {
            self.time += dt;
        }
    }

    /// Clip currently playing.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Playback time in seconds since the clip started.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Computes the global matrix of every node for the current frame.
    ///
    /// Nodes untouched by the clip keep their rest transform. Unknown clips
    /// produce the rest pose.
    #[must_use]
    pub fn pose(&self, model: &ModelData) -> Vec<Mat4> {
        let mut translations: Vec<Vec3> = model.nodes.iter().map(|n| n.translation).collect();
        let mut rotations: Vec<Quat> = model.nodes.iter().map(|n| n.rotation).collect();
        let mut scales: Vec<Vec3> = model.nodes.iter().map(|n| n.scale).collect();

        if let Some(clip) = self.current.as_deref().and_then(|name| model.clips.get(name)) {
            let t = clip.wrap_time(self.time);
            for (&node, track) in &clip.translations {
                if let Some(slot) = translations.get_mut(node) {
                    *slot = sample_vec3(track, t, *slot);
                }
            }
            for (&node, track) in &clip.rotations {
                if let Some(slot) = rotations.get_mut(node) {
                    *slot = sample_quat(track, t, *slot);
                }
            }
            for (&node, track) in &clip.scales {
                if let Some(slot) = scales.get_mut(node) {
                    *slot = sample_vec3(track, t, *slot);
                }
            }
        }

        let locals: Vec<Mat4> = (0..model.nodes.len())
            .map(|i| Mat4::from_scale_rotation_translation(scales[i], rotations[i], translations[i]))
            .collect();

        let mut globals: Vec<Option<Mat4>> = vec![None; locals.len()];
        for node in 0..locals.len() {
            resolve_global(node, model, &locals, &mut globals);
        }
        globals
            .into_iter()
            .map(|m| m.unwrap_or(Mat4::IDENTITY))
            .collect()
    }
}

fn resolve_global(
    node: usize,
    model: &ModelData,
    locals: &[Mat4],
    globals: &mut [Option<Mat4>],
) -> Mat4 {
    if let Some(m) = globals[node] {
        return m;
    }
    let local = locals[node];
    let m = match model.nodes[node].parent {
        Some(parent) if parent < locals.len() && parent != node => {
            resolve_global(parent, model, locals, globals) * local
        }
        _ => local,
    };
    globals[node] = Some(m);
    m
}

use glam::Vec2;
use mekanix_common::geometry::{OrientedRect, normalize_angle};
use mekanix_common::{EntityId, EntityKind, Pose};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::entity::{
    DEFAULT_MUSCLE_LENGTH, DEFAULT_PLATFORM_SIZE, Goal, Joint, JointKind,
    MIN_EXTENT, MIN_GOAL_RADIUS, Material, Part, PartDesc, PartEnd, PartKind, Platform, Player,
};

/// Names of editable fields, for error reporting and change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyName {
    X,
    Y,
    Position,
    Width,
    Height,
    Angle,
    Material,
    Radius,
    Actuated,
}

impl std::fmt::Display for PropertyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Position => "position",
            Self::Width => "width",
            Self::Height => "height",
            Self::Angle => "angle",
            Self::Material => "material",
            Self::Radius => "radius",
            Self::Actuated => "actuated",
        };
        f.write_str(name)
    }
}

/// A single field edit: the field and its new value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyEdit {
    X(f32),
    Y(f32),
    Position(Vec2),
    Width(f32),
    Height(f32),
    Angle(f32),
    Material(Material),
    Radius(f32),
    /// Turn a joint into a contraction joint (`true`) or a pivot (`false`).
    Actuated(bool),
}

impl PropertyEdit {
    pub fn name(&self) -> PropertyName {
        match self {
            Self::X(_) => PropertyName::X,
            Self::Y(_) => PropertyName::Y,
            Self::Position(_) => PropertyName::Position,
            Self::Width(_) => PropertyName::Width,
            Self::Height(_) => PropertyName::Height,
            Self::Angle(_) => PropertyName::Angle,
            Self::Material(_) => PropertyName::Material,
            Self::Radius(_) => PropertyName::Radius,
            Self::Actuated(_) => PropertyName::Actuated,
        }
    }

    /// The first non-finite component of the value, if any.
    fn non_finite(&self) -> Option<f32> {
        let values: &[f32] = match self {
            Self::X(v) | Self::Y(v) | Self::Width(v) | Self::Height(v) | Self::Angle(v)
            | Self::Radius(v) => std::slice::from_ref(v),
            Self::Position(p) => return [p.x, p.y].into_iter().find(|v| !v.is_finite()),
            Self::Material(_) | Self::Actuated(_) => &[],
        };
        values.iter().copied().find(|v| !v.is_finite())
    }
}

/// Why a joint breaks the level graph.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GraphViolation {
    #[error("endpoint {0} does not resolve")]
    Dangling(EntityId),
    #[error("endpoint {0} has the wrong kind")]
    WrongKind(EntityId),
    #[error("it connects a part to itself")]
    SelfConnected,
}

/// Why a level's entity tables disagree with each other.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Inconsistency {
    #[error("entity stored under {key} carries id {id}")]
    KeyMismatch { key: EntityId, id: EntityId },
    #[error("id {0} belongs to more than one entity")]
    DuplicateId(EntityId),
    #[error("id {id} was never issued (next id is {next_id})")]
    UnissuedId { id: EntityId, next_id: EntityId },
    #[error("player primary {0} is not a part")]
    MissingPrimary(EntityId),
    #[error("{id} has {property} {value}, below the minimum")]
    Undersized {
        id: EntityId,
        property: PropertyName,
        value: f32,
    },
}

/// Errors from level operations. None of them leave a partial mutation behind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LevelError {
    #[error("anchor {0} is not a part or platform")]
    InvalidAnchor(EntityId),
    #[error("entity {0} not found")]
    UnknownEntity(EntityId),
    #[error("part {0} is the last part of the player")]
    CannotDeletePlayerRoot(EntityId),
    #[error("goal {0} cannot be deleted")]
    CannotDeleteGoal(EntityId),
    #[error("{kind} {id} has no property {property}")]
    InvalidProperty {
        id: EntityId,
        kind: EntityKind,
        property: PropertyName,
    },
    #[error("{property} must be finite, got {value}")]
    InvalidValue { property: PropertyName, value: f32 },
    #[error("joint {joint} is invalid: {violation}")]
    InvalidLevelGraph {
        joint: EntityId,
        violation: GraphViolation,
    },
    #[error("level is inconsistent: {0}")]
    Inconsistent(#[from] Inconsistency),
}

/// Mutation record emitted by every successful level operation.
#[derive(Debug, Clone, PartialEq)]
pub enum LevelEvent {
    PartAdded(EntityId),
    PartRemoved(EntityId),
    JointAdded(EntityId),
    JointRemoved(EntityId),
    PlatformAdded(EntityId),
    PlatformRemoved(EntityId),
    PropertyChanged { id: EntityId, property: PropertyName },
    Moved { id: EntityId, delta: Vec2 },
}

/// The aggregate root: parts, joints, platforms, the goal, and the player.
///
/// Entity maps are keyed by id (BTreeMap), so iteration is in creation order.
/// The dirty flag and event log are transient and never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    name: String,
    next_id: u64,
    parts: BTreeMap<EntityId, Part>,
    joints: BTreeMap<EntityId, Joint>,
    platforms: BTreeMap<EntityId, Platform>,
    goal: Goal,
    player: Player,
    #[serde(skip)]
    dirty: bool,
    #[serde(skip)]
    events: Vec<LevelEvent>,
}

impl PartialEq for Level {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.next_id == other.next_id
            && self.parts == other.parts
            && self.joints == other.joints
            && self.platforms == other.platforms
            && self.goal == other.goal
            && self.player == other.player
    }
}

impl Level {
    /// Create a level with its goal and a one-part player.
    pub fn new(name: impl Into<String>, goal_center: Vec2, goal_radius: f32, root: PartDesc) -> Self {
        let goal = Goal {
            id: EntityId(1),
            center: goal_center,
            radius: goal_radius.max(MIN_GOAL_RADIUS),
        };
        let root = root.build(EntityId(2));
        let name = name.into();
        let player = Player {
            name: format!("{name} robot"),
            primary: root.id,
        };
        let mut parts = BTreeMap::new();
        parts.insert(root.id, root);
        Self {
            name,
            next_id: 3,
            parts,
            joints: BTreeMap::new(),
            platforms: BTreeMap::new(),
            goal,
            player,
            dirty: true,
            events: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parts(&self) -> &BTreeMap<EntityId, Part> {
        &self.parts
    }

    pub fn joints(&self) -> &BTreeMap<EntityId, Joint> {
        &self.joints
    }

    pub fn platforms(&self) -> &BTreeMap<EntityId, Platform> {
        &self.platforms
    }

    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn part(&self, id: EntityId) -> Option<&Part> {
        self.parts.get(&id)
    }

    pub fn joint(&self, id: EntityId) -> Option<&Joint> {
        self.joints.get(&id)
    }

    pub fn platform(&self, id: EntityId) -> Option<&Platform> {
        self.platforms.get(&id)
    }

    /// The id the next created entity will receive.
    pub fn next_id(&self) -> EntityId {
        EntityId(self.next_id)
    }

    pub fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
        if self.parts.contains_key(&id) {
            Some(EntityKind::Part)
        } else if self.joints.contains_key(&id) {
            Some(EntityKind::Joint)
        } else if self.platforms.contains_key(&id) {
            Some(EntityKind::Platform)
        } else if self.goal.id == id {
            Some(EntityKind::Goal)
        } else {
            None
        }
    }

    /// Every entity id in ascending (creation) order.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .parts
            .keys()
            .chain(self.joints.keys())
            .chain(self.platforms.keys())
            .copied()
            .chain(std::iter::once(self.goal.id))
            .collect();
        ids.sort();
        ids
    }

    /// Rectangle of a part or platform.
    pub fn shape_of(&self, id: EntityId) -> Option<OrientedRect> {
        self.parts
            .get(&id)
            .map(Part::rect)
            .or_else(|| self.platforms.get(&id).map(Platform::rect))
    }

    /// World positions of a joint's two anchors.
    pub fn joint_anchors(&self, joint: &Joint) -> Option<(Vec2, Vec2)> {
        let a = self.shape_of(joint.a)?.to_world(joint.local_a);
        let b = self.shape_of(joint.b)?.to_world(joint.local_b);
        Some((a, b))
    }

    /// Where a joint is marked: a pivot at its `a`-side hole, a muscle halfway
    /// between its anchors.
    pub fn joint_position(&self, id: EntityId) -> Option<Vec2> {
        let joint = self.joints.get(&id)?;
        let (a, b) = self.joint_anchors(joint)?;
        Some(if joint.kind.is_contraction() { a.lerp(b, 0.5) } else { a })
    }

    pub fn contraction_joints(&self) -> impl Iterator<Item = &Joint> {
        self.joints.values().filter(|j| j.kind.is_contraction())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read and clear the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn events(&self) -> &[LevelEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<LevelEvent> {
        std::mem::take(&mut self.events)
    }

    fn record(&mut self, event: LevelEvent) {
        tracing::debug!(?event, level_name = %self.name, "level mutated");
        self.dirty = true;
        self.events.push(event);
    }

    fn alloc_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a default-size part pinned to an existing part or platform.
    ///
    /// The anchor defaults to the parent's tail pivot (part) or top-center
    /// (platform); `at` overrides it with a world point. The new part takes
    /// the parent's angle and hangs from the anchor by its head pivot.
    pub fn add_part(
        &mut self,
        kind: PartKind,
        anchor_entity: EntityId,
        at: Option<Vec2>,
    ) -> Result<EntityId, LevelError> {
        let (default_anchor, angle) = if let Some(parent) = self.parts.get(&anchor_entity) {
            (parent.rect().to_world(parent.local_end(PartEnd::Tail)), parent.angle)
        } else if let Some(platform) = self.platforms.get(&anchor_entity) {
            let top = Vec2::new(0.0, -platform.height * 0.5);
            (platform.rect().to_world(top), 0.0)
        } else {
            return Err(LevelError::InvalidAnchor(anchor_entity));
        };
        let anchor = at.unwrap_or(default_anchor);
        if !anchor.is_finite() {
            return Err(LevelError::InvalidValue {
                property: PropertyName::Position,
                value: if anchor.x.is_finite() { anchor.y } else { anchor.x },
            });
        }
        Ok(self.attach(kind, anchor_entity, anchor, angle, PartEnd::Head))
    }

    /// Add a part continuing from `parent`'s head or tail pivot.
    pub fn add_part_at_end(
        &mut self,
        parent: EntityId,
        end: PartEnd,
        kind: PartKind,
    ) -> Result<EntityId, LevelError> {
        let p = self
            .parts
            .get(&parent)
            .ok_or(LevelError::InvalidAnchor(parent))?;
        let anchor = p.rect().to_world(p.local_end(end));
        let angle = p.angle;
        Ok(self.attach(kind, parent, anchor, angle, end.opposite()))
    }

    /// Insert an unattached part, for building fixed layouts before wiring
    /// them with [`Level::connect`].
    pub fn add_free_part(&mut self, desc: PartDesc) -> EntityId {
        let id = self.alloc_id();
        self.parts.insert(id, desc.build(id));
        self.record(LevelEvent::PartAdded(id));
        id
    }

    /// Create a part whose `child_end` pivot sits on `anchor`, plus its joints.
    /// `parent` must already be validated as a part or platform.
    fn attach(
        &mut self,
        kind: PartKind,
        parent: EntityId,
        anchor: Vec2,
        angle: f32,
        child_end: PartEnd,
    ) -> EntityId {
        let id = self.alloc_id();
        let mut child = PartDesc::default().with_angle(angle).build(id);
        let local_child = child.local_end(child_end);
        child.center = anchor - Vec2::from_angle(child.angle).rotate(local_child);
        let child_center = child.center;
        self.parts.insert(id, child);
        self.record(LevelEvent::PartAdded(id));

        let pivot_parent = self
            .shape_of(parent)
            .map(|r| r.to_local(anchor))
            .unwrap_or(Vec2::ZERO);
        self.insert_joint(id, parent, local_child, pivot_parent, JointKind::Pivot);

        if kind == PartKind::Limb {
            if let Some(parent_part) = self.parts.get(&parent) {
                let span = parent_part
                    .center
                    .distance(child_center)
                    .max(DEFAULT_MUSCLE_LENGTH);
                self.insert_joint(id, parent, Vec2::ZERO, Vec2::ZERO, JointKind::contraction(span));
            }
        }
        tracing::debug!(%id, %parent, ?kind, "attached part");
        id
    }

    pub(crate) fn insert_joint(
        &mut self,
        a: EntityId,
        b: EntityId,
        local_a: Vec2,
        local_b: Vec2,
        kind: JointKind,
    ) -> EntityId {
        let id = self.alloc_id();
        self.joints.insert(
            id,
            Joint {
                id,
                a,
                b,
                local_a,
                local_b,
                kind,
            },
        );
        for end in [a, b] {
            if let Some(part) = self.parts.get_mut(&end) {
                part.joints.push(id);
            }
        }
        self.record(LevelEvent::JointAdded(id));
        id
    }

    /// Join part `a` to part-or-platform `b` at the given world anchors.
    pub fn connect(
        &mut self,
        a: EntityId,
        b: EntityId,
        kind: JointKind,
        anchor_a: Vec2,
        anchor_b: Vec2,
    ) -> Result<EntityId, LevelError> {
        let rect_a = match self.kind_of(a) {
            None => return Err(LevelError::UnknownEntity(a)),
            Some(EntityKind::Part) => self.parts[&a].rect(),
            Some(_) => return Err(LevelError::InvalidAnchor(a)),
        };
        if a == b {
            return Err(LevelError::InvalidAnchor(b));
        }
        let rect_b = match self.kind_of(b) {
            None => return Err(LevelError::UnknownEntity(b)),
            Some(EntityKind::Part | EntityKind::Platform) => self.shape_of(b),
            Some(_) => return Err(LevelError::InvalidAnchor(b)),
        }
        .ok_or(LevelError::UnknownEntity(b))?;
        Ok(self.insert_joint(a, b, rect_a.to_local(anchor_a), rect_b.to_local(anchor_b), kind))
    }

    /// Insert a default-size platform centered at `position`.
    pub fn add_platform(&mut self, position: Vec2) -> EntityId {
        self.add_platform_with(position, DEFAULT_PLATFORM_SIZE.x, DEFAULT_PLATFORM_SIZE.y, 0.0)
    }

    pub fn add_platform_with(&mut self, center: Vec2, width: f32, height: f32, angle: f32) -> EntityId {
        let id = self.alloc_id();
        self.platforms.insert(
            id,
            Platform {
                id,
                center,
                width: width.max(MIN_EXTENT),
                height: height.max(MIN_EXTENT),
                angle: normalize_angle(angle),
            },
        );
        self.record(LevelEvent::PlatformAdded(id));
        id
    }

    /// Validate and apply a single field edit. Sizes are clamped, angles
    /// normalized.
    pub fn update_property(&mut self, id: EntityId, edit: PropertyEdit) -> Result<(), LevelError> {
        let kind = self.kind_of(id).ok_or(LevelError::UnknownEntity(id))?;
        let property = edit.name();
        if let Some(value) = edit.non_finite() {
            return Err(LevelError::InvalidValue { property, value });
        }
        let unsupported = LevelError::InvalidProperty { id, kind, property };

        match kind {
            EntityKind::Part => {
                let part = self.parts.get_mut(&id).ok_or(LevelError::UnknownEntity(id))?;
                let mut scale = None;
                match edit {
                    PropertyEdit::X(x) => part.center.x = x,
                    PropertyEdit::Y(y) => part.center.y = y,
                    PropertyEdit::Position(p) => part.center = p,
                    PropertyEdit::Width(w) => {
                        let w = w.max(MIN_EXTENT);
                        scale = Some(Vec2::new(w / part.width, 1.0));
                        part.width = w;
                    }
                    PropertyEdit::Height(h) => {
                        let h = h.max(MIN_EXTENT);
                        scale = Some(Vec2::new(1.0, h / part.height));
                        part.height = h;
                    }
                    PropertyEdit::Angle(a) => part.angle = normalize_angle(a),
                    PropertyEdit::Material(m) => part.material = m,
                    PropertyEdit::Radius(_) | PropertyEdit::Actuated(_) => return Err(unsupported),
                }
                if let Some(scale) = scale {
                    self.scale_anchors(id, scale);
                }
            }
            EntityKind::Platform => {
                let platform = self
                    .platforms
                    .get_mut(&id)
                    .ok_or(LevelError::UnknownEntity(id))?;
                let mut scale = None;
                match edit {
                    PropertyEdit::X(x) => platform.center.x = x,
                    PropertyEdit::Y(y) => platform.center.y = y,
                    PropertyEdit::Position(p) => platform.center = p,
                    PropertyEdit::Width(w) => {
                        let w = w.max(MIN_EXTENT);
                        scale = Some(Vec2::new(w / platform.width, 1.0));
                        platform.width = w;
                    }
                    PropertyEdit::Height(h) => {
                        let h = h.max(MIN_EXTENT);
                        scale = Some(Vec2::new(1.0, h / platform.height));
                        platform.height = h;
                    }
                    PropertyEdit::Angle(a) => platform.angle = normalize_angle(a),
                    PropertyEdit::Material(_) | PropertyEdit::Radius(_) | PropertyEdit::Actuated(_) => {
                        return Err(unsupported);
                    }
                }
                if let Some(scale) = scale {
                    self.scale_anchors(id, scale);
                }
            }
            EntityKind::Goal => match edit {
                PropertyEdit::X(x) => self.goal.center.x = x,
                PropertyEdit::Y(y) => self.goal.center.y = y,
                PropertyEdit::Position(p) => self.goal.center = p,
                PropertyEdit::Radius(r) => self.goal.radius = r.max(MIN_GOAL_RADIUS),
                _ => return Err(unsupported),
            },
            EntityKind::Joint => match edit {
                PropertyEdit::Actuated(on) => self.set_actuated(id, on)?,
                _ => return Err(unsupported),
            },
        }
        self.record(LevelEvent::PropertyChanged { id, property });
        Ok(())
    }

    /// Keep joint anchors at the same relative spot when an endpoint resizes.
    fn scale_anchors(&mut self, id: EntityId, scale: Vec2) {
        for joint in self.joints.values_mut() {
            if joint.a == id {
                joint.local_a *= scale;
            }
            if joint.b == id {
                joint.local_b *= scale;
            }
        }
    }

    fn set_actuated(&mut self, id: EntityId, on: bool) -> Result<(), LevelError> {
        let joint = self.joints.get(&id).ok_or(LevelError::UnknownEntity(id))?;
        let kind = match (on, joint.kind.is_contraction()) {
            (true, false) => {
                let span = self
                    .joint_anchors(joint)
                    .map(|(a, b)| a.distance(b))
                    .unwrap_or(0.0)
                    .max(MIN_EXTENT);
                JointKind::contraction(span)
            }
            (false, true) => JointKind::Pivot,
            _ => return Ok(()),
        };
        if let Some(joint) = self.joints.get_mut(&id) {
            joint.kind = kind;
        }
        Ok(())
    }

    /// Move parts, platforms, or the goal by `delta`. All ids are checked
    /// before anything moves.
    pub fn translate(&mut self, ids: &[EntityId], delta: Vec2) -> Result<(), LevelError> {
        if !delta.is_finite() {
            return Err(LevelError::InvalidValue {
                property: PropertyName::Position,
                value: if delta.x.is_finite() { delta.y } else { delta.x },
            });
        }
        for &id in ids {
            match self.kind_of(id) {
                None => return Err(LevelError::UnknownEntity(id)),
                Some(EntityKind::Joint) => {
                    return Err(LevelError::InvalidProperty {
                        id,
                        kind: EntityKind::Joint,
                        property: PropertyName::Position,
                    });
                }
                Some(_) => {}
            }
        }
        for &id in ids {
            if let Some(part) = self.parts.get_mut(&id) {
                part.center += delta;
            } else if let Some(platform) = self.platforms.get_mut(&id) {
                platform.center += delta;
            } else if self.goal.id == id {
                self.goal.center += delta;
            }
            self.record(LevelEvent::Moved { id, delta });
        }
        Ok(())
    }

    /// Overwrite a part's pose without touching its size or joints.
    pub fn set_part_pose(&mut self, id: EntityId, pose: Pose) -> Result<(), LevelError> {
        if !pose.is_finite() {
            return Err(LevelError::InvalidValue {
                property: PropertyName::Position,
                value: f32::NAN,
            });
        }
        let part = self.parts.get_mut(&id).ok_or(LevelError::UnknownEntity(id))?;
        part.center = pose.position;
        part.angle = normalize_angle(pose.angle);
        self.record(LevelEvent::PropertyChanged {
            id,
            property: PropertyName::Position,
        });
        Ok(())
    }

    /// Reset every contraction joint to its relaxed length.
    pub fn relax_joints(&mut self) {
        for joint in self.joints.values_mut() {
            joint.kind = joint.kind.relaxed();
        }
        self.dirty = true;
    }

    /// The part's connected component through part-to-part joints, sorted.
    pub fn connected_parts(&self, id: EntityId) -> Vec<EntityId> {
        if !self.parts.contains_key(&id) {
            return Vec::new();
        }
        let mut seen = BTreeSet::from([id]);
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            let Some(part) = self.parts.get(&current) else {
                continue;
            };
            for joint_id in &part.joints {
                let Some(next) = self.joints.get(joint_id).and_then(|j| j.other(current)) else {
                    continue;
                };
                if self.parts.contains_key(&next) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen.into_iter().collect()
    }

    /// Remove a part and every joint touching it.
    pub fn delete_part(&mut self, id: EntityId) -> Result<(), LevelError> {
        if !self.parts.contains_key(&id) {
            return Err(LevelError::UnknownEntity(id));
        }
        if self.parts.len() == 1 {
            return Err(LevelError::CannotDeletePlayerRoot(id));
        }
        self.remove_joints_touching(id);
        self.parts.remove(&id);
        if self.player.primary == id {
            if let Some(&next) = self.parts.keys().next() {
                self.player.primary = next;
            }
        }
        self.record(LevelEvent::PartRemoved(id));
        Ok(())
    }

    /// Remove a joint only; its parts stay, possibly disconnected.
    pub fn delete_joint(&mut self, id: EntityId) -> Result<(), LevelError> {
        if self.unlink_joint(id) {
            Ok(())
        } else {
            Err(LevelError::UnknownEntity(id))
        }
    }

    /// Remove a joint and its back-references; false if it does not exist.
    fn unlink_joint(&mut self, id: EntityId) -> bool {
        let Some(joint) = self.joints.remove(&id) else {
            return false;
        };
        for end in joint.endpoints() {
            if let Some(part) = self.parts.get_mut(&end) {
                part.joints.retain(|j| *j != id);
            }
        }
        self.record(LevelEvent::JointRemoved(id));
        true
    }

    /// Remove a platform and the joints pinning parts to it.
    pub fn delete_platform(&mut self, id: EntityId) -> Result<(), LevelError> {
        if !self.platforms.contains_key(&id) {
            return Err(LevelError::UnknownEntity(id));
        }
        self.remove_joints_touching(id);
        self.platforms.remove(&id);
        self.record(LevelEvent::PlatformRemoved(id));
        Ok(())
    }

    /// Delete any entity by id with its kind's cascade rules.
    pub fn delete(&mut self, id: EntityId) -> Result<(), LevelError> {
        match self.kind_of(id) {
            Some(EntityKind::Part) => self.delete_part(id),
            Some(EntityKind::Joint) => self.delete_joint(id),
            Some(EntityKind::Platform) => self.delete_platform(id),
            Some(EntityKind::Goal) => Err(LevelError::CannotDeleteGoal(id)),
            None => Err(LevelError::UnknownEntity(id)),
        }
    }

    fn remove_joints_touching(&mut self, id: EntityId) {
        let doomed: Vec<EntityId> = self
            .joints
            .values()
            .filter(|j| j.touches(id))
            .map(|j| j.id)
            .collect();
        for joint_id in doomed {
            self.unlink_joint(joint_id);
        }
    }

    /// Check a level that did not come from this API, such as a loaded file.
    ///
    /// Every map key matches its entity's id, ids are unique and below the
    /// id counter, the player's primary is a part, and sizes are at least
    /// their minimum. Then every joint's endpoints must resolve: `a` to a
    /// part, `b` to a part or platform, and `a != b`.
    pub fn validate(&self) -> Result<(), LevelError> {
        self.check_tables()?;
        self.check_joints()
    }

    fn check_tables(&self) -> Result<(), Inconsistency> {
        let keyed = self
            .parts
            .iter()
            .map(|(k, p)| (*k, p.id))
            .chain(self.joints.iter().map(|(k, j)| (*k, j.id)))
            .chain(self.platforms.iter().map(|(k, p)| (*k, p.id)));
        for (key, id) in keyed {
            if key != id {
                return Err(Inconsistency::KeyMismatch { key, id });
            }
        }

        let ids = self.entity_ids();
        if let Some(pair) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(Inconsistency::DuplicateId(pair[0]));
        }
        if let Some(&id) = ids.last().filter(|id| id.0 >= self.next_id) {
            return Err(Inconsistency::UnissuedId {
                id,
                next_id: self.next_id(),
            });
        }

        if !self.parts.contains_key(&self.player.primary) {
            return Err(Inconsistency::MissingPrimary(self.player.primary));
        }

        let sizes = self
            .parts
            .values()
            .map(|p| (p.id, p.width, p.height))
            .chain(self.platforms.values().map(|p| (p.id, p.width, p.height)));
        for (id, width, height) in sizes {
            for (property, value) in [(PropertyName::Width, width), (PropertyName::Height, height)] {
                if value.is_nan() || value < MIN_EXTENT {
                    return Err(Inconsistency::Undersized { id, property, value });
                }
            }
        }
        if self.goal.radius.is_nan() || self.goal.radius < MIN_GOAL_RADIUS {
            return Err(Inconsistency::Undersized {
                id: self.goal.id,
                property: PropertyName::Radius,
                value: self.goal.radius,
            });
        }
        Ok(())
    }

    fn check_joints(&self) -> Result<(), LevelError> {
        for joint in self.joints.values() {
            let violation = if joint.a == joint.b {
                Some(GraphViolation::SelfConnected)
            } else {
                match (self.kind_of(joint.a), self.kind_of(joint.b)) {
                    (None, _) => Some(GraphViolation::Dangling(joint.a)),
                    (_, None) => Some(GraphViolation::Dangling(joint.b)),
                    (Some(EntityKind::Part), Some(EntityKind::Part | EntityKind::Platform)) => None,
                    (Some(EntityKind::Part), Some(_)) => Some(GraphViolation::WrongKind(joint.b)),
                    (Some(_), _) => Some(GraphViolation::WrongKind(joint.a)),
                }
            };
            if let Some(violation) = violation {
                return Err(LevelError::InvalidLevelGraph {
                    joint: joint.id,
                    violation,
                });
            }
        }
        Ok(())
    }
}

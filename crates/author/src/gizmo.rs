use glam::Vec2;
use mekanix_common::geometry::{
    HANDLE_TOLERANCE_PX, HandleId, OrientedRect, handle_position, nearest_handle_within,
    normalize_angle,
};
use mekanix_common::{Corner, EntityId, EntityKind};
use mekanix_input::{PointerEvent, PointerPhase, Tool};
use mekanix_kernel::entity::MIN_EXTENT;
use mekanix_kernel::{Level, LevelError, PartKind, PropertyEdit};
use serde::{Deserialize, Serialize};

/// Pick radius around a joint marker, in screen pixels.
pub const JOINT_HIT_RADIUS_PX: f32 = 12.0;

/// Pick tolerances for the editor, in screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub handle_tolerance_px: f32,
    pub joint_hit_radius_px: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            handle_tolerance_px: HANDLE_TOLERANCE_PX,
            joint_hit_radius_px: JOINT_HIT_RADIUS_PX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub id: EntityId,
    pub kind: EntityKind,
}

/// What the pointer is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Handle(HandleId),
    Entity(Selection),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragKind {
    /// Translate `ids` together. `applied` is the offset already written to
    /// the level, so every move is computed from the drag origin.
    Move { ids: Vec<EntityId>, applied: Vec2 },
    /// Resize about the opposite corner, which stays at `anchor`.
    Resize {
        id: EntityId,
        corner: Corner,
        anchor: Vec2,
        start_size: Vec2,
        angle: f32,
    },
    Rotate {
        id: EntityId,
        center: Vec2,
        start_angle: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Drag {
    pub origin: Vec2,
    pub kind: DragKind,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Hover(Target),
    Dragging(Drag),
}

/// What a pointer event did, for callers that mirror editor state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GizmoEvent {
    Selected(EntityId),
    SelectionCleared,
    Created(EntityId),
    Deleted(EntityId),
    Toggled(EntityId),
    DragStarted(EntityId),
    Dragged(EntityId),
    DragEnded,
    Hovered(Option<Target>),
}

/// Buttons a toolbar should offer for the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionActions {
    pub edit_properties: bool,
    pub add_connected_part: bool,
    pub delete: bool,
}

/// Turns pointer input into selections and level edits.
///
/// The phase (idle, hover, dragging) is independent of the selection: a
/// selection survives hovering, and clearing the selection ends nothing.
#[derive(Debug, Clone)]
pub struct GizmoController {
    tool: Tool,
    selection: Option<Selection>,
    phase: Phase,
    view_scale: f32,
    config: EditorConfig,
}

impl Default for GizmoController {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl GizmoController {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            tool: Tool::default(),
            selection: None,
            phase: Phase::Idle,
            view_scale: 1.0,
            config,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        if self.tool != tool {
            tracing::debug!(%tool, "tool selected");
        }
        self.tool = tool;
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging(_))
    }

    /// Screen pixels per world unit; pixel tolerances are divided by it.
    pub fn set_view_scale(&mut self, view_scale: f32) {
        if view_scale.is_finite() && view_scale > 0.0 {
            self.view_scale = view_scale;
        }
    }

    pub fn view_scale(&self) -> f32 {
        self.view_scale
    }

    /// Select an entity directly, as a toolbar or test would.
    pub fn select(&mut self, level: &Level, id: EntityId) -> Result<(), LevelError> {
        let kind = level.kind_of(id).ok_or(LevelError::UnknownEntity(id))?;
        self.selection = Some(Selection { id, kind });
        Ok(())
    }

    pub fn clear(&mut self) {
        self.selection = None;
        self.phase = Phase::Idle;
    }

    /// End any drag as though the pointer was released.
    pub fn cancel_drag(&mut self) -> bool {
        if self.is_dragging() {
            self.phase = Phase::Idle;
            tracing::debug!("drag cancelled");
            true
        } else {
            false
        }
    }

    /// Drop a selection whose entity no longer exists.
    pub fn prune(&mut self, level: &Level) {
        if let Some(sel) = self.selection {
            if level.kind_of(sel.id).is_none() {
                self.selection = None;
            }
        }
    }

    pub fn available_actions(&self, level: &Level) -> SelectionActions {
        let Some(sel) = self.selection.filter(|s| level.kind_of(s.id).is_some()) else {
            return SelectionActions::default();
        };
        match sel.kind {
            EntityKind::Part => SelectionActions {
                edit_properties: true,
                add_connected_part: true,
                delete: true,
            },
            EntityKind::Platform => SelectionActions {
                edit_properties: true,
                add_connected_part: false,
                delete: true,
            },
            EntityKind::Joint => SelectionActions {
                edit_properties: false,
                add_connected_part: false,
                delete: true,
            },
            EntityKind::Goal => SelectionActions {
                edit_properties: true,
                add_connected_part: false,
                delete: false,
            },
        }
    }

    /// Rectangle of the selection, if it has handles.
    fn selected_rect(&self, level: &Level) -> Option<(EntityId, OrientedRect)> {
        let sel = self.selection?;
        match sel.kind {
            EntityKind::Part | EntityKind::Platform => Some((sel.id, level.shape_of(sel.id)?)),
            EntityKind::Joint | EntityKind::Goal => None,
        }
    }

    /// World positions of the selection's handles.
    pub fn handles(&self, level: &Level) -> Vec<(HandleId, Vec2)> {
        self.selected_rect(level)
            .map(|(_, rect)| {
                HandleId::RECT_SET
                    .iter()
                    .map(|&h| (h, handle_position(&rect, h, self.view_scale)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn handle_at(&self, level: &Level, point: Vec2) -> Option<(EntityId, OrientedRect, HandleId)> {
        let (id, rect) = self.selected_rect(level)?;
        let handle = nearest_handle_within(
            point,
            &rect,
            &HandleId::RECT_SET,
            self.view_scale,
            self.config.handle_tolerance_px,
        )?;
        Some((id, rect, handle))
    }

    /// Topmost entity under `point`: newest first.
    pub fn hit_test(&self, level: &Level, point: Vec2) -> Option<Selection> {
        let joint_radius = self.config.joint_hit_radius_px / self.view_scale;
        level.entity_ids().into_iter().rev().find_map(|id| {
            let kind = level.kind_of(id)?;
            let hit = match kind {
                EntityKind::Joint => joint_hit(level, id, point, joint_radius),
                EntityKind::Goal => level.goal().contains(point),
                EntityKind::Part | EntityKind::Platform => {
                    level.shape_of(id).is_some_and(|r| r.contains(point))
                }
            };
            hit.then_some(Selection { id, kind })
        })
    }

    pub fn pointer(&mut self, level: &mut Level, event: PointerEvent) -> Result<Vec<GizmoEvent>, LevelError> {
        self.prune(level);
        match event.phase {
            PointerPhase::Down => self.pointer_down(level, event.position),
            PointerPhase::Move => self.pointer_move(level, event.position),
            PointerPhase::Up => Ok(self.pointer_up()),
        }
    }

    /// Only the placing tools grab the selection's handles.
    fn uses_handles(&self) -> bool {
        matches!(self.tool, Tool::Move | Tool::Platform | Tool::Player)
    }

    fn pointer_down(&mut self, level: &mut Level, point: Vec2) -> Result<Vec<GizmoEvent>, LevelError> {
        let handle = if self.uses_handles() {
            self.handle_at(level, point)
        } else {
            None
        };
        if let Some((id, rect, handle)) = handle {
            let kind = match handle {
                HandleId::Resize(corner) => DragKind::Resize {
                    id,
                    corner,
                    anchor: rect.corner(corner.opposite()),
                    start_size: rect.half_extents * 2.0,
                    angle: rect.angle,
                },
                HandleId::Rotate => DragKind::Rotate {
                    id,
                    center: rect.center,
                    start_angle: rect.angle,
                },
            };
            self.phase = Phase::Dragging(Drag {
                origin: point,
                kind,
            });
            tracing::debug!(%id, ?handle, "handle drag started");
            return Ok(vec![GizmoEvent::DragStarted(id)]);
        }

        let hit = self.hit_test(level, point);
        match (self.tool, hit) {
            (Tool::Platform, None) => {
                let id = level.add_platform(point);
                self.selection = Some(Selection {
                    id,
                    kind: EntityKind::Platform,
                });
                Ok(vec![GizmoEvent::Created(id), GizmoEvent::Selected(id)])
            }
            (Tool::Player, Some(sel)) if sel.kind == EntityKind::Part => {
                let id = level.add_part(PartKind::Limb, sel.id, None)?;
                self.selection = Some(Selection {
                    id,
                    kind: EntityKind::Part,
                });
                Ok(vec![GizmoEvent::Created(id), GizmoEvent::Selected(id)])
            }
            (Tool::Controls, Some(sel)) if sel.kind == EntityKind::Joint => {
                let actuated = level
                    .joint(sel.id)
                    .is_some_and(|j| j.kind.is_contraction());
                level.update_property(sel.id, PropertyEdit::Actuated(!actuated))?;
                self.selection = Some(sel);
                Ok(vec![GizmoEvent::Toggled(sel.id), GizmoEvent::Selected(sel.id)])
            }
            (Tool::Controls, Some(sel)) => {
                self.selection = Some(sel);
                Ok(vec![GizmoEvent::Selected(sel.id)])
            }
            (Tool::Delete, Some(sel)) => {
                level.delete(sel.id)?;
                self.clear();
                Ok(vec![GizmoEvent::Deleted(sel.id), GizmoEvent::SelectionCleared])
            }
            (Tool::Move | Tool::Platform | Tool::Player, Some(sel)) => {
                self.selection = Some(sel);
                let mut events = vec![GizmoEvent::Selected(sel.id)];
                let ids = match sel.kind {
                    EntityKind::Part => level.connected_parts(sel.id),
                    EntityKind::Platform | EntityKind::Goal => vec![sel.id],
                    EntityKind::Joint => Vec::new(),
                };
                if !ids.is_empty() {
                    self.phase = Phase::Dragging(Drag {
                        origin: point,
                        kind: DragKind::Move {
                            ids,
                            applied: Vec2::ZERO,
                        },
                    });
                    events.push(GizmoEvent::DragStarted(sel.id));
                }
                Ok(events)
            }
            (Tool::Move | Tool::Player | Tool::Controls | Tool::Delete, None) => {
                let had = self.selection.take().is_some();
                self.phase = Phase::Idle;
                Ok(if had {
                    vec![GizmoEvent::SelectionCleared]
                } else {
                    Vec::new()
                })
            }
        }
    }

    fn pointer_move(&mut self, level: &mut Level, point: Vec2) -> Result<Vec<GizmoEvent>, LevelError> {
        let Phase::Dragging(drag) = &mut self.phase else {
            let target = self
                .handle_at(level, point)
                .filter(|_| self.uses_handles())
                .map(|(_, _, h)| Target::Handle(h))
                .or_else(|| self.hit_test(level, point).map(Target::Entity));
            let next = target.map_or(Phase::Idle, Phase::Hover);
            if next == self.phase {
                return Ok(Vec::new());
            }
            self.phase = next;
            return Ok(vec![GizmoEvent::Hovered(target)]);
        };

        let offset = point - drag.origin;
        match &mut drag.kind {
            DragKind::Move { ids, applied } => {
                let step = offset - *applied;
                if step == Vec2::ZERO {
                    return Ok(Vec::new());
                }
                level.translate(ids, step)?;
                *applied = offset;
                Ok(ids.first().map(|&id| GizmoEvent::Dragged(id)).into_iter().collect())
            }
            DragKind::Resize {
                id,
                corner,
                anchor,
                start_size,
                angle,
            } => {
                let signs = corner.signs();
                let local = Vec2::from_angle(-*angle).rotate(offset);
                let size = (*start_size + signs * local).max(Vec2::splat(MIN_EXTENT));
                let center = *anchor + Vec2::from_angle(*angle).rotate(signs * size * 0.5);
                let id = *id;
                level.update_property(id, PropertyEdit::Width(size.x))?;
                level.update_property(id, PropertyEdit::Height(size.y))?;
                level.update_property(id, PropertyEdit::Position(center))?;
                Ok(vec![GizmoEvent::Dragged(id)])
            }
            DragKind::Rotate {
                id,
                center,
                start_angle,
            } => {
                let from = drag.origin - *center;
                let to = point - *center;
                if from.length_squared() < f32::EPSILON || to.length_squared() < f32::EPSILON {
                    return Ok(Vec::new());
                }
                let swept = to.to_angle() - from.to_angle();
                let id = *id;
                level.update_property(id, PropertyEdit::Angle(normalize_angle(*start_angle + swept)))?;
                Ok(vec![GizmoEvent::Dragged(id)])
            }
        }
    }

    fn pointer_up(&mut self) -> Vec<GizmoEvent> {
        if self.cancel_drag() {
            vec![GizmoEvent::DragEnded]
        } else {
            Vec::new()
        }
    }
}

/// A pivot is hit around its hole. A muscle is hit along the line between
/// its anchors, except around an anchor at a body's center and around pivots
/// on either of its bodies, which stay reachable underneath it.
fn joint_hit(level: &Level, id: EntityId, point: Vec2, radius: f32) -> bool {
    let Some(joint) = level.joint(id) else {
        return false;
    };
    let Some((a, b)) = level.joint_anchors(joint) else {
        return false;
    };
    if !joint.kind.is_contraction() {
        return a.distance(point) <= radius;
    }
    let on_center = [(joint.local_a, a), (joint.local_b, b)]
        .into_iter()
        .any(|(local, world)| local.length_squared() <= f32::EPSILON && world.distance(point) <= radius);
    if on_center {
        return false;
    }
    let covers_pivot = level
        .joints()
        .values()
        .filter(|j| !j.kind.is_contraction())
        .filter(|j| joint.endpoints().iter().any(|&end| j.touches(end)))
        .filter_map(|j| level.joint_position(j.id))
        .any(|hole| hole.distance(point) <= radius);
    !covers_pivot && distance_to_segment(point, a, b) <= radius
}

fn distance_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

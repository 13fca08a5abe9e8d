use std::time::Instant;

use log::{debug, trace};

use crate::api::PhysicsWorldApi;
use crate::body::RigidBody;
use crate::error::{CreationError, IndexError};
use crate::math::Vector2;
use crate::narrowphase::{build_manifold, collides};
use crate::resolver::ContactResolver;
use crate::types::*;

/// Owning rigid-body world.
///
/// Bodies live in a dense vector kept in insertion order, which is also the
/// order the step pipeline visits pairs in. Handles go through a slot table
/// carrying a generation counter so handles of removed bodies stay invalid
/// after their slot is reused.
pub struct PhysicsWorld {
    pub cfg: WorldConfig,

    bodies: Vec<RigidBody>,
    // `owners[i]` is the handle of `bodies[i]`.
    owners: Vec<BodyHandle>,
    slots: Vec<Slot>,
    free: Vec<u32>,

    // Per-substep scratch, reused between calls.
    aabbs: Vec<Aabb>,
    pairs: Vec<(usize, usize)>,

    contacts: Vec<ContactEvent>,
    last_stats: WorldStats,
    last_timing: Option<WorldTiming>,
}

struct Slot {
    generation: u32,
    dense: Option<usize>,
}

#[inline]
fn elapsed_ms(t: Option<Instant>) -> f64 {
    t.map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0)
}

/// Push an overlapping pair apart along `normal` (which points from `a` to `b`).
/// A static body never moves.
fn separate(a: &mut RigidBody, b: &mut RigidBody, normal: Vector2, depth: f64, mode: PositionCorrection) {
    let push = normal * depth;
    match (a.is_static(), b.is_static()) {
        (true, true) => {}
        (true, false) => b.move_by(push),
        (false, true) => a.move_by(-push),
        (false, false) => {
            let share_a = match mode {
                PositionCorrection::HalfSplit => 0.5,
                PositionCorrection::MassWeighted => {
                    a.inverse_mass() / (a.inverse_mass() + b.inverse_mass())
                }
            };
            a.move_by(-push * share_a);
            b.move_by(push * (1.0 - share_a));
        }
    }
}

impl PhysicsWorldApi for PhysicsWorld {
    fn new(cfg: WorldConfig) -> Self {
        Self {
            cfg,
            bodies: Vec::new(),
            owners: Vec::new(),
            slots: Vec::new(),
            free: Vec::new(),
            aabbs: Vec::new(),
            pairs: Vec::new(),
            contacts: Vec::new(),
            last_stats: WorldStats::default(),
            last_timing: None,
        }
    }

    fn add(&mut self, body: RigidBody) -> BodyHandle {
        let dense = self.bodies.len();
        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.dense = Some(dense);
                BodyHandle { index, generation: slot.generation }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot { generation: 0, dense: Some(dense) });
                BodyHandle { index, generation: 0 }
            }
        };
        self.bodies.push(body);
        self.owners.push(handle);
        debug!("added body {:?} ({} live)", handle, self.bodies.len());
        handle
    }

    fn remove(&mut self, handle: BodyHandle) -> Result<(), IndexError> {
        let dense = self.dense_index(handle).ok_or(IndexError::OutOfRange { handle })?;
        self.bodies.remove(dense);
        self.owners.remove(dense);

        let slot = &mut self.slots[handle.index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        slot.dense = None;
        self.free.push(handle.index);

        // Everything after the hole shifted down by one.
        for (i, owner) in self.owners.iter().enumerate().skip(dense) {
            self.slots[owner.index as usize].dense = Some(i);
        }
        debug!("removed body {:?} ({} live)", handle, self.bodies.len());
        Ok(())
    }

    fn get(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.dense_index(handle).map(|i| &self.bodies[i])
    }

    fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.dense_index(handle).map(|i| &mut self.bodies[i])
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn handles(&self) -> Vec<BodyHandle> {
        self.owners.clone()
    }

    fn create_circle_body(
        &mut self,
        radius: f64,
        position: Vector2,
        density: f64,
        is_static: bool,
        restitution: f64,
    ) -> Result<BodyHandle, CreationError> {
        let body = RigidBody::create_circle(radius, position, density, is_static, restitution)?;
        Ok(self.add(body))
    }

    fn create_box_body(
        &mut self,
        width: f64,
        height: f64,
        position: Vector2,
        density: f64,
        is_static: bool,
        restitution: f64,
    ) -> Result<BodyHandle, CreationError> {
        let body = RigidBody::create_box(width, height, position, density, is_static, restitution)?;
        Ok(self.add(body))
    }

    fn step(&mut self, dt: f64, substeps: usize) {
        self.contacts.clear();
        self.last_timing = None;
        self.last_stats = WorldStats {
            bodies: self.bodies.len(),
            ..Default::default()
        };
        if !dt.is_finite() || dt <= 0.0 {
            debug!("step ignored: dt = {dt}");
            return;
        }

        let iterations = substeps.clamp(MIN_ITERATIONS, MAX_ITERATIONS);
        if iterations != substeps {
            debug!("substeps {substeps} clamped to {iterations}");
        }
        let h = dt / iterations as f64;
        let gravity = self.cfg.gravity;
        let timed = self.cfg.enable_timing;
        let t_all = if timed { Some(Instant::now()) } else { None };
        let mut timing = WorldTiming::default();

        for _ in 0..iterations {
            let t0 = if timed { Some(Instant::now()) } else { None };
            for body in &mut self.bodies {
                body.step(h, gravity);
            }
            timing.integrate_ms += elapsed_ms(t0);

            let t1 = if timed { Some(Instant::now()) } else { None };
            self.broad_phase();
            timing.broad_phase_ms += elapsed_ms(t1);

            let t2 = if timed { Some(Instant::now()) } else { None };
            self.narrow_phase();
            timing.narrow_phase_ms += elapsed_ms(t2);

            self.last_stats.substeps += 1;
        }

        if t_all.is_some() {
            timing.step_ms = elapsed_ms(t_all);
            self.last_timing = Some(timing);
        }
        trace!(
            "step dt={dt} substeps={} bodies={} candidate_pairs={} contacts={}",
            self.last_stats.substeps,
            self.last_stats.bodies,
            self.last_stats.candidate_pairs,
            self.last_stats.contacts
        );
    }

    fn gravity(&self) -> Vector2 {
        self.cfg.gravity
    }

    fn set_gravity(&mut self, gravity: Vector2) {
        self.cfg.gravity = gravity;
    }

    fn drain_contacts(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.contacts)
    }

    fn query_point(&self, p: Vector2) -> Vec<BodyHandle> {
        self.bodies
            .iter()
            .zip(&self.owners)
            .filter(|(body, _)| body.contains_point(p))
            .map(|(_, h)| *h)
            .collect()
    }

    fn query_aabb(&self, region: Aabb) -> Vec<BodyHandle> {
        self.bodies
            .iter()
            .zip(&self.owners)
            .filter(|(body, _)| body.aabb().overlaps(&region))
            .map(|(_, h)| *h)
            .collect()
    }
}

impl PhysicsWorld {
    fn dense_index(&self, handle: BodyHandle) -> Option<usize> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.dense
    }

    /// Candidate pairs `(i, j)`, `i < j`: not both static, strictly
    /// overlapping bounds. Bodies whose bounds are not finite never pair up.
    fn broad_phase(&mut self) {
        self.aabbs.clear();
        for body in &mut self.bodies {
            body.refresh_world_vertices();
        }
        self.aabbs.extend(self.bodies.iter().map(RigidBody::aabb));

        self.pairs.clear();
        let n = self.bodies.len();
        for i in 0..n {
            for j in (i + 1)..n {
                if self.bodies[i].is_static() && self.bodies[j].is_static() {
                    continue;
                }
                if !self.aabbs[i].is_finite() || !self.aabbs[j].is_finite() {
                    continue;
                }
                if !self.aabbs[i].overlaps(&self.aabbs[j]) {
                    continue;
                }
                self.pairs.push((i, j));
            }
        }
        self.last_stats.candidate_pairs += self.pairs.len();
    }

    /// Exact test, separation, manifold and impulses for every candidate pair.
    fn narrow_phase(&mut self) {
        let mode = self.cfg.position_correction;
        for k in 0..self.pairs.len() {
            let (i, j) = self.pairs[k];
            let (head, tail) = self.bodies.split_at_mut(j);
            let a = &mut head[i];
            let b = &mut tail[0];

            let Some((normal, depth)) = collides(a, b) else {
                continue;
            };
            separate(a, b, normal, depth, mode);
            let manifold = build_manifold(a, b, normal, depth);
            ContactResolver::resolve(a, b, &manifold);

            self.last_stats.contacts += 1;
            if self.cfg.record_contacts && self.contacts.len() < self.cfg.max_contacts {
                self.contacts.push(ContactEvent {
                    a: self.owners[i],
                    b: self.owners[j],
                    manifold,
                });
            }
        }
    }

    /// Statistics of the last `step` call.
    pub fn debug_stats(&self) -> WorldStats {
        self.last_stats
    }

    /// Timing breakdown of the last `step` call (needs `enable_timing`).
    pub fn timing(&self) -> Option<WorldTiming> {
        self.last_timing
    }

    /// Read-only view of the bodies in insertion order.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.owners.iter().copied().zip(self.bodies.iter())
    }
}

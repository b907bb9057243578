//! Particle-based hydraulic erosion.
//!
//! Each particle walks downhill one cell crossing at a time, trading
//! sediment with the live grid. Particles are processed sequentially
//! against the live grid; the resulting order bias is tolerated. All
//! numerical dead ends (unfillable pits, zero-length directions, forced
//! uphill moves beyond capacity) are absorbed by retiring the particle:
//! it deposits what it carries and respawns elsewhere. A retire is never
//! an error.

use glam::{Vec2, Vec3};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::config::HydraulicConfig;
use super::slump::{collapse_from, collapse_to};
use crate::field::{TerrainField, NEIGHBOR_OFFSETS, ORTHO_OFFSETS};
use crate::geometry::intersect_cell_boundary;
use crate::particle::{ErosionParticle, ParticlePool};

/// Hole deposits must slightly over-clear the deficit before a fill is
/// attempted, so borderline fills do not oscillate.
const HOLE_FILL_MARGIN: f32 = 1.001;

/// Uphill moves are paid for at a small premium so the leveled cell ends
/// strictly above the obstacle.
const UPHILL_MARGIN: f32 = 1.02;

/// One full pass: every particle attempts up to `cells_per_run` cell
/// crossings against the live grid.
pub fn hydraulic_pass(
    field: &mut TerrainField,
    pool: &mut ParticlePool,
    config: &HydraulicConfig,
    rng: &mut ChaCha8Rng,
) {
    for particle in pool.iter_mut() {
        for _ in 0..config.cells_per_run {
            if !step_once(field, particle, config, rng) {
                break;
            }
        }
    }
}

/// Deposits everything the particle carries at `(cx, cy)`, smooths the
/// deposit, and respawns the particle. The terminal move of every
/// degenerate condition.
fn retire(
    field: &mut TerrainField,
    particle: &mut ErosionParticle,
    config: &HydraulicConfig,
    rng: &mut ChaCha8Rng,
    cx: i32,
    cy: i32,
) {
    if particle.carrying > 0.0 {
        field.cell_mut(cx, cy).loose += particle.carrying;
        collapse_from(field, cx, cy, config.collapse_amount);
    }
    particle.reset(rng, field.width(), field.height());
}

fn wrap_position(position: Vec2, width: u32, height: u32) -> Vec2 {
    Vec2::new(
        position.x.rem_euclid(width as f32),
        position.y.rem_euclid(height as f32),
    )
}

/// Advances the particle by one cell crossing. Returns `false` when the
/// particle retired and the run should stop.
fn step_once(
    field: &mut TerrainField,
    particle: &mut ErosionParticle,
    config: &HydraulicConfig,
    rng: &mut ChaCha8Rng,
) -> bool {
    let (cx, cy) = particle.cell();
    let mut adjusted_height = field.height_at(cx, cy);

    // Hole check: a cell lower than all eight neighbors traps the
    // particle until it fills the basin or gives up.
    let mut min_neighbor_wheight = f32::MAX;
    for &(dx, dy) in &NEIGHBOR_OFFSETS {
        min_neighbor_wheight = min_neighbor_wheight.min(field.wheight_at(cx + dx, cy + dy));
    }
    if min_neighbor_wheight > adjusted_height {
        let deficit = min_neighbor_wheight - adjusted_height;
        if particle.carrying > deficit * HOLE_FILL_MARGIN {
            particle.carrying -= deficit;
            field.cell_mut(cx, cy).loose += deficit;
            adjusted_height += deficit;
        } else {
            retire(field, particle, config, rng, cx, cy);
            return false;
        }
    }

    // Fall vector from the four orthogonal water-augmented slopes.
    let this_wheight = field.wheight_at(cx, cy);
    let mut fall = Vec2::ZERO;
    let mut steepest_drop = 0.0f32;
    for &(dx, dy) in &ORTHO_OFFSETS {
        let drop = this_wheight - field.wheight_at(cx + dx, cy + dy);
        fall += Vec2::new(dx as f32, dy as f32) * drop;
        steepest_drop = steepest_drop.max(drop);
    }
    if fall.length_squared() < 1e-12 {
        retire(field, particle, config, rng, cx, cy);
        return false;
    }
    let fall = fall.normalize();

    // Blend in last frame's direction and a turbulence kick, renormalize.
    let turbulence = Vec2::new(
        rng.random::<f32>() * 2.0 - 1.0,
        rng.random::<f32>() * 2.0 - 1.0,
    ) * config.turbulence;
    let blended = fall + Vec2::new(particle.velocity.x, particle.velocity.y) * config.momentum
        + turbulence;
    if blended.length_squared() < 1e-12 {
        retire(field, particle, config, rng, cx, cy);
        return false;
    }
    let direction = blended.normalize();

    // Edge nudge: repeated intersection queries lock up when the
    // position sits on the boundary it is about to cross.
    let eps = config.edge_epsilon;
    let mut position = particle.position;
    let frac = position - Vec2::new(cx as f32, cy as f32);
    if direction.x < 0.0 && frac.x < eps {
        position.x = cx as f32 + eps;
    } else if direction.x > 0.0 && frac.x > 1.0 - eps {
        position.x = cx as f32 + 1.0 - eps;
    }
    if direction.y < 0.0 && frac.y < eps {
        position.y = cy as f32 + eps;
    } else if direction.y > 0.0 && frac.y > 1.0 - eps {
        position.y = cy as f32 + 1.0 - eps;
    }

    let exit = intersect_cell_boundary(position, direction, cx, cy);
    if (exit.cell_x, exit.cell_y) == (cx, cy) {
        retire(field, particle, config, rng, cx, cy);
        return false;
    }
    let cross_distance = (exit.position - position).length() / std::f32::consts::SQRT_2;

    // Uphill correction: pay sediment to level the way, or give up.
    let ndiff = field.height_at(exit.cell_x, exit.cell_y) - adjusted_height;
    if ndiff > 0.0 {
        let cost = ndiff * UPHILL_MARGIN;
        if particle.carrying > cost {
            particle.carrying -= cost;
            field.cell_mut(cx, cy).loose += cost;
        } else {
            retire(field, particle, config, rng, cx, cy);
            return false;
        }
    }

    // Downhill acceleration with drag; speed is low-passed so one steep
    // crossing does not spike the capacity.
    let instantaneous = if ndiff < 0.0 {
        let slope_length = (ndiff * ndiff + cross_distance * cross_distance).sqrt();
        let acceleration = if slope_length > 0.0 {
            2.0 * ndiff.abs() / slope_length
        } else {
            0.0
        };
        (particle.speed + acceleration) * config.drag
    } else {
        particle.speed * config.drag
    };
    particle.speed += (instantaneous - particle.speed) * config.speed_blend;

    field.cell_mut(cx, cy).moving_water += config.water_per_crossing * cross_distance;

    let new_capacity = config.capacity_coefficient * particle.speed;
    particle.capacity = (particle.capacity + (new_capacity - particle.capacity) * config.capacity_blend)
        .min(config.max_capacity);

    // Deposit when over capacity, erode when under.
    let cdiff = particle.carrying - particle.capacity;
    if cdiff > 0.0 {
        let dropped = (cdiff * config.drop_proportion * cross_distance).min(particle.carrying);
        particle.carrying -= dropped;
        field.cell_mut(cx, cy).loose += dropped;
        collapse_from(field, cx, cy, config.collapse_amount);
    } else if particle.speed > config.min_speed {
        let budget = -cdiff;
        let excess = particle.speed - config.min_speed;
        let mut erosion_factor = config.erosion_coefficient * excess * excess;
        if particle.age < config.young_age {
            erosion_factor += config.min_erosion;
        }
        erosion_factor *= cross_distance;

        let cell = field.cell_mut(cx, cy);
        let from_loose = erosion_factor.min(cell.loose).min(budget);
        cell.loose -= from_loose;
        let leftover = (erosion_factor - from_loose).min(budget - from_loose);
        let from_hard = (leftover * config.hard_erosion_factor).min(cell.hard).max(0.0);
        cell.hard -= from_hard;

        let eroded = from_loose + from_hard;
        particle.carrying += eroded;
        cell.erosion += eroded;
    }

    {
        let cell = field.cell_mut(cx, cy);
        cell.carrying += (particle.carrying - cell.carrying) * config.carrying_blend;
    }

    collapse_to(
        field,
        cx,
        cy,
        config.collapse_threshold,
        config.collapse_amount,
    );

    particle.age += 1;
    if particle.age > config.max_age && particle.carrying < config.min_carry_to_survive {
        retire(field, particle, config, rng, cx, cy);
        return false;
    }

    particle.position = wrap_position(exit.position, field.width(), field.height());
    particle.velocity = Vec3::new(direction.x, direction.y, steepest_drop);
    true
}

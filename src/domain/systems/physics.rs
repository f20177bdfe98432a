use crate::domain::state::Stone;
use crate::domain::tuning::RinkTuning;

// Pairs closer than this are treated as coincident and skipped.
const MIN_CONTACT_DIST_SQ: f32 = 1e-6;
// Overlap below this is float noise between touching stones and is not a visible change.
const POSITION_SLOP: f32 = 1e-3;

/// Result of advancing the stones by one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    // Any position, velocity or motion flag changed.
    pub changed: bool,
    // At least one stone is still sliding after friction.
    pub any_moving: bool,
}

#[derive(Debug, Clone, Copy)]
struct Contact {
    a: usize,
    b: usize,
    nx: f32,
    ny: f32,
    overlap: f32,
}

pub fn step_stones(stones: &mut [Stone], tuning: &RinkTuning) -> StepReport {
    let mut report = StepReport::default();

    // Integrate.
    for s in stones.iter_mut().filter(|s| s.in_motion) {
        s.x += s.vx;
        s.y += s.vy;
        report.changed = true;
    }

    for s in stones.iter_mut().filter(|s| s.in_motion) {
        if bounce_off_walls(s, tuning) {
            report.changed = true;
        }
    }

    if resolve_collisions(stones, tuning) {
        report.changed = true;
    }

    // Friction and rest detection.
    for s in stones.iter_mut().filter(|s| s.in_motion) {
        s.vx *= tuning.friction;
        s.vy *= tuning.friction;
        if s.speed() < tuning.min_speed {
            s.vx = 0.0;
            s.vy = 0.0;
            s.in_motion = false;
        } else {
            report.any_moving = true;
        }
        report.changed = true;
    }

    report
}

/// Clamps a stone inside the rink and reflects the offending velocity component.
/// Returns true when a wall was hit.
pub fn bounce_off_walls(s: &mut Stone, tuning: &RinkTuning) -> bool {
    let lo = tuning.stone_radius;
    let hi = tuning.rink_size - tuning.stone_radius;
    let mut hit = false;

    if s.x < lo {
        s.x = lo;
        s.vx *= -tuning.restitution;
        hit = true;
    } else if s.x > hi {
        s.x = hi;
        s.vx *= -tuning.restitution;
        hit = true;
    }

    if s.y < lo {
        s.y = lo;
        s.vy *= -tuning.restitution;
        hit = true;
    } else if s.y > hi {
        s.y = hi;
        s.vy *= -tuning.restitution;
        hit = true;
    }

    hit
}

/// Detects every overlapping pair from one consistent snapshot, separates them, then
/// applies impulses to the approaching ones. Returns true if anything visibly changed.
pub fn resolve_collisions(stones: &mut [Stone], tuning: &RinkTuning) -> bool {
    let contacts = find_contacts(stones, tuning.stone_diameter());
    if contacts.is_empty() {
        return false;
    }
    let mut changed = contacts.iter().any(|c| c.overlap > POSITION_SLOP);

    for c in &contacts {
        let mx = c.nx * c.overlap * 0.5;
        let my = c.ny * c.overlap * 0.5;
        stones[c.a].x -= mx;
        stones[c.a].y -= my;
        stones[c.b].x += mx;
        stones[c.b].y += my;
    }

    for c in &contacts {
        let rvx = stones[c.b].vx - stones[c.a].vx;
        let rvy = stones[c.b].vy - stones[c.a].vy;
        let vel_along_normal = rvx * c.nx + rvy * c.ny;

        // Separating or resting contact.
        if vel_along_normal >= 0.0 {
            continue;
        }

        // Equal masses: the impulse is split evenly.
        let j = -(1.0 + tuning.restitution) * vel_along_normal * 0.5;
        let ix = j * c.nx;
        let iy = j * c.ny;

        let a = &mut stones[c.a];
        a.vx -= ix;
        a.vy -= iy;
        a.in_motion = true;

        let b = &mut stones[c.b];
        b.vx += ix;
        b.vy += iy;
        b.in_motion = true;
        changed = true;
    }

    changed
}

fn find_contacts(stones: &[Stone], diameter: f32) -> Vec<Contact> {
    let diameter_sq = diameter * diameter;
    let mut contacts = Vec::new();

    for a in 0..stones.len() {
        for b in (a + 1)..stones.len() {
            let dx = stones[b].x - stones[a].x;
            let dy = stones[b].y - stones[a].y;
            let dist_sq = dx * dx + dy * dy;
            if dist_sq < diameter_sq && dist_sq > MIN_CONTACT_DIST_SQ {
                let dist = dist_sq.sqrt();
                contacts.push(Contact {
                    a,
                    b,
                    nx: dx / dist,
                    ny: dy / dist,
                    overlap: diameter - dist,
                });
            }
        }
    }

    contacts
}

use crate::elastika::vector::Vec3;

/*
Spring Mesh
===========

The resonator is a flat patch of point masses ("balls") on a triangular
lattice, each joined to its six nearest neighbours by springs. The patch is
hexagonal; its outer ring is nailed down.

                  o   o   o   o   o   o          o  anchor (fixed)
                o   ·   ·   ·   ·   ·   o        ·  mobile ball
              o   ·   ·   ·   ·   ·   ·   o      L/R input ports (driven)
            o   ·   L   ·   ·   R   ·   ·   o    l/r output pickups (mobile)
          o   ·   ·   ·   ·   ·   ·   ·   ·   o
            ...

Vocabulary
----------

  spacing       Lattice distance between neighbouring balls at rest. The
                mesh lives in lattice units, so spacing is 1.0.

  rest length   Natural length of a spring. Shorter than the spacing, so
                every spring is stretched in the rest configuration. That
                pre-tension is what lets transverse (z) waves travel across
                the flat mesh.

  anchor        Boundary ball with a fixed position.

  driven        Input port: its position is prescribed every sample from the
                incoming audio. Acts as an anchor when the input is silent.

  mobile        Every other ball; integrated every sample.


Units
-----

Time is measured in samples, so velocity is "lattice units per sample" and
the spring constant κ is already multiplied by dt². A spring stretched by e
accelerates a unit mass by κ × e per sample per sample.


Integration: Semi-Implicit Euler
--------------------------------

For each sample:

    1. S_i  = Σ (|d| − rest) × d/|d|         over springs touching ball i
    2. v_i += min(κ / m_i, κ_limit) × S_i
    3. v_i  = rotate_z(v_i, curl angle)       magnetic curl
    4. v_i *= damping                         friction
    5. v_i  = clamp_length(v_i, MAX_SPEED)
    6. p_i += v_i
    7. p_i  = rest_i + clamp_length(p_i − rest_i, MAX_DISPLACEMENT)

Updating velocity first and then position with the *new* velocity is what
makes the scheme symplectic: for a linear spring network it is stable as long
as ω × dt < 2 for the highest mode. Step 2 caps κ / m on each ball, so a
light ball behaves as if it had mass κ / κ_limit while every other ball keeps
its own. Forces stay equal and opposite; only the inertia changes.

Step 3 is the exact solution of dv/dt = v × B for a field along z, applied
for one sample. It turns velocity without changing its length, so curl alone
neither adds nor removes kinetic energy in the integrator. Step 4 multiplies
by the exact exponential decay for one sample, so friction is always
dissipative. Steps 5 and 7 bound the speed and excursion of any ball no
matter what the forces did.

With the rest configuration perfectly symmetric, every mobile ball starts in
equilibrium: the six spring pulls cancel.
*/

/// Distance between neighbouring balls at rest.
pub const SPACING: f32 = 1.0;
/// Rings of balls around the centre; the outermost ring is anchored.
pub const MESH_RADIUS: i32 = 5;
/// Upper bound on any ball's speed, in lattice units per sample.
pub const MAX_SPEED: f32 = 0.25;
/// Upper bound on any ball's distance from its rest position.
pub const MAX_DISPLACEMENT: f32 = 2.0;

const AXIAL_NEIGHBOURS: [(i32, i32); 3] = [(1, 0), (0, 1), (-1, 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallKind {
    Anchor,
    Driven,
    Mobile,
}

#[derive(Debug, Clone, Copy)]
pub struct Ball {
    pub rest: Vec3,
    pub pos: Vec3,
    pub vel: Vec3,
    pub mass: f32,
    pub kind: BallKind,
}

impl Ball {
    fn new(rest: Vec3, kind: BallKind) -> Self {
        Self {
            rest,
            pos: rest,
            vel: Vec3::ZERO,
            mass: 1.0,
            kind,
        }
    }

    #[inline]
    pub fn displacement(&self) -> Vec3 {
        self.pos - self.rest
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Spring {
    pub a: usize,
    pub b: usize,
}

/// Ball indices of the audio ports.
#[derive(Debug, Clone, Copy)]
pub struct MeshPorts {
    pub input_left: usize,
    pub input_right: usize,
    pub output_left: usize,
    pub output_right: usize,
}

/// Per-sample coefficients, precomputed by the engine whenever a parameter
/// or the sample rate changes.
#[derive(Debug, Clone, Copy)]
pub struct StepParams {
    /// Spring constant in per-sample² units.
    pub kappa: f32,
    /// Upper bound on κ / m for any single ball.
    pub kappa_limit: f32,
    /// Natural spring length.
    pub rest_length: f32,
    /// Velocity multiplier per sample, in (0, 1].
    pub damping: f32,
    pub curl_cos: f32,
    pub curl_sin: f32,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    balls: Vec<Ball>,
    springs: Vec<Spring>,
    forces: Vec<Vec3>,
    ports: MeshPorts,
    impurities: Vec<usize>,
}

impl Mesh {
    /// Build the hexagonal patch. Allocates; call once per engine.
    pub fn hexagon() -> Self {
        let radius = MESH_RADIUS;
        let mut coords = Vec::new();
        let mut balls = Vec::new();

        for r in -radius..=radius {
            for q in -radius..=radius {
                let ring = q.abs().max(r.abs()).max((q + r).abs());
                if ring > radius {
                    continue;
                }
                let kind = if ring == radius {
                    BallKind::Anchor
                } else {
                    BallKind::Mobile
                };
                coords.push((q, r));
                balls.push(Ball::new(axial_to_plane(q, r), kind));
            }
        }

        let index_of = |q: i32, r: i32| coords.iter().position(|&c| c == (q, r));

        let mut springs = Vec::new();
        for (i, &(q, r)) in coords.iter().enumerate() {
            for &(dq, dr) in &AXIAL_NEIGHBOURS {
                if let Some(j) = index_of(q + dq, r + dr) {
                    let both_fixed =
                        balls[i].kind == BallKind::Anchor && balls[j].kind == BallKind::Anchor;
                    if !both_fixed {
                        springs.push(Spring { a: i, b: j });
                    }
                }
            }
        }

        // Ports are placed in mirror-image pairs across the y axis.
        let port = |q: i32, r: i32| index_of(q, r).unwrap_or(0);
        let ports = MeshPorts {
            input_left: port(-3, 1),
            input_right: port(2, 1),
            output_left: port(-1, -2),
            output_right: port(3, -2),
        };
        balls[ports.input_left].kind = BallKind::Driven;
        balls[ports.input_right].kind = BallKind::Driven;

        // A small cluster on one side, so mass changes break the symmetry.
        let impurities = [(1, 1), (1, 2), (2, 1)]
            .iter()
            .filter_map(|&(q, r)| index_of(q, r))
            .collect();

        let forces = vec![Vec3::ZERO; balls.len()];

        Self {
            balls,
            springs,
            forces,
            ports,
            impurities,
        }
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    pub fn ports(&self) -> MeshPorts {
        self.ports
    }

    pub fn impurities(&self) -> &[usize] {
        &self.impurities
    }

    /// Give every impurity ball the same mass. Others stay at 1.0.
    pub fn set_impurity_mass(&mut self, mass: f32) {
        for &i in &self.impurities {
            self.balls[i].mass = mass;
        }
    }

    /// Put every ball back at rest with zero velocity.
    pub fn reset(&mut self) {
        for ball in &mut self.balls {
            ball.pos = ball.rest;
            ball.vel = Vec3::ZERO;
        }
    }

    /// Displace a driven ball from its rest position.
    #[inline]
    pub fn drive(&mut self, index: usize, offset: Vec3) {
        let ball = &mut self.balls[index];
        ball.pos = ball.rest + offset;
    }

    #[inline]
    pub fn displacement(&self, index: usize) -> Vec3 {
        self.balls[index].displacement()
    }

    /// Advance one sample. Returns the sum of squared mobile-ball speeds,
    /// which is non-finite if the state has been corrupted.
    pub fn step(&mut self, params: &StepParams) -> f32 {
        self.forces.fill(Vec3::ZERO);

        for spring in &self.springs {
            let d = self.balls[spring.b].pos - self.balls[spring.a].pos;
            let length = d.length();
            if length > f32::EPSILON {
                let f = d * ((length - params.rest_length) / length);
                self.forces[spring.a] += f;
                self.forces[spring.b] -= f;
            }
        }

        let max_speed_squared = MAX_SPEED * MAX_SPEED;
        let mut speed_sum = 0.0;
        for (ball, &force) in self.balls.iter_mut().zip(&self.forces) {
            if ball.kind != BallKind::Mobile {
                continue;
            }
            let response = (params.kappa / ball.mass).min(params.kappa_limit);
            let mut vel = ball.vel + force * response;
            vel = vel.rotate_z(params.curl_cos, params.curl_sin) * params.damping;
            let speed_squared = vel.length_squared();
            if speed_squared > max_speed_squared {
                vel = vel * (MAX_SPEED / speed_squared.sqrt());
            }
            ball.vel = vel;
            ball.pos += vel;
            let offset = ball.pos - ball.rest;
            let offset_squared = offset.length_squared();
            if offset_squared > MAX_DISPLACEMENT * MAX_DISPLACEMENT {
                ball.pos = ball.rest + offset * (MAX_DISPLACEMENT / offset_squared.sqrt());
            }
            speed_sum += vel.length_squared();
        }
        speed_sum
    }

    /// Σ ½ m v² over mobile balls.
    pub fn kinetic_energy(&self) -> f32 {
        self.balls
            .iter()
            .filter(|b| b.kind == BallKind::Mobile)
            .map(|b| 0.5 * b.mass * b.vel.length_squared())
            .sum()
    }

    /// Σ ½ κ (|d| − rest)² over all springs.
    pub fn potential_energy(&self, kappa: f32, rest_length: f32) -> f32 {
        self.springs
            .iter()
            .map(|s| {
                let stretch = (self.balls[s.b].pos - self.balls[s.a].pos).length() - rest_length;
                0.5 * kappa * stretch * stretch
            })
            .sum()
    }
}

fn axial_to_plane(q: i32, r: i32) -> Vec3 {
    let (q, r) = (q as f32, r as f32);
    Vec3::new(
        SPACING * (q + 0.5 * r),
        SPACING * (r * 3.0f32.sqrt() * 0.5),
        0.0,
    )
}

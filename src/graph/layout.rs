//! Force-directed layout for the dependency graph.
//!
//! A velocity Verlet simulation with link, many-body, centering and
//! collision forces. Alpha ("temperature") decays toward a target each tick;
//! the simulation stops once alpha falls below `alpha_min`.

use std::f64::consts::PI;

use super::validate::Link;

/// Tunables of the simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceParams {
    pub link_distance: f64,
    pub charge_strength: f64,
    /// Squared distance floor for the many-body force.
    pub charge_distance_min2: f64,
    pub collide_radius: f64,
    pub collide_strength: f64,
    pub alpha_min: f64,
    /// Fraction of velocity lost per tick.
    pub velocity_decay: f64,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            link_distance: 100.0,
            charge_strength: -300.0,
            charge_distance_min2: 1.0,
            collide_radius: 40.0,
            collide_strength: 1.0,
            alpha_min: 0.001,
            velocity_decay: 0.4,
        }
    }
}

const INITIAL_RADIUS: f64 = 10.0;
/// Ticks for alpha to decay from 1 to `alpha_min` with a zero target.
const DECAY_TICKS: f64 = 300.0;

/// Position and velocity of one node. `fx`/`fy` pin the node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutNode {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub fx: Option<f64>,
    pub fy: Option<f64>,
}

/// Linear congruential generator used to separate coincident nodes.
#[derive(Debug, Clone)]
struct Lcg(u64);

impl Lcg {
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;
    const M: u64 = 1 << 32;

    fn next(&mut self) -> f64 {
        self.0 = (Self::A * self.0 + Self::C) % Self::M;
        self.0 as f64 / Self::M as f64
    }

    /// Tiny random offset in `(-5e-7, 5e-7)`.
    fn jiggle(&mut self) -> f64 {
        (self.next() - 0.5) * 1e-6
    }
}

/// Force simulation state for one graph.
#[derive(Debug, Clone)]
pub struct ForceLayout {
    nodes: Vec<LayoutNode>,
    links: Vec<Link>,
    link_strength: Vec<f64>,
    link_bias: Vec<f64>,
    params: ForceParams,
    alpha: f64,
    alpha_target: f64,
    alpha_decay: f64,
    running: bool,
    rng: Lcg,
}

impl ForceLayout {
    /// Build a layout for `node_count` nodes connected by `links`.
    ///
    /// Links must reference valid node indices; see
    /// [`validate`](super::validate::validate).
    pub fn new(node_count: usize, links: &[Link]) -> Self {
        Self::with_params(node_count, links, ForceParams::default())
    }

    /// Self loops are kept for drawing but exert no force.
    pub fn with_params(node_count: usize, links: &[Link], params: ForceParams) -> Self {
        let links: Vec<Link> = links
            .iter()
            .filter(|l| l.source != l.target)
            .copied()
            .collect();
        let initial_angle = PI * (3.0 - 5f64.sqrt());
        let nodes = (0..node_count)
            .map(|i| {
                let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
                let angle = i as f64 * initial_angle;
                LayoutNode {
                    x: radius * angle.cos(),
                    y: radius * angle.sin(),
                    ..LayoutNode::default()
                }
            })
            .collect();

        let mut degree = vec![0usize; node_count];
        for link in &links {
            degree[link.source] += 1;
            degree[link.target] += 1;
        }
        let link_strength = links
            .iter()
            .map(|l| 1.0 / degree[l.source].min(degree[l.target]) as f64)
            .collect();
        let link_bias = links
            .iter()
            .map(|l| {
                let s = degree[l.source] as f64;
                s / (s + degree[l.target] as f64)
            })
            .collect();

        Self {
            nodes,
            links,
            link_strength,
            link_bias,
            alpha_decay: 1.0 - params.alpha_min.powf(1.0 / DECAY_TICKS),
            params,
            alpha: 1.0,
            alpha_target: 0.0,
            running: true,
            rng: Lcg(1),
        }
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f64 {
        self.alpha_target
    }

    /// Whether [`step`](Self::step) still advances the simulation.
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_alpha_target(&mut self, target: f64) {
        self.alpha_target = target;
    }

    /// Resume ticking. Alpha is left as is and moves toward the target.
    pub fn restart(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Move node `i` to a position, keeping its velocity at rest.
    pub fn place(&mut self, i: usize, x: f64, y: f64) {
        if let Some(node) = self.nodes.get_mut(i) {
            node.x = x;
            node.y = y;
            node.vx = 0.0;
            node.vy = 0.0;
        }
    }

    /// Fix node `i` at `(x, y)` until unpinned.
    pub fn pin(&mut self, i: usize, x: f64, y: f64) {
        if let Some(node) = self.nodes.get_mut(i) {
            node.fx = Some(x);
            node.fy = Some(y);
        }
    }

    pub fn unpin(&mut self, i: usize) {
        if let Some(node) = self.nodes.get_mut(i) {
            node.fx = None;
            node.fy = None;
        }
    }

    pub fn position(&self, i: usize) -> Option<(f64, f64)> {
        self.nodes.get(i).map(|n| (n.x, n.y))
    }

    /// Closest node to `(x, y)` within `radius`.
    pub fn node_at(&self, x: f64, y: f64, radius: f64) -> Option<usize> {
        let mut best = None;
        let mut best_d2 = radius * radius;
        for (i, node) in self.nodes.iter().enumerate() {
            let d2 = (node.x - x).powi(2) + (node.y - y).powi(2);
            if d2 <= best_d2 {
                best_d2 = d2;
                best = Some(i);
            }
        }
        best
    }

    /// Advance one tick if running. Returns whether a tick happened.
    ///
    /// The simulation stops itself once alpha drops below `alpha_min`.
    pub fn step(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.tick();
        if self.alpha < self.params.alpha_min {
            self.running = false;
        }
        true
    }

    /// Apply all forces once and integrate positions, regardless of alpha.
    pub fn tick(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
        let alpha = self.alpha;

        self.apply_links(alpha);
        self.apply_charge(alpha);
        self.apply_center();
        self.apply_collide();

        let keep = 1.0 - self.params.velocity_decay;
        for node in &mut self.nodes {
            match node.fx {
                Some(fx) => {
                    node.x = fx;
                    node.vx = 0.0;
                }
                None => {
                    node.vx *= keep;
                    node.x += node.vx;
                }
            }
            match node.fy {
                Some(fy) => {
                    node.y = fy;
                    node.vy = 0.0;
                }
                None => {
                    node.vy *= keep;
                    node.y += node.vy;
                }
            }
        }
    }

    fn apply_links(&mut self, alpha: f64) {
        for (i, link) in self.links.iter().enumerate() {
            let source = self.nodes[link.source];
            let target = self.nodes[link.target];

            let mut x = target.x + target.vx - source.x - source.vx;
            let mut y = target.y + target.vy - source.y - source.vy;
            if x == 0.0 {
                x = self.rng.jiggle();
            }
            if y == 0.0 {
                y = self.rng.jiggle();
            }
            let mut l = (x * x + y * y).sqrt();
            l = (l - self.params.link_distance) / l * alpha * self.link_strength[i];
            x *= l;
            y *= l;

            let bias = self.link_bias[i];
            let t = &mut self.nodes[link.target];
            t.vx -= x * bias;
            t.vy -= y * bias;
            let s = &mut self.nodes[link.source];
            s.vx += x * (1.0 - bias);
            s.vy += y * (1.0 - bias);
        }
    }

    /// Exact pairwise many-body force.
    fn apply_charge(&mut self, alpha: f64) {
        let n = self.nodes.len();
        let strength = self.params.charge_strength;
        for i in 0..n {
            let (xi, yi) = (self.nodes[i].x, self.nodes[i].y);
            let mut dvx = 0.0;
            let mut dvy = 0.0;
            for j in 0..n {
                if i == j {
                    continue;
                }
                let mut x = self.nodes[j].x - xi;
                let mut y = self.nodes[j].y - yi;
                if x == 0.0 {
                    x = self.rng.jiggle();
                }
                if y == 0.0 {
                    y = self.rng.jiggle();
                }
                let mut l = x * x + y * y;
                if l < self.params.charge_distance_min2 {
                    l = (self.params.charge_distance_min2 * l).sqrt();
                }
                dvx += x * strength * alpha / l;
                dvy += y * strength * alpha / l;
            }
            self.nodes[i].vx += dvx;
            self.nodes[i].vy += dvy;
        }
    }

    /// Shift all nodes so their centroid sits at the origin.
    fn apply_center(&mut self) {
        if self.nodes.is_empty() {
            return;
        }
        let n = self.nodes.len() as f64;
        let sx = self.nodes.iter().map(|p| p.x).sum::<f64>() / n;
        let sy = self.nodes.iter().map(|p| p.y).sum::<f64>() / n;
        for node in &mut self.nodes {
            node.x -= sx;
            node.y -= sy;
        }
    }

    fn apply_collide(&mut self) {
        let n = self.nodes.len();
        let r = self.params.collide_radius * 2.0;
        let strength = self.params.collide_strength;
        for i in 0..n {
            for j in (i + 1)..n {
                let a = self.nodes[i];
                let b = self.nodes[j];
                let mut x = (a.x + a.vx) - (b.x + b.vx);
                let mut y = (a.y + a.vy) - (b.y + b.vy);
                let mut l = x * x + y * y;
                if l >= r * r {
                    continue;
                }
                if x == 0.0 {
                    x = self.rng.jiggle();
                    l += x * x;
                }
                if y == 0.0 {
                    y = self.rng.jiggle();
                    l += y * y;
                }
                let d = l.sqrt();
                let k = (r - d) / d * strength;
                x *= k;
                y *= k;
                // Equal radii split the correction evenly.
                self.nodes[i].vx += x * 0.5;
                self.nodes[i].vy += y * 0.5;
                self.nodes[j].vx -= x * 0.5;
                self.nodes[j].vy -= y * 0.5;
            }
        }
    }
}

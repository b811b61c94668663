use rand::Rng;

#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec<bool>,
    pub velocity: Vec<f64>,
    /// Personal best position.
    pub best: Vec<bool>,
    pub fitness: f64,
}

impl Particle {
    /// Uniform random position, velocities uniform in [-1, 1].
    pub fn random<R: Rng>(num_variables: usize, rng: &mut R) -> Self {
        let position: Vec<bool> = (0..num_variables).map(|_| rng.gen::<bool>()).collect();
        let velocity = (0..num_variables)
            .map(|_| rng.gen_range(-1.0..=1.0))
            .collect();
        Self {
            best: position.clone(),
            position,
            velocity,
            fitness: f64::NEG_INFINITY,
        }
    }

    /// `v ← w·v + c1·r1·(best − x) + c2·r2·(global_best − x)` with fresh
    /// `r1, r2` per dimension.
    pub fn update_velocity<R: Rng>(
        &mut self,
        global_best: &[bool],
        w: f64,
        c1: f64,
        c2: f64,
        rng: &mut R,
    ) {
        for (i, v) in self.velocity.iter_mut().enumerate() {
            let r1 = rng.gen::<f64>();
            let r2 = rng.gen::<f64>();
            let x = bit(self.position[i]);
            *v = w * *v + c1 * r1 * (bit(self.best[i]) - x) + c2 * r2 * (bit(global_best[i]) - x);
        }
    }

    /// Binary PSO flight: one uniform draw per update, compared against every
    /// dimension's flip probability.
    pub fn fly<R: Rng>(&mut self, rng: &mut R) {
        let r = rng.gen::<f64>();
        for (x, &v) in self.position.iter_mut().zip(&self.velocity) {
            *x = r < sigmoid(v);
        }
    }
}

/// Logistic function written so that `exp` only ever sees a non-positive
/// argument.
pub fn sigmoid(v: f64) -> f64 {
    if v >= 0.0 {
        1.0 / (1.0 + (-v).exp())
    } else {
        let e = v.exp();
        e / (1.0 + e)
    }
}

#[inline]
fn bit(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

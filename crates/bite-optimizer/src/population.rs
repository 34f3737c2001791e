//! Rank-ordered candidate populations.

/// Cost used for ordering: non-finite objective values rank after every
/// finite value.
pub fn rank_cost(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        f64::INFINITY
    }
}

/// A point in normalized space with its objective value.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub params: Vec<f64>,
    /// Value exactly as returned by the objective.
    pub value: f64,
    /// Ordering key derived from `value`.
    pub cost: f64,
}

impl Candidate {
    pub fn new(params: Vec<f64>, value: f64) -> Self {
        Self {
            params,
            value,
            cost: rank_cost(value),
        }
    }
}

/// Outcome of offering a candidate to a population.
#[derive(Debug, Clone, PartialEq)]
pub enum Insertion {
    /// Worse than the worst active member; the population is unchanged.
    Rejected,
    /// Stored at `rank`; `displaced` is the member it pushed out, if any.
    Accepted {
        rank: usize,
        displaced: Option<Candidate>,
    },
}

/// Fixed-capacity population kept sorted by ascending cost.
///
/// Only the first `active_size` members take part in selection; the active
/// size can be grown or shrunk between half and full capacity.
#[derive(Debug, Clone)]
pub struct Population {
    dims: usize,
    capacity: usize,
    active_size: usize,
    members: Vec<Candidate>,
}

impl Population {
    pub fn new(dims: usize, capacity: usize) -> Self {
        Self {
            dims,
            capacity,
            active_size: capacity,
            members: Vec::with_capacity(capacity),
        }
    }

    /// Default population size for `dims` parameters.
    pub fn default_size(dims: usize) -> usize {
        let d = dims as f64;
        let cx = (0.008 * d).tanh();
        let low = 10.0 + 3.0 * d;
        let high = 11.0 * d.sqrt();
        (low * (1.0 - cx) + high * cx + 0.5) as usize
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    /// Number of members taking part in selection.
    pub fn active_len(&self) -> usize {
        self.active_size.min(self.members.len())
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.members.first()
    }

    pub fn get(&self, rank: usize) -> &Candidate {
        &self.members[rank]
    }

    pub fn params(&self, rank: usize) -> &[f64] {
        &self.members[rank].params
    }

    /// Offer a candidate. While filling, every candidate is accepted; once
    /// full, a candidate replaces the worst active member unless its cost is
    /// higher.
    pub fn insert(&mut self, candidate: Candidate) -> Insertion {
        if !self.is_full() {
            let rank = self.members.partition_point(|m| m.cost < candidate.cost);
            self.members.insert(rank, candidate);
            return Insertion::Accepted {
                rank,
                displaced: None,
            };
        }

        let worst = self.active_len() - 1;
        if candidate.cost > self.members[worst].cost {
            return Insertion::Rejected;
        }

        let rank = self.members[..worst].partition_point(|m| m.cost < candidate.cost);
        let displaced = self.members.remove(worst);
        self.members.insert(rank, candidate);

        Insertion::Accepted {
            rank,
            displaced: Some(displaced),
        }
    }

    /// Grow the active size by one, up to capacity.
    pub fn grow(&mut self) -> bool {
        if self.active_size < self.capacity {
            self.active_size += 1;
            true
        } else {
            false
        }
    }

    /// Shrink the active size by one, down to half capacity.
    pub fn shrink(&mut self) -> bool {
        if self.active_size > (self.capacity / 2).max(2) {
            self.active_size -= 1;
            true
        } else {
            false
        }
    }

    /// Mean of the active members.
    pub fn centroid(&self) -> Vec<f64> {
        let n = self.active_len();
        let mut centroid = vec![0.0; self.dims];
        if n == 0 {
            return centroid;
        }

        for member in &self.members[..n] {
            for (c, &p) in centroid.iter_mut().zip(&member.params) {
                *c += p;
            }
        }
        for c in &mut centroid {
            *c /= n as f64;
        }
        centroid
    }

    /// Largest per-coordinate range across the active members.
    pub fn spread(&self) -> f64 {
        let n = self.active_len();
        if n < 2 {
            return f64::INFINITY;
        }

        (0..self.dims)
            .map(|i| {
                let (lo, hi) = self.members[..n]
                    .iter()
                    .map(|m| m.params[i])
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                        (lo.min(v), hi.max(v))
                    });
                hi - lo
            })
            .fold(0.0, f64::max)
    }
}

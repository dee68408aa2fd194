//! Travel ordering.
//!
//! Finished paths are grouped by paint (darkest first, water and blank
//! last) with strokes ahead of fills inside a paint. Each group is then
//! ordered to cut pen-up travel: greedily by nearest endpoint, or by a
//! 2-opt or ant colony tour over the path start points.

use crate::path::{PathRole, PlotPath};
use paintkit_core::{Palette, Point};
use paintkit_settings::{TravelAlgorithm, TravelSettings};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// Groups at or below this size always use the greedy order.
const MIN_TOUR_SIZE: usize = 3;

const ANT_COUNT: usize = 10;
const ANT_ALPHA: f64 = 1.0;
const ANT_BETA: f64 = 3.0;
const EVAPORATION: f64 = 0.5;

/// Orders plot paths for emission.
pub struct TravelOptimizer {
    algorithm: TravelAlgorithm,
    iterations: usize,
    rng: StdRng,
}

impl TravelOptimizer {
    pub fn new(settings: &TravelSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            algorithm: settings.travel_algorithm,
            iterations: settings.tsp_iterations.max(1),
            rng,
        }
    }

    pub fn algorithm(&self) -> TravelAlgorithm {
        self.algorithm
    }

    /// Returns every path exactly once, grouped by paint.
    pub fn optimize(&mut self, paths: Vec<PlotPath>, palette: &Palette) -> Vec<PlotPath> {
        let total = paths.len();
        let mut groups: BTreeMap<(usize, u8), Vec<PlotPath>> = BTreeMap::new();
        for path in paths {
            let role = match path.role {
                PathRole::Stroke => 0,
                PathRole::Fill => 1,
            };
            groups
                .entry((palette.paint_rank(path.color), role))
                .or_default()
                .push(path);
        }

        let mut cursor = Point::new(0.0, 0.0);
        let mut ordered = Vec::with_capacity(total);
        for (_, group) in groups {
            let sorted = match self.algorithm {
                _ if group.len() <= MIN_TOUR_SIZE => greedy_order(group, cursor),
                TravelAlgorithm::Greedy => greedy_order(group, cursor),
                TravelAlgorithm::TspOpt => {
                    let tour = two_opt_tour(&starts(&group), self.iterations, &mut self.rng);
                    apply_tour(group, &tour, cursor)
                }
                TravelAlgorithm::TspAco => {
                    let tour = ant_colony_tour(&starts(&group), self.iterations, &mut self.rng);
                    apply_tour(group, &tour, cursor)
                }
            };
            if let Some(end) = sorted.last().and_then(PlotPath::end) {
                cursor = end;
            }
            ordered.extend(sorted);
        }

        tracing::debug!(
            "Ordered {} paths ({}), travel {:.1}",
            ordered.len(),
            self.algorithm,
            travel_distance(&ordered, Point::new(0.0, 0.0))
        );
        ordered
    }
}

/// Pen-up distance to visit `paths` in order starting from `origin`.
pub fn travel_distance(paths: &[PlotPath], origin: Point) -> f64 {
    let mut cursor = origin;
    let mut total = 0.0;
    for path in paths {
        if let (Some(start), Some(end)) = (path.start(), path.end()) {
            total += cursor.distance_to(&start);
            cursor = end;
        }
    }
    total
}

/// Nearest-endpoint ordering, reversing paths to start at the nearer end.
pub fn greedy_order(mut pool: Vec<PlotPath>, origin: Point) -> Vec<PlotPath> {
    let mut ordered = Vec::with_capacity(pool.len());
    let mut cursor = origin;
    while !pool.is_empty() {
        let mut best = (0usize, false, f64::INFINITY);
        for (i, path) in pool.iter().enumerate() {
            if let Some(start) = path.start() {
                let d = cursor.distance_sq(&start);
                if d < best.2 {
                    best = (i, false, d);
                }
            }
            if let Some(end) = path.end() {
                let d = cursor.distance_sq(&end);
                if d < best.2 {
                    best = (i, true, d);
                }
            }
        }
        let mut path = pool.swap_remove(best.0);
        if best.1 {
            path.reverse();
        }
        if let Some(end) = path.end() {
            cursor = end;
        }
        ordered.push(path);
    }
    ordered
}

fn starts(group: &[PlotPath]) -> Vec<Point> {
    group
        .iter()
        .map(|p| p.start().unwrap_or(Point::new(0.0, 0.0)))
        .collect()
}

fn distance_matrix(points: &[Point]) -> Vec<Vec<f64>> {
    points
        .iter()
        .map(|a| points.iter().map(|b| a.distance_to(b)).collect())
        .collect()
}

fn tour_length(tour: &[usize], dist: &[Vec<f64>]) -> f64 {
    tour.windows(2).map(|w| dist[w[0]][w[1]]).sum()
}

/// Open tour over `points` improved by 2-opt sweeps from a random start.
pub fn two_opt_tour(points: &[Point], iterations: usize, rng: &mut StdRng) -> Vec<usize> {
    let n = points.len();
    let mut tour: Vec<usize> = (0..n).collect();
    if n <= MIN_TOUR_SIZE {
        return tour;
    }
    tour.shuffle(rng);
    improve_two_opt(&mut tour, &distance_matrix(points), iterations);
    tour
}

/// Runs up to `iterations` 2-opt sweeps over an open tour, stopping
/// early once a sweep finds no improving move.
///
/// Besides the usual segment reversal, a sweep also tries reversing a
/// prefix of the tour, since an open tour's first stop is not fixed.
fn improve_two_opt(tour: &mut [usize], dist: &[Vec<f64>], iterations: usize) {
    let n = tour.len();
    if n < 3 {
        return;
    }
    for _ in 0..iterations {
        let mut improved = false;
        for i in 0..n - 1 {
            for j in i + 2..n {
                let a = tour[i];
                let b = tour[i + 1];
                let c = tour[j];
                let before = dist[a][b] + tour.get(j + 1).map_or(0.0, |&d| dist[c][d]);
                let after = dist[a][c] + tour.get(j + 1).map_or(0.0, |&d| dist[b][d]);
                if after + 1e-9 < before {
                    tour[i + 1..=j].reverse();
                    improved = true;
                }
            }
        }
        for j in 1..n - 1 {
            if dist[tour[0]][tour[j + 1]] + 1e-9 < dist[tour[j]][tour[j + 1]] {
                tour[..=j].reverse();
                improved = true;
            }
        }
        if !improved {
            break;
        }
    }
}

/// Ant colony tour: `iterations` rounds of up to ten ants, keeping the
/// shortest open tour seen.
pub fn ant_colony_tour(points: &[Point], iterations: usize, rng: &mut StdRng) -> Vec<usize> {
    let n = points.len();
    if n <= MIN_TOUR_SIZE {
        return (0..n).collect();
    }
    let dist = distance_matrix(points);
    let mut pheromone = vec![vec![1.0f64; n]; n];
    let ants = n.min(ANT_COUNT);
    let mut best: Vec<usize> = (0..n).collect();
    let mut best_len = tour_length(&best, &dist);

    for _ in 0..iterations {
        let mut tours = Vec::with_capacity(ants);
        for _ in 0..ants {
            let tour = construct_ant_tour(&dist, &pheromone, rng);
            let len = tour_length(&tour, &dist);
            if len < best_len {
                best_len = len;
                best = tour.clone();
            }
            tours.push((tour, len));
        }

        for row in pheromone.iter_mut() {
            for value in row.iter_mut() {
                *value *= 1.0 - EVAPORATION;
            }
        }
        for (tour, len) in &tours {
            let deposit = 1.0 / len.max(1e-9);
            for w in tour.windows(2) {
                pheromone[w[0]][w[1]] += deposit;
                pheromone[w[1]][w[0]] += deposit;
            }
        }
    }
    best
}

fn construct_ant_tour(dist: &[Vec<f64>], pheromone: &[Vec<f64>], rng: &mut StdRng) -> Vec<usize> {
    let n = dist.len();
    let mut visited = vec![false; n];
    let mut current = rng.gen_range(0..n);
    let mut tour = Vec::with_capacity(n);
    tour.push(current);
    visited[current] = true;

    while tour.len() < n {
        let weights: Vec<(usize, f64)> = (0..n)
            .filter(|&j| !visited[j])
            .map(|j| {
                let eta = 1.0 / dist[current][j].max(1e-6);
                (j, pheromone[current][j].powf(ANT_ALPHA) * eta.powf(ANT_BETA))
            })
            .collect();
        let sum: f64 = weights.iter().map(|(_, w)| w).sum();
        let mut pick = weights.last().map(|(j, _)| *j).unwrap_or(current);
        if sum > 0.0 && sum.is_finite() {
            let mut roll = rng.gen::<f64>() * sum;
            for (j, w) in &weights {
                if roll <= *w {
                    pick = *j;
                    break;
                }
                roll -= w;
            }
        }
        visited[pick] = true;
        tour.push(pick);
        current = pick;
    }
    tour
}

/// Visits `group` in tour order, entering from whichever tour end is
/// nearer `origin` and flipping paths to start at their nearer end.
fn apply_tour(group: Vec<PlotPath>, tour: &[usize], origin: Point) -> Vec<PlotPath> {
    let mut slots: Vec<Option<PlotPath>> = group.into_iter().map(Some).collect();
    let first = tour.first().and_then(|&i| slots[i].as_ref()?.start());
    let last = tour.last().and_then(|&i| slots[i].as_ref()?.start());
    let reversed = match (first, last) {
        (Some(f), Some(l)) => origin.distance_sq(&l) < origin.distance_sq(&f),
        _ => false,
    };
    let order: Vec<usize> = if reversed {
        tour.iter().rev().copied().collect()
    } else {
        tour.to_vec()
    };

    let mut cursor = origin;
    let mut out = Vec::with_capacity(order.len());
    for i in order {
        let Some(mut path) = slots.get_mut(i).and_then(Option::take) else {
            continue;
        };
        if let (Some(start), Some(end)) = (path.start(), path.end()) {
            if cursor.distance_sq(&end) < cursor.distance_sq(&start) {
                path.reverse();
            }
        }
        if let Some(end) = path.end() {
            cursor = end;
        }
        out.push(path);
    }
    // Anything the tour missed keeps its original order.
    out.extend(slots.into_iter().flatten());
    out
}

//! Polyline smoothing and simplification for the smooth line fill.

use paintkit_core::Point;

/// Ramer-Douglas-Peucker simplification. Endpoints are always kept.
pub fn douglas_peucker(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0usize, points.len() - 1)];
    while let Some((first, last)) = stack.pop() {
        let mut max_dist = 0.0;
        let mut index = first;
        for i in first + 1..last {
            let d = points[i].distance_to_segment(&points[first], &points[last]);
            if d > max_dist {
                max_dist = d;
                index = i;
            }
        }
        if max_dist > tolerance && index != first {
            keep[index] = true;
            stack.push((first, index));
            stack.push((index, last));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Chaikin corner cutting on an open polyline.
pub fn chaikin(points: &[Point], iterations: usize) -> Vec<Point> {
    let mut current = points.to_vec();
    for _ in 0..iterations {
        if current.len() < 3 {
            break;
        }
        let mut next = Vec::with_capacity(current.len() * 2);
        next.push(current[0]);
        for w in current.windows(2) {
            next.push(w[0].lerp(&w[1], 0.25));
            next.push(w[0].lerp(&w[1], 0.75));
        }
        if let Some(last) = current.last() {
            next.push(*last);
        }
        current = next;
    }
    current
}

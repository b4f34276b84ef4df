// polygon geometry backing the gene splicing mutation
//
// - signed area / winding
// - convex hull (Andrew's monotone chain)
// - triangle bisection through the longest edge
// - fan triangulation of a convex polygon

use crate::dna::Point;

/// compute signed area of a polygon using the shoelace formula.
/// returns positive for CCW, negative for CW, zero for degenerate.
pub fn signed_area(pts: &[Point]) -> f64 {
    if pts.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..pts.len() {
        let j = (i + 1) % pts.len();
        area += pts[i].0 * pts[j].1;
        area -= pts[j].0 * pts[i].1;
    }
    area * 0.5
}

/// absolute polygon area
#[inline]
pub fn polygon_area(pts: &[Point]) -> f64 {
    signed_area(pts).abs()
}

/// z component of (a - o) x (b - o); positive for a left turn
#[inline]
fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// convex hull in CCW order without collinear points.
/// fewer than 3 distinct input points yields whatever is left after deduplication.
pub fn convex_hull(pts: &[Point]) -> Vec<Point> {
    let mut p: Vec<Point> = pts.to_vec();
    p.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    p.dedup();

    let n = p.len();
    if n < 3 {
        return p;
    }

    let mut hull: Vec<Point> = Vec::with_capacity(2 * n);

    // lower hull
    for &pt in &p {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], pt) <= 0.0 {
            hull.pop();
        }
        hull.push(pt);
    }

    // upper hull
    let lower_len = hull.len() + 1;
    for &pt in p.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], pt) <= 0.0 {
            hull.pop();
        }
        hull.push(pt);
    }

    // last point repeats the first
    hull.pop();
    hull
}

#[inline]
fn dist2(a: Point, b: Point) -> f64 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    dx * dx + dy * dy
}

/// cut a triangle in two through the midpoint of its longest edge and the
/// opposite vertex. returns None unless given exactly 3 points.
pub fn bisect_triangle(tri: &[Point]) -> Option<([Point; 3], [Point; 3])> {
    if tri.len() != 3 {
        return None;
    }

    // edge i runs from tri[i] to tri[i + 1]
    let mut longest = 0;
    let mut longest_len = dist2(tri[0], tri[1]);
    for i in 1..3 {
        let l = dist2(tri[i], tri[(i + 1) % 3]);
        if l > longest_len {
            longest_len = l;
            longest = i;
        }
    }

    let p0 = tri[longest];
    let p1 = tri[(longest + 1) % 3];
    let apex = tri[(longest + 2) % 3];
    let mid = ((p0.0 + p1.0) / 2.0, (p0.1 + p1.1) / 2.0);

    Some(([p0, mid, apex], [p1, apex, mid]))
}

/// split a convex polygon into triangles fanning out from its first vertex
pub fn fan_triangulate(convex: &[Point]) -> Vec<[Point; 3]> {
    if convex.len() < 3 {
        return Vec::new();
    }
    (1..convex.len() - 1)
        .map(|i| [convex[0], convex[i], convex[i + 1]])
        .collect()
}

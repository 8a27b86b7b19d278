use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec2;

/// Wraps an angle into (-π, π]. Values already in range are returned untouched.
pub fn wrap_to_pi(angle: f32) -> f32 {
    if !angle.is_finite() {
        return angle;
    }

    let mut wrapped = if angle.abs() > 4.0 * TAU {
        angle % TAU
    } else {
        angle
    };
    while wrapped > PI {
        wrapped -= TAU;
    }
    while wrapped <= -PI {
        wrapped += TAU;
    }
    wrapped
}

/// True when the angle points into the right half-plane (ball travelling left to right).
pub fn is_rightward(angle: f32) -> bool {
    let wrapped = wrap_to_pi(angle);
    -FRAC_PI_2 < wrapped && wrapped < FRAC_PI_2
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_position(position: Vec2, size: Vec2) -> Self {
        Self::new(position.x, position.y, size.x, size.y)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Contact point between a circle and a rectangle whose corners are rounded
/// with a diameter of `min(width, height) * corner_ratio`.
///
/// Straight edges are tested first (left before right, then top before
/// bottom). Corners are sampled every degree from 0 to 90, visiting
/// top-left, bottom-left, top-right, bottom-right for each angle, and the
/// first sample within `circle_radius` of the centre wins.
pub fn rounded_rect_circle_contact(
    rect: Rect,
    corner_ratio: f32,
    circle: Vec2,
    circle_radius: f32,
) -> Option<Vec2> {
    let corner_radius = rect.width.min(rect.height) * corner_ratio / 2.0;

    let overlaps = rect.y - circle_radius <= circle.y
        && circle.y <= rect.bottom() + circle_radius
        && rect.x - circle_radius <= circle.x
        && circle.x <= rect.right() + circle_radius;
    if !overlaps {
        return None;
    }

    if rect.y + corner_radius <= circle.y && circle.y <= rect.bottom() - corner_radius {
        if (rect.x - circle.x).abs() <= circle_radius {
            return Some(Vec2::new(rect.x, circle.y));
        }
        if (rect.right() - circle.x).abs() <= circle_radius {
            return Some(Vec2::new(rect.right(), circle.y));
        }
        return None;
    }

    if rect.x + corner_radius <= circle.x && circle.x <= rect.right() - corner_radius {
        if (rect.y - circle.y).abs() <= circle_radius {
            return Some(Vec2::new(circle.x, rect.y));
        }
        if (rect.bottom() - circle.y).abs() <= circle_radius {
            return Some(Vec2::new(circle.x, rect.bottom()));
        }
        return None;
    }

    for degree in 0..=90u16 {
        let (sin, cos) = f32::from(degree).to_radians().sin_cos();
        let dx = corner_radius * cos;
        let dy = corner_radius * sin;

        let xs = [
            rect.x + corner_radius - dx,
            rect.right() - corner_radius + dx,
        ];
        let ys = [
            rect.y + corner_radius - dy,
            rect.bottom() - corner_radius + dy,
        ];

        for x in xs {
            for y in ys {
                let sample = Vec2::new(x, y);
                if sample.distance(circle) <= circle_radius {
                    return Some(sample);
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_to_pi_range_and_idempotence() {
        let mut angle = -40.0f32;
        while angle < 40.0 {
            let wrapped = wrap_to_pi(angle);
            assert!(wrapped > -PI && wrapped <= PI, "{angle} -> {wrapped}");
            assert_eq!(wrap_to_pi(wrapped), wrapped);
            angle += 0.37;
        }
    }

    #[test]
    fn test_wrap_to_pi_boundaries() {
        assert_eq!(wrap_to_pi(PI), PI);
        assert_eq!(wrap_to_pi(-PI), PI);
        assert_eq!(wrap_to_pi(0.5), 0.5);
        assert!((wrap_to_pi(3.0 * PI).abs() - PI).abs() < 1e-5);
        assert!((wrap_to_pi(1000.0 * TAU + 0.25) - 0.25).abs() < 1e-2);
    }

    #[test]
    fn test_is_rightward() {
        assert!(is_rightward(0.0));
        assert!(is_rightward(-PI / 4.0));
        assert!(is_rightward(TAU + 0.1));
        assert!(!is_rightward(PI));
        assert!(!is_rightward(3.0 * PI / 4.0));
        assert!(!is_rightward(FRAC_PI_2));
    }

    #[test]
    fn test_straight_edge_contact_at_exact_radius() {
        let rect = Rect::new(100.0, 100.0, 100.0, 40.0);
        let radius = 8.0;

        let left = rounded_rect_circle_contact(rect, 0.5, Vec2::new(92.0, 120.0), radius);
        assert_eq!(left, Some(Vec2::new(100.0, 120.0)));

        let right = rounded_rect_circle_contact(rect, 0.5, Vec2::new(208.0, 120.0), radius);
        assert_eq!(right, Some(Vec2::new(200.0, 120.0)));

        let top = rounded_rect_circle_contact(rect, 0.5, Vec2::new(150.0, 92.0), radius);
        assert_eq!(top, Some(Vec2::new(150.0, 100.0)));

        let bottom = rounded_rect_circle_contact(rect, 0.5, Vec2::new(150.0, 148.0), radius);
        assert_eq!(bottom, Some(Vec2::new(150.0, 140.0)));
    }

    #[test]
    fn test_no_contact_beyond_radius() {
        let rect = Rect::new(100.0, 100.0, 100.0, 40.0);
        let radius = 8.0;

        assert!(rounded_rect_circle_contact(rect, 0.5, Vec2::new(91.5, 120.0), radius).is_none());
        assert!(rounded_rect_circle_contact(rect, 0.5, Vec2::new(150.0, 120.0), radius).is_none());
    }

    #[test]
    fn test_corner_far_away_is_not_colliding() {
        let rect = Rect::new(100.0, 100.0, 50.0, 50.0);
        let radius = 8.0;
        let corner_radius = 25.0;
        let offset = (radius + corner_radius + 1.0) / 2f32.sqrt() + 1.0;
        let circle = Vec2::new(100.0 - offset, 100.0 - offset);

        assert!(rounded_rect_circle_contact(rect, 1.0, circle, radius).is_none());
    }

    #[test]
    fn test_rounded_corner_contact_lies_on_arc() {
        let rect = Rect::new(0.0, 0.0, 50.0, 50.0);
        let radius = 8.0;
        let center = Vec2::new(25.0, 25.0);
        let circle = center + Vec2::new(-1.0, -1.0).normalize() * (25.0 + radius - 0.5);

        let contact = rounded_rect_circle_contact(rect, 1.0, circle, radius)
            .expect("ball touching the rounded corner");
        assert!((contact.distance(center) - 25.0).abs() < 1e-3);
        assert!(contact.x <= 25.0 && contact.y <= 25.0);
        assert!(contact.distance(circle) <= radius);
    }

    #[test]
    fn test_rounded_corner_gap_is_not_colliding() {
        let rect = Rect::new(0.0, 0.0, 50.0, 50.0);
        let radius = 8.0;
        // Inside the bounding box but off the rounded corner.
        let circle = Vec2::new(-4.0, -4.0);

        assert!(rounded_rect_circle_contact(rect, 1.0, circle, radius).is_none());
    }
}

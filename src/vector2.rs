use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// Plain 2D vector used for positions, velocities and accelerations.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Skips the square root; use for threshold comparisons.
    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn distance_to(&self, other: Vector2) -> f64 {
        (*self - other).length()
    }

    pub fn distance_squared_to(&self, other: Vector2) -> f64 {
        (*self - other).length_squared()
    }

    /// Unit vector in the same direction. A zero vector stays zero instead of
    /// turning into NaN.
    pub fn normalize(&self) -> Vector2 {
        let mut v = *self;
        v.normalize_ip();
        v
    }

    pub fn normalize_ip(&mut self) {
        let len = self.length();
        if len == 0.0 {
            return;
        }
        self.x /= len;
        self.y /= len;
    }

    /// Rescales in place to `target` length. No-op on a zero vector.
    pub fn scale_to_length(&mut self, target: f64) {
        let len = self.length();
        if len == 0.0 {
            return;
        }
        let k = target / len;
        self.x *= k;
        self.y *= k;
    }

    pub fn update(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Vector2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector2 {
    type Output = Vector2;

    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vector2 {
    type Output = Vector2;

    fn neg(self) -> Vector2 {
        Vector2::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;

    fn mul(self, rhs: f64) -> Vector2 {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}

// Division by zero follows IEEE-754 (inf / NaN); callers pick the divisor.
impl Div<f64> for Vector2 {
    type Output = Vector2;

    fn div(self, rhs: f64) -> Vector2 {
        Vector2::new(self.x / rhs, self.y / rhs)
    }
}

#[cfg(test)]
impl approx::AbsDiffEq for Vector2 {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        approx::AbsDiffEq::abs_diff_eq(&self.x, &other.x, epsilon)
            && approx::AbsDiffEq::abs_diff_eq(&self.y, &other.y, epsilon)
    }
}

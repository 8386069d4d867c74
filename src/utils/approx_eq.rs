#[cfg(test)]
pub(crate) fn approx_eq(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() < epsilon
}

#[cfg(test)]
pub(crate) fn approx_eq_vec2(a: glam::Vec2, b: glam::Vec2, epsilon: f32) -> bool {
    approx_eq(a.x, b.x, epsilon) && approx_eq(a.y, b.y, epsilon)
}

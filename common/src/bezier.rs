// ============================================================================
// Quartic Bezier Patch
// ============================================================================

// Control points per patch axis. Five points make a degree-4 curve.
pub const PATCH_SIZE: usize = 5;

pub type ControlGrid = [[f32; PATCH_SIZE]; PATCH_SIZE];

// Degree-4 Bernstein basis at t. The weights sum to one for every t.
#[must_use]
pub fn bernstein4(t: f32) -> [f32; PATCH_SIZE] {
    let s = 1.0 - t;
    [
        s * s * s * s,
        4.0 * t * s * s * s,
        6.0 * t * t * s * s,
        4.0 * t * t * t * s,
        t * t * t * t,
    ]
}

// Tensor-product evaluation. `control[row][col]`: rows follow v, columns follow u.
#[must_use]
pub fn evaluate_patch(control: &ControlGrid, u: f32, v: f32) -> f32 {
    let bu = bernstein4(u.clamp(0.0, 1.0));
    let bv = bernstein4(v.clamp(0.0, 1.0));

    control
        .iter()
        .zip(bv)
        .map(|(row, wv)| row.iter().zip(bu).map(|(h, wu)| h * wu).sum::<f32>() * wv)
        .sum()
}

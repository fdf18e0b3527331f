//! Transport jacobian of one Runge–Kutta–Nyström step.

use crate::field::TESLA;
use crate::math::{Jacobian, Vector3, QOP_INDEX};
use crate::stage::StepData;

/// Jacobian of the free parameters across a step of length `h` in vacuum.
///
/// Field gradients are neglected, so this is exact for a uniform field up to
/// the `O(h²)` direction coupling. `direction` and `qop` are the values at
/// the start of the step.
pub fn vacuum_transport(h: f64, direction: &Vector3, qop: f64, data: &StepData) -> Jacobian {
    let mut d = Jacobian::identity();
    let b = data.b_middle;
    let kappa = qop * TESLA;

    // ∂(dir × B)/∂dir
    let skew = [
        [0.0, b.z(), -b.y()],
        [-b.z(), 0.0, b.x()],
        [b.y(), -b.x(), 0.0],
    ];
    for (i, row) in skew.iter().enumerate() {
        for (j, m) in row.iter().enumerate() {
            d[(i, 3 + j)] += 0.5 * h * h * kappa * m;
            d[(3 + i, 3 + j)] += h * kappa * m;
        }
        d[(i, 3 + i)] += h;
    }

    // ∂k/∂(q/p) at fixed direction
    let dk1 = direction.cross(&data.b_first) * TESLA;
    let dk2 = direction.cross(&data.b_middle) * TESLA;
    let dk4 = direction.cross(&data.b_last) * TESLA;
    let dpos = (dk1 + dk2 * 2.0) * (h * h / 6.0);
    let ddir = (dk1 + dk2 * 4.0 + dk4) * (h / 6.0);
    d.set_column_block(0, QOP_INDEX, dpos);
    d.set_column_block(3, QOP_INDEX, ddir);
    d
}

use crate::neighborhood::{Neighborhood, E, N, NE, NW, S, SE, SW, W};

/// A 3x3 integer kernel laid out row-major with y pointing down.
pub type Kernel3 = [[i32; 3]; 3];

/// First difference across the 0 degree (horizontal) direction.
pub const GRADIENT_0: Kernel3 = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];

/// First difference across the 45 degree diagonal.
pub const GRADIENT_45: Kernel3 = [[0, 1, 2], [-1, 0, 1], [-2, -1, 0]];

/// First difference across the 90 degree (vertical) direction.
pub const GRADIENT_90: Kernel3 = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

/// First difference across the 135 degree diagonal.
pub const GRADIENT_135: Kernel3 = [[2, 1, 0], [1, 0, -1], [0, -1, -2]];

/// The four directional gradient kernels, in 0, 45, 90, 135 degree order.
pub const GRADIENT_KERNELS: [Kernel3; 4] = [GRADIENT_0, GRADIENT_45, GRADIENT_90, GRADIENT_135];

/// Correlate a kernel with a neighborhood.
pub fn apply_kernel3(kernel: &Kernel3, hood: &Neighborhood) -> i32 {
    let r = &hood.ring;
    kernel[0][0] * r[NW]
        + kernel[0][1] * r[N]
        + kernel[0][2] * r[NE]
        + kernel[1][0] * r[W]
        + kernel[1][1] * hood.center
        + kernel[1][2] * r[E]
        + kernel[2][0] * r[SW]
        + kernel[2][1] * r[S]
        + kernel[2][2] * r[SE]
}

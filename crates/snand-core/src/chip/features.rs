//! NAND chip feature flags

use bitflags::bitflags;

bitflags! {
    /// Feature flags for serial NAND chips
    ///
    /// These flags describe behaviors that change how the driver talks to a
    /// chip family, beyond what the geometry and ECC variant capture.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Features: u32 {
        /// Two-plane part: the plane (block & 1) goes into column bit 12
        const PLANE_SELECT = 1 << 0;
        /// Buffer read mode must be selected in the configuration register
        const BUF_MODE     = 1 << 1;
        /// Quad enable bit lives in the configuration register
        const QUAD_ENABLE  = 1 << 2;
        /// Block protection is set at power-up; attach clears it on every chip
        const LOCKED_AT_POR = 1 << 3;
    }
}

impl Default for Features {
    fn default() -> Self {
        Features::empty()
    }
}

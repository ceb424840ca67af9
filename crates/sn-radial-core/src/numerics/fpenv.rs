//! Sticky floating-point exception flags of the current thread.
//!
//! The flags are read and cleared through the C runtime's `<fenv.h>`
//! interface where its bit layout is known. Elsewhere the monitor reports
//! nothing raised.

use crate::modules::traits::FloatingPointMonitor;
use std::fmt::{Display, Formatter};

/// Subset of IEEE 754 exception flags watched between steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FpFlags(u8);

impl FpFlags {
    pub const NONE: Self = Self(0);
    pub const INVALID: Self = Self(1);
    pub const DIV_BY_ZERO: Self = Self(1 << 1);
    pub const OVERFLOW: Self = Self(1 << 2);
    pub const UNDERFLOW: Self = Self(1 << 3);

    const NAMED: [(Self, &'static str); 4] = [
        (Self::INVALID, "INVALID"),
        (Self::DIV_BY_ZERO, "DIVBYZERO"),
        (Self::OVERFLOW, "OVERFLOW"),
        (Self::UNDERFLOW, "UNDERFLOW"),
    ];

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl std::ops::BitOr for FpFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl Display for FpFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&self.names().join(" "))
    }
}

/// Reads the hardware status word after every step.
#[derive(Debug, Clone, Copy, Default)]
pub struct HardwareFpMonitor;

impl HardwareFpMonitor {
    pub fn new() -> Self {
        Self
    }

    /// Whether flags can actually be observed on this target.
    pub const fn is_supported() -> bool {
        sys::SUPPORTED
    }
}

impl FloatingPointMonitor for HardwareFpMonitor {
    fn raised(&mut self) -> FpFlags {
        sys::test_flags()
    }

    fn clear(&mut self) {
        sys::clear_flags();
    }
}

#[cfg(all(target_os = "linux", any(target_arch = "x86_64", target_arch = "aarch64")))]
mod sys {
    use super::FpFlags;
    use std::os::raw::c_int;

    pub(super) const SUPPORTED: bool = true;

    #[cfg(target_arch = "x86_64")]
    mod bits {
        use std::os::raw::c_int;
        pub(super) const FE_INVALID: c_int = 0x01;
        pub(super) const FE_DIVBYZERO: c_int = 0x04;
        pub(super) const FE_OVERFLOW: c_int = 0x08;
        pub(super) const FE_UNDERFLOW: c_int = 0x10;
    }

    #[cfg(target_arch = "aarch64")]
    mod bits {
        use std::os::raw::c_int;
        pub(super) const FE_INVALID: c_int = 0x01;
        pub(super) const FE_DIVBYZERO: c_int = 0x02;
        pub(super) const FE_OVERFLOW: c_int = 0x04;
        pub(super) const FE_UNDERFLOW: c_int = 0x08;
    }

    use bits::{FE_DIVBYZERO, FE_INVALID, FE_OVERFLOW, FE_UNDERFLOW};

    const WATCHED: c_int = FE_INVALID | FE_DIVBYZERO | FE_OVERFLOW | FE_UNDERFLOW;

    #[link(name = "m")]
    unsafe extern "C" {
        fn fetestexcept(excepts: c_int) -> c_int;
        fn feclearexcept(excepts: c_int) -> c_int;
    }

    pub(super) fn test_flags() -> FpFlags {
        // SAFETY: both calls only touch the calling thread's FP status word.
        let raised = unsafe { fetestexcept(WATCHED) };
        let mut flags = FpFlags::NONE;
        for (bit, flag) in [
            (FE_INVALID, FpFlags::INVALID),
            (FE_DIVBYZERO, FpFlags::DIV_BY_ZERO),
            (FE_OVERFLOW, FpFlags::OVERFLOW),
            (FE_UNDERFLOW, FpFlags::UNDERFLOW),
        ] {
            if raised & bit != 0 {
                flags = flags | flag;
            }
        }
        flags
    }

    pub(super) fn clear_flags() {
        // SAFETY: see `test_flags`.
        unsafe {
            feclearexcept(WATCHED);
        }
    }
}

#[cfg(not(all(target_os = "linux", any(target_arch = "x86_64", target_arch = "aarch64"))))]
mod sys {
    use super::FpFlags;

    pub(super) const SUPPORTED: bool = false;

    pub(super) fn test_flags() -> FpFlags {
        FpFlags::NONE
    }

    pub(super) fn clear_flags() {}
}

//! Binary-side scenario tests: drive the library end to end the way the
//! driver loop does, with simulated clocks instead of hardware.

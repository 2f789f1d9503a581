pub mod bits;

/// Breakpoint hook for consistency-check failures. Stops in the debugger on
/// debug builds of the supported architectures; otherwise does nothing.
pub fn debug_break() {
    #[cfg(all(debug_assertions, target_arch = "x86_64"))]
    unsafe {
        std::arch::asm!("int3");
    }
    #[cfg(all(debug_assertions, target_arch = "aarch64"))]
    unsafe {
        std::arch::asm!("brk #0");
    }
}

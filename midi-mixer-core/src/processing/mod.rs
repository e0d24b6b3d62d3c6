pub mod debounce;
pub mod midi;
pub mod scaling;
pub mod shell;

pub mod runtime;
pub mod theme;
pub mod view;

pub mod nord;
pub mod roles;

pub use roles::ThemeRoles;

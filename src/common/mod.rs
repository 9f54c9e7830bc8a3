pub mod config;
pub mod distro;
pub mod host;
pub mod package;
pub mod privileges;
pub mod requirements;

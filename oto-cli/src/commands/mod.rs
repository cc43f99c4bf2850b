pub mod assemble;
pub mod check;
pub mod modules;

pub use assemble::{handle_assemble_command, AssembleArgs};
pub use check::handle_check_command;
pub use modules::handle_modules_command;

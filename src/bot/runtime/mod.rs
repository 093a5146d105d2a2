pub mod command_lifecycle;

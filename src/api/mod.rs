pub mod urban;

pub mod control_signal;

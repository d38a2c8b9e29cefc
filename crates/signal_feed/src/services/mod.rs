pub mod signal_poller;

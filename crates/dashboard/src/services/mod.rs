pub mod terminal_view;

pub mod process_canvas;

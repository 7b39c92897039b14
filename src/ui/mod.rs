pub mod bottom_bar;
pub mod messenger;
pub mod modal;
pub mod quiz;
pub mod top;
pub mod util;

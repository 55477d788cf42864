pub mod file_formats;
pub mod peptone;
pub mod profile;
pub mod strain;
